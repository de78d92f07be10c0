//! Asynchronous work the chat view hands off: opening the session and
//! waiting for a reply.
//!
//! Both operations are bounded by an optional timeout and a cancellation
//! token, and both settle with a `Result` instead of leaving the view stuck.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::observability::EXCHANGE_DURATION;
use crate::provider::{ChatHandle, ChatProvider};
use crate::session::StartChatParams;

/// Opens a session through `provider`.
pub async fn start_session(
    provider: &dyn ChatProvider,
    params: StartChatParams,
    timeout: Option<Duration>,
    cancel: CancellationToken,
) -> Result<Box<dyn ChatHandle>> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::abort("session start cancelled")),
        result = bounded(provider.start_chat(params), timeout) => result,
    }
}

/// One user message on its way to the model.
///
/// The exchange owns the session handle while it runs and gives it back in
/// the [`ExchangeOutcome`], so at most one exchange can exist per session.
pub struct Exchange {
    handle: Box<dyn ChatHandle>,
    text: String,
}

impl Exchange {
    pub(crate) fn new(handle: Box<dyn ChatHandle>, text: String) -> Self {
        Self { handle, text }
    }

    /// The text being sent.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Sends the text and waits for a single reply.
    ///
    /// Cancellation and timeout both settle the exchange with an error; the
    /// handle's history is only updated by a completed reply.
    pub async fn run(self, timeout: Option<Duration>, cancel: CancellationToken) -> ExchangeOutcome {
        let Exchange { mut handle, text } = self;
        let start = Instant::now();
        let result = {
            let send = bounded(handle.send_message(&text), timeout);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::abort("exchange cancelled")),
                result = send => result,
            }
        };
        let elapsed = start.elapsed();
        EXCHANGE_DURATION.add(elapsed.as_secs_f64());
        ExchangeOutcome {
            handle,
            result,
            elapsed,
        }
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("text", &self.text)
            .field("history", &self.handle.history().len())
            .finish()
    }
}

/// The settled result of an [`Exchange`].
pub struct ExchangeOutcome {
    pub(crate) handle: Box<dyn ChatHandle>,
    result: Result<String>,
    elapsed: Duration,
}

impl ExchangeOutcome {
    /// The reply text, or why there is none.
    pub fn result(&self) -> &Result<String> {
        &self.result
    }

    /// How long the exchange was in flight.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub(crate) fn into_parts(self) -> (Box<dyn ChatHandle>, Result<String>) {
        (self.handle, self.result)
    }
}

impl fmt::Debug for ExchangeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeOutcome")
            .field("result", &self.result)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

async fn bounded<T, F>(future: F, timeout: Option<Duration>) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .unwrap_or_else(|_| {
                Err(Error::timeout(
                    "no reply before the deadline",
                    Some(limit.as_secs_f64()),
                ))
            }),
        None => future.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Content;

    struct Silent;

    #[async_trait::async_trait]
    impl ChatHandle for Silent {
        async fn send_message(&mut self, _: &str) -> Result<String> {
            std::future::pending().await
        }

        fn history(&self) -> &[Content] {
            &[]
        }
    }

    struct Echo(Vec<Content>);

    #[async_trait::async_trait]
    impl ChatHandle for Echo {
        async fn send_message(&mut self, text: &str) -> Result<String> {
            self.0.push(Content::user(text));
            self.0.push(Content::model(text));
            Ok(format!("echo: {text}"))
        }

        fn history(&self) -> &[Content] {
            &self.0
        }
    }

    #[tokio::test]
    async fn reply_returns_handle() {
        let exchange = Exchange::new(Box::new(Echo(Vec::new())), "ping".to_string());
        assert_eq!(exchange.text(), "ping");
        let outcome = exchange.run(None, CancellationToken::new()).await;
        assert_eq!(outcome.result().as_deref().ok(), Some("echo: ping"));
        let (handle, _) = outcome.into_parts();
        assert_eq!(handle.history().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_session_times_out() {
        let exchange = Exchange::new(Box::new(Silent), "hello?".to_string());
        let outcome = exchange
            .run(Some(Duration::from_secs(5)), CancellationToken::new())
            .await;
        assert!(outcome.result().as_ref().unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn cancelled_exchange_aborts() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let exchange = Exchange::new(Box::new(Silent), "hello?".to_string());
        let outcome = exchange.run(None, cancel).await;
        assert!(outcome.result().as_ref().unwrap_err().is_abort());
    }
}
