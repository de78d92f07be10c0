//! The seam between the chat view and the remote model.
//!
//! The view never talks to [`Gemini`] directly.  It asks a [`ChatProvider`]
//! for a session and then sends text through the [`ChatHandle`] it got back,
//! which keeps the exchange logic testable against scripted providers.

use crate::client::Gemini;
use crate::error::{Error, Result};
use crate::session::{GeminiChat, StartChatParams};
use crate::types::Content;

/// Something that can open conversational sessions.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Creates a new session with the given settings.
    async fn start_chat(&self, params: StartChatParams) -> Result<Box<dyn ChatHandle>>;
}

/// An open conversation that remembers earlier turns.
#[async_trait::async_trait]
pub trait ChatHandle: Send {
    /// Sends one message and waits for a single reply.
    async fn send_message(&mut self, text: &str) -> Result<String>;

    /// Turns exchanged so far, oldest first.
    fn history(&self) -> &[Content];
}

#[async_trait::async_trait]
impl ChatProvider for Gemini {
    async fn start_chat(&self, params: StartChatParams) -> Result<Box<dyn ChatHandle>> {
        let chat = Gemini::start_chat(self, params).await?;
        Ok(Box::new(chat))
    }
}

#[async_trait::async_trait]
impl ChatHandle for GeminiChat {
    async fn send_message(&mut self, text: &str) -> Result<String> {
        GeminiChat::send_message(self, text).await
    }

    fn history(&self) -> &[Content] {
        GeminiChat::history(self)
    }
}

/// A provider that cannot open sessions, e.g. because the client could not
/// be configured.  Every start fails with the stored error.
#[derive(Clone, Debug)]
pub struct Unavailable {
    error: Error,
}

impl Unavailable {
    pub fn new(error: Error) -> Self {
        Self { error }
    }
}

#[async_trait::async_trait]
impl ChatProvider for Unavailable {
    async fn start_chat(&self, _: StartChatParams) -> Result<Box<dyn ChatHandle>> {
        Err(self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_always_fails() {
        let provider = Unavailable::new(Error::authentication("no key"));
        let err = provider
            .start_chat(StartChatParams::default())
            .await
            .err()
            .unwrap();
        assert!(err.is_authentication());
    }
}
