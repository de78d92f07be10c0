//! The state behind the chat view.
//!
//! [`ChatController`] owns the transcript, the pending input, the session
//! handle and the last error.  Front-ends feed it events (session started,
//! submit pressed, reply arrived) and render whatever it holds afterwards;
//! nothing else mutates chat state.

use std::fmt;

use time::OffsetDateTime;

use crate::chat::exchange::{Exchange, ExchangeOutcome};
use crate::chat::transcript::{Message, Role, Transcript};
use crate::error::{Error, Result};
use crate::observability::{EXCHANGE_ERRORS, EXCHANGES, EXCHANGES_REJECTED};
use crate::provider::ChatHandle;

/// The bot's opening line once the session is up.
pub const GREETING: &str = "Hi, I'm the Headstarter Support Agent. How can I assist you today?";

/// Shown when the session could not be opened.
pub const INIT_FAILED: &str = "Failed to initialize chat. Please try again.";

/// Shown when a message could not be answered.
pub const SEND_FAILED: &str = "Failed to send message. Please try again.";

/// Which operation produced a [`ViewError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    SessionStart,
    Send,
}

/// A failure surfaced to the user.
#[derive(Debug, Clone)]
pub struct ViewError {
    kind: ErrorKind,
    cause: Error,
}

impl ViewError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The generic text shown in the view.
    pub fn message(&self) -> &'static str {
        match self.kind {
            ErrorKind::SessionStart => INIT_FAILED,
            ErrorKind::Send => SEND_FAILED,
        }
    }

    /// The underlying error, for logs and statistics.
    pub fn cause(&self) -> &Error {
        &self.cause
    }
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Where the session handle currently is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Session creation has not settled yet.
    Starting,
    /// The handle is idle and ready for a message.
    Ready,
    /// The handle is lent to an in-flight exchange.
    Busy,
    /// Session creation failed; no replies will come.
    Failed,
}

enum SessionSlot {
    Starting,
    Ready(Box<dyn ChatHandle>),
    Lent,
    Failed,
}

impl SessionSlot {
    fn status(&self) -> SessionStatus {
        match self {
            SessionSlot::Starting => SessionStatus::Starting,
            SessionSlot::Ready(_) => SessionStatus::Ready,
            SessionSlot::Lent => SessionStatus::Busy,
            SessionSlot::Failed => SessionStatus::Failed,
        }
    }
}

/// What happened to a submission.
#[derive(Debug)]
pub enum Submission {
    /// The user message was recorded and must now be run to get a reply.
    Dispatched(Exchange),
    /// The user message was recorded but there is no session to answer it.
    NoSession,
    /// Another exchange is in flight; nothing was recorded.
    Busy,
}

/// Counters for the `/stats` view.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ExchangeStats {
    /// Exchanges handed to the session.
    pub dispatched: u64,
    /// Exchanges that produced a reply.
    pub answered: u64,
    /// Exchanges that failed, timed out or were cancelled.
    pub failed: u64,
    /// Submissions refused because an exchange was in flight.
    pub rejected: u64,
    /// Submissions recorded while no session existed.
    pub unanswered: u64,
}

/// The chat view's state machine.
pub struct ChatController {
    transcript: Transcript,
    input: String,
    session: SessionSlot,
    greeting: String,
    last_error: Option<ViewError>,
    stats: ExchangeStats,
}

impl ChatController {
    /// Creates a controller waiting for its session, with the default greeting.
    pub fn new() -> Self {
        Self::with_greeting(GREETING)
    }

    /// Creates a controller that seeds the transcript with `greeting`.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::new(),
            input: String::new(),
            session: SessionSlot::Starting,
            greeting: greeting.into(),
            last_error: None,
            stats: ExchangeStats::default(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The text currently in the input box.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replaces the pending input.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn push_input(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_input(&mut self) {
        self.input.pop();
    }

    /// True strictly while an exchange is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self.session, SessionSlot::Lent)
    }

    pub fn session_status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn last_error(&self) -> Option<&ViewError> {
        self.last_error.as_ref()
    }

    pub fn stats(&self) -> ExchangeStats {
        self.stats
    }

    /// Number of turns the session has recorded, if it is idle.
    pub fn session_history_len(&self) -> Option<usize> {
        match &self.session {
            SessionSlot::Ready(handle) => Some(handle.history().len()),
            _ => None,
        }
    }

    /// Records the settled session creation.
    ///
    /// On success the handle is stored and the transcript is seeded with the
    /// greeting stamped `at`.  On failure the error is recorded and the
    /// transcript is left empty.  Only the first call has any effect.
    pub fn on_session_started(&mut self, result: Result<Box<dyn ChatHandle>>, at: OffsetDateTime) {
        if !matches!(self.session, SessionSlot::Starting) {
            tracing::warn!("ignoring session start result: session already settled");
            return;
        }
        match result {
            Ok(handle) => {
                tracing::info!("chat session ready");
                self.session = SessionSlot::Ready(handle);
                self.transcript.seed(Message::bot(self.greeting.clone(), at));
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat session failed to start");
                self.session = SessionSlot::Failed;
                self.last_error = Some(ViewError {
                    kind: ErrorKind::SessionStart,
                    cause: err,
                });
            }
        }
    }

    /// Submits the pending input.
    ///
    /// The user message is appended immediately, before any reply, and the
    /// input is cleared.  When the session is idle the handle is lent to the
    /// returned [`Exchange`], which the caller must run and feed back through
    /// [`ChatController::on_exchange_settled`].  While an exchange is in
    /// flight the submission is refused and the input is kept.
    pub fn submit(&mut self, at: OffsetDateTime) -> Submission {
        if self.is_loading() {
            tracing::info!("submission rejected: exchange in flight");
            self.stats.rejected += 1;
            EXCHANGES_REJECTED.click();
            return Submission::Busy;
        }

        let text = std::mem::take(&mut self.input);
        self.transcript.push(Message::user(text.clone(), at));

        match std::mem::replace(&mut self.session, SessionSlot::Lent) {
            SessionSlot::Ready(handle) => {
                tracing::debug!(chars = text.chars().count(), "exchange dispatched");
                self.last_error = None;
                self.stats.dispatched += 1;
                EXCHANGES.click();
                Submission::Dispatched(Exchange::new(handle, text))
            }
            other => {
                tracing::debug!("no session; message will not be answered");
                self.session = other;
                self.stats.unanswered += 1;
                Submission::NoSession
            }
        }
    }

    /// Convenience for front-ends that collect a whole line at once.
    ///
    /// `text` replaces the input buffer, so a `Busy` rejection keeps it there
    /// just as [`submit`](Self::submit) does.
    pub fn submit_text(&mut self, text: impl Into<String>, at: OffsetDateTime) -> Submission {
        self.input = text.into();
        self.submit(at)
    }

    /// Records the settled exchange and takes the session handle back.
    ///
    /// A reply is appended as a bot message stamped `at`; a failure records
    /// the error and leaves the user's message in place.
    pub fn on_exchange_settled(&mut self, outcome: ExchangeOutcome, at: OffsetDateTime) {
        let elapsed = outcome.elapsed();
        let (handle, result) = outcome.into_parts();
        self.session = SessionSlot::Ready(handle);
        match result {
            Ok(reply) => {
                tracing::debug!(?elapsed, "exchange answered");
                self.stats.answered += 1;
                self.transcript.push(Message::bot(reply, at));
            }
            Err(err) => {
                tracing::warn!(?elapsed, error = %err, "exchange failed");
                self.stats.failed += 1;
                EXCHANGE_ERRORS.click();
                self.last_error = Some(ViewError {
                    kind: ErrorKind::Send,
                    cause: err,
                });
            }
        }
    }

    /// Number of messages from `role`.
    pub fn count(&self, role: Role) -> usize {
        self.transcript.count(role)
    }
}

impl Default for ChatController {
    fn default() -> Self {
        Self::new()
    }
}
