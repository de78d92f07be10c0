//! The support chat view.
//!
//! This module turns a [`ChatProvider`](crate::provider::ChatProvider) into an
//! interactive conversation with the support agent.  The view opens one
//! session at startup, greets the user, and sends each submitted message as
//! a single exchange whose reply is appended to the transcript.
//!
//! # Architecture
//!
//! - [`controller`]: the view state machine (transcript, input, session slot)
//! - [`exchange`]: session start and message round-trips, with timeout and
//!   cancellation
//! - [`render`]: transcript to display rows, shared by both front-ends
//! - [`tui`]: full-screen front-end
//! - [`plain`]: line-oriented front-end output
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing
//! - [`theme`]: light and dark palettes

pub mod commands;
pub mod config;
pub mod controller;
pub mod exchange;
pub mod plain;
pub mod render;
pub mod theme;
pub mod transcript;
pub mod tui;

pub use commands::{ChatCommand, LineInput, classify_line, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use controller::{
    ChatController, ErrorKind, ExchangeStats, GREETING, INIT_FAILED, SEND_FAILED, SessionStatus,
    Submission, ViewError,
};
pub use exchange::{Exchange, ExchangeOutcome, start_session};
pub use plain::PlainPrinter;
pub use render::{Alignment, LOADING_MARKER, Row, RowKind, TranscriptRenderer, bubble_width};
pub use theme::{Palette, Theme};
pub use transcript::{Message, Role, Transcript};
pub use tui::{App, AppEvent, run_tui};
