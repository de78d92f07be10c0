// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod provider;
pub mod session;
pub mod types;

// Re-exports
pub use client::{API_KEY_ENV, Gemini};
pub use client_logger::{ClientLogger, TracingClientLogger};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use provider::{ChatHandle, ChatProvider, Unavailable};
pub use session::{GeminiChat, StartChatParams};
pub use types::*;
