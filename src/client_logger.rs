//! Logging trait for Gemini client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`Gemini`](crate::Gemini)
//! client, plus a [`TracingClientLogger`] that forwards them to `tracing`.

use crate::{GenerateContentRequest, GenerateContentResponse, Model};

/// A trait for logging Gemini client operations.
///
/// Implement this trait to capture and record every generation request and
/// the response it produced.
///
/// # Example
///
/// ```rust,ignore
/// use supportchat::{ClientLogger, GenerateContentRequest, GenerateContentResponse, Model};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, model: &Model, request: &GenerateContentRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "{model} <- {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
///
///     fn log_response(&self, model: &Model, response: &GenerateContentResponse) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "{model} -> {}", serde_json::to_string(response).unwrap()).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, model: &Model, request: &GenerateContentRequest);

    /// Log a successfully parsed response.
    ///
    /// Called once per successful `generate_content` call, including
    /// responses whose content was blocked.
    fn log_response(&self, model: &Model, response: &GenerateContentResponse);
}

/// Forwards client traffic to `tracing` at debug level.
///
/// Message text is not logged, only its shape and token accounting.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingClientLogger;

impl ClientLogger for TracingClientLogger {
    fn log_request(&self, model: &Model, request: &GenerateContentRequest) {
        tracing::debug!(
            model = %model,
            turns = request.contents.len(),
            safety_settings = request.safety_settings.len(),
            "generateContent request"
        );
    }

    fn log_response(&self, model: &Model, response: &GenerateContentResponse) {
        let usage = response.usage_metadata.unwrap_or_default();
        tracing::debug!(
            model = %model,
            candidates = response.candidates.len(),
            finish_reason = ?response.candidates.first().and_then(|c| c.finish_reason),
            prompt_tokens = usage.prompt_token_count,
            output_tokens = usage.candidates_token_count,
            "generateContent response"
        );
    }
}
