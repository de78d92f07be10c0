//! Error types for the support chat client.
//!
//! Every fallible operation in the crate (HTTP calls to the Gemini API,
//! session start, message exchange) reports one of these errors.  The chat
//! view collapses them into a generic user-visible string, but keeps the
//! original error around for logs and statistics.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// A shareable underlying cause.
type Source = Arc<dyn error::Error + Send + Sync>;

/// The main error type for the support chat client.
///
/// Variants that wrap another error keep it behind an `Arc` so the whole
/// enum stays `Clone`; the chat view stores the last failure and the
/// provider used when the client cannot be built hands out copies.
#[derive(Clone, Debug)]
pub enum Error {
    /// The API answered with a status that has no dedicated variant.
    ///
    /// `status` is Google's canonical code, e.g. `FAILED_PRECONDITION`.
    Api {
        status_code: u16,
        status: Option<String>,
        message: String,
    },

    /// The API key is missing, empty, or was rejected (`API_KEY_INVALID`).
    Authentication { message: String },

    /// The key is valid but may not use this model or project.
    Permission { message: String },

    /// Usually an unknown model name.
    NotFound {
        message: String,
        resource: Option<String>,
    },

    /// Quota exhausted (HTTP 429, `RESOURCE_EXHAUSTED`).
    RateLimit {
        message: String,
        /// Seconds to wait, from the `retry-after` header.
        retry_after: Option<u64>,
    },

    /// The request was malformed (`INVALID_ARGUMENT`).
    BadRequest { message: String },

    /// No answer before the deadline.
    Timeout {
        message: String,
        /// The deadline in seconds.
        duration: Option<f64>,
    },

    /// The user or the application cancelled the operation.
    Abort { message: String },

    /// The connection could not be established or was dropped.
    Connection {
        message: String,
        source: Option<Source>,
    },

    /// HTTP 500.
    InternalServer { message: String },

    /// HTTP 503 or another overloaded-server response.
    ServiceUnavailable {
        message: String,
        retry_after: Option<u64>,
    },

    /// The provider withheld the prompt or the reply because of its safety
    /// settings.  `reason` is the block or finish reason, e.g. `SAFETY`.
    Blocked { message: String, reason: String },

    /// A body could not be encoded or decoded.
    Serialization {
        message: String,
        source: Option<Source>,
    },

    Io {
        message: String,
        source: Arc<io::Error>,
    },

    /// The HTTP client failed outside of connecting, e.g. while building.
    HttpClient {
        message: String,
        source: Option<Source>,
    },

    /// A configuration value or request parameter is out of range.
    Validation {
        message: String,
        param: Option<String>,
    },

    Url {
        message: String,
        source: Option<url::ParseError>,
    },

    Unknown { message: String },
}

impl Error {
    pub fn api(status_code: u16, status: Option<String>, message: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            status,
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Error::Permission {
            message: message.into(),
        }
    }

    /// Creates a not-found error, naming the missing resource when known.
    pub fn not_found(message: impl Into<String>, resource: Option<String>) -> Self {
        Error::NotFound {
            message: message.into(),
            resource,
        }
    }

    pub fn rate_limit(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a timeout error for a deadline of `duration` seconds.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    pub fn abort(message: impl Into<String>) -> Self {
        Error::Abort {
            message: message.into(),
        }
    }

    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Source::from),
        }
    }

    pub fn internal_server(message: impl Into<String>) -> Self {
        Error::InternalServer {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::ServiceUnavailable {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates an error for content withheld for `reason`.
    pub fn blocked(message: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Blocked {
            message: message.into(),
            reason: reason.into(),
        }
    }

    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Source::from),
        }
    }

    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Source::from),
        }
    }

    /// Creates a validation error for the named parameter.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Error::Unknown {
            message: message.into(),
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, Error::Permission { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimit { .. })
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(self, Error::BadRequest { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Abort { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// True if the provider blocked the prompt or the reply.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Error::Blocked { .. })
    }

    /// True for 5xx responses.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Error::InternalServer { .. } | Error::ServiceUnavailable { .. }
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// The HTTP status of an otherwise unclassified API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Seconds the server asked us to wait before trying again.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Error::RateLimit { retry_after, .. } | Error::ServiceUnavailable { retry_after, .. } => {
                *retry_after
            }
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                status_code,
                status: Some(status),
                message,
            } => write!(f, "{status} ({status_code}): {message}"),
            Error::Api {
                status_code,
                status: None,
                message,
            } => write!(f, "Gemini API error ({status_code}): {message}"),
            Error::Authentication { message } => write!(f, "Authentication failed: {message}"),
            Error::Permission { message } => write!(f, "Permission denied: {message}"),
            Error::NotFound {
                message,
                resource: Some(resource),
            } => write!(f, "Not found ({resource}): {message}"),
            Error::NotFound {
                message,
                resource: None,
            } => write!(f, "Not found: {message}"),
            Error::RateLimit {
                message,
                retry_after,
            } => {
                write!(f, "Quota exceeded: {message}")?;
                write_retry_after(f, *retry_after)
            }
            Error::BadRequest { message } => write!(f, "Invalid request: {message}"),
            Error::Timeout {
                message,
                duration: Some(duration),
            } => write!(f, "Timed out after {duration}s: {message}"),
            Error::Timeout {
                message,
                duration: None,
            } => write!(f, "Timed out: {message}"),
            Error::Abort { message } => write!(f, "Cancelled: {message}"),
            Error::Connection { message, .. } => write!(f, "Connection error: {message}"),
            Error::InternalServer { message } => write!(f, "Gemini internal error: {message}"),
            Error::ServiceUnavailable {
                message,
                retry_after,
            } => {
                write!(f, "Gemini unavailable: {message}")?;
                write_retry_after(f, *retry_after)
            }
            Error::Blocked { message, reason } => write!(f, "Blocked ({reason}): {message}"),
            Error::Serialization { message, .. } => write!(f, "Serialization error: {message}"),
            Error::Io { message, .. } => write!(f, "I/O error: {message}"),
            Error::HttpClient { message, .. } => write!(f, "HTTP client error: {message}"),
            Error::Validation {
                message,
                param: Some(param),
            } => write!(f, "Invalid {param}: {message}"),
            Error::Validation {
                message,
                param: None,
            } => write!(f, "Invalid configuration: {message}"),
            Error::Url { message, .. } => write!(f, "URL error: {message}"),
            Error::Unknown { message } => write!(f, "Unknown error: {message}"),
        }
    }
}

fn write_retry_after(f: &mut fmt::Formatter<'_>, retry_after: Option<u64>) -> fmt::Result {
    match retry_after {
        Some(secs) => write!(f, " (retry after {secs}s)"),
        None => Ok(()),
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. }
            | Error::Serialization { source, .. }
            | Error::HttpClient { source, .. } => source
                .as_deref()
                .map(|e| e as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source.as_ref()),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("invalid JSON: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("cannot parse URL: {err}"), Some(err))
    }
}

/// A specialized Result type for support chat operations.
pub type Result<T> = std::result::Result<T, Error>;
