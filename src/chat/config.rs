//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the binary runs with.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::chat::controller::GREETING;
use crate::chat::theme::Theme;
use crate::error::Error;
use crate::session::StartChatParams;
use crate::types::{GenerationConfig, KnownModel, Model, SafetySetting};

/// Default timeout for each request, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Command-line arguments for the supportchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-1.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// Maximum output tokens per reply.
    #[arrrg(optional, "Max output tokens per reply (default: 2048)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Seconds to wait for the session or a reply; 0 waits forever.
    #[arrrg(optional, "Seconds to wait for a reply, 0 for no limit (default: 60)", "SECS")]
    pub timeout: Option<u64>,

    /// Initial color theme.
    #[arrrg(optional, "Color theme: light or dark (default: light)", "THEME")]
    pub theme: Option<String>,

    /// Override the API base URL.
    #[arrrg(optional, "API base URL (default: Gemini v1beta)", "URL")]
    pub api_base: Option<String>,

    /// Write logs to this file.
    #[arrrg(optional, "Write logs to FILE (full-screen mode logs nowhere else)", "FILE")]
    pub log_file: Option<String>,

    /// Use the line-oriented interface instead of the full-screen one.
    #[arrrg(flag, "Line-oriented interface for simple terminals")]
    pub plain: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles in plain mode")]
    pub no_color: bool,
}

/// Configuration for a chat run.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The model serving the session.
    pub model: Model,

    /// Sampling parameters.
    pub generation_config: GenerationConfig,

    /// Content filters.
    pub safety_settings: Vec<SafetySetting>,

    /// The bot's first message.
    pub greeting: String,

    /// Deadline for session creation and for each reply.
    pub request_timeout: Option<Duration>,

    /// Initial theme.
    pub theme: Theme,

    /// Whether plain mode uses ANSI colors and styles.
    pub use_color: bool,

    /// Whether to use the line-oriented interface.
    pub plain: bool,

    /// API base URL override.
    pub api_base: Option<String>,

    /// Log destination.
    pub log_file: Option<PathBuf>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-1.5-flash
    /// - Temperature 0.9, top-k 1, top-p 1, 2048 output tokens
    /// - Every harm category blocked at medium and above
    /// - Timeout: 60 seconds
    /// - Full-screen, light theme, color enabled
    pub fn new() -> Self {
        let params = StartChatParams::default();
        Self {
            model: params.model,
            generation_config: params.generation_config,
            safety_settings: params.safety_settings,
            greeting: GREETING.to_string(),
            request_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            theme: Theme::default(),
            use_color: true,
            plain: false,
            api_base: None,
            log_file: None,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the maximum output tokens per reply.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.generation_config.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Sets the request timeout.  `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the initial theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Sets the greeting.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// The parameters the session is created with.
    pub fn start_params(&self) -> StartChatParams {
        StartChatParams::new(self.model.clone())
            .with_generation_config(self.generation_config.clone())
            .with_safety_settings(self.safety_settings.clone())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self, Error> {
        let model = args
            .model
            .map(|s| s.parse::<Model>().unwrap_or(Model::Custom(s)))
            .unwrap_or(Model::Known(KnownModel::Gemini15Flash));

        let theme = match args.theme {
            Some(theme) => theme
                .parse::<Theme>()
                .map_err(|err| Error::validation(err, Some("theme".to_string())))?,
            None => Theme::default(),
        };

        if args.max_tokens == Some(0) {
            return Err(Error::validation(
                "max tokens must be positive",
                Some("max-tokens".to_string()),
            ));
        }

        let request_timeout = match args.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let mut config = ChatConfig {
            model,
            request_timeout,
            theme,
            use_color: !args.no_color,
            plain: args.plain,
            api_base: args.api_base,
            log_file: args.log_file.map(PathBuf::from),
            ..ChatConfig::new()
        };
        if let Some(max_tokens) = args.max_tokens {
            config = config.with_max_output_tokens(max_tokens);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HarmBlockThreshold;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini15Flash));
        assert_eq!(config.generation_config.temperature, Some(0.9));
        assert_eq!(config.generation_config.max_output_tokens, Some(2048));
        assert_eq!(config.safety_settings.len(), 4);
        assert!(
            config
                .safety_settings
                .iter()
                .all(|s| s.threshold == HarmBlockThreshold::BlockMediumAndAbove)
        );
        assert_eq!(config.greeting, GREETING);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.theme, Theme::Light);
        assert!(config.use_color);
        assert!(!config.plain);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::try_from(ChatArgs::default()).unwrap();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini15Flash));
        assert_eq!(config.generation_config.max_output_tokens, Some(2048));
        assert!(config.api_base.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("gemini-2.0-flash".to_string()),
            max_tokens: Some(512),
            timeout: Some(0),
            theme: Some("dark".to_string()),
            api_base: Some("http://localhost:9999/v1beta/".to_string()),
            log_file: Some("chat.log".to_string()),
            plain: true,
            no_color: true,
        };
        let config = ChatConfig::try_from(args).unwrap();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini20Flash));
        assert_eq!(config.generation_config.max_output_tokens, Some(512));
        assert_eq!(config.generation_config.top_k, Some(1));
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.log_file, Some(PathBuf::from("chat.log")));
        assert!(config.plain);
        assert!(!config.use_color);
    }

    #[test]
    fn unknown_model_is_custom() {
        let args = ChatArgs {
            model: Some("tunedModels/helpdesk-v2".to_string()),
            ..ChatArgs::default()
        };
        let config = ChatConfig::try_from(args).unwrap();
        assert_eq!(
            config.model,
            Model::Custom("tunedModels/helpdesk-v2".to_string())
        );
    }

    #[test]
    fn invalid_args() {
        let args = ChatArgs {
            theme: Some("neon".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).unwrap_err().is_validation());

        let args = ChatArgs {
            max_tokens: Some(0),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).unwrap_err().is_validation());
    }

    #[test]
    fn start_params_carry_settings() {
        let config = ChatConfig::new().with_max_output_tokens(100);
        let params = config.start_params();
        assert_eq!(params.generation_config.max_output_tokens, Some(100));
        assert_eq!(params.safety_settings, config.safety_settings);
        assert!(params.history.is_empty());
    }
}
