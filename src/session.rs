//! Remote chat sessions.
//!
//! The Gemini API is stateless: every `generateContent` call carries the
//! whole conversation.  [`GeminiChat`] is the session handle that owns that
//! history and replays it on every message, which is what gives the model a
//! memory of earlier turns.

use crate::client::Gemini;
use crate::error::Result;
use crate::observability::CLIENT_RESPONSES_BLOCKED;
use crate::types::{
    Content, GenerateContentRequest, GenerationConfig, HarmBlockThreshold, KnownModel, Model,
    ModelInfo, SafetySetting, UsageMetadata,
};

/// Parameters fixed at session creation.
#[derive(Debug, Clone, PartialEq)]
pub struct StartChatParams {
    /// The model serving the session.
    pub model: Model,
    /// Sampling parameters for every turn.
    pub generation_config: GenerationConfig,
    /// Content filters for every turn.
    pub safety_settings: Vec<SafetySetting>,
    /// Turns to seed the conversation with.
    pub history: Vec<Content>,
}

impl StartChatParams {
    /// Creates parameters for a model with no settings and no history.
    pub fn new(model: Model) -> Self {
        Self {
            model,
            generation_config: GenerationConfig::default(),
            safety_settings: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Set the generation config.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }

    /// Set the safety settings.
    pub fn with_safety_settings(mut self, settings: Vec<SafetySetting>) -> Self {
        self.safety_settings = settings;
        self
    }

    /// Seed the conversation with prior turns.
    pub fn with_history(mut self, history: Vec<Content>) -> Self {
        self.history = history;
        self
    }
}

impl Default for StartChatParams {
    /// The support agent's settings: Gemini 1.5 Flash, temperature 0.9,
    /// top-k 1, top-p 1, 2048 output tokens, and every harm category blocked
    /// at medium and above.
    fn default() -> Self {
        StartChatParams::new(Model::Known(KnownModel::Gemini15Flash))
            .with_generation_config(
                GenerationConfig::new()
                    .with_temperature(0.9)
                    .with_top_k(1)
                    .with_top_p(1.0)
                    .with_max_output_tokens(2048),
            )
            .with_safety_settings(SafetySetting::all(HarmBlockThreshold::BlockMediumAndAbove))
    }
}

/// A conversation with a Gemini model.
#[derive(Debug, Clone)]
pub struct GeminiChat {
    client: Gemini,
    params: StartChatParams,
    model_info: Option<ModelInfo>,
    last_usage: Option<UsageMetadata>,
}

impl GeminiChat {
    pub(crate) fn new(client: Gemini, params: StartChatParams, model_info: Option<ModelInfo>) -> Self {
        Self {
            client,
            params,
            model_info,
            last_usage: None,
        }
    }

    /// The model serving this session.
    pub fn model(&self) -> &Model {
        &self.params.model
    }

    /// Metadata fetched when the session started.
    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.model_info.as_ref()
    }

    /// Every turn exchanged so far, oldest first.
    pub fn history(&self) -> &[Content] {
        &self.params.history
    }

    /// Token usage reported for the most recent turn.
    pub fn last_usage(&self) -> Option<UsageMetadata> {
        self.last_usage
    }

    /// Sends a user message and returns the model's reply text.
    ///
    /// History grows by the user turn and the model turn only when the model
    /// produced content that was not blocked; a failed request leaves it
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply was blocked.
    pub async fn send_message(&mut self, text: &str) -> Result<String> {
        let user = Content::user(text);
        let mut contents = self.params.history.clone();
        contents.push(user.clone());

        let request = GenerateContentRequest::new(contents)
            .with_generation_config(self.params.generation_config.clone())
            .with_safety_settings(self.params.safety_settings.clone());

        let response = self
            .client
            .generate_content(&self.params.model, &request)
            .await?;
        self.last_usage = response.usage_metadata;

        let text = response.text().inspect_err(|err| {
            if err.is_blocked() {
                CLIENT_RESPONSES_BLOCKED.click();
            }
        })?;
        if let Some(content) = response.first_content()
            && !content.parts.is_empty()
        {
            let mut reply = content.clone();
            reply.role = Some(crate::types::ContentRole::Model);
            self.params.history.push(user);
            self.params.history.push(reply);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HarmCategory;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned JSON body per connection, in order, and returns the
    /// base URL to point a client at.
    async fn canned_server(bodies: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for body in bodies {
                let (mut stream, _) = listener.accept().await.unwrap();
                read_request(&mut stream).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
        });
        format!("http://{addr}/v1beta/")
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return;
            }
        }
    }

    fn chat_against(base: String) -> GeminiChat {
        let client = Gemini::with_options(Some("k".to_string()), Some(base), None).unwrap();
        GeminiChat::new(client, StartChatParams::default(), None)
    }

    #[test]
    fn default_params_match_support_agent() {
        let params = StartChatParams::default();
        assert_eq!(params.model, Model::Known(KnownModel::Gemini15Flash));
        assert_eq!(params.generation_config.temperature, Some(0.9));
        assert_eq!(params.generation_config.top_k, Some(1));
        assert_eq!(params.generation_config.top_p, Some(1.0));
        assert_eq!(params.generation_config.max_output_tokens, Some(2048));
        assert_eq!(params.safety_settings.len(), 4);
        assert!(
            params
                .safety_settings
                .iter()
                .all(|s| s.threshold == HarmBlockThreshold::BlockMediumAndAbove)
        );
        assert!(
            params
                .safety_settings
                .iter()
                .any(|s| s.category == HarmCategory::DangerousContent)
        );
        assert!(params.history.is_empty());
    }

    #[test]
    fn new_chat_keeps_seed_history() {
        let client = Gemini::new(Some("k".to_string())).unwrap();
        let params = StartChatParams::default()
            .with_history(vec![Content::user("hi"), Content::model("hello")]);
        let chat = GeminiChat::new(client, params, None);
        assert_eq!(chat.history().len(), 2);
        assert!(chat.model_info().is_none());
        assert!(chat.last_usage().is_none());
    }

    #[tokio::test]
    async fn reply_is_recorded_in_history() {
        let base = canned_server(vec![
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hi there!"}]},"finishReason":"STOP"}]}"#,
        ])
        .await;
        let mut chat = chat_against(base);
        let reply = chat.send_message("Hello").await.unwrap();
        assert_eq!(reply, "Hi there!");
        assert_eq!(
            chat.history(),
            &[Content::user("Hello"), Content::model("Hi there!")]
        );
    }

    #[tokio::test]
    async fn blocked_reply_stays_out_of_history() {
        let base = canned_server(vec![
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"partial unsafe"}]},"finishReason":"SAFETY"}]}"#,
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"fine"}]},"finishReason":"STOP"}]}"#,
        ])
        .await;
        let mut chat = chat_against(base);
        let err = chat.send_message("tell me something bad").await.unwrap_err();
        assert!(err.is_blocked());
        assert!(chat.history().is_empty());

        assert_eq!(chat.send_message("never mind").await.unwrap(), "fine");
        assert_eq!(chat.history().len(), 2);
        assert_eq!(chat.history()[0], Content::user("never mind"));
    }
}
