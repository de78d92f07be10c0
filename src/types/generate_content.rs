use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Content, GenerationConfig, SafetyRating, SafetySetting};

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation so far, ending with the newest user turn.
    pub contents: Vec<Content>,

    /// Sampling parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,

    /// Per-category blocking thresholds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<SafetySetting>,
}

impl GenerateContentRequest {
    /// Create a request for the given contents with no extra settings.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            generation_config: None,
            safety_settings: Vec::new(),
        }
    }

    /// Set the generation config.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    /// Set the safety settings.
    pub fn with_safety_settings(mut self, settings: Vec<SafetySetting>) -> Self {
        self.safety_settings = settings;
        self
    }
}

/// Why the model stopped generating a candidate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    /// Natural stop point of the model or provided stop sequence.
    Stop,
    /// The maximum number of tokens as specified in the request was reached.
    MaxTokens,
    /// The candidate content was flagged for safety reasons.
    Safety,
    /// The candidate content was flagged for recitation reasons.
    Recitation,
    /// The candidate content was flagged for using an unsupported language.
    Language,
    /// Token generation stopped because the content contains forbidden terms.
    Blocklist,
    /// Token generation stopped for potentially containing prohibited content.
    ProhibitedContent,
    /// Token generation stopped for potentially containing personal data.
    Spii,
    /// Unknown reason.
    #[serde(other)]
    Other,
}

impl FinishReason {
    /// True when the candidate's text must not be shown.
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            FinishReason::Safety
                | FinishReason::Recitation
                | FinishReason::Language
                | FinishReason::Blocklist
                | FinishReason::ProhibitedContent
                | FinishReason::Spii
        )
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinishReason::Stop => "STOP",
            FinishReason::MaxTokens => "MAX_TOKENS",
            FinishReason::Safety => "SAFETY",
            FinishReason::Recitation => "RECITATION",
            FinishReason::Language => "LANGUAGE",
            FinishReason::Blocklist => "BLOCKLIST",
            FinishReason::ProhibitedContent => "PROHIBITED_CONTENT",
            FinishReason::Spii => "SPII",
            FinishReason::Other => "OTHER",
        };
        f.write_str(s)
    }
}

/// A response candidate generated by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content.  Absent when the candidate was blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Per-category ratings for this candidate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_ratings: Vec<SafetyRating>,

    /// Index of the candidate in the list of candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// Feedback about the prompt itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// If set, the prompt was blocked and no candidates are returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,

    /// Ratings for safety of the prompt.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_ratings: Vec<SafetyRating>,
}

/// Token accounting for a generation request.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Number of tokens in the prompt.
    #[serde(default)]
    pub prompt_token_count: u32,
    /// Total number of tokens across the generated candidates.
    #[serde(default)]
    pub candidates_token_count: u32,
    /// Total token count for the request.
    #[serde(default)]
    pub total_token_count: u32,
}

/// Response body for `generateContent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate responses from the model.
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// The prompt's feedback related to the content filters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,

    /// Token usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,

    /// The model version used to generate the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GenerateContentResponse {
    /// The content of the first candidate, if it produced any.
    pub fn first_content(&self) -> Option<&Content> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
    }

    /// Returns the reply text of the first candidate.
    ///
    /// Fails with [`Error::Blocked`] when the prompt was blocked or the first
    /// candidate was cut off by a content filter.  A response with neither
    /// candidates nor block feedback yields an empty string.
    pub fn text(&self) -> Result<String> {
        if let Some(candidate) = self.candidates.first() {
            if let Some(reason) = candidate.finish_reason
                && reason.is_blocked()
            {
                return Err(Error::blocked(
                    format!("candidate was blocked due to {reason}"),
                    reason.to_string(),
                ));
            }
            return Ok(candidate
                .content
                .as_ref()
                .map(Content::text)
                .unwrap_or_default());
        }
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return Err(Error::blocked(
                format!("prompt was blocked due to {reason}"),
                reason,
            ));
        }
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HarmBlockThreshold, HarmCategory};
    use serde_json::{json, to_value};

    #[test]
    fn request_shape() {
        let request = GenerateContentRequest::new(vec![Content::user("Hello")])
            .with_generation_config(GenerationConfig::new().with_top_k(1))
            .with_safety_settings(vec![SafetySetting::new(
                HarmCategory::HateSpeech,
                HarmBlockThreshold::BlockOnlyHigh,
            )]);
        assert_eq!(
            to_value(request).unwrap(),
            json!({
                "contents": [{"role": "user", "parts": [{"text": "Hello"}]}],
                "generationConfig": {"topK": 1},
                "safetySettings": [
                    {"category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_ONLY_HIGH"}
                ]
            })
        );
    }

    #[test]
    fn text_of_normal_response() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hi there!"}]},
                "finishReason": "STOP",
                "index": 0,
                "safetyRatings": [
                    {"category": "HARM_CATEGORY_HARASSMENT", "probability": "NEGLIGIBLE"}
                ]
            }],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 4, "totalTokenCount": 7},
            "modelVersion": "gemini-1.5-flash-002"
        }))
        .unwrap();
        assert_eq!(response.text().unwrap(), "Hi there!");
        assert_eq!(response.usage_metadata.unwrap().total_token_count, 7);
        assert_eq!(
            response.candidates[0].finish_reason,
            Some(FinishReason::Stop)
        );
    }

    #[test]
    fn text_of_blocked_prompt() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = response.text().unwrap_err();
        assert!(err.is_blocked());
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn text_of_blocked_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "RECITATION"}]
        }))
        .unwrap();
        assert!(response.text().unwrap_err().is_blocked());
        assert!(response.first_content().is_none());
    }

    #[test]
    fn max_tokens_is_not_blocked() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "partial"}]},
                "finishReason": "MAX_TOKENS"
            }]
        }))
        .unwrap();
        assert_eq!(response.text().unwrap(), "partial");
    }

    #[test]
    fn empty_response_is_empty_text() {
        let response = GenerateContentResponse::default();
        assert_eq!(response.text().unwrap(), "");
    }

    #[test]
    fn unknown_finish_reason() {
        let candidate: Candidate =
            serde_json::from_value(json!({"finishReason": "MALFORMED_FUNCTION_CALL"})).unwrap();
        assert_eq!(candidate.finish_reason, Some(FinishReason::Other));
    }
}
