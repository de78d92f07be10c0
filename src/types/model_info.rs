use serde::{Deserialize, Serialize};

/// Information about a specific model.
///
/// Returned by `GET models/{model}`.  The chat client fetches it once when a
/// session starts, which doubles as a check that the key and model are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-1.5-flash`.
    pub name: String,

    /// Major version of the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// A human-readable name for the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Maximum number of input tokens allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_token_limit: Option<u32>,

    /// Maximum number of output tokens available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_token_limit: Option<u32>,

    /// API methods the model supports, e.g. `generateContent`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// True if the model can serve `generateContent` requests.
    ///
    /// An empty method list is treated as unknown and therefore allowed.
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods.is_empty()
            || self
                .supported_generation_methods
                .iter()
                .any(|method| method == "generateContent")
    }
}
