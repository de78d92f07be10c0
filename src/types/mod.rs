// Public modules
pub mod content;
pub mod generate_content;
pub mod generation_config;
pub mod model;
pub mod model_info;
pub mod safety;

// Re-exports
pub use content::{Content, ContentRole, Part};
pub use generate_content::{
    Candidate, FinishReason, GenerateContentRequest, GenerateContentResponse, PromptFeedback,
    UsageMetadata,
};
pub use generation_config::GenerationConfig;
pub use model::{KnownModel, Model, ModelParseError};
pub use model_info::ModelInfo;
pub use safety::{HarmBlockThreshold, HarmCategory, HarmProbability, SafetyRating, SafetySetting};
