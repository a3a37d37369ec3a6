//! AI assistant
//!
//! Recipe generation and nutrition chat backed by Google Gemini, with
//! deterministic fallbacks when no API key is configured or a call fails.

pub mod chat;
pub mod gemini;
pub mod prompts;
pub mod recipes;

use thiserror::Error;

pub use chat::{reply, ChatReply};
pub use gemini::GeminiClient;
pub use recipes::{generate_recipe, mock_recipe, GeneratedRecipe, RecipeRequest};

/// Assistant error types
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("No content in Gemini response")]
    EmptyResponse,

    #[error("Failed to parse model output: {0}")]
    Parse(String),
}

// Request URLs stay out of error text and logs
impl From<reqwest::Error> for AssistantError {
    fn from(e: reqwest::Error) -> Self {
        AssistantError::Http(e.without_url())
    }
}

/// Where an assistant answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Gemini,
    /// No API key configured
    Mock,
    /// The API call or the parse failed
    Fallback,
}

/// A blocking text completion backend.
///
/// Implementations block the calling thread; async callers go through
/// `tokio::task::spawn_blocking`.
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`, optionally steered by a system instruction
    fn generate(&self, system: Option<&str>, prompt: &str) -> Result<String, AssistantError>;
}
