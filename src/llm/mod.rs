//! Generative model access: model catalog, prompt template and the
//! Gemini `generateContent` client.

pub mod catalog;
mod client;
pub mod prompts;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use catalog::{choose_model, ModelDescriptor, GENERATE_CONTENT};
pub use client::{FinishReason, GeminiClient, GenerationSettings};
pub use prompts::build_prompt;

/// Result of a generation call that reached the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Text of the first candidate, fragments joined with `\n`.
    Complete(String),
    /// Generation stopped at the output token ceiling.
    Truncated,
    /// The provider returned no usable candidate.
    Empty,
}

/// Errors from provider calls.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Listing models failed.
    #[error("failed to list models{}: {message}", StatusSuffix(.status))]
    Catalog { status: Option<u16>, message: String },
    /// The generation call did not complete.
    #[error("generateContent failed{}: {detail}", StatusSuffix(.status))]
    Transport { status: Option<u16>, detail: String },
}

/// Formats `Some(404)` as ` (HTTP 404)` and `None` as nothing.
struct StatusSuffix<'a>(&'a Option<u16>);

impl fmt::Display for StatusSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(status) => write!(f, " (HTTP {})", status),
            None => Ok(()),
        }
    }
}

/// A generative model provider.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// List the models available to `credential`.
    async fn list_models(&self, credential: &str) -> Result<Vec<ModelDescriptor>, LlmError>;

    /// Generate a response for `prompt` with `model_id`.
    async fn generate(
        &self,
        credential: &str,
        model_id: &str,
        prompt: &str,
    ) -> Result<GenerationOutcome, LlmError>;
}
