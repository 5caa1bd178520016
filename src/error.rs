//! Request-level error taxonomy.

use thiserror::Error;

use crate::analysis::MalformedResponse;
use crate::extract::ExtractError;
use crate::llm::LlmError;

/// Everything that can end an analysis request. None of these are retried.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No provider API key is configured.
    #[error("API key not configured; set GEMINI_API_KEY or GOOGLE_API_KEY")]
    Configuration,

    /// The uploaded file could not be read or parsed.
    #[error("failed to extract document text: {0}")]
    Extraction(#[from] ExtractError),

    /// Listing models failed or returned no models at all.
    #[error("{0}")]
    Catalog(LlmError),

    /// The catalog listed no model that supports content generation.
    #[error("no model available with generateContent support")]
    NoModelAvailable,

    /// The generation call failed.
    #[error("{0}")]
    Transport(LlmError),

    /// The model hit the output token ceiling; raise `max_output_tokens`.
    #[error("model output exceeded the output token limit; the analysis was truncated")]
    OutputTruncated,

    /// The model answered without any usable candidate.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The model output is not a valid analysis.
    #[error("model did not return valid analysis JSON")]
    MalformedResponse { raw: String },
}

impl AnalysisError {
    /// Stable machine-readable category.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Extraction(_) => "extraction",
            Self::Catalog(_) => "catalog",
            Self::NoModelAvailable => "no_model_available",
            Self::Transport(_) => "transport",
            Self::OutputTruncated => "output_truncated",
            Self::EmptyResponse => "empty_response",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }

    /// Raw model output, for malformed responses.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Self::MalformedResponse { raw } => Some(raw),
            _ => None,
        }
    }
}

impl From<LlmError> for AnalysisError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Catalog { .. } => Self::Catalog(err),
            LlmError::Transport { .. } => Self::Transport(err),
        }
    }
}

impl From<MalformedResponse> for AnalysisError {
    fn from(err: MalformedResponse) -> Self {
        Self::MalformedResponse { raw: err.raw }
    }
}
