//! Document-to-analysis pipeline.
//!
//! One call to [`Analyzer::analyze`] handles one upload: extract, bound,
//! prompt, resolve a model, generate, normalize. The upload is deleted when
//! the call returns, whatever the outcome.

mod artifact;

use tracing::{error, info, Instrument};

use crate::analysis::{normalize, truncate, AnalysisResult};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::extract::{extract_text, ExtractError, ExtractedContent};
use crate::llm::{
    build_prompt, choose_model, GeminiClient, GenerationOutcome, LlmError, ModelDescriptor,
    ModelProvider,
};

pub use artifact::{stored_file_name, UploadedArtifact};

/// Runs analyses against a model provider.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct Analyzer {
    config: AnalyzerConfig,
    credential: String,
    provider: Box<dyn ModelProvider>,
}

impl Analyzer {
    /// Build an analyzer that talks to the Gemini API.
    pub fn from_config(config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        let client = GeminiClient::new(
            config.endpoint.clone(),
            config.generation_settings(),
            config.request_timeout(),
        )
        .map_err(|e| LlmError::Transport {
            status: None,
            detail: format!("failed to create HTTP client: {}", e),
        })?;

        Self::with_provider(config, Box::new(client))
    }

    /// Build an analyzer over any provider. Fails if no API key is configured.
    pub fn with_provider(
        config: AnalyzerConfig,
        provider: Box<dyn ModelProvider>,
    ) -> Result<Self, AnalysisError> {
        let credential = config.credential()?.to_string();
        Ok(Self {
            config,
            credential,
            provider,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Fetch the provider's current model catalog.
    pub async fn catalog(&self) -> Result<Vec<ModelDescriptor>, AnalysisError> {
        Ok(self.provider.list_models(&self.credential).await?)
    }

    /// Analyze an uploaded file. Consumes the artifact, which deletes it.
    pub async fn analyze(&self, artifact: UploadedArtifact) -> Result<AnalysisResult, AnalysisError> {
        let span = tracing::info_span!(
            "analyze",
            file = %artifact.original_name(),
            format = %artifact.format()
        );

        let result = self.run(&artifact).instrument(span).await;
        match &result {
            Ok(analysis) => info!(
                file = %artifact.original_name(),
                suggestions = analysis.suggestions.len(),
                "Analysis complete"
            ),
            Err(e) => error!(
                file = %artifact.original_name(),
                category = e.category(),
                error = %e,
                "Analysis failed"
            ),
        }

        drop(artifact);
        result
    }

    async fn run(&self, artifact: &UploadedArtifact) -> Result<AnalysisResult, AnalysisError> {
        let content = self.extract(artifact).await?;

        let bounded = truncate(content.text(), self.config.max_content_chars);
        let prompt = build_prompt(bounded.text());

        let models = self.provider.list_models(&self.credential).await?;
        if models.is_empty() {
            return Err(AnalysisError::Catalog(LlmError::Catalog {
                status: None,
                message: "model catalog is empty".to_string(),
            }));
        }
        let model_id = choose_model(&models, &self.config.preferred_models)
            .ok_or(AnalysisError::NoModelAvailable)?;
        info!(model = model_id, catalog_size = models.len(), "Selected model");

        match self
            .provider
            .generate(&self.credential, model_id, &prompt)
            .await?
        {
            GenerationOutcome::Complete(text) => Ok(normalize(&text)?),
            GenerationOutcome::Truncated => Err(AnalysisError::OutputTruncated),
            GenerationOutcome::Empty => Err(AnalysisError::EmptyResponse),
        }
    }

    async fn extract(&self, artifact: &UploadedArtifact) -> Result<ExtractedContent, ExtractError> {
        let path = artifact.path().to_path_buf();
        let format = artifact.format();

        tokio::task::spawn_blocking(move || extract_text(&path, format))
            .await
            .map_err(|e| ExtractError::Worker(e.to_string()))?
    }
}
