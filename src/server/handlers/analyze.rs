//! Upload and analysis endpoint.

use std::path::Path;

use axum::{
    extract::{multipart::Field, multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use super::super::AppState;
use super::helpers::{analysis_error_response, ErrorResponse};
use crate::analysis::AnalysisResult;
use crate::pipeline::{stored_file_name, UploadedArtifact};

/// Multipart field that carries the uploaded file.
const FILE_FIELD: &str = "file";

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub analysis: AnalysisResult,
}

#[derive(Debug, Error)]
enum UploadError {
    #[error("no file uploaded; send it in the `file` field")]
    MissingFile,
    #[error("failed to read upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    fn into_error_response(self) -> Response {
        let status = match &self {
            Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::Multipart(e) => e.status(),
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ErrorResponse::new("upload", self.to_string()).with_status(status)
    }
}

/// Analyze the file uploaded in the `file` multipart field.
#[tracing::instrument(skip(state, multipart))]
pub async fn analyze(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let artifact = match receive_upload(&state.upload_dir, &mut multipart).await {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected upload");
            return e.into_error_response();
        }
    };

    tracing::debug!(
        file = %artifact.original_name(),
        path = %artifact.path().display(),
        "Upload stored"
    );

    match state.analyzer.analyze(artifact).await {
        Ok(analysis) => Json(AnalyzeResponse { analysis }).into_response(),
        Err(e) => analysis_error_response(&e),
    }
}

/// Store the first `file` field; other fields are skipped.
async fn receive_upload(
    upload_dir: &Path,
    multipart: &mut Multipart,
) -> Result<UploadedArtifact, UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return store_field(upload_dir, field).await;
        }
    }
    Err(UploadError::MissingFile)
}

/// Stream a field to disk. The artifact guard exists before the first
/// byte is written, so a failed write leaves nothing behind.
async fn store_field(
    upload_dir: &Path,
    mut field: Field<'_>,
) -> Result<UploadedArtifact, UploadError> {
    let original_name = field
        .file_name()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or("upload")
        .to_string();

    let path = upload_dir.join(stored_file_name(&original_name));
    let artifact = UploadedArtifact::new(&path, original_name);

    let mut file = tokio::fs::File::create(&path).await?;
    let mut written = 0usize;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len();
    }
    file.flush().await?;

    tracing::info!(file = %artifact.original_name(), bytes = written, "Received upload");
    Ok(artifact)
}
