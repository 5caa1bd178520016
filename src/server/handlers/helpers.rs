//! Response types shared by the handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::AnalysisError;

/// JSON error body: `{ "error", "category", "rawOutput"? }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl ErrorResponse {
    pub fn new(category: &'static str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            category,
            raw_output: None,
        }
    }

    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl From<&AnalysisError> for ErrorResponse {
    fn from(err: &AnalysisError) -> Self {
        Self {
            error: err.to_string(),
            category: err.category(),
            raw_output: err.raw_output().map(str::to_string),
        }
    }
}

/// HTTP status for each failure category.
pub fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::OutputTruncated => StatusCode::BAD_REQUEST,
        AnalysisError::Catalog(_)
        | AnalysisError::NoModelAvailable
        | AnalysisError::Transport(_)
        | AnalysisError::EmptyResponse => StatusCode::BAD_GATEWAY,
        AnalysisError::MalformedResponse { .. } | AnalysisError::Configuration => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Full JSON error response for a failed analysis.
pub fn analysis_error_response(err: &AnalysisError) -> Response {
    ErrorResponse::from(err).with_status(status_for(err))
}
