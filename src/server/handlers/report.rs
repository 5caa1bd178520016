//! Report rendering endpoint.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::helpers::ErrorResponse;
use crate::report::{render_report, ReportAnalysis};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub original_file_name: Option<String>,
    #[serde(default)]
    pub analysis: ReportAnalysis,
}

/// Render a posted analysis as an HTML report.
pub async fn report(Json(request): Json<ReportRequest>) -> Response {
    match render_report(
        request.original_file_name.as_deref(),
        &request.analysis,
        Utc::now(),
    ) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(category = "report", error = %e, "Failed to render report");
            ErrorResponse::new("report", format!("failed to render report: {}", e))
                .with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
