//! HTTP front end for the analyzer.
//!
//! Accepts multipart uploads, runs them through the pipeline and returns
//! the analysis as JSON. Also renders posted analyses as HTML reports.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::AnalysisError;
use crate::pipeline::Analyzer;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(analyzer: Analyzer, upload_dir: PathBuf) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            upload_dir,
        }
    }

    /// Build the server state. A missing API key is fatal here, before any
    /// request is accepted.
    pub fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        let analyzer = Analyzer::from_config(config.analyzer.clone())?;
        Ok(Self::new(analyzer, config.server.upload_dir.clone()))
    }
}

/// Start the web server.
pub async fn serve(config: &Config, bind: &str) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    tokio::fs::create_dir_all(&config.server.upload_dir).await?;

    let app = create_router(state, &config.server);

    let addr: SocketAddr = bind.parse()?;
    info!(
        upload_dir = %config.server.upload_dir.display(),
        "Starting server at http://{}", addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::analysis::fixtures::ANALYSIS_JSON;
    use crate::config::{AnalyzerConfig, ServerConfig};
    use crate::llm::{GenerationOutcome, LlmError, ModelDescriptor, ModelProvider, GENERATE_CONTENT};

    const BOUNDARY: &str = "ghostflow-test-boundary";

    struct FixedProvider(GenerationOutcome);

    #[async_trait]
    impl ModelProvider for FixedProvider {
        async fn list_models(&self, _credential: &str) -> Result<Vec<ModelDescriptor>, LlmError> {
            Ok(vec![ModelDescriptor::new(
                "models/gemini-2.5-flash",
                [GENERATE_CONTENT],
            )])
        }

        async fn generate(
            &self,
            _credential: &str,
            _model_id: &str,
            _prompt: &str,
        ) -> Result<GenerationOutcome, LlmError> {
            Ok(self.0.clone())
        }
    }

    fn setup_test_app(outcome: GenerationOutcome) -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = AnalyzerConfig {
            api_key: Some("test-key".to_string()),
            ..AnalyzerConfig::default()
        };
        let analyzer = Analyzer::with_provider(config, Box::new(FixedProvider(outcome))).unwrap();

        let state = AppState::new(analyzer, dir.path().to_path_buf());
        let app = create_router(state, &ServerConfig::default());
        (app, dir)
    }

    fn complete(text: &str) -> GenerationOutcome {
        GenerationOutcome::Complete(text.to_string())
    }

    fn multipart_request(field: &str, filename: &str, contents: &str) -> Request<Body> {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{contents}\r\n--{b}--\r\n",
            b = BOUNDARY,
        );
        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn upload_count(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_index() {
        let (app, _dir) = setup_test_app(GenerationOutcome::Empty);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = setup_test_app(GenerationOutcome::Empty);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let (app, dir) = setup_test_app(complete(ANALYSIS_JSON));

        let response = app
            .oneshot(multipart_request("file", "tarefas.csv", "a,b\n1,2\n3,4"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["analysis"]["tempo_desperdicado_horas_total"], 42.5);
        assert_eq!(json["analysis"]["sugestoes"][1]["prioridade"], "Média");
        assert_eq!(upload_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_analyze_without_file_field() {
        let (app, dir) = setup_test_app(complete(ANALYSIS_JSON));

        let response = app
            .oneshot(multipart_request("attachment", "notes.txt", "hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["category"], "upload");
        assert_eq!(upload_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_analyze_malformed_output() {
        let (app, dir) = setup_test_app(complete("not json at all"));

        let response = app
            .oneshot(multipart_request("file", "notes.txt", "hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["category"], "malformed_response");
        assert_eq!(json["rawOutput"], "not json at all");
        assert_eq!(upload_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_analyze_truncated_output() {
        let (app, dir) = setup_test_app(GenerationOutcome::Truncated);

        let response = app
            .oneshot(multipart_request("file", "notes.txt", "hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["category"], "output_truncated");
        assert!(json.get("rawOutput").is_none());
        assert_eq!(upload_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_analyze_extraction_failure() {
        let (app, dir) = setup_test_app(complete(ANALYSIS_JSON));

        let response = app
            .oneshot(multipart_request("file", "broken.xlsx", "not a workbook"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["category"], "extraction");
        assert_eq!(upload_count(&dir), 0);
    }

    #[test]
    fn test_state_requires_api_key() {
        let config = Config::default().with_overrides_from(|_| None);
        assert!(matches!(
            AppState::from_config(&config),
            Err(AnalysisError::Configuration)
        ));
    }

    #[tokio::test]
    async fn test_serve_refuses_to_start_without_api_key() {
        let dir = tempdir().unwrap();
        let mut config = Config::default().with_overrides_from(|_| None);
        config.server.upload_dir = dir.path().join("uploads");

        let err = serve(&config, "127.0.0.1:0").await.unwrap_err();
        assert!(err.to_string().contains("API key not configured"));
        assert!(!config.server.upload_dir.exists());
    }

    #[tokio::test]
    async fn test_report_renders_html() {
        let (app, _dir) = setup_test_app(GenerationOutcome::Empty);
        let body = serde_json::json!({
            "originalFileName": "tarefas.csv",
            "analysis": {"resumo": "Muito retrabalho manual."}
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/report")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("tarefas.csv"));
        assert!(html.contains("Muito retrabalho manual."));
        assert!(html.contains("Nenhuma sugestão encontrada."));
    }

    #[tokio::test]
    async fn test_report_tolerates_wrong_types() {
        let (app, _dir) = setup_test_app(GenerationOutcome::Empty);
        let body = serde_json::json!({
            "originalFileName": "tarefas.csv",
            "analysis": {
                "tempo_desperdicado_horas_por_tarefa": [{"tarefa": "Planilha", "horas": "3"}],
                "custo_estimado_reais_total": "caro"
            }
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/report")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Planilha"));
    }
}
