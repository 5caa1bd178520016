//! Google Gemini REST client.
//!
//! Talks to the `v1beta` API: `GET /models` for the catalog and
//! `POST /{model}:generateContent` for generation. The API key travels as the
//! `key` query parameter and is never logged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::catalog::ModelListResponse;
use super::{GenerationOutcome, LlmError, ModelDescriptor, ModelProvider};

/// Sampling settings sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 40_960,
        }
    }
}

/// Gemini API client.
pub struct GeminiClient {
    endpoint: String,
    settings: GenerationSettings,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    finish_reason: Option<FinishReason>,
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Why the provider stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    #[serde(other)]
    Other,
}

impl GenerateResponse {
    /// Judge delivery of the first candidate. The text itself is not inspected.
    pub(crate) fn into_outcome(self) -> GenerationOutcome {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return GenerationOutcome::Empty;
        };

        if candidate.finish_reason == Some(FinishReason::MaxTokens) {
            return GenerationOutcome::Truncated;
        }

        let fragments: Vec<String> = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if fragments.is_empty() {
            GenerationOutcome::Empty
        } else {
            GenerationOutcome::Complete(fragments.join("\n"))
        }
    }
}

impl GeminiClient {
    /// Create a client for the API rooted at `endpoint`
    /// (e.g. `https://generativelanguage.googleapis.com/v1beta`).
    pub fn new(
        endpoint: impl Into<String>,
        settings: GenerationSettings,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            settings,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn settings(&self) -> GenerationSettings {
        self.settings
    }

    fn generate_request<'a>(&self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_output_tokens,
                response_mime_type: "application/json",
            },
        }
    }
}

#[async_trait]
impl ModelProvider for GeminiClient {
    async fn list_models(&self, credential: &str) -> Result<Vec<ModelDescriptor>, LlmError> {
        let url = format!("{}/models", self.endpoint);
        debug!(endpoint = %self.endpoint, "Listing models");

        let resp = self
            .client
            .get(&url)
            .query(&[("key", credential)])
            .send()
            .await
            .map_err(|e| LlmError::Catalog {
                status: None,
                message: e.without_url().to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Model listing failed");
            return Err(LlmError::Catalog {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let listing: ModelListResponse = resp.json().await.map_err(|e| LlmError::Catalog {
            status: Some(status.as_u16()),
            message: format!("invalid model listing: {}", e.without_url()),
        })?;

        let models = listing.into_descriptors();
        debug!(count = models.len(), "Model catalog received");
        Ok(models)
    }

    async fn generate(
        &self,
        credential: &str,
        model_id: &str,
        prompt: &str,
    ) -> Result<GenerationOutcome, LlmError> {
        let url = format!("{}/{}:generateContent", self.endpoint, model_id);
        let request = self.generate_request(prompt);

        info!(
            model = model_id,
            prompt_chars = prompt.chars().count(),
            max_output_tokens = self.settings.max_output_tokens,
            "Requesting analysis from model"
        );

        let resp = self
            .client
            .post(&url)
            .query(&[("key", credential)])
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Transport {
                status: None,
                detail: e.without_url().to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| LlmError::Transport {
            status: Some(status.as_u16()),
            detail: e.without_url().to_string(),
        })?;

        if !status.is_success() {
            error!(status = status.as_u16(), model = model_id, "generateContent failed");
            return Err(LlmError::Transport {
                status: Some(status.as_u16()),
                detail: body,
            });
        }

        let response: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Transport {
                status: Some(status.as_u16()),
                detail: format!("invalid generateContent response: {}", e),
            })?;

        let outcome = response.into_outcome();
        match &outcome {
            GenerationOutcome::Complete(text) => {
                debug!(chars = text.chars().count(), "Model response received")
            }
            GenerationOutcome::Truncated => {
                warn!(
                    max_output_tokens = self.settings.max_output_tokens,
                    "Model output hit the token ceiling"
                )
            }
            GenerationOutcome::Empty => warn!(model = model_id, "Model returned no candidates"),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{StatusCode, Uri};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn outcome(body: Value) -> GenerationOutcome {
        serde_json::from_value::<GenerateResponse>(body)
            .unwrap()
            .into_outcome()
    }

    #[test]
    fn test_outcome_complete_joins_parts() {
        let body = json!({
            "candidates": [{
                "finishReason": "STOP",
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]}
            }]
        });
        assert_eq!(outcome(body), GenerationOutcome::Complete("{\"a\":\n1}".to_string()));
    }

    #[test]
    fn test_outcome_max_tokens_is_truncated() {
        let body = json!({
            "candidates": [{
                "finishReason": "MAX_TOKENS",
                "content": {"parts": [{"text": "{\"resumo\": \"partial"}]}
            }]
        });
        assert_eq!(outcome(body), GenerationOutcome::Truncated);
    }

    #[test]
    fn test_outcome_without_candidates_is_empty() {
        assert_eq!(outcome(json!({})), GenerationOutcome::Empty);
        assert_eq!(outcome(json!({"candidates": []})), GenerationOutcome::Empty);
        assert_eq!(
            outcome(json!({"candidates": [{"finishReason": "SAFETY"}]})),
            GenerationOutcome::Empty
        );
        assert_eq!(
            outcome(json!({"candidates": [{"content": {"parts": [{"inlineData": {}}]}}]})),
            GenerationOutcome::Empty
        );
    }

    #[test]
    fn test_unknown_finish_reason() {
        let body = json!({
            "candidates": [{"finishReason": "BLOCKLIST", "content": {"parts": [{"text": "ok"}]}}]
        });
        assert_eq!(outcome(body), GenerationOutcome::Complete("ok".to_string()));
    }

    #[test]
    fn test_request_body_shape() {
        let client = GeminiClient::new(
            "http://localhost/v1beta/",
            GenerationSettings::default(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost/v1beta");

        let body = serde_json::to_value(client.generate_request("prompt")).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "prompt"}]}],
                "generationConfig": {
                    "temperature": 0.2_f32,
                    "maxOutputTokens": 40960,
                    "responseMimeType": "application/json"
                }
            })
        );
    }

    #[derive(Clone, Default)]
    struct Recorded {
        requests: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    async fn spawn_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1beta", addr)
    }

    fn client_for(endpoint: String) -> GeminiClient {
        GeminiClient::new(endpoint, GenerationSettings::default(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_list_models_against_mock_provider() {
        async fn models(Query(q): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
            if q.get("key").map(String::as_str) != Some("secret") {
                return (StatusCode::FORBIDDEN, Json(json!({"error": "bad key"})));
            }
            (
                StatusCode::OK,
                Json(json!({"models": [
                    {"name": "models/gemini-2.5-flash", "supportedGenerationMethods": ["generateContent"]}
                ]})),
            )
        }

        let endpoint = spawn_provider(Router::new().route("/v1beta/models", get(models))).await;
        let client = client_for(endpoint);

        let listed = client.list_models("secret").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].can_generate());

        match client.list_models("wrong").await.unwrap_err() {
            LlmError::Catalog { status, message } => {
                assert_eq!(status, Some(403));
                assert!(message.contains("bad key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_against_mock_provider() {
        async fn generate(
            State(recorded): State<Recorded>,
            uri: Uri,
            Query(q): Query<HashMap<String, String>>,
            Json(body): Json<Value>,
        ) -> Json<Value> {
            recorded
                .requests
                .lock()
                .unwrap()
                .push((uri.path().to_string(), q.get("key").cloned(), body));
            Json(json!({
                "candidates": [{"finishReason": "STOP", "content": {"parts": [{"text": "{}"}]}}]
            }))
        }

        let recorded = Recorded::default();
        let router = Router::new().fallback(generate).with_state(recorded.clone());
        let client = client_for(spawn_provider(router).await);

        let result = client
            .generate("secret", "models/gemini-2.5-flash", "hello")
            .await
            .unwrap();
        assert_eq!(result, GenerationOutcome::Complete("{}".to_string()));

        let requests = recorded.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (path, key, body) = &requests[0];
        assert_eq!(path, "/v1beta/models/gemini-2.5-flash:generateContent");
        assert_eq!(key.as_deref(), Some("secret"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[tokio::test]
    async fn test_generate_http_error_is_transport_error() {
        async fn overloaded() -> (StatusCode, &'static str) {
            (StatusCode::SERVICE_UNAVAILABLE, "model overloaded")
        }

        let client = client_for(spawn_provider(Router::new().fallback(overloaded)).await);
        match client.generate("k", "models/x", "p").await.unwrap_err() {
            LlmError::Transport { status, detail } => {
                assert_eq!(status, Some(503));
                assert_eq!(detail, "model overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_non_json_body_is_transport_error() {
        async fn html() -> &'static str {
            "<html>proxy error</html>"
        }

        let client = client_for(spawn_provider(Router::new().fallback(html)).await);
        let err = client.generate("k", "models/x", "p").await.unwrap_err();
        assert!(matches!(err, LlmError::Transport { status: Some(200), .. }));
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{}/v1beta", addr));
        let err = client.list_models("k").await.unwrap_err();
        assert!(matches!(err, LlmError::Catalog { status: None, .. }));
    }
}
