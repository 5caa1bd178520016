//! Configuration management using the prefer crate for file discovery.
//!
//! Values are resolved in order: built-in defaults, then a config file
//! (discovered by prefer or given explicitly), then environment variables.
//! The result is immutable and handed to the components that need it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::AnalysisError;
use crate::llm::GenerationSettings;

/// Name used for config file discovery (`ghostflow.toml`, `ghostflow.yaml`, ...).
pub const CONFIG_NAME: &str = "ghostflow";

/// Default Gemini API root.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },
}

/// Settings for the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Provider API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API root, without a trailing slash.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model ids to try first, in order of preference.
    #[serde(default = "default_preferred_models")]
    pub preferred_models: Vec<String>,
    /// Maximum characters of document content sent to the model.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Generation temperature (0.0 - 1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Output token ceiling for a single response.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// HTTP timeout for provider calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_preferred_models() -> Vec<String> {
    vec!["models/gemini-2.5-flash".to_string()]
}

fn default_max_content_chars() -> usize {
    35_000
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    40_960
}

fn default_request_timeout_secs() -> u64 {
    300 // 5 min for long analyses
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            preferred_models: default_preferred_models(),
            max_content_chars: default_max_content_chars(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AnalyzerConfig {
    /// The provider API key, or a configuration error if none is set.
    pub fn credential(&self) -> Result<&str, AnalysisError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(AnalysisError::Configuration)
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply overrides from `lookup` (an environment accessor).
    ///
    /// Supported variables:
    /// - `GEMINI_API_KEY`, falling back to `GOOGLE_API_KEY` (blank values are ignored)
    /// - `GHOSTFLOW_ENDPOINT`: API root
    /// - `GHOSTFLOW_MODEL`: model id tried before the configured preferences
    /// - `GHOSTFLOW_MAX_CONTENT_CHARS`
    /// - `GHOSTFLOW_MAX_OUTPUT_TOKENS`
    /// - `GHOSTFLOW_TEMPERATURE`
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_blank("GEMINI_API_KEY").or_else(|| non_blank("GOOGLE_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(endpoint) = lookup("GHOSTFLOW_ENDPOINT") {
            self.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("GHOSTFLOW_MODEL") {
            let model = if model.starts_with("models/") {
                model
            } else {
                format!("models/{}", model)
            };
            self.preferred_models.retain(|m| m != &model);
            self.preferred_models.insert(0, model);
        }
        if let Some(n) = lookup("GHOSTFLOW_MAX_CONTENT_CHARS").and_then(|v| v.parse().ok()) {
            self.max_content_chars = n;
        }
        if let Some(n) = lookup("GHOSTFLOW_MAX_OUTPUT_TOKENS").and_then(|v| v.parse().ok()) {
            self.max_output_tokens = n;
        }
        if let Some(t) = lookup("GHOSTFLOW_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.temperature = t;
        }
        self
    }
}

/// Settings for the upload server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Where uploads are stored while they are analyzed.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Per-request timeout, in seconds.
    #[serde(default = "default_server_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_bind() -> String {
    "127.0.0.1:4000".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_server_timeout_secs() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            request_timeout_secs: default_server_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply overrides from `lookup`: `GHOSTFLOW_UPLOAD_DIR`, `GHOSTFLOW_BIND`
    /// and `PORT` (replaces only the port of the bind address).
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("GHOSTFLOW_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(bind) = lookup("GHOSTFLOW_BIND") {
            self.bind = bind;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
            let host = self
                .bind
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| self.bind.clone());
            self.bind = format!("{}:{}", host, port);
        }
        self
    }
}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// File the configuration was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit`, or from a discovered config file,
    /// then apply environment overrides.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load_from_path(path).await?,
            None => Self::discover().await?,
        };
        Ok(config.with_overrides_from(|key| std::env::var(key).ok()))
    }

    /// Find a config file in the standard locations; defaults if there is none.
    async fn discover() -> Result<Self, ConfigError> {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await,
                None => Ok(Self::default()),
            },
            Err(e) => {
                debug!("No config file found: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file.
    /// The format is chosen by extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |message: String| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        };

        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_error(e.to_string())),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| parse_error(e.to_string())),
            _ => serde_json::from_str(contents).map_err(|e| parse_error(e.to_string())),
        }
    }

    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.analyzer = self.analyzer.with_overrides_from(&lookup);
        self.server = self.server.with_overrides_from(&lookup);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.max_content_chars, 35_000);
        assert_eq!(config.max_output_tokens, 40_960);
        assert_eq!(config.preferred_models, vec!["models/gemini-2.5-flash"]);
        assert!(config.api_key.is_none());
        assert_eq!(ServerConfig::default().request_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_missing_credential_is_configuration_error() {
        let mut config = AnalyzerConfig::default();
        assert!(matches!(config.credential(), Err(AnalysisError::Configuration)));

        config.api_key = Some("   ".to_string());
        assert!(matches!(config.credential(), Err(AnalysisError::Configuration)));

        config.api_key = Some("abc".to_string());
        assert_eq!(config.credential().unwrap(), "abc");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().with_overrides_from(env(&[
            ("GOOGLE_API_KEY", "google"),
            ("GHOSTFLOW_MODEL", "gemini-2.0-flash"),
            ("GHOSTFLOW_MAX_CONTENT_CHARS", "1000"),
            ("GHOSTFLOW_TEMPERATURE", "not a number"),
            ("PORT", "8080"),
        ]));

        assert_eq!(config.analyzer.api_key.as_deref(), Some("google"));
        assert_eq!(
            config.analyzer.preferred_models,
            vec!["models/gemini-2.0-flash", "models/gemini-2.5-flash"]
        );
        assert_eq!(config.analyzer.max_content_chars, 1000);
        assert_eq!(config.analyzer.temperature, 0.2);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_gemini_key_wins_over_google_key() {
        let config = AnalyzerConfig::default()
            .with_overrides_from(env(&[("GEMINI_API_KEY", "gemini"), ("GOOGLE_API_KEY", "google")]));
        assert_eq!(config.api_key.as_deref(), Some("gemini"));
    }

    #[test]
    fn test_blank_gemini_key_falls_back_to_google_key() {
        let config = AnalyzerConfig::default()
            .with_overrides_from(env(&[("GEMINI_API_KEY", ""), ("GOOGLE_API_KEY", "google")]));
        assert_eq!(config.credential().unwrap(), "google");

        let config = AnalyzerConfig::default()
            .with_overrides_from(env(&[("GEMINI_API_KEY", "  "), ("GOOGLE_API_KEY", "")]));
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_parse_toml_with_partial_sections() {
        let toml = r#"
            [analyzer]
            preferred_models = ["models/a", "models/b"]
            max_content_chars = 500

            [server]
            upload_dir = "/tmp/ghostflow"
        "#;
        let config = Config::parse(toml, Path::new("ghostflow.toml")).unwrap();
        assert_eq!(config.analyzer.preferred_models, vec!["models/a", "models/b"]);
        assert_eq!(config.analyzer.max_content_chars, 500);
        assert_eq!(config.analyzer.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.server.upload_dir, PathBuf::from("/tmp/ghostflow"));
        assert_eq!(config.server.bind, "127.0.0.1:4000");
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = "analyzer:\n  temperature: 0.5\n";
        let config = Config::parse(yaml, Path::new("ghostflow.yml")).unwrap();
        assert_eq!(config.analyzer.temperature, 0.5);

        let json = r#"{"server": {"max_upload_bytes": 1024}}"#;
        let config = Config::parse(json, Path::new("ghostflow.json")).unwrap();
        assert_eq!(config.server.max_upload_bytes, 1024);
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let err = Config::parse("analyzer = [", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[tokio::test]
    async fn test_load_from_path_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ghostflow.toml");
        std::fs::write(&path, "[analyzer]\nmax_output_tokens = 8192\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.analyzer.max_output_tokens, 8192);
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }
}
