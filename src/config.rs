//! Client configuration.
//!
//! Loaded from a TOML file (explicit `--config` path, or `llm-compare.toml`
//! in the working directory when present). Every field has a default, so an
//! empty file is a valid configuration. CLI flags are applied on top by the
//! binary.
//!
//! ```toml
//! base_url = "http://localhost:8080"
//! request_timeout_secs = 60
//! default_deployment = "mistral"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::validate_temperature;
use crate::error::CompareError;
use crate::providers::Deployment;

/// File name probed in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "llm-compare.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheme, host and port of the chat backend.
    pub base_url: String,
    pub chat_path: String,
    pub upload_path: String,
    pub query_path: String,
    pub embedding_build_path: String,
    pub embedding_store_path: String,
    pub embedding_search_path: String,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout applied by the HTTP client.
    pub request_timeout_secs: u64,
    /// Temperature used by the chat session and the deployment comparison.
    pub default_temperature: f64,
    pub default_deployment: Deployment,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "http://localhost:8080".to_string(),
            chat_path: "/api/chat".to_string(),
            upload_path: "/rag/upload".to_string(),
            query_path: "/rag/query".to_string(),
            embedding_build_path: "/embedding/build".to_string(),
            embedding_store_path: "/embedding/build-and-store".to_string(),
            embedding_search_path: "/embedding/search".to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 120,
            default_temperature: 0.7,
            default_deployment: Deployment::OpenAi,
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, CompareError> {
        let cfg: Config = toml::from_str(s).map_err(|e| CompareError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `llm-compare.toml` in the
    /// working directory is used if present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CompareError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    tracing::debug!("no config file found, using defaults");
                    return Ok(Config::default());
                }
                fallback.to_path_buf()
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|source| CompareError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), CompareError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(CompareError::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if validate_temperature(self.default_temperature).is_err() {
            return Err(CompareError::Config(format!(
                "default_temperature must be within [0, 1], got {}",
                self.default_temperature
            )));
        }
        if self.connect_timeout_secs == 0 {
            return Err(CompareError::Config("connect_timeout_secs must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(CompareError::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn chat_url(&self) -> String {
        join_url(&self.base_url, &self.chat_path)
    }

    pub fn upload_url(&self) -> String {
        join_url(&self.base_url, &self.upload_path)
    }

    pub fn query_url(&self) -> String {
        join_url(&self.base_url, &self.query_path)
    }

    pub fn embedding_build_url(&self) -> String {
        join_url(&self.base_url, &self.embedding_build_path)
    }

    pub fn embedding_store_url(&self) -> String {
        join_url(&self.base_url, &self.embedding_store_path)
    }

    pub fn embedding_search_url(&self) -> String {
        join_url(&self.base_url, &self.embedding_search_path)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Join a base URL and an endpoint path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.chat_url(), "http://localhost:8080/api/chat");
        assert_eq!(cfg.upload_url(), "http://localhost:8080/rag/upload");
        assert_eq!(cfg.query_url(), "http://localhost:8080/rag/query");
        assert_eq!(cfg.embedding_build_url(), "http://localhost:8080/embedding/build");
        assert_eq!(
            cfg.embedding_store_url(),
            "http://localhost:8080/embedding/build-and-store"
        );
        assert_eq!(cfg.embedding_search_url(), "http://localhost:8080/embedding/search");
        assert_eq!(cfg.default_temperature, 0.7);
        assert_eq!(cfg.default_deployment, Deployment::OpenAi);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let cfg = Config::from_toml_str("").expect("parse");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let cfg = Config::from_toml_str(
            r#"
            base_url = "https://llm.internal:9443/"
            default_deployment = "deepseek"
            request_timeout_secs = 30
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.chat_url(), "https://llm.internal:9443/api/chat");
        assert_eq!(cfg.default_deployment, Deployment::Deepseek);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.query_path, "/rag/query");
    }

    #[test]
    fn test_bad_scheme_rejected() {
        let err = Config::from_toml_str(r#"base_url = "localhost:8080""#).unwrap_err();
        assert!(matches!(err, CompareError::Config(_)));
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        let err = Config::from_toml_str("default_temperature = 1.5").unwrap_err();
        assert!(err.to_string().contains("default_temperature"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Config::from_toml_str("request_timeout_secs = 0").is_err());
    }

    #[test]
    fn test_zero_connect_timeout_rejected() {
        let err = Config::from_toml_str("connect_timeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn test_unknown_deployment_rejected() {
        assert!(Config::from_toml_str(r#"default_deployment = "gemini""#).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "base_url = \"http://127.0.0.1:3000\"").expect("write");
        let cfg = Config::load(Some(file.path())).expect("load");
        assert_eq!(cfg.base_url, "http://127.0.0.1:3000");
    }

    #[test]
    fn test_load_missing_explicit_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, CompareError::Io { .. }));
    }

    #[test]
    fn test_join_url_slashes() {
        assert_eq!(join_url("http://a/", "/b"), "http://a/b");
        assert_eq!(join_url("http://a", "b"), "http://a/b");
    }
}
