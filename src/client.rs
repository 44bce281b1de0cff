//! HTTP client for the chat backend.
//!
//! Every call to the chat or grounded query endpoint is folded into a single
//! [`Outcome`] so callers never branch on status codes or transport errors.
//! The [`ChatBackend`] trait is the seam the comparison controller and the
//! chat session are written against; [`ChatClient`] is the reqwest-backed
//! implementation.

use std::future::Future;
use std::time::Duration;

use reqwest::multipart;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::CompareError;
use crate::providers::{
    ChatReply, ChatRequest, Deployment, EmbeddingItem, EmbeddingReply, EmbeddingRequest, RagQueryRequest,
    SearchResult, DEFAULT_SEARCH_LIMIT,
};

/// Sampling parameters for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatParams {
    pub temperature: f64,
    pub deployment: Deployment,
}

impl ChatParams {
    pub fn new(temperature: f64, deployment: Deployment) -> Self {
        Self { temperature, deployment }
    }
}

pub const TEMPERATURE_RANGE_MESSAGE: &str = "Temperature must be between 0 and 1.";

/// Accept a sampling temperature within `[0, 1]`.
pub fn validate_temperature(temperature: f64) -> Result<f64, CompareError> {
    if temperature.is_finite() && (0.0..=1.0).contains(&temperature) {
        Ok(temperature)
    } else {
        Err(CompareError::Validation(TEMPERATURE_RANGE_MESSAGE.to_string()))
    }
}

/// Normalized result of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ok { text: String },
    Err { message: String },
}

impl Outcome {
    pub fn success(text: impl Into<String>) -> Self {
        Outcome::Ok { text: text.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Err { message: message.into() }
    }

}

/// Anything that can answer a single chat turn.
///
/// Implementations must issue exactly one request per call and never retry.
pub trait ChatBackend {
    /// One exchange against the plain chat endpoint.
    fn chat(&self, prompt: &str, params: ChatParams) -> impl Future<Output = Outcome> + Send;

    /// One exchange against the retrieval-augmented endpoint, optionally
    /// scoped to a previously uploaded document.
    fn query(
        &self,
        prompt: &str,
        params: ChatParams,
        source_filename: Option<&str>,
    ) -> impl Future<Output = Outcome> + Send;
}

/// Map a raw status + body onto an [`Outcome`].
///
/// * non-2xx: the body's `error` string when present, else
///   `HTTP error! status: <code>`.
/// * 2xx with `in_band_errors`: a non-empty `error` field is still a failure.
/// * 2xx: the `response` string.
pub fn interpret_reply(status: u16, body: &[u8], in_band_errors: bool) -> Outcome {
    let parsed = serde_json::from_slice::<ChatReply>(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .and_then(|r| r.error)
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {status}"));
        return Outcome::failure(message);
    }

    let reply = match parsed {
        Ok(r) => r,
        Err(e) => return Outcome::failure(format!("unexpected response body: {e}")),
    };

    if in_band_errors {
        if let Some(err) = reply.error.filter(|e| !e.trim().is_empty()) {
            return Outcome::failure(err);
        }
    }

    match reply.response {
        Some(text) => Outcome::success(text),
        None => Outcome::failure("response body did not contain a `response` field"),
    }
}

/// reqwest-backed [`ChatBackend`] plus the document upload call.
#[derive(Debug, Clone)]
pub struct ChatClient {
    config: Config,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn builder(base_url: impl Into<String>) -> ChatClientBuilder {
        ChatClientBuilder::new(base_url)
    }

    /// Build a client from a validated [`Config`].
    pub fn from_config(config: Config) -> Result<Self, CompareError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CompareError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(ChatClient { config, http })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn post_json<T: Serialize>(&self, url: &str, body: &T, in_band_errors: bool) -> Outcome {
        let resp = match self.http.post(url).json(body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, url = %url, "request failed before a response arrived");
                return Outcome::failure(e.to_string());
            }
        };

        let status = resp.status().as_u16();
        let bytes = match resp.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, url = %url, status, "failed reading response body");
                return Outcome::failure(e.to_string());
            }
        };

        let outcome = interpret_reply(status, &bytes, in_band_errors);
        if let Outcome::Err { message } = &outcome {
            warn!(url = %url, status, error = %message, "request returned an error");
        }
        outcome
    }

    /// Upload a document to the retrieval endpoint.
    ///
    /// Returns the server's plain-text status on 2xx. Non-2xx responses become
    /// [`CompareError::Protocol`] carrying the plain-text body (or the status
    /// line when the body is empty).
    pub async fn upload_document(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, CompareError> {
        let url = self.config.upload_url();
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| CompareError::Validation(format!("invalid content type: {e}")))?;
        let form = multipart::Form::new().part("file", part);

        debug!(url = %url, file = file_name, content_type, "uploading document");
        let resp = self.http.post(&url).multipart(form).send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        plain_text_result(&url, status, text)
    }

    /// Embed `text` without storing it.
    pub async fn build_embedding(&self, text: &str) -> Result<Vec<EmbeddingItem>, CompareError> {
        let url = self.config.embedding_build_url();
        let (status, bytes) = self.post_embedding_request(&url, text, DEFAULT_SEARCH_LIMIT).await?;
        let reply = serde_json::from_slice::<EmbeddingReply>(&bytes);

        if !(200..300).contains(&status) {
            let message = reply
                .ok()
                .and_then(|r| r.error)
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| format!("HTTP error! status: {status}"));
            warn!(url = %url, status, error = %message, "embedding request failed");
            return Err(CompareError::Protocol { status: Some(status), message });
        }

        let reply = reply.map_err(|e| CompareError::Protocol {
            status: Some(status),
            message: format!("unexpected response body: {e}"),
        })?;
        reply.embedding.ok_or_else(|| CompareError::Protocol {
            status: Some(status),
            message: "response body did not contain an `embedding` field".to_string(),
        })
    }

    /// Embed `text` and store it in the vector collection. Returns the
    /// server's plain-text status.
    pub async fn store_embedding(&self, text: &str) -> Result<String, CompareError> {
        let url = self.config.embedding_store_url();
        let (status, bytes) = self.post_embedding_request(&url, text, DEFAULT_SEARCH_LIMIT).await?;
        plain_text_result(&url, status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// The `limit` stored vectors closest to `text`, best first.
    pub async fn search_embeddings(&self, text: &str, limit: u32) -> Result<Vec<SearchResult>, CompareError> {
        let url = self.config.embedding_search_url();
        let (status, bytes) = self.post_embedding_request(&url, text, limit).await?;
        if !(200..300).contains(&status) {
            return Err(status_error(&url, status, String::from_utf8_lossy(&bytes).into_owned()));
        }
        serde_json::from_slice(&bytes).map_err(|e| CompareError::Protocol {
            status: Some(status),
            message: format!("unexpected response body: {e}"),
        })
    }

    async fn post_embedding_request(&self, url: &str, text: &str, limit: u32) -> Result<(u16, Vec<u8>), CompareError> {
        let body = EmbeddingRequest {
            text: text.to_string(),
            limit,
        };
        debug!(url = %url, chars = text.len(), limit, "sending embedding request");
        let resp = self.http.post(url).json(&body).send().await?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?;
        Ok((status, bytes.to_vec()))
    }
}

/// 2xx → the body as-is. Otherwise the body is the error message, or the
/// status line when the body is blank.
fn plain_text_result(url: &str, status: u16, text: String) -> Result<String, CompareError> {
    if (200..300).contains(&status) {
        Ok(text)
    } else {
        Err(status_error(url, status, text))
    }
}

fn status_error(url: &str, status: u16, text: String) -> CompareError {
    let message = if text.trim().is_empty() {
        format!("HTTP error! status: {status}")
    } else {
        text
    };
    warn!(url = %url, status, error = %message, "request rejected");
    CompareError::Protocol {
        status: Some(status),
        message,
    }
}

impl ChatBackend for ChatClient {
    async fn chat(&self, prompt: &str, params: ChatParams) -> Outcome {
        let body = ChatRequest {
            input: prompt.to_string(),
            temperature: params.temperature,
            deployment: params.deployment,
        };
        debug!(deployment = %params.deployment, temperature = params.temperature, "sending chat request");
        self.post_json(&self.config.chat_url(), &body, false).await
    }

    async fn query(&self, prompt: &str, params: ChatParams, source_filename: Option<&str>) -> Outcome {
        let body = RagQueryRequest {
            input: prompt.to_string(),
            temperature: params.temperature,
            deployment: params.deployment,
            source_filename: source_filename.map(str::to_string),
        };
        debug!(
            deployment = %params.deployment,
            temperature = params.temperature,
            source = source_filename.unwrap_or("N/A"),
            "sending grounded query"
        );
        self.post_json(&self.config.query_url(), &body, true).await
    }
}

/// Builder for [`ChatClient`].
///
/// Starts from [`Config::default`] with the given base URL.
pub struct ChatClientBuilder {
    config: Config,
}

impl ChatClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: Config {
                base_url: base_url.into(),
                ..Config::default()
            },
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn chat_path(mut self, path: impl Into<String>) -> Self {
        self.config.chat_path = path.into();
        self
    }

    pub fn build(self) -> Result<ChatClient, CompareError> {
        ChatClient::from_config(self.config)
    }
}
