//! Single-turn chat session.
//!
//! Keeps the role-tagged exchange log, the sampling settings and the optional
//! document context. Like the comparison controller, a send is split into
//! [`ChatSession::begin_send`] (validate, log the user turn, hand out the
//! request) and [`ChatSession::finish`] (log the reply), with
//! [`ChatSession::send`] combining both around a [`ChatBackend`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{validate_temperature, ChatBackend, ChatParams, Outcome};
use crate::error::CompareError;
use crate::providers::Deployment;

pub const EMPTY_INPUT_MESSAGE: &str = "Input prompt cannot be empty.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Error,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Error => write!(f, "error"),
            Role::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

/// A request handed out by [`ChatSession::begin_send`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChat {
    pub prompt: String,
    pub params: ChatParams,
    /// Set when a document context is active; the request then goes to the
    /// grounded query endpoint.
    pub source_filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    log: Vec<ChatMessage>,
    temperature: f64,
    deployment: Deployment,
    document: Option<String>,
    loading: bool,
    error_message: Option<String>,
}

impl ChatSession {
    pub fn new(temperature: f64, deployment: Deployment) -> Self {
        Self {
            log: Vec::new(),
            temperature: temperature.clamp(0.0, 1.0),
            deployment,
            document: None,
            loading: false,
            error_message: None,
        }
    }

    pub fn log(&self) -> &[ChatMessage] {
        &self.log
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn deployment(&self) -> Deployment {
        self.deployment
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Inline validation message, if the last send was rejected.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Set the sampling temperature; must be a number within `[0, 1]`.
    pub fn set_temperature(&mut self, temperature: f64) -> Result<(), CompareError> {
        self.temperature = validate_temperature(temperature)?;
        Ok(())
    }

    pub fn set_deployment(&mut self, deployment: Deployment) {
        self.deployment = deployment;
    }

    pub fn params(&self) -> ChatParams {
        ChatParams::new(self.temperature, self.deployment)
    }

    /// Ground later questions in an uploaded document.
    pub fn attach_document(&mut self, file_name: impl Into<String>, status: &str) {
        let file_name = file_name.into();
        self.log.push(ChatMessage::new(
            Role::System,
            format!("Document '{file_name}' uploaded: {status}"),
        ));
        self.document = Some(file_name);
    }

    /// Drop the document context. This is the only operation that removes
    /// entries from the log: the whole exchange is cleared with it.
    pub fn clear_document(&mut self) {
        self.document = None;
        self.log.clear();
    }

    /// Validate `message`, log it as the user turn and return the request to
    /// issue.
    ///
    /// Returns `Ok(None)` when a reply is still outstanding.
    pub fn begin_send(&mut self, message: &str) -> Result<Option<PendingChat>, CompareError> {
        if self.loading {
            debug!("send ignored, reply outstanding");
            return Ok(None);
        }
        if message.trim().is_empty() {
            self.error_message = Some(EMPTY_INPUT_MESSAGE.to_string());
            return Err(CompareError::Validation(EMPTY_INPUT_MESSAGE.to_string()));
        }

        self.error_message = None;
        self.log.push(ChatMessage::new(Role::User, message));
        self.loading = true;
        Ok(Some(PendingChat {
            prompt: message.to_string(),
            params: self.params(),
            source_filename: self.document.clone(),
        }))
    }

    /// Log the reply to the outstanding request.
    pub fn finish(&mut self, outcome: Outcome) {
        if !self.loading {
            debug!("reply received with no request outstanding, discarded");
            return;
        }
        self.loading = false;
        let message = match outcome {
            Outcome::Ok { text } => ChatMessage::new(Role::Assistant, text),
            Outcome::Err { message } => ChatMessage::new(Role::Error, format!("Error occurred: {message}")),
        };
        self.log.push(message);
    }

    /// Send one message and wait for the reply.
    ///
    /// Returns the logged reply message, or `None` if the send was ignored.
    pub async fn send<B: ChatBackend>(
        &mut self,
        message: &str,
        backend: &B,
    ) -> Result<Option<&ChatMessage>, CompareError> {
        let Some(pending) = self.begin_send(message)? else {
            return Ok(None);
        };
        let outcome = match pending.source_filename.as_deref() {
            Some(source) => backend.query(&pending.prompt, pending.params, Some(source)).await,
            None => backend.chat(&pending.prompt, pending.params).await,
        };
        self.finish(outcome);
        Ok(self.log.last())
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(0.7, Deployment::OpenAi)
    }
}
