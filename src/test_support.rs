//! Scripted collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::client::{ChatBackend, ChatParams, Outcome};
use crate::error::CompareError;
use crate::upload::{self, DocumentUploader, UploadReceipt};

pub(crate) const UPLOAD_STATUS: &str = "File processed and embedded successfully.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endpoint {
    Chat,
    Query,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub endpoint: Endpoint,
    pub prompt: String,
    pub params: ChatParams,
    pub source: Option<String>,
}

/// Pops one outcome per request and records every request and upload.
///
/// Uploads run the real local validation, then succeed with
/// [`UPLOAD_STATUS`].
#[derive(Default)]
pub(crate) struct Scripted {
    outcomes: Mutex<VecDeque<Outcome>>,
    calls: Mutex<Vec<Call>>,
    uploads: Mutex<Vec<PathBuf>>,
}

impl Scripted {
    pub fn new(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<PathBuf> {
        self.uploads.lock().unwrap().clone()
    }

    fn record(&self, endpoint: Endpoint, prompt: &str, params: ChatParams, source: Option<&str>) -> Outcome {
        self.calls.lock().unwrap().push(Call {
            endpoint,
            prompt: prompt.to_string(),
            params,
            source: source.map(str::to_string),
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Outcome::failure("script exhausted"))
    }
}

impl ChatBackend for Scripted {
    async fn chat(&self, prompt: &str, params: ChatParams) -> Outcome {
        self.record(Endpoint::Chat, prompt, params, None)
    }

    async fn query(&self, prompt: &str, params: ChatParams, source: Option<&str>) -> Outcome {
        self.record(Endpoint::Query, prompt, params, source)
    }
}

impl DocumentUploader for Scripted {
    async fn upload(&self, path: &Path) -> Result<UploadReceipt, CompareError> {
        let prepared = upload::prepare_upload(path)?;
        self.uploads.lock().unwrap().push(path.to_path_buf());
        Ok(UploadReceipt {
            file_name: prepared.file_name,
            status: UPLOAD_STATUS.to_string(),
        })
    }
}
