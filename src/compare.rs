//! # Sequential comparison controller
//!
//! ## Responsibility
//! Given one prompt and a fixed, ordered list of variants (deployments or
//! temperatures), issue one chat request per variant, strictly one after the
//! other, and accumulate the responses keyed by variant.
//!
//! ## Guarantees
//! - Sequential: variant `i + 1` is requested only after the outcome of
//!   variant `i` has been fed back through [`ComparisonRun::complete`].
//! - Halting: the first failed request ends the run. Later variants are
//!   never requested and the failing one is not skipped.
//! - Fresh runs: an accepted submission clears the result map and resets the
//!   cursor before the first request is handed out.
//! - Non-reentrant: a submission while a run is in progress is ignored.
//! - Non-propagating: request failures end in [`RunPhase::Halted`]; nothing
//!   is returned as an `Err` to the caller.
//!
//! ## NOT Responsible For
//! - Transport, status-code handling (see [`crate::client`])
//! - Rendering (see [`crate::binder`])

use std::fmt;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{ChatBackend, ChatParams, Outcome};
use crate::providers::Deployment;

/// Validation message shown when an empty or blank prompt is submitted.
pub const EMPTY_PROMPT_MESSAGE: &str = "Prompt cannot be empty.";

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// One point on a comparison axis.
pub trait Variant: Clone + PartialEq + fmt::Debug {
    /// Name used in error messages, e.g. `mistral` or `temperature 0.5`.
    fn label(&self) -> String;

    /// Heading of the variant's display slot.
    fn heading(&self) -> String;

    /// Request parameters for this variant, derived from the run's base.
    fn params(&self, base: ChatParams) -> ChatParams;
}

impl Variant for Deployment {
    fn label(&self) -> String {
        self.as_str().to_string()
    }

    fn heading(&self) -> String {
        self.as_str().to_string()
    }

    fn params(&self, base: ChatParams) -> ChatParams {
        ChatParams { deployment: *self, ..base }
    }
}

/// Sampling temperature used as a comparison variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature(pub f64);

impl Temperature {
    /// The temperatures compared by the temperature view.
    pub const STANDARD: [Temperature; 3] = [Temperature(0.0), Temperature(0.5), Temperature(1.0)];
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // f64 Display prints 1.0 as "1" and 0.5 as "0.5"
        write!(f, "{}", self.0)
    }
}

impl Variant for Temperature {
    fn label(&self) -> String {
        format!("temperature {self}")
    }

    fn heading(&self) -> String {
        format!("Temperature: {self}")
    }

    fn params(&self, base: ChatParams) -> ChatParams {
        ChatParams { temperature: self.0, ..base }
    }
}

// ---------------------------------------------------------------------------
// ResultMap
// ---------------------------------------------------------------------------

/// Variant → response text, in the order responses arrived.
///
/// Holds at most one entry per variant.
#[derive(Debug, Clone)]
pub struct ResultMap<V> {
    entries: Vec<(V, String)>,
}

impl<V: Variant> ResultMap<V> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert or replace the response for `variant`.
    pub fn insert(&mut self, variant: V, text: String) {
        match self.entries.iter_mut().find(|(v, _)| *v == variant) {
            Some(slot) => slot.1 = text,
            None => self.entries.push((variant, text)),
        }
    }

    pub fn get(&self, variant: &V) -> Option<&str> {
        self.entries
            .iter()
            .find(|(v, _)| v == variant)
            .map(|(_, text)| text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<V: Variant> Default for ResultMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Run state machine
// ---------------------------------------------------------------------------

/// Lifecycle of a comparison run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunPhase {
    /// No prompt accepted yet.
    Idle,
    /// Waiting for the outcome of the variant at `cursor`.
    Running { cursor: usize },
    /// Stopped at `cursor` by a failed request.
    Halted { cursor: usize, error: String },
    /// Every variant answered.
    Completed,
}

/// The next request the caller should issue.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest<V> {
    pub index: usize,
    pub variant: V,
    pub prompt: String,
    pub params: ChatParams,
}

/// What the caller should do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<V> {
    /// Issue this request and feed its outcome to [`ComparisonRun::complete`].
    Request(PendingRequest<V>),
    /// The run reached (or already was in) a terminal or idle phase.
    Finished,
}

/// Result of [`ComparisonRun::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<V> {
    /// A new run started; `Step` carries the first request.
    Started(Step<V>),
    /// A run is already in progress; nothing changed.
    Ignored,
    /// The prompt failed validation; the phase is unchanged.
    Rejected { message: String },
}

/// State of one comparison view.
///
/// Construct one per view; runs are replaced in place by later submissions.
#[derive(Debug, Clone)]
pub struct ComparisonRun<V: Variant> {
    variants: Vec<V>,
    /// Parameters used for the next run.
    base: ChatParams,
    /// Parameters captured when the current run started.
    active: ChatParams,
    run_id: Option<Uuid>,
    prompt: String,
    results: ResultMap<V>,
    phase: RunPhase,
    error_message: Option<String>,
}

impl<V: Variant> ComparisonRun<V> {
    pub fn new(variants: Vec<V>, base: ChatParams) -> Self {
        Self {
            variants,
            base,
            active: base,
            run_id: None,
            prompt: String::new(),
            results: ResultMap::new(),
            phase: RunPhase::Idle,
            error_message: None,
        }
    }

    pub fn variants(&self) -> &[V] {
        &self.variants
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn results(&self) -> &ResultMap<V> {
        &self.results
    }

    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    /// Message to show above the slots: the halt reason or a validation error.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Index of the next variant to be answered.
    pub fn cursor(&self) -> usize {
        match &self.phase {
            RunPhase::Idle => 0,
            RunPhase::Running { cursor } | RunPhase::Halted { cursor, .. } => *cursor,
            RunPhase::Completed => self.variants.len(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, RunPhase::Running { .. })
    }

    pub fn base_params(&self) -> ChatParams {
        self.base
    }

    /// Change the parameters for subsequent runs. A run in progress keeps
    /// the parameters it started with.
    pub fn set_base_params(&mut self, params: ChatParams) {
        self.base = params;
    }

    /// Start a new run for `prompt`.
    ///
    /// Blank prompts are rejected without touching the phase or the results.
    /// While a run is in progress the submission is ignored.
    pub fn submit(&mut self, prompt: &str) -> Submission<V> {
        if self.is_running() {
            debug!(run_id = ?self.run_id, "submission ignored, run in progress");
            return Submission::Ignored;
        }
        if prompt.trim().is_empty() {
            self.error_message = Some(EMPTY_PROMPT_MESSAGE.to_string());
            return Submission::Rejected {
                message: EMPTY_PROMPT_MESSAGE.to_string(),
            };
        }

        let run_id = Uuid::new_v4();
        self.run_id = Some(run_id);
        self.prompt = prompt.to_string();
        self.active = self.base;
        self.results.clear();
        self.error_message = None;
        info!(%run_id, variants = self.variants.len(), "comparison run started");

        if self.variants.is_empty() {
            self.phase = RunPhase::Completed;
            return Submission::Started(Step::Finished);
        }
        self.phase = RunPhase::Running { cursor: 0 };
        Submission::Started(self.next_step())
    }

    /// The request for the current cursor, if a run is in progress.
    pub fn pending_request(&self) -> Option<PendingRequest<V>> {
        let RunPhase::Running { cursor } = self.phase else {
            return None;
        };
        let variant = self.variants.get(cursor)?.clone();
        Some(PendingRequest {
            index: cursor,
            params: variant.params(self.active),
            variant,
            prompt: self.prompt.clone(),
        })
    }

    fn next_step(&self) -> Step<V> {
        match self.pending_request() {
            Some(req) => Step::Request(req),
            None => Step::Finished,
        }
    }

    /// Feed the outcome of the pending request and advance.
    ///
    /// Outside of a running phase the outcome is discarded.
    pub fn complete(&mut self, outcome: Outcome) -> Step<V> {
        let RunPhase::Running { cursor } = self.phase else {
            warn!(run_id = ?self.run_id, "outcome received with no request pending, discarded");
            return Step::Finished;
        };
        let Some(variant) = self.variants.get(cursor).cloned() else {
            self.phase = RunPhase::Completed;
            return Step::Finished;
        };

        match outcome {
            Outcome::Ok { text } => {
                debug!(run_id = ?self.run_id, variant = %variant.label(), cursor, "variant answered");
                self.results.insert(variant, text);
                let next = cursor + 1;
                if next < self.variants.len() {
                    self.phase = RunPhase::Running { cursor: next };
                } else {
                    info!(run_id = ?self.run_id, "comparison run completed");
                    self.phase = RunPhase::Completed;
                }
            }
            Outcome::Err { message } => {
                let error = format!("Error occurred with {}: {}", variant.label(), message);
                warn!(run_id = ?self.run_id, variant = %variant.label(), cursor, error = %message, "comparison run halted");
                self.error_message = Some(error.clone());
                self.phase = RunPhase::Halted { cursor, error };
            }
        }
        self.next_step()
    }

    /// Drive the current run to a terminal phase, one request at a time.
    ///
    /// `observe` is called after every transition so callers can render
    /// partial results as they arrive.
    pub async fn drive<B, F>(&mut self, backend: &B, mut observe: F)
    where
        B: ChatBackend,
        F: FnMut(&Self),
    {
        while let Some(req) = self.pending_request() {
            let outcome = backend.chat(&req.prompt, req.params).await;
            self.complete(outcome);
            observe(self);
        }
    }

    /// Submit `prompt` and drive the run to completion.
    ///
    /// Returns the submission result; when it is `Started`, the run is in a
    /// terminal phase on return.
    pub async fn run<B: ChatBackend>(&mut self, prompt: &str, backend: &B) -> Submission<V> {
        let submission = self.submit(prompt);
        if matches!(submission, Submission::Started(_)) {
            self.drive(backend, |_| {}).await;
        }
        submission
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
