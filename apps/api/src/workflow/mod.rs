//! Resumable review workflows.
//!
//! Every workflow is an explicit state value plus transition functions of the
//! shape `(state, input) -> (new state, step)`. A call drives the state to its
//! next suspension point and returns; nothing runs in the background. The
//! caller persists the returned state (see `session::SessionRegistry`) and
//! hands it back on the next call.
//!
//! - `linear`: generate → suspend → edit loop → complete (job profile, cover letter)
//! - `section`: one resume section, write or edit, then report to the coordinator
//! - `coordinator`: parallel fan-out of section workflows and single-section routing

use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::{DocumentGenerator, DocumentSchema, GeneratedFragment, GenerationContext};
use crate::llm_client::retry::RetryingInvoker;
use crate::llm_client::ChatMessage;
use crate::source::SourceMaterial;

pub mod coordinator;
pub mod linear;
pub mod section;

/// Append-only conversation log; entries are never reordered or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ChatMessage) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.entries.last()
    }
}

/// Outcome of driving a workflow to its next stop.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<D> {
    /// Waiting for the next human decision.
    Suspended(D),
    /// Terminal; the document is final.
    Completed(D),
}

impl<D> Step<D> {
    pub fn document(&self) -> &D {
        match self {
            Step::Suspended(d) | Step::Completed(d) => d,
        }
    }

    pub fn into_document(self) -> D {
        match self {
            Step::Suspended(d) | Step::Completed(d) => d,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Step::Completed(_))
    }
}

/// What happens to a completed document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    #[default]
    Save,
    Discard,
}

/// Human decision at a linear workflow's suspension point.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewInput<D> {
    /// Free-text suggestion; the service revises the document.
    Feedback(String),
    /// A fully human-written document, taken as is.
    Replace(D),
    /// Finish, optionally with a last human edit.
    Done {
        replacement: Option<D>,
        decision: Decision,
    },
}

impl<D> ReviewInput<D> {
    /// Builds an edit from the optional request parts; exactly one must be given.
    pub fn edit_from_parts(
        editing_suggestions: Option<String>,
        replacement: Option<D>,
    ) -> Result<Self, AppError> {
        let suggestions = editing_suggestions.filter(|s| !s.trim().is_empty());
        match (suggestions, replacement) {
            (Some(s), None) => Ok(ReviewInput::Feedback(s)),
            (None, Some(doc)) => Ok(ReviewInput::Replace(doc)),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "Provide either editing suggestions or an edited document, not both".to_string(),
            )),
            (None, None) => Err(AppError::Validation(
                "Provide editing suggestions or an edited document".to_string(),
            )),
        }
    }

    pub fn decision(&self) -> Option<Decision> {
        match self {
            ReviewInput::Done { decision, .. } => Some(*decision),
            _ => None,
        }
    }
}

/// Handles every workflow needs to make progress.
#[derive(Clone)]
pub struct WorkflowDeps {
    pub generator: Arc<dyn DocumentGenerator>,
    pub invoker: RetryingInvoker,
    pub source: Arc<dyn SourceMaterial>,
}

impl WorkflowDeps {
    /// First draft through the retrying invoker.
    pub async fn generate(
        &self,
        stage: &str,
        context: &GenerationContext,
    ) -> Result<GeneratedFragment, AppError> {
        self.invoker
            .invoke(stage, || self.generator.generate(context))
            .await
            .map_err(|e| AppError::from_llm(stage, e))
    }

    /// Revision through the retrying invoker.
    pub async fn edit(
        &self,
        stage: &str,
        schema: DocumentSchema,
        log: &MessageLog,
        feedback: &str,
    ) -> Result<GeneratedFragment, AppError> {
        self.invoker
            .invoke(stage, || self.generator.edit(schema, log.entries(), feedback))
            .await
            .map_err(|e| AppError::from_llm(stage, e))
    }
}

/// Validates service output against the target schema.
pub(crate) fn decode<T: DeserializeOwned>(
    stage: &str,
    value: serde_json::Value,
) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::SchemaViolation {
        stage: stage.to_string(),
        message: e.to_string(),
    })
}

/// Log entry for a service-produced version.
pub(crate) fn output_entry(data_json: &str, rationale: &str) -> ChatMessage {
    ChatMessage::assistant(format!(
        "```json\n{data_json}\n```\n\n**Explanation of Changes:**\n{rationale}"
    ))
}

/// Log entry for a human-written version.
pub(crate) fn replacement_entry(document_name: &str, data_json: &str) -> ChatMessage {
    let mut title = document_name.to_string();
    if let Some(first) = title.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    ChatMessage::user(format!(
        "I updated the {document_name} to better fit my needs.\n\n**{title}:**\n```json\n{data_json}\n```"
    ))
}

pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize document: {e}")))
}
