//! Document generation: the boundary to the external text-generation service.
//!
//! Workflows never talk to the model directly: they hand a `GenerationContext`
//! (first draft) or a conversation log plus feedback (edit) to a
//! `DocumentGenerator`, wrapped by `RetryingInvoker`, and validate the
//! returned `data` against the typed schema themselves.
//!
//! `AppState` holds an `Arc<dyn DocumentGenerator>`; the production backend is
//! `LlmDocumentGenerator`.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm_client::{ChatMessage, LlmError};
use crate::models::job_profile::JobProfile;
use crate::models::resume::{Resume, SectionKey};

pub mod llm_generator;
pub mod prompts;
#[cfg(test)]
pub mod testing;

/// Target structure of a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "schema", content = "section", rename_all = "snake_case")]
pub enum DocumentSchema {
    JobProfile,
    ResumeSection(SectionKey),
    /// Professional summary written over the finished resume.
    ResumeSummary,
    CoverLetter,
}

impl fmt::Display for DocumentSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSchema::JobProfile => f.write_str("job profile"),
            DocumentSchema::ResumeSection(key) => write!(f, "{} section", key.display_name()),
            DocumentSchema::ResumeSummary => f.write_str("professional summary"),
            DocumentSchema::CoverLetter => f.write_str("cover letter"),
        }
    }
}

/// What a resume round is tailored towards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RefinementTarget {
    /// Tailor towards one concrete job.
    WithJob { job_profile: JobProfile },
    /// Tailor towards a family of roles; both strings may be empty.
    WithoutJob {
        job_titles: String,
        focus_aspects: String,
    },
}

/// Source context for a first draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GenerationContext {
    JobProfile {
        job_description: String,
    },
    ResumeSection {
        section: SectionKey,
        /// The section's entries from the source resume.
        candidate_data: Value,
        target: RefinementTarget,
    },
    CoverLetter {
        job_profile: JobProfile,
        /// Refined resume without personal information.
        resume: Resume,
        /// Original posting, for tone only.
        job_description: Option<String>,
    },
    /// Assembled resume at completion, without personal information.
    ResumeSummary {
        resume: Resume,
    },
}

impl GenerationContext {
    pub fn schema(&self) -> DocumentSchema {
        match self {
            GenerationContext::JobProfile { .. } => DocumentSchema::JobProfile,
            GenerationContext::ResumeSection { section, .. } => {
                DocumentSchema::ResumeSection(*section)
            }
            GenerationContext::ResumeSummary { .. } => DocumentSchema::ResumeSummary,
            GenerationContext::CoverLetter { .. } => DocumentSchema::CoverLetter,
        }
    }
}

/// Structured result of one generation call, not yet validated against the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedFragment {
    pub data: Value,
    pub rationale: String,
}

/// The external text-generation service. Implement this to swap backends
/// without touching the workflows.
#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    /// Writes a first draft from source material.
    async fn generate(&self, context: &GenerationContext) -> Result<GeneratedFragment, LlmError>;

    /// Revises the latest version in `log` according to `feedback`.
    async fn edit(
        &self,
        schema: DocumentSchema,
        log: &[ChatMessage],
        feedback: &str,
    ) -> Result<GeneratedFragment, LlmError>;
}
