//! Single-document review loop: generate, then suspend for feedback until the
//! human is done. Used for job profiles and cover letters.

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::generation::{DocumentSchema, GenerationContext};
use crate::models::cover_letter::CoverLetter;
use crate::models::job_profile::JobProfile;
use crate::models::personal_info::PersonalInfo;
use crate::workflow::{
    decode, output_entry, replacement_entry, to_pretty_json, MessageLog, ReviewInput, Step,
    WorkflowDeps,
};

/// A document that goes through the linear review loop.
pub trait ReviewDocument: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const SCHEMA: DocumentSchema;

    /// Copy safe to log and send to the generation service.
    fn sanitized(&self) -> Self {
        self.clone()
    }

    /// Attaches personal information at finalization.
    fn attach_personal_info(&mut self, _info: PersonalInfo) {}

    fn needs_personal_info() -> bool {
        false
    }
}

impl ReviewDocument for JobProfile {
    const SCHEMA: DocumentSchema = DocumentSchema::JobProfile;
}

impl ReviewDocument for CoverLetter {
    const SCHEMA: DocumentSchema = DocumentSchema::CoverLetter;

    fn sanitized(&self) -> Self {
        self.anonymized()
    }

    fn attach_personal_info(&mut self, info: PersonalInfo) {
        self.personal_information = Some(info);
    }

    fn needs_personal_info() -> bool {
        true
    }
}

/// Durable state of a linear review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearReviewState<D> {
    pub log: MessageLog,
    /// Latest version, without personal information.
    pub document: D,
    pub done: bool,
}

impl<D: ReviewDocument> LinearReviewState<D> {
    /// Produces the first draft and suspends.
    pub async fn generate(
        context: &GenerationContext,
        deps: &WorkflowDeps,
    ) -> Result<(Self, Step<D>), AppError> {
        if context.schema() != D::SCHEMA {
            return Err(AppError::Internal(anyhow::anyhow!(
                "{} context given to the {} workflow",
                context.schema(),
                D::SCHEMA
            )));
        }

        let stage = format!("{} (generate)", D::SCHEMA);
        let fragment = deps.generate(&stage, context).await?;
        let document = decode::<D>(&stage, fragment.data)?.sanitized();

        let mut log = MessageLog::new();
        log.push(output_entry(&to_pretty_json(&document)?, &fragment.rationale));
        info!("Generated {}", D::SCHEMA);

        let state = Self {
            log,
            document: document.clone(),
            done: false,
        };
        Ok((state, Step::Suspended(document)))
    }

    /// Applies one human decision and drives the review to its next stop.
    ///
    /// On error `self` is dropped; the caller keeps its previous copy.
    pub async fn resume(
        mut self,
        input: ReviewInput<D>,
        deps: &WorkflowDeps,
    ) -> Result<(Self, Step<D>), AppError> {
        if self.done {
            return Err(AppError::InvalidTransition(format!(
                "The {} review is already complete",
                D::SCHEMA
            )));
        }

        match input {
            ReviewInput::Feedback(editing_suggestions) => {
                if editing_suggestions.trim().is_empty() {
                    return Err(AppError::Validation(
                        "Editing suggestions must not be empty".to_string(),
                    ));
                }
                let stage = format!("{} (edit)", D::SCHEMA);
                let fragment = deps
                    .edit(&stage, D::SCHEMA, &self.log, &editing_suggestions)
                    .await?;
                let document = decode::<D>(&stage, fragment.data)?.sanitized();
                self.log
                    .push(output_entry(&to_pretty_json(&document)?, &fragment.rationale));
                self.document = document;
                debug!("Revised {} ({} log entries)", D::SCHEMA, self.log.len());
            }
            ReviewInput::Replace(document) => {
                self.record_replacement(document)?;
            }
            ReviewInput::Done { replacement, .. } => {
                if let Some(document) = replacement {
                    self.record_replacement(document)?;
                }
                let mut finished = self.document.clone();
                if D::needs_personal_info() {
                    let personal = deps.source.personal_info().await?;
                    finished.attach_personal_info(personal);
                }
                self.done = true;
                info!("Completed {}", D::SCHEMA);
                return Ok((self, Step::Completed(finished)));
            }
        }

        let document = self.document.clone();
        Ok((self, Step::Suspended(document)))
    }

    fn record_replacement(&mut self, document: D) -> Result<(), AppError> {
        let document = document.sanitized();
        self.log.push(replacement_entry(
            &D::SCHEMA.to_string(),
            &to_pretty_json(&document)?,
        ));
        self.document = document;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::generation::testing::{RecordedCall, ScriptedGenerator};
    use crate::llm_client::{ChatRole, LlmError};
    use crate::models::resume::Resume;
    use crate::workflow::test_support::{deps_with, jane};
    use crate::workflow::Decision;

    fn job_context() -> GenerationContext {
        GenerationContext::JobProfile {
            job_description: "Acme is hiring a Rust engineer in Berlin.".to_string(),
        }
    }

    fn letter_json(opening: &str) -> serde_json::Value {
        json!({
            "company": "Acme",
            "position": "Rust Engineer",
            "opening_paragraph": opening,
            "body_paragraphs": ["I built things."],
            "closing_paragraph": "Thanks."
        })
    }

    fn done() -> ReviewInput<JobProfile> {
        ReviewInput::Done {
            replacement: None,
            decision: Decision::Save,
        }
    }

    #[tokio::test]
    async fn test_generate_edit_done_logs_one_entry_per_call() {
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_ok(
            DocumentSchema::JobProfile,
            json!({"company": "Acme", "position": "Rust Engineer"}),
            "straight from the posting",
        );
        generator.push_ok(
            DocumentSchema::JobProfile,
            json!({"company": "Acme", "position": "Rust Engineer", "languages": ["English"]}),
            "added languages",
        );
        let deps = deps_with(generator.clone(), Resume::default(), None);

        let (state, step) = LinearReviewState::<JobProfile>::generate(&job_context(), &deps)
            .await
            .unwrap();
        assert!(!step.is_completed());
        assert_eq!(state.log.len(), 1);

        let (state, step) = state
            .resume(ReviewInput::Feedback("add languages".to_string()), &deps)
            .await
            .unwrap();
        assert_eq!(
            step.document().languages,
            Some(vec!["English".to_string()])
        );
        assert_eq!(state.log.len(), 2);

        let (state, step) = state.resume(done(), &deps).await.unwrap();
        assert!(step.is_completed());
        assert!(state.done);
        assert_eq!(state.log.len(), 2);
        assert_eq!(generator.calls().len(), 2);

        // The edit saw the first draft only.
        assert!(matches!(
            &generator.calls()[1],
            RecordedCall::Edit { log, .. } if log.len() == 1 && log[0].role == ChatRole::Assistant
        ));
    }

    #[tokio::test]
    async fn test_replacement_is_logged_without_service_call() {
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_ok(DocumentSchema::JobProfile, json!({"company": "Acme"}), "ok");
        let deps = deps_with(generator.clone(), Resume::default(), None);
        let (state, _) = LinearReviewState::<JobProfile>::generate(&job_context(), &deps)
            .await
            .unwrap();

        let mine = JobProfile {
            company: Some("Acme GmbH".to_string()),
            ..Default::default()
        };
        let (state, step) = state
            .resume(ReviewInput::Replace(mine.clone()), &deps)
            .await
            .unwrap();

        assert_eq!(step.document(), &mine);
        assert_eq!(state.log.len(), 2);
        assert_eq!(state.log.last().map(|m| m.role), Some(ChatRole::User));
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_resume_after_done_is_invalid() {
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_ok(DocumentSchema::JobProfile, json!({}), "empty posting");
        let deps = deps_with(generator, Resume::default(), None);
        let (state, _) = LinearReviewState::<JobProfile>::generate(&job_context(), &deps)
            .await
            .unwrap();
        let (state, _) = state.resume(done(), &deps).await.unwrap();

        let err = state
            .resume(ReviewInput::Feedback("more".to_string()), &deps)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_edit_failure_keeps_previous_version() {
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_ok(DocumentSchema::JobProfile, json!({"company": "Acme"}), "ok");
        generator.push_ok(DocumentSchema::JobProfile, json!({"company": ["not", "text"]}), "bad");
        let deps = deps_with(generator, Resume::default(), None);
        let (state, _) = LinearReviewState::<JobProfile>::generate(&job_context(), &deps)
            .await
            .unwrap();
        let before = state.clone();

        let err = state
            .resume(ReviewInput::Feedback("rename".to_string()), &deps)
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::SchemaViolation { ref stage, .. } if stage == "job profile (edit)")
        );
        assert_eq!(before.document.company.as_deref(), Some("Acme"));
        assert_eq!(before.log.len(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_err(DocumentSchema::JobProfile, LlmError::RateLimited { retry_after: None });
        generator.push_ok(DocumentSchema::JobProfile, json!({"company": "Acme"}), "ok");
        let deps = deps_with(generator.clone(), Resume::default(), None);

        let (state, _) = LinearReviewState::<JobProfile>::generate(&job_context(), &deps)
            .await
            .unwrap();
        assert_eq!(state.document.company.as_deref(), Some("Acme"));
        assert_eq!(generator.calls_for(DocumentSchema::JobProfile), 2);
    }

    #[tokio::test]
    async fn test_cover_letter_personal_info_attached_only_on_completion() {
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_ok(DocumentSchema::CoverLetter, letter_json("Hello"), "first draft");
        let deps = deps_with(generator, Resume::default(), Some(jane()));
        let context = GenerationContext::CoverLetter {
            job_profile: JobProfile::default(),
            resume: Resume::default(),
            job_description: None,
        };

        let (state, step) = LinearReviewState::<CoverLetter>::generate(&context, &deps)
            .await
            .unwrap();
        assert!(step.document().personal_information.is_none());

        // A human edit carrying personal data is stripped before logging.
        let mut mine: CoverLetter = serde_json::from_value(letter_json("Dear team")).unwrap();
        mine.personal_information = Some(jane());
        let (state, step) = state
            .resume(
                ReviewInput::Done {
                    replacement: Some(mine),
                    decision: Decision::Save,
                },
                &deps,
            )
            .await
            .unwrap();

        assert!(state.document.personal_information.is_none());
        assert!(!state.log.entries().iter().any(|m| m.content.contains("jane@example.com")));
        let finished = step.into_document();
        assert_eq!(finished.opening_paragraph, "Dear team");
        assert_eq!(finished.personal_information, Some(jane()));
    }
}
