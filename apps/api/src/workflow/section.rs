//! Section workflow: refines one resume section per activation.
//!
//! An activation routes to the writer (first draft from the source entries),
//! the editor (revision of the latest version from feedback), or records a
//! human replacement. It ends by reporting the section data to the parent
//! coordinator. The state is only mutated once the step has succeeded.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::AppError;
use crate::generation::{DocumentSchema, GenerationContext, RefinementTarget};
use crate::models::resume::{SectionData, SectionKey};
use crate::workflow::{output_entry, replacement_entry, MessageLog, WorkflowDeps};

/// Durable state of one section's workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionWorkflowState {
    pub key: SectionKey,
    pub log: MessageLog,
    /// Latest version; `None` until the writer has run.
    pub data: Option<SectionData>,
    /// Whether the last activation went through the editor.
    pub edit: bool,
}

/// Why the section is being activated.
#[derive(Debug, Clone)]
pub enum SectionActivation<'a> {
    Write {
        candidate_data: Value,
        target: &'a RefinementTarget,
    },
    Edit {
        editing_suggestions: String,
    },
    Replace {
        data: SectionData,
    },
}

/// What a section hands back to its coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionReport {
    pub key: SectionKey,
    pub data: SectionData,
    /// Present when the generation service produced this version.
    pub rationale: Option<String>,
}

impl SectionWorkflowState {
    /// New section state seeded with the parent's log.
    pub fn seeded(key: SectionKey, parent_log: &MessageLog) -> Self {
        Self {
            key,
            log: parent_log.clone(),
            data: None,
            edit: false,
        }
    }

    pub fn schema(&self) -> DocumentSchema {
        DocumentSchema::ResumeSection(self.key)
    }

    pub async fn activate(
        &mut self,
        activation: SectionActivation<'_>,
        deps: &WorkflowDeps,
    ) -> Result<SectionReport, AppError> {
        match activation {
            SectionActivation::Write {
                candidate_data,
                target,
            } => self.write(candidate_data, target, deps).await,
            SectionActivation::Edit {
                editing_suggestions,
            } => self.revise(&editing_suggestions, deps).await,
            SectionActivation::Replace { data } => self.replace(data),
        }
    }

    async fn write(
        &mut self,
        candidate_data: Value,
        target: &RefinementTarget,
        deps: &WorkflowDeps,
    ) -> Result<SectionReport, AppError> {
        let stage = format!("{} (writer)", self.schema());
        let context = GenerationContext::ResumeSection {
            section: self.key,
            candidate_data,
            target: target.clone(),
        };
        let fragment = deps.generate(&stage, &context).await?;
        let data = self.validate(&stage, fragment.data)?;

        self.log
            .push(output_entry(&data.to_pretty_json(), &fragment.rationale));
        self.data = Some(data.clone());
        self.edit = false;
        debug!("Wrote {} with {} entries", self.schema(), data.len());
        Ok(self.report(data, Some(fragment.rationale)))
    }

    async fn revise(
        &mut self,
        editing_suggestions: &str,
        deps: &WorkflowDeps,
    ) -> Result<SectionReport, AppError> {
        if self.data.is_none() {
            return Err(AppError::InvalidTransition(format!(
                "The {} section has not been written yet",
                self.key.display_name()
            )));
        }
        if editing_suggestions.trim().is_empty() {
            return Err(AppError::Validation(
                "Editing suggestions must not be empty".to_string(),
            ));
        }

        let stage = format!("{} (editor)", self.schema());
        let fragment = deps
            .edit(&stage, self.schema(), &self.log, editing_suggestions)
            .await?;
        let data = self.validate(&stage, fragment.data)?;

        self.log
            .push(output_entry(&data.to_pretty_json(), &fragment.rationale));
        self.data = Some(data.clone());
        self.edit = true;
        debug!("Edited {}", self.schema());
        Ok(self.report(data, Some(fragment.rationale)))
    }

    fn replace(&mut self, data: SectionData) -> Result<SectionReport, AppError> {
        if data.key() != self.key {
            return Err(AppError::Validation(format!(
                "Replacement holds {} entries, expected {}",
                data.key(),
                self.key
            )));
        }
        self.log.push(replacement_entry(
            &format!("{} section", self.key.display_name()),
            &data.to_pretty_json(),
        ));
        self.data = Some(data.clone());
        self.edit = true;
        Ok(self.report(data, None))
    }

    fn validate(&self, stage: &str, value: Value) -> Result<SectionData, AppError> {
        SectionData::from_value(self.key, value).map_err(|e| AppError::SchemaViolation {
            stage: stage.to_string(),
            message: e.to_string(),
        })
    }

    fn report(&self, data: SectionData, rationale: Option<String>) -> SectionReport {
        SectionReport {
            key: self.key,
            data,
            rationale,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::generation::testing::{RecordedCall, ScriptedGenerator};
    use crate::llm_client::{ChatMessage, ChatRole, LlmError};
    use crate::models::resume::Resume;
    use crate::workflow::test_support::deps_with;

    fn general_target() -> RefinementTarget {
        RefinementTarget::WithoutJob {
            job_titles: "Backend Engineer".to_string(),
            focus_aspects: String::new(),
        }
    }

    fn projects(names: &[&str]) -> Value {
        Value::Array(names.iter().map(|n| json!({"name": n})).collect())
    }

    #[tokio::test]
    async fn test_write_then_edit_appends_one_entry_each() {
        let generator = Arc::new(ScriptedGenerator::new());
        let schema = DocumentSchema::ResumeSection(SectionKey::Projects);
        generator.push_ok(schema, projects(&["tailor"]), "dropped the rest");
        generator.push_ok(schema, projects(&["tailor", "forge"]), "added forge back");
        let deps = deps_with(generator.clone(), Resume::default(), None);

        let mut parent = MessageLog::new();
        parent.push(ChatMessage::user("round target"));
        let mut state = SectionWorkflowState::seeded(SectionKey::Projects, &parent);
        let target = general_target();

        let report = state
            .activate(
                SectionActivation::Write {
                    candidate_data: projects(&["tailor", "forge", "misc"]),
                    target: &target,
                },
                &deps,
            )
            .await
            .unwrap();
        assert_eq!(report.data.len(), 1);
        assert_eq!(report.rationale.as_deref(), Some("dropped the rest"));
        assert!(!state.edit);
        assert_eq!(state.log.len(), 2);

        let report = state
            .activate(
                SectionActivation::Edit {
                    editing_suggestions: "keep forge".to_string(),
                },
                &deps,
            )
            .await
            .unwrap();
        assert_eq!(report.data.len(), 2);
        assert!(state.edit);
        assert_eq!(state.log.len(), 3);
        assert_eq!(state.log.last().map(|m| m.role), Some(ChatRole::Assistant));

        // The editor sees the seeded entry and the first draft.
        match &generator.calls()[1] {
            RecordedCall::Edit { log, feedback, .. } => {
                assert_eq!(log.len(), 2);
                assert_eq!(log[0].content, "round target");
                assert_eq!(feedback, "keep forge");
            }
            other => panic!("expected an edit call, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replace_makes_no_service_call() {
        let generator = Arc::new(ScriptedGenerator::new());
        let deps = deps_with(generator.clone(), Resume::default(), None);
        let mut state = SectionWorkflowState::seeded(SectionKey::Projects, &MessageLog::new());
        let target = general_target();
        state
            .activate(
                SectionActivation::Write {
                    candidate_data: projects(&["tailor"]),
                    target: &target,
                },
                &deps,
            )
            .await
            .unwrap();

        let mine = SectionData::from_value(SectionKey::Projects, projects(&["mine"])).unwrap();
        let report = state
            .activate(SectionActivation::Replace { data: mine.clone() }, &deps)
            .await
            .unwrap();

        assert_eq!(report.data, mine);
        assert_eq!(report.rationale, None);
        assert_eq!(state.data, Some(mine));
        assert_eq!(state.log.last().map(|m| m.role), Some(ChatRole::User));
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_rejects_other_section() {
        let deps = deps_with(Arc::new(ScriptedGenerator::new()), Resume::default(), None);
        let mut state = SectionWorkflowState::seeded(SectionKey::Projects, &MessageLog::new());
        let err = state
            .activate(
                SectionActivation::Replace {
                    data: SectionData::Education(vec![]),
                },
                &deps,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(state.log.is_empty());
    }

    #[tokio::test]
    async fn test_edit_before_write_is_invalid() {
        let deps = deps_with(Arc::new(ScriptedGenerator::new()), Resume::default(), None);
        let mut state = SectionWorkflowState::seeded(SectionKey::Education, &MessageLog::new());
        let err = state
            .activate(
                SectionActivation::Edit {
                    editing_suggestions: "add GPA".to_string(),
                },
                &deps,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_schema_violation_leaves_state_untouched() {
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_ok(
            DocumentSchema::ResumeSection(SectionKey::Education),
            json!({"not": "a list"}),
            "oops",
        );
        let deps = deps_with(generator, Resume::default(), None);
        let mut state = SectionWorkflowState::seeded(SectionKey::Education, &MessageLog::new());
        let target = general_target();

        let err = state
            .activate(
                SectionActivation::Write {
                    candidate_data: json!([]),
                    target: &target,
                },
                &deps,
            )
            .await
            .unwrap_err();

        assert!(
            matches!(err, AppError::SchemaViolation { ref stage, .. } if stage == "education section (writer)")
        );
        assert!(state.data.is_none());
        assert!(state.log.is_empty());
    }

    #[tokio::test]
    async fn test_non_retryable_failure_surfaces_after_one_call() {
        let generator = Arc::new(ScriptedGenerator::new());
        let schema = DocumentSchema::ResumeSection(SectionKey::Projects);
        generator.push_err(
            schema,
            LlmError::Api {
                status: 400,
                message: "bad request".to_string(),
            },
        );
        let deps = deps_with(generator.clone(), Resume::default(), None);
        let mut state = SectionWorkflowState::seeded(SectionKey::Projects, &MessageLog::new());
        let target = general_target();

        let result = state
            .activate(
                SectionActivation::Write {
                    candidate_data: json!([]),
                    target: &target,
                },
                &deps,
            )
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(generator.calls_for(schema), 1);
    }
}
