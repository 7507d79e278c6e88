//! Sessions: the unit of isolation for one candidate's refinement activity.
//!
//! A session owns the finalized documents produced so far and at most one
//! workflow state. The state is a closed set of typed fields; callers address
//! them through `SessionField`, parsed at the boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cover_letter::CoverLetter;
use crate::models::job_profile::JobProfile;
use crate::models::resume::Resume;
use crate::workflow::coordinator::ResumeWorkflowState;
use crate::workflow::linear::LinearReviewState;

pub mod handlers;
pub mod registry;
pub mod service;

// ────────────────────────────────────────────────────────────────────────────
// Identity and parameters
// ────────────────────────────────────────────────────────────────────────────

/// Opaque, collision-free session identifier (random UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    /// Tailored towards one job posting.
    JobApplication,
    /// Tailored towards role families, no posting.
    GeneralResume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    JobProfile,
    Resume,
    CoverLetter,
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkflowKind::JobProfile => "job profile",
            WorkflowKind::Resume => "resume",
            WorkflowKind::CoverLetter => "cover letter",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionParams {
    pub application_type: ApplicationType,
    /// Workflows this session will run.
    pub steps: Vec<WorkflowKind>,
}

impl SessionParams {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.steps.is_empty() {
            return Err(AppError::Validation(
                "A session needs at least one step".to_string(),
            ));
        }
        if self.application_type == ApplicationType::GeneralResume
            && self.steps.iter().any(|s| *s != WorkflowKind::Resume)
        {
            return Err(AppError::Validation(
                "A general resume session can only run the resume step".to_string(),
            ));
        }
        Ok(())
    }
}

/// Descriptive session metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub application_type: ApplicationType,
    pub steps: Vec<WorkflowKind>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub job_titles: Option<String>,
    #[serde(default)]
    pub focus_aspects: Option<String>,
}

impl SessionInfo {
    pub fn new(params: &SessionParams) -> Self {
        Self {
            application_type: params.application_type,
            steps: params.steps.clone(),
            created_at: Utc::now(),
            company: None,
            position: None,
            job_titles: None,
            focus_aspects: None,
        }
    }

    pub fn runs(&self, kind: WorkflowKind) -> bool {
        self.steps.contains(&kind)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Workflow state and session fields
// ────────────────────────────────────────────────────────────────────────────

/// The one workflow a session is running (or last ran).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowState {
    JobProfile(LinearReviewState<JobProfile>),
    Resume(ResumeWorkflowState),
    CoverLetter(LinearReviewState<CoverLetter>),
}

impl WorkflowState {
    pub fn kind(&self) -> WorkflowKind {
        match self {
            WorkflowState::JobProfile(_) => WorkflowKind::JobProfile,
            WorkflowState::Resume(_) => WorkflowKind::Resume,
            WorkflowState::CoverLetter(_) => WorkflowKind::CoverLetter,
        }
    }

    pub fn is_done(&self) -> bool {
        match self {
            WorkflowState::JobProfile(s) => s.done,
            WorkflowState::Resume(s) => s.done,
            WorkflowState::CoverLetter(s) => s.done,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub info: SessionInfo,
    pub job_description: Option<String>,
    pub job_profile: Option<JobProfile>,
    pub refined_resume: Option<Resume>,
    pub cover_letter: Option<CoverLetter>,
    pub workflow: Option<WorkflowState>,
}

impl Session {
    pub fn new(params: &SessionParams) -> Self {
        Self {
            id: SessionId::new(),
            info: SessionInfo::new(params),
            job_description: None,
            job_profile: None,
            refined_resume: None,
            cover_letter: None,
            workflow: None,
        }
    }

    /// The workflow awaiting human input, if any.
    pub fn suspended_workflow(&self) -> Option<&WorkflowState> {
        self.workflow.as_ref().filter(|w| !w.is_done())
    }

    pub fn field(&self, field: SessionField) -> SessionValue {
        match field {
            SessionField::Info => SessionValue::Info(self.info.clone()),
            SessionField::JobDescription => {
                SessionValue::JobDescription(self.job_description.clone())
            }
            SessionField::JobProfile => SessionValue::JobProfile(self.job_profile.clone()),
            SessionField::RefinedResume => SessionValue::RefinedResume(self.refined_resume.clone()),
            SessionField::CoverLetter => SessionValue::CoverLetter(self.cover_letter.clone()),
            SessionField::Workflow => SessionValue::Workflow(self.workflow.clone()),
        }
    }

    pub fn apply(&mut self, value: SessionValue) {
        match value {
            SessionValue::Info(v) => self.info = v,
            SessionValue::JobDescription(v) => self.job_description = v,
            SessionValue::JobProfile(v) => self.job_profile = v,
            SessionValue::RefinedResume(v) => self.refined_resume = v,
            SessionValue::CoverLetter(v) => self.cover_letter = v,
            SessionValue::Workflow(v) => self.workflow = v,
        }
    }
}

/// The closed set of addressable session fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    Info,
    JobDescription,
    JobProfile,
    RefinedResume,
    CoverLetter,
    Workflow,
}

impl SessionField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionField::Info => "info",
            SessionField::JobDescription => "job_description",
            SessionField::JobProfile => "job_profile",
            SessionField::RefinedResume => "refined_resume",
            SessionField::CoverLetter => "cover_letter",
            SessionField::Workflow => "workflow",
        }
    }
}

impl FromStr for SessionField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "info" => SessionField::Info,
            "job_description" => SessionField::JobDescription,
            "job_profile" => SessionField::JobProfile,
            "refined_resume" => SessionField::RefinedResume,
            "cover_letter" => SessionField::CoverLetter,
            "workflow" => SessionField::Workflow,
            other => return Err(AppError::UnknownField(other.to_string())),
        })
    }
}

/// Typed value of one session field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum SessionValue {
    Info(SessionInfo),
    JobDescription(Option<String>),
    JobProfile(Option<JobProfile>),
    RefinedResume(Option<Resume>),
    CoverLetter(Option<CoverLetter>),
    Workflow(Option<WorkflowState>),
}

impl SessionValue {
    pub fn field(&self) -> SessionField {
        match self {
            SessionValue::Info(_) => SessionField::Info,
            SessionValue::JobDescription(_) => SessionField::JobDescription,
            SessionValue::JobProfile(_) => SessionField::JobProfile,
            SessionValue::RefinedResume(_) => SessionField::RefinedResume,
            SessionValue::CoverLetter(_) => SessionField::CoverLetter,
            SessionValue::Workflow(_) => SessionField::Workflow,
        }
    }

    /// Checks the value against the invariants of its field.
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            SessionValue::Info(info) if info.steps.is_empty() => Err(AppError::Validation(
                "Session info needs at least one step".to_string(),
            )),
            SessionValue::JobDescription(Some(text)) if text.trim().is_empty() => Err(
                AppError::Validation("Job description must not be blank".to_string()),
            ),
            SessionValue::RefinedResume(Some(resume)) if resume.present_sections().is_empty() => {
                Err(AppError::Validation(
                    "A refined resume needs at least one section".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SessionParams {
        SessionParams {
            application_type: ApplicationType::JobApplication,
            steps: vec![WorkflowKind::JobProfile, WorkflowKind::Resume],
        }
    }

    #[test]
    fn test_session_id_parses_its_display() {
        let id = SessionId::new();
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_session_field_rejects_unknown_names() {
        for field in [
            SessionField::Info,
            SessionField::JobDescription,
            SessionField::JobProfile,
            SessionField::RefinedResume,
            SessionField::CoverLetter,
            SessionField::Workflow,
        ] {
            assert_eq!(field.as_str().parse::<SessionField>().unwrap(), field);
        }
        let err = "resume_draft".parse::<SessionField>().unwrap_err();
        assert!(matches!(err, AppError::UnknownField(ref f) if f == "resume_draft"));
    }

    #[test]
    fn test_params_require_a_step() {
        let mut p = params();
        assert!(p.validate().is_ok());
        p.steps.clear();
        assert!(matches!(p.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_general_resume_runs_only_the_resume_step() {
        let p = SessionParams {
            application_type: ApplicationType::GeneralResume,
            steps: vec![WorkflowKind::Resume, WorkflowKind::CoverLetter],
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_apply_then_field_returns_value() {
        let mut session = Session::new(&params());
        session.apply(SessionValue::JobDescription(Some("Rust role".to_string())));
        assert_eq!(
            session.field(SessionField::JobDescription),
            SessionValue::JobDescription(Some("Rust role".to_string()))
        );
        assert!(session.suspended_workflow().is_none());
    }

    #[test]
    fn test_session_value_serializes_with_field_tag() {
        let value = serde_json::to_value(SessionValue::JobDescription(None)).unwrap();
        assert_eq!(value["field"], "job_description");
        assert!(value["value"].is_null());
    }
}
