//! `TailorService`: the engine surface callers drive.
//!
//! Every call snapshots the session, drives the active workflow to its next
//! stop without holding any lock, then writes the new state back in one
//! `set_fields`. A failed call writes nothing, so the session keeps its last
//! good state and stays deletable.

use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::generation::{GenerationContext, RefinementTarget};
use crate::models::cover_letter::CoverLetter;
use crate::models::job_profile::JobProfile;
use crate::models::resume::Resume;
use crate::session::registry::SessionRegistry;
use crate::session::{
    ApplicationType, SessionField, SessionId, SessionInfo, SessionParams, SessionValue,
    WorkflowKind, WorkflowState,
};
use crate::workflow::coordinator::{ResumeWorkflowState, SectionCommand};
use crate::workflow::linear::LinearReviewState;
use crate::workflow::{Decision, ReviewInput, Step, WorkflowDeps};

/// Source context that seeds a workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceContext {
    JobProfile {
        job_description: String,
    },
    Resume {
        job_titles: Option<String>,
        focus_aspects: Option<String>,
    },
    CoverLetter,
}

impl SourceContext {
    pub fn kind(&self) -> WorkflowKind {
        match self {
            SourceContext::JobProfile { .. } => WorkflowKind::JobProfile,
            SourceContext::Resume { .. } => WorkflowKind::Resume,
            SourceContext::CoverLetter => WorkflowKind::CoverLetter,
        }
    }
}

/// Human decision for the suspended workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeInput {
    JobProfile(ReviewInput<JobProfile>),
    Resume(SectionCommand),
    CoverLetter(ReviewInput<CoverLetter>),
}

impl ResumeInput {
    pub fn kind(&self) -> WorkflowKind {
        match self {
            ResumeInput::JobProfile(_) => WorkflowKind::JobProfile,
            ResumeInput::Resume(_) => WorkflowKind::Resume,
            ResumeInput::CoverLetter(_) => WorkflowKind::CoverLetter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    JobProfile(JobProfile),
    Resume(Resume),
    CoverLetter(CoverLetter),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowOutput {
    /// Awaiting the next human decision.
    Suspended { document: Document },
    /// Terminal. With `discard` the document was not kept in the session.
    Completed {
        document: Document,
        decision: Decision,
    },
}

impl WorkflowOutput {
    fn from_step<D>(step: Step<D>, decision: Option<Decision>, wrap: fn(D) -> Document) -> Self {
        match step {
            Step::Suspended(doc) => WorkflowOutput::Suspended {
                document: wrap(doc),
            },
            Step::Completed(doc) => WorkflowOutput::Completed {
                document: wrap(doc),
                decision: decision.unwrap_or_default(),
            },
        }
    }
}

/// Everything a finished session produced, handed to whoever persists or
/// renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedApplication {
    pub session_id: SessionId,
    pub info: SessionInfo,
    pub job_profile: Option<JobProfile>,
    pub refined_resume: Option<Resume>,
    pub cover_letter: Option<CoverLetter>,
}

#[derive(Clone)]
pub struct TailorService {
    registry: SessionRegistry,
    deps: WorkflowDeps,
}

impl TailorService {
    pub fn new(registry: SessionRegistry, deps: WorkflowDeps) -> Self {
        Self { registry, deps }
    }

    pub fn start_session(&self, params: &SessionParams) -> Result<SessionId, AppError> {
        self.registry.create(params)
    }

    pub fn get_field(&self, id: SessionId, field: SessionField) -> Result<SessionValue, AppError> {
        self.registry.get_field(id, field)
    }

    /// Deletes the session and all in-flight state.
    pub fn discard(&self, id: SessionId) -> Result<(), AppError> {
        self.registry.delete(id)
    }

    /// Starts a workflow and drives it to its first suspension point.
    pub async fn generate(
        &self,
        id: SessionId,
        context: SourceContext,
    ) -> Result<WorkflowOutput, AppError> {
        let session = self.registry.snapshot(id)?;
        let kind = context.kind();
        if !session.info.runs(kind) {
            return Err(AppError::InvalidTransition(format!(
                "This session does not run the {kind} step"
            )));
        }
        if let Some(active) = session.suspended_workflow() {
            return Err(AppError::InvalidTransition(format!(
                "The {} workflow is still awaiting input",
                active.kind()
            )));
        }
        info!(session_id = %id, workflow = %kind, "Generating");

        let (values, document) = match context {
            SourceContext::JobProfile { job_description } => {
                if job_description.trim().is_empty() {
                    return Err(AppError::Validation(
                        "Job description must not be blank".to_string(),
                    ));
                }
                let context = GenerationContext::JobProfile {
                    job_description: job_description.clone(),
                };
                let (state, step) =
                    LinearReviewState::<JobProfile>::generate(&context, &self.deps).await?;
                (
                    vec![
                        SessionValue::JobDescription(Some(job_description)),
                        SessionValue::Workflow(Some(WorkflowState::JobProfile(state))),
                    ],
                    Document::JobProfile(step.into_document()),
                )
            }
            SourceContext::Resume {
                job_titles,
                focus_aspects,
            } => {
                let mut info = session.info.clone();
                let target = match info.application_type {
                    ApplicationType::JobApplication => RefinementTarget::WithJob {
                        job_profile: session.job_profile.clone().ok_or_else(|| {
                            AppError::InvalidTransition(
                                "Finalize the job profile before refining the resume".to_string(),
                            )
                        })?,
                    },
                    ApplicationType::GeneralResume => {
                        let job_titles = job_titles.unwrap_or_default();
                        let focus_aspects = focus_aspects.unwrap_or_default();
                        info.job_titles = Some(job_titles.clone());
                        info.focus_aspects = Some(focus_aspects.clone());
                        RefinementTarget::WithoutJob {
                            job_titles,
                            focus_aspects,
                        }
                    }
                };
                let source = self.deps.source.full_resume().await?;
                let state = ResumeWorkflowState::fan_out(&source, target, &self.deps).await?;
                info!(session_id = %id, sections = ?state.dispatched(), "Resume sections refined");
                let document = Document::Resume(state.assembled());
                (
                    vec![
                        SessionValue::Info(info),
                        SessionValue::Workflow(Some(WorkflowState::Resume(state))),
                    ],
                    document,
                )
            }
            SourceContext::CoverLetter => {
                let job_profile = session.job_profile.clone().ok_or_else(|| {
                    AppError::InvalidTransition(
                        "Finalize the job profile before writing a cover letter".to_string(),
                    )
                })?;
                let resume = session.refined_resume.as_ref().ok_or_else(|| {
                    AppError::InvalidTransition(
                        "Finalize the resume before writing a cover letter".to_string(),
                    )
                })?;
                let context = GenerationContext::CoverLetter {
                    job_profile,
                    resume: resume.anonymized(),
                    job_description: session.job_description.clone(),
                };
                let (state, step) =
                    LinearReviewState::<CoverLetter>::generate(&context, &self.deps).await?;
                (
                    vec![SessionValue::Workflow(Some(WorkflowState::CoverLetter(state)))],
                    Document::CoverLetter(step.into_document()),
                )
            }
        };

        self.registry.set_fields(id, values)?;
        info!(session_id = %id, workflow = %kind, "Suspended for review");
        Ok(WorkflowOutput::Suspended { document })
    }

    /// Feeds one human decision to the suspended workflow.
    pub async fn resume(&self, id: SessionId, input: ResumeInput) -> Result<WorkflowOutput, AppError> {
        let session = self.registry.snapshot(id)?;
        let active = session.suspended_workflow().cloned().ok_or_else(|| {
            AppError::InvalidTransition("No workflow is awaiting input".to_string())
        })?;
        let kind = input.kind();
        info!(session_id = %id, workflow = %kind, "Resuming");

        let mut values = Vec::new();
        let output = match (active, input) {
            (WorkflowState::JobProfile(state), ResumeInput::JobProfile(input)) => {
                let decision = input.decision();
                let (state, step) = state.resume(input, &self.deps).await?;
                if let Step::Completed(profile) = &step {
                    if decision == Some(Decision::Save) {
                        let mut info = session.info.clone();
                        info.company = profile.company.clone();
                        info.position = profile.position.clone();
                        values.push(SessionValue::JobProfile(Some(profile.clone())));
                        values.push(SessionValue::Info(info));
                    } else {
                        values.push(SessionValue::JobProfile(None));
                        values.push(SessionValue::JobDescription(None));
                    }
                }
                values.push(SessionValue::Workflow(Some(WorkflowState::JobProfile(state))));
                WorkflowOutput::from_step(step, decision, Document::JobProfile)
            }
            (WorkflowState::Resume(state), ResumeInput::Resume(command)) => {
                let decision = command.decision();
                let (state, step) = state.resume(command, &self.deps).await?;
                if let Step::Completed(resume) = &step {
                    let kept = (decision == Some(Decision::Save)).then(|| resume.clone());
                    values.push(SessionValue::RefinedResume(kept));
                }
                values.push(SessionValue::Workflow(Some(WorkflowState::Resume(state))));
                WorkflowOutput::from_step(step, decision, Document::Resume)
            }
            (WorkflowState::CoverLetter(state), ResumeInput::CoverLetter(input)) => {
                let decision = input.decision();
                let (state, step) = state.resume(input, &self.deps).await?;
                if let Step::Completed(letter) = &step {
                    let kept = (decision == Some(Decision::Save)).then(|| letter.clone());
                    values.push(SessionValue::CoverLetter(kept));
                }
                values.push(SessionValue::Workflow(Some(WorkflowState::CoverLetter(state))));
                WorkflowOutput::from_step(step, decision, Document::CoverLetter)
            }
            (active, _) => {
                return Err(AppError::InvalidTransition(format!(
                    "The {} workflow is awaiting input, not the {kind} workflow",
                    active.kind()
                )))
            }
        };

        self.registry.set_fields(id, values)?;
        match &output {
            WorkflowOutput::Suspended { .. } => {
                info!(session_id = %id, workflow = %kind, "Suspended for review")
            }
            WorkflowOutput::Completed { decision, .. } => {
                info!(session_id = %id, workflow = %kind, ?decision, "Workflow completed")
            }
        }
        Ok(output)
    }

    /// Hands over every finalized document and deletes the session.
    pub fn finish(&self, id: SessionId) -> Result<FinishedApplication, AppError> {
        let session = self.registry.snapshot(id)?;
        if let Some(active) = session.suspended_workflow() {
            return Err(AppError::InvalidTransition(format!(
                "The {} workflow is still awaiting input",
                active.kind()
            )));
        }
        for step in &session.info.steps {
            let finished = match step {
                WorkflowKind::JobProfile => session.job_profile.is_some(),
                WorkflowKind::Resume => session.refined_resume.is_some(),
                WorkflowKind::CoverLetter => session.cover_letter.is_some(),
            };
            if !finished {
                return Err(AppError::InvalidTransition(format!(
                    "The {step} step has no saved result"
                )));
            }
        }

        self.registry.delete(id)?;
        info!(session_id = %id, "Application finished");
        Ok(FinishedApplication {
            session_id: id,
            info: session.info,
            job_profile: session.job_profile,
            refined_resume: session.refined_resume,
            cover_letter: session.cover_letter,
        })
    }
}
