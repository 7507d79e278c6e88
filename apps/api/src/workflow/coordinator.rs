//! Resume coordinator: fans out one section workflow per present section,
//! joins their reports, and routes single-section edits afterwards.
//!
//! Fan-out runs every section concurrently and waits for all of them. A round
//! is all-or-nothing: if any section fails, the whole round fails with
//! `SectionRoundAborted` and no state is produced.
//!
//! Completion makes one more service call that writes the professional summary
//! over the assembled resume; personal information is attached after it.

use std::collections::BTreeMap;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::{GenerationContext, RefinementTarget};
use crate::llm_client::ChatMessage;
use crate::models::resume::{Prose, Resume, SectionData, SectionKey};
use crate::workflow::section::{SectionActivation, SectionReport, SectionWorkflowState};
use crate::workflow::{decode, Decision, MessageLog, Step, WorkflowDeps};

/// Human decision at the coordinator's suspension point.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionCommand {
    /// Revise one section from free-text feedback.
    Edit {
        section_key: SectionKey,
        editing_suggestions: String,
    },
    /// Take a human-written version of one section.
    Replace { data: SectionData },
    /// Finish the round, optionally with a last human edit of the whole resume.
    Done {
        replacement: Option<Resume>,
        decision: Decision,
    },
}

impl SectionCommand {
    pub fn decision(&self) -> Option<Decision> {
        match self {
            SectionCommand::Done { decision, .. } => Some(*decision),
            _ => None,
        }
    }
}

/// Durable state of one resume round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeWorkflowState {
    pub target: RefinementTarget,
    /// Round-level log: the target, then one report entry per section result.
    pub log: MessageLog,
    /// Exactly the sections present in the source resume.
    pub sections: BTreeMap<SectionKey, SectionWorkflowState>,
    pub done: bool,
}

impl ResumeWorkflowState {
    /// Starts a round: one concurrent writer per present section of `source`.
    ///
    /// `source` is expected without personal information.
    pub async fn fan_out(
        source: &Resume,
        target: RefinementTarget,
        deps: &WorkflowDeps,
    ) -> Result<Self, AppError> {
        let present = source.present_sections();
        if present.is_empty() {
            return Err(AppError::Validation(
                "The source resume has no sections to refine".to_string(),
            ));
        }

        let mut log = MessageLog::new();
        log.push(ChatMessage::user(describe_target(&target)?));

        let mut states = Vec::with_capacity(present.len());
        let mut candidates = Vec::with_capacity(present.len());
        for key in &present {
            let entries = serde_json::to_value(source.section(*key)).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to serialize {key} entries: {e}"))
            })?;
            states.push(SectionWorkflowState::seeded(*key, &log));
            candidates.push(entries);
        }

        info!("Dispatching {} resume sections: {:?}", present.len(), present);
        let target_ref = &target;
        let outcomes = join_all(states.iter_mut().zip(candidates).map(
            |(state, candidate_data)| {
                state.activate(
                    SectionActivation::Write {
                        candidate_data,
                        target: target_ref,
                    },
                    deps,
                )
            },
        ))
        .await;

        let mut reports: Vec<SectionReport> = Vec::with_capacity(outcomes.len());
        let mut failure: Option<(SectionKey, AppError)> = None;
        for (key, outcome) in present.iter().zip(outcomes) {
            match outcome {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!("Section {key} failed during fan-out: {e}");
                    if failure.is_none() {
                        failure = Some((*key, e));
                    }
                }
            }
        }
        if let Some((section, source)) = failure {
            let completed: Vec<SectionKey> = reports.iter().map(|r| r.key).collect();
            warn!("Abandoning resume round; completed sections were {completed:?}");
            return Err(AppError::SectionRoundAborted {
                section,
                completed,
                source: Box::new(source),
            });
        }

        for report in &reports {
            log.push(report_entry(report));
        }
        let sections = states.into_iter().map(|s| (s.key, s)).collect();

        Ok(Self {
            target,
            log,
            sections,
            done: false,
        })
    }

    /// Keys of the sections dispatched in this round.
    pub fn dispatched(&self) -> Vec<SectionKey> {
        self.sections.keys().copied().collect()
    }

    /// The current resume, built only from dispatched sections.
    pub fn assembled(&self) -> Resume {
        Resume::from_sections(self.sections.values().filter_map(|s| s.data.clone()))
    }

    /// Applies one human decision and drives the round to its next stop.
    ///
    /// On error `self` is dropped; the caller keeps its previous copy.
    pub async fn resume(
        mut self,
        command: SectionCommand,
        deps: &WorkflowDeps,
    ) -> Result<(Self, Step<Resume>), AppError> {
        if self.done {
            return Err(AppError::InvalidTransition(
                "The resume round is already complete".to_string(),
            ));
        }

        match command {
            SectionCommand::Edit {
                section_key,
                editing_suggestions,
            } => {
                let report = self
                    .section_mut(section_key)?
                    .activate(SectionActivation::Edit { editing_suggestions }, deps)
                    .await?;
                self.log.push(report_entry(&report));
                info!("Re-ran the {} section", section_key.display_name());
            }
            SectionCommand::Replace { data } => {
                let key = data.key();
                let report = self
                    .section_mut(key)?
                    .activate(SectionActivation::Replace { data }, deps)
                    .await?;
                self.log.push(report_entry(&report));
            }
            SectionCommand::Done { replacement, .. } => {
                let (finished, rationale) = self.finalize(replacement, deps).await?;
                self.log
                    .push(ChatMessage::assistant(format!("**Professional Summary:** {rationale}")));
                self.done = true;
                return Ok((self, Step::Completed(finished)));
            }
        }

        let document = self.assembled();
        Ok((self, Step::Suspended(document)))
    }

    fn section_mut(&mut self, key: SectionKey) -> Result<&mut SectionWorkflowState, AppError> {
        self.sections.get_mut(&key).ok_or_else(|| {
            AppError::InvalidTransition(format!(
                "The {} section was not part of this resume round",
                key.display_name()
            ))
        })
    }

    async fn finalize(
        &self,
        replacement: Option<Resume>,
        deps: &WorkflowDeps,
    ) -> Result<(Resume, String), AppError> {
        let mut finished = self.assembled();
        if let Some(edited) = replacement {
            for key in edited.present_sections() {
                if !self.sections.contains_key(&key) {
                    return Err(AppError::InvalidTransition(format!(
                        "The {} section was not part of this resume round",
                        key.display_name()
                    )));
                }
            }
            for data in edited.present_sections().into_iter().filter_map(|k| edited.section(k)) {
                finished.set_section(data);
            }
        }

        let stage = "professional summary (compiler)";
        let context = GenerationContext::ResumeSummary {
            resume: finished.clone(),
        };
        let fragment = deps.generate(stage, &context).await?;
        let summary: Prose = decode(stage, fragment.data)?;
        finished.professional_summary = Some(summary);

        let personal = deps.source.personal_info().await?;
        finished.personal_information = Some(personal);
        Ok((finished, fragment.rationale))
    }
}

fn describe_target(target: &RefinementTarget) -> Result<String, AppError> {
    let text = match target {
        RefinementTarget::WithJob { job_profile } => format!(
            "Refine my resume for this job profile:\n```json\n{}\n```",
            serde_json::to_string_pretty(job_profile).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to serialize job profile: {e}"))
            })?
        ),
        RefinementTarget::WithoutJob {
            job_titles,
            focus_aspects,
        } => format!(
            "Refine my resume for roles such as: {job_titles}\nAspects to emphasize: {focus_aspects}"
        ),
    };
    Ok(text)
}

fn report_entry(report: &SectionReport) -> ChatMessage {
    let name = report.key.display_name();
    match &report.rationale {
        Some(rationale) => ChatMessage::assistant(format!("**{name}:** {rationale}")),
        None => ChatMessage::user(format!("I replaced the {name} section myself.")),
    }
}
