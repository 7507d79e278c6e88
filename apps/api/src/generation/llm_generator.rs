//! Claude-backed `DocumentGenerator`.

use async_trait::async_trait;
use tracing::debug;

use crate::generation::prompts::{
    COVER_LETTER_SYSTEM, COVER_LETTER_WRITER_TEMPLATE, EDITOR_SYSTEM, EDITOR_TEMPLATE,
    JOB_PROFILE_EXTRACT_TEMPLATE, JOB_PROFILE_SYSTEM, RESUME_SUMMARY_SYSTEM,
    RESUME_SUMMARY_TEMPLATE, SECTION_WRITER_SYSTEM, SECTION_WRITER_TEMPLATE, TARGET_WITHOUT_JOB_TEMPLATE, TARGET_WITH_JOB_TEMPLATE,
};
use crate::generation::{
    DocumentGenerator, DocumentSchema, GeneratedFragment, GenerationContext, RefinementTarget,
};
use crate::llm_client::prompts::{
    EDIT_CONVERSATION_PREAMBLE, GROUNDING_INSTRUCTION, JSON_ENVELOPE_SYSTEM,
    NO_PERSONAL_DATA_INSTRUCTION,
};
use crate::llm_client::{ChatMessage, LlmClient, LlmError};

pub struct LlmDocumentGenerator {
    llm: LlmClient,
}

impl LlmDocumentGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl DocumentGenerator for LlmDocumentGenerator {
    async fn generate(&self, context: &GenerationContext) -> Result<GeneratedFragment, LlmError> {
        let (system, prompt) = build_generation_prompt(context)?;
        debug!("Generating {}", context.schema());
        self.llm
            .call_json(&system, &[ChatMessage::user(prompt)])
            .await
    }

    async fn edit(
        &self,
        schema: DocumentSchema,
        log: &[ChatMessage],
        feedback: &str,
    ) -> Result<GeneratedFragment, LlmError> {
        let document_name = schema.to_string();
        let system = with_envelope(&EDITOR_SYSTEM.replace("{document_name}", &document_name));
        let prompt = EDITOR_TEMPLATE
            .replace("{document_name}", &document_name)
            .replace("{editing_suggestions}", feedback);

        let mut turns = Vec::with_capacity(log.len() + 2);
        turns.push(ChatMessage::user(EDIT_CONVERSATION_PREAMBLE));
        turns.extend(log.iter().cloned());
        turns.push(ChatMessage::user(prompt));

        debug!("Editing {} with {} log entries", schema, log.len());
        self.llm.call_json(&system, &merge_consecutive_turns(turns)).await
    }
}

fn with_envelope(system: &str) -> String {
    format!("{system}\n\n{NO_PERSONAL_DATA_INSTRUCTION}\n\n{JSON_ENVELOPE_SYSTEM}")
}

/// Builds `(system, user prompt)` for a first draft.
fn build_generation_prompt(context: &GenerationContext) -> Result<(String, String), LlmError> {
    match context {
        GenerationContext::JobProfile { job_description } => Ok((
            with_envelope(JOB_PROFILE_SYSTEM),
            JOB_PROFILE_EXTRACT_TEMPLATE.replace("{job_description}", job_description),
        )),
        GenerationContext::ResumeSection {
            section,
            candidate_data,
            target,
        } => {
            let section_name = section.display_name();
            let target_text = match target {
                RefinementTarget::WithJob { job_profile } => TARGET_WITH_JOB_TEMPLATE
                    .replace("{job_profile}", &serde_json::to_string_pretty(job_profile)?),
                RefinementTarget::WithoutJob {
                    job_titles,
                    focus_aspects,
                } => TARGET_WITHOUT_JOB_TEMPLATE
                    .replace("{job_titles}", job_titles)
                    .replace("{focus_aspects}", focus_aspects),
            };
            let prompt = SECTION_WRITER_TEMPLATE
                .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
                .replace("{target}", &target_text)
                .replace("{candidate_data}", &serde_json::to_string_pretty(candidate_data)?)
                .replace("{section_name}", &section_name);
            Ok((
                with_envelope(&SECTION_WRITER_SYSTEM.replace("{section_name}", &section_name)),
                prompt,
            ))
        }
        GenerationContext::CoverLetter {
            job_profile,
            resume,
            job_description,
        } => {
            let prompt = COVER_LETTER_WRITER_TEMPLATE
                .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
                .replace("{job_profile}", &serde_json::to_string_pretty(job_profile)?)
                .replace("{resume}", &serde_json::to_string_pretty(resume)?)
                .replace(
                    "{job_description}",
                    job_description.as_deref().unwrap_or("(not provided)"),
                );
            Ok((with_envelope(COVER_LETTER_SYSTEM), prompt))
        }
        GenerationContext::ResumeSummary { resume } => {
            let prompt = RESUME_SUMMARY_TEMPLATE
                .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
                .replace("{resume}", &serde_json::to_string_pretty(resume)?);
            Ok((with_envelope(RESUME_SUMMARY_SYSTEM), prompt))
        }
    }
}

/// The Messages API requires alternating roles; adjacent turns of the same
/// speaker are joined.
fn merge_consecutive_turns(turns: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut merged: Vec<ChatMessage> = Vec::with_capacity(turns.len());
    for turn in turns {
        match merged.last_mut() {
            Some(last) if last.role == turn.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&turn.content);
            }
            _ => merged.push(turn),
        }
    }
    merged
}
