//! In-process `DocumentGenerator` double for workflow tests.
//!
//! Responses are scripted per schema (fan-out calls arrive in any order), and
//! every call is recorded for assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::generation::{DocumentGenerator, DocumentSchema, GeneratedFragment, GenerationContext};
use crate::llm_client::{ChatMessage, LlmError};

/// Summary returned when no summary response is scripted.
pub const DEFAULT_SUMMARY: &str = "Backend engineer who builds reliable services.";

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Generate(DocumentSchema),
    Edit {
        schema: DocumentSchema,
        feedback: String,
        log: Vec<ChatMessage>,
    },
}

impl RecordedCall {
    pub fn schema(&self) -> DocumentSchema {
        match self {
            RecordedCall::Generate(schema) => *schema,
            RecordedCall::Edit { schema, .. } => *schema,
        }
    }
}

#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<HashMap<DocumentSchema, VecDeque<Result<GeneratedFragment, LlmError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, schema: DocumentSchema, data: Value, rationale: &str) {
        self.push(
            schema,
            Ok(GeneratedFragment {
                data,
                rationale: rationale.to_string(),
            }),
        );
    }

    pub fn push_err(&self, schema: DocumentSchema, err: LlmError) {
        self.push(schema, Err(err));
    }

    fn push(&self, schema: DocumentSchema, response: Result<GeneratedFragment, LlmError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(schema)
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, schema: DocumentSchema) -> usize {
        self.calls().iter().filter(|c| c.schema() == schema).count()
    }

    fn next(
        &self,
        schema: DocumentSchema,
        fallback: Option<Value>,
    ) -> Result<GeneratedFragment, LlmError> {
        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&schema)
            .and_then(|queue| queue.pop_front());
        match (scripted, fallback) {
            (Some(response), _) => response,
            (None, Some(data)) => Ok(GeneratedFragment {
                data,
                rationale: "kept as is".to_string(),
            }),
            (None, None) => Err(LlmError::EmptyContent),
        }
    }
}

#[async_trait]
impl DocumentGenerator for ScriptedGenerator {
    async fn generate(&self, context: &GenerationContext) -> Result<GeneratedFragment, LlmError> {
        let schema = context.schema();
        self.calls.lock().unwrap().push(RecordedCall::Generate(schema));
        // Unscripted section writers echo their source entries.
        let fallback = match context {
            GenerationContext::ResumeSection { candidate_data, .. } => Some(candidate_data.clone()),
            GenerationContext::ResumeSummary { .. } => Some(Value::from(DEFAULT_SUMMARY)),
            _ => None,
        };
        self.next(schema, fallback)
    }

    async fn edit(
        &self,
        schema: DocumentSchema,
        log: &[ChatMessage],
        feedback: &str,
    ) -> Result<GeneratedFragment, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall::Edit {
            schema,
            feedback: feedback.to_string(),
            log: log.to_vec(),
        });
        self.next(schema, None)
    }
}
