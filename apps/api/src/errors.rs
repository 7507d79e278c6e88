use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::models::resume::SectionKey;
use crate::session::SessionId;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    #[error("Unknown session field '{0}'")]
    UnknownField(String),

    /// The request does not fit the current workflow state.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient service failures outlived the retry budget.
    #[error("Generation service unavailable during {stage}: {message}")]
    ServiceUnavailable { stage: String, message: String },

    /// The service answered with content that does not fit the target schema.
    #[error("Schema violation during {stage}: {message}")]
    SchemaViolation { stage: String, message: String },

    /// A section failed during fan-out; the whole round was abandoned.
    #[error("Resume round aborted: section '{section}' failed ({source}); completed sections: {completed:?}")]
    SectionRoundAborted {
        section: SectionKey,
        completed: Vec<SectionKey>,
        #[source]
        source: Box<AppError>,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Maps a failure of the external generation service onto the engine taxonomy.
    ///
    /// Retryable failures reaching this point have exhausted the retry budget.
    pub fn from_llm(stage: &str, err: LlmError) -> Self {
        if err.is_retryable() {
            return AppError::ServiceUnavailable {
                stage: stage.to_string(),
                message: err.to_string(),
            };
        }
        match err {
            LlmError::Parse(_) | LlmError::EmptyContent => AppError::SchemaViolation {
                stage: stage.to_string(),
                message: err.to_string(),
            },
            other => AppError::Internal(anyhow::anyhow!("{stage} failed: {other}")),
        }
    }

    /// True for errors caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::SessionNotFound(_)
                | AppError::UnknownField(_)
                | AppError::InvalidTransition(_)
                | AppError::Validation(_)
                | AppError::NotFound(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::SessionNotFound(_) => {
                (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", self.to_string())
            }
            AppError::UnknownField(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_FIELD", self.to_string()),
            AppError::InvalidTransition(msg) => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION", msg.clone())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::ServiceUnavailable { .. } => {
                tracing::error!("{self}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "The generation service is temporarily unavailable".to_string(),
                )
            }
            AppError::SchemaViolation { .. } => {
                tracing::error!("{self}");
                (StatusCode::BAD_GATEWAY, "SCHEMA_VIOLATION", self.to_string())
            }
            AppError::SectionRoundAborted { .. } => {
                tracing::error!("{self}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SECTION_ROUND_ABORTED",
                    self.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_transient_failure_maps_to_service_unavailable() {
        let err = AppError::from_llm(
            "job profile (generate)",
            LlmError::RateLimited { retry_after: None },
        );
        assert!(matches!(err, AppError::ServiceUnavailable { ref stage, .. } if stage == "job profile (generate)"));
    }

    #[test]
    fn test_fatal_failure_maps_to_schema_violation() {
        let err = AppError::from_llm("cover letter (edit)", LlmError::EmptyContent);
        assert!(matches!(err, AppError::SchemaViolation { .. }));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_rejected_request_maps_to_internal() {
        let err = AppError::from_llm(
            "job profile (generate)",
            LlmError::Api {
                status: 401,
                message: "invalid x-api-key".to_string(),
            },
        );
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::SessionNotFound(SessionId::new()), StatusCode::NOT_FOUND),
            (AppError::UnknownField("x".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidTransition("x".into()), StatusCode::CONFLICT),
            (
                AppError::ServiceUnavailable {
                    stage: "s".into(),
                    message: "m".into(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::SchemaViolation {
                    stage: "s".into(),
                    message: "m".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
