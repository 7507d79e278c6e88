use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::cover_letter::CoverLetter;
use crate::models::job_profile::JobProfile;
use crate::models::resume::{Resume, SectionData, SectionKey};
use crate::session::service::{FinishedApplication, ResumeInput, SourceContext, WorkflowOutput};
use crate::session::{SessionField, SessionId, SessionParams, SessionValue};
use crate::state::AppState;
use crate::workflow::coordinator::SectionCommand;
use crate::workflow::{Decision, ReviewInput};

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
}

#[derive(Deserialize)]
pub struct JobProfileGenerateRequest {
    pub job_description: String,
}

#[derive(Deserialize)]
pub struct JobProfileEditRequest {
    #[serde(default)]
    pub editing_suggestions: Option<String>,
    #[serde(default)]
    pub user_edited_profile: Option<Value>,
}

#[derive(Deserialize)]
pub struct JobProfileCompleteRequest {
    #[serde(default)]
    pub decision: Decision,
    #[serde(default)]
    pub user_edited_profile: Option<Value>,
}

#[derive(Deserialize)]
pub struct ResumeGenerateRequest {
    #[serde(default)]
    pub job_titles: Option<String>,
    #[serde(default)]
    pub focus_aspects: Option<String>,
}

#[derive(Deserialize)]
pub struct SectionEditRequest {
    pub section_key: String,
    #[serde(default)]
    pub editing_suggestions: Option<String>,
    #[serde(default)]
    pub user_edited_section: Option<Value>,
}

#[derive(Deserialize)]
pub struct ResumeCompleteRequest {
    #[serde(default)]
    pub decision: Decision,
    #[serde(default)]
    pub user_edited_resume: Option<Value>,
}

#[derive(Deserialize)]
pub struct CoverLetterEditRequest {
    #[serde(default)]
    pub editing_suggestions: Option<String>,
    #[serde(default)]
    pub user_edited_cover_letter: Option<Value>,
}

#[derive(Deserialize)]
pub struct CoverLetterCompleteRequest {
    #[serde(default)]
    pub decision: Decision,
    #[serde(default)]
    pub user_edited_cover_letter: Option<Value>,
}

/// Session ids arrive as path text; a malformed one is a client error in the
/// usual error envelope.
fn parse_session_id(raw: &str) -> Result<SessionId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("'{raw}' is not a valid session id")))
}

/// Human replacements are checked against the schema before they reach a workflow.
fn parse_replacement<T: DeserializeOwned>(what: &str, value: Option<Value>) -> Result<Option<T>, AppError> {
    value
        .map(|v| {
            serde_json::from_value(v)
                .map_err(|e| AppError::Validation(format!("Edited {what} is invalid: {e}")))
        })
        .transpose()
}

// ────────────────────────────────────────────────────────────────────────────
// Sessions
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(params): Json<SessionParams>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let session_id = state.service.start_session(&params)?;
    Ok((StatusCode::CREATED, Json(CreateSessionResponse { session_id })))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_discard_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_session_id(&id)?;
    state.service.discard(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/sessions/:id/fields/:field
pub async fn handle_get_field(
    State(state): State<AppState>,
    Path((id, field)): Path<(String, String)>,
) -> Result<Json<SessionValue>, AppError> {
    let id = parse_session_id(&id)?;
    let field: SessionField = field.parse()?;
    Ok(Json(state.service.get_field(id, field)?))
}

/// POST /api/v1/sessions/:id/finish
pub async fn handle_finish(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FinishedApplication>, AppError> {
    let id = parse_session_id(&id)?;
    Ok(Json(state.service.finish(id)?))
}

// ────────────────────────────────────────────────────────────────────────────
// Job profile
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/job-profile/generate
pub async fn handle_job_profile_generate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<JobProfileGenerateRequest>,
) -> Result<Json<WorkflowOutput>, AppError> {
    let id = parse_session_id(&id)?;
    let context = SourceContext::JobProfile {
        job_description: req.job_description,
    };
    Ok(Json(state.service.generate(id, context).await?))
}

/// POST /api/v1/sessions/:id/job-profile/edit
pub async fn handle_job_profile_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<JobProfileEditRequest>,
) -> Result<Json<WorkflowOutput>, AppError> {
    let id = parse_session_id(&id)?;
    let replacement = parse_replacement::<JobProfile>("job profile", req.user_edited_profile)?;
    let input = ReviewInput::edit_from_parts(req.editing_suggestions, replacement)?;
    Ok(Json(state.service.resume(id, ResumeInput::JobProfile(input)).await?))
}

/// POST /api/v1/sessions/:id/job-profile/complete
pub async fn handle_job_profile_complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<JobProfileCompleteRequest>,
) -> Result<Json<WorkflowOutput>, AppError> {
    let id = parse_session_id(&id)?;
    let input = ReviewInput::Done {
        replacement: parse_replacement::<JobProfile>("job profile", req.user_edited_profile)?,
        decision: req.decision,
    };
    Ok(Json(state.service.resume(id, ResumeInput::JobProfile(input)).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Resume
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/resume/generate
pub async fn handle_resume_generate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ResumeGenerateRequest>,
) -> Result<Json<WorkflowOutput>, AppError> {
    let id = parse_session_id(&id)?;
    let context = SourceContext::Resume {
        job_titles: req.job_titles,
        focus_aspects: req.focus_aspects,
    };
    Ok(Json(state.service.generate(id, context).await?))
}

/// POST /api/v1/sessions/:id/resume/edit-section
pub async fn handle_resume_edit_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SectionEditRequest>,
) -> Result<Json<WorkflowOutput>, AppError> {
    let id = parse_session_id(&id)?;
    let section_key: SectionKey = req.section_key.parse().map_err(AppError::Validation)?;
    let replacement = req
        .user_edited_section
        .map(|v| {
            SectionData::from_value(section_key, v).map_err(|e| {
                AppError::Validation(format!(
                    "Edited {} section is invalid: {e}",
                    section_key.display_name()
                ))
            })
        })
        .transpose()?;

    let command = match ReviewInput::edit_from_parts(req.editing_suggestions, replacement)? {
        ReviewInput::Replace(data) => SectionCommand::Replace { data },
        ReviewInput::Feedback(editing_suggestions) => SectionCommand::Edit {
            section_key,
            editing_suggestions,
        },
        ReviewInput::Done { .. } => {
            return Err(AppError::Validation(
                "Use the complete endpoint to finish the resume".to_string(),
            ))
        }
    };
    Ok(Json(state.service.resume(id, ResumeInput::Resume(command)).await?))
}

/// POST /api/v1/sessions/:id/resume/complete
pub async fn handle_resume_complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ResumeCompleteRequest>,
) -> Result<Json<WorkflowOutput>, AppError> {
    let id = parse_session_id(&id)?;
    let command = SectionCommand::Done {
        replacement: parse_replacement::<Resume>("resume", req.user_edited_resume)?,
        decision: req.decision,
    };
    Ok(Json(state.service.resume(id, ResumeInput::Resume(command)).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Cover letter
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/cover-letter/generate
pub async fn handle_cover_letter_generate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowOutput>, AppError> {
    let id = parse_session_id(&id)?;
    Ok(Json(state.service.generate(id, SourceContext::CoverLetter).await?))
}

/// POST /api/v1/sessions/:id/cover-letter/edit
pub async fn handle_cover_letter_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CoverLetterEditRequest>,
) -> Result<Json<WorkflowOutput>, AppError> {
    let id = parse_session_id(&id)?;
    let replacement =
        parse_replacement::<CoverLetter>("cover letter", req.user_edited_cover_letter)?;
    let input = ReviewInput::edit_from_parts(req.editing_suggestions, replacement)?;
    Ok(Json(state.service.resume(id, ResumeInput::CoverLetter(input)).await?))
}

/// POST /api/v1/sessions/:id/cover-letter/complete
pub async fn handle_cover_letter_complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CoverLetterCompleteRequest>,
) -> Result<Json<WorkflowOutput>, AppError> {
    let id = parse_session_id(&id)?;
    let input = ReviewInput::Done {
        replacement: parse_replacement::<CoverLetter>("cover letter", req.user_edited_cover_letter)?,
        decision: req.decision,
    };
    Ok(Json(state.service.resume(id, ResumeInput::CoverLetter(input)).await?))
}
