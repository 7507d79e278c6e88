pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            delete(handlers::handle_discard_session),
        )
        .route(
            "/api/v1/sessions/:id/fields/:field",
            get(handlers::handle_get_field),
        )
        .route("/api/v1/sessions/:id/finish", post(handlers::handle_finish))
        // Job profile
        .route(
            "/api/v1/sessions/:id/job-profile/generate",
            post(handlers::handle_job_profile_generate),
        )
        .route(
            "/api/v1/sessions/:id/job-profile/edit",
            post(handlers::handle_job_profile_edit),
        )
        .route(
            "/api/v1/sessions/:id/job-profile/complete",
            post(handlers::handle_job_profile_complete),
        )
        // Resume
        .route(
            "/api/v1/sessions/:id/resume/generate",
            post(handlers::handle_resume_generate),
        )
        .route(
            "/api/v1/sessions/:id/resume/edit-section",
            post(handlers::handle_resume_edit_section),
        )
        .route(
            "/api/v1/sessions/:id/resume/complete",
            post(handlers::handle_resume_complete),
        )
        // Cover letter
        .route(
            "/api/v1/sessions/:id/cover-letter/generate",
            post(handlers::handle_cover_letter_generate),
        )
        .route(
            "/api/v1/sessions/:id/cover-letter/edit",
            post(handlers::handle_cover_letter_edit),
        )
        .route(
            "/api/v1/sessions/:id/cover-letter/complete",
            post(handlers::handle_cover_letter_complete),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::generation::testing::ScriptedGenerator;
    use crate::generation::DocumentSchema;
    use crate::models::resume::Resume;
    use crate::session::registry::SessionRegistry;
    use crate::session::service::TailorService;
    use crate::workflow::test_support::{deps_with, jane};

    fn source_resume() -> Resume {
        serde_json::from_value(json!({
            "education": [{
                "degree": "MSc",
                "institution": "TU Example",
                "field_of_study": "Computer Science"
            }],
            "projects": [{"name": "tailor"}]
        }))
        .unwrap()
    }

    fn app(generator: &Arc<ScriptedGenerator>) -> Router {
        let deps = deps_with(generator.clone(), source_resume(), Some(jane()));
        build_router(AppState {
            service: TailorService::new(SessionRegistry::new(), deps),
        })
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(app: &Router, body: Value) -> String {
        let (status, value) = call(app, Method::POST, "/api/v1/sessions", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        value["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(&Arc::new(ScriptedGenerator::new()));
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "tailor-api");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = app(&Arc::new(ScriptedGenerator::new()));
        let uri = format!("/api/v1/sessions/{}/fields/info", uuid::Uuid::new_v4());
        let (status, body) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_session_id_uses_error_envelope() {
        let app = app(&Arc::new(ScriptedGenerator::new()));
        for (method, uri) in [
            (Method::GET, "/api/v1/sessions/not-a-uuid/fields/info"),
            (Method::DELETE, "/api/v1/sessions/not-a-uuid"),
            (Method::POST, "/api/v1/sessions/not-a-uuid/finish"),
        ] {
            let (status, body) = call(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "{uri}");
            assert!(body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("not-a-uuid"));
        }
    }

    #[tokio::test]
    async fn test_unknown_field_is_400() {
        let app = app(&Arc::new(ScriptedGenerator::new()));
        let id = create(
            &app,
            json!({"application_type": "general_resume", "steps": ["resume"]}),
        )
        .await;
        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/api/v1/sessions/{id}/fields/resume_draft"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "UNKNOWN_FIELD");
    }

    #[tokio::test]
    async fn test_job_profile_round_trip_over_http() {
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_ok(DocumentSchema::JobProfile, json!({"company": "Acme"}), "ok");
        let app = app(&generator);
        let id = create(
            &app,
            json!({"application_type": "job_application", "steps": ["job_profile"]}),
        )
        .await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/job-profile/generate"),
            Some(json!({"job_description": "Acme is hiring."})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "suspended");
        assert_eq!(body["document"]["company"], "Acme");

        // A replacement that does not fit the schema is rejected before the workflow.
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/job-profile/edit"),
            Some(json!({"user_edited_profile": {"company": 42}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/job-profile/complete"),
            Some(json!({"decision": "save", "user_edited_profile": {"company": "Acme GmbH"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["document"]["company"], "Acme GmbH");

        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/api/v1/sessions/{id}/fields/job_profile"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["field"], "job_profile");
        assert_eq!(body["value"]["company"], "Acme GmbH");

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/job-profile/edit"),
            Some(json!({"editing_suggestions": "more"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_section_edit_for_undispatched_section_is_409() {
        let app = app(&Arc::new(ScriptedGenerator::new()));
        let id = create(
            &app,
            json!({"application_type": "general_resume", "steps": ["resume"]}),
        )
        .await;
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/resume/generate"),
            Some(json!({"job_titles": "Backend Engineer"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["document"]["publications"].is_null());

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/resume/edit-section"),
            Some(json!({"section_key": "publications", "editing_suggestions": "add my paper"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/resume/edit-section"),
            Some(json!({"section_key": "summary", "editing_suggestions": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_discard_session() {
        let app = app(&Arc::new(ScriptedGenerator::new()));
        let id = create(
            &app,
            json!({"application_type": "general_resume", "steps": ["resume"]}),
        )
        .await;
        let uri = format!("/api/v1/sessions/{id}");
        let (status, _) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
