//! services/api/src/web/rest.rs
//!
//! Contains the service-level handlers (root and diagnostics) and the master
//! definition for the OpenAPI specification.

use crate::web::schemas::{
    AssignTopicRequest, CreateMessageRequest, CreatePresentationRequest, CreateSubjectRequest,
    DeletedResponse, DiagnosticsResponse, LoginRequest, LoginResponse, MessageResponse,
    MyPresentationsResponse, PresentationResponse, Role, StatusMessage, SubjectResponse,
    SyncResponse, UpdateStatusRequest,
};
use crate::web::state::AppState;
use crate::web::{auth, messages, presentations, subjects, sync};
use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::warn;
use utoipa::OpenApi;

/// Diagnostics list at most this many collection names.
const MAX_LISTED_COLLECTIONS: usize = 10;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    info(title = "ClassCom API", version = "1.0.1"),
    paths(
        root_handler,
        diagnostics_handler,
        auth::login_handler,
        subjects::list_subjects_handler,
        subjects::create_subject_handler,
        presentations::list_presentations_handler,
        presentations::my_presentations_handler,
        presentations::create_presentation_handler,
        presentations::update_presentation_status_handler,
        presentations::assign_topic_handler,
        messages::create_message_handler,
        messages::list_messages_handler,
        messages::delete_message_handler,
        sync::sync_handler,
    ),
    components(
        schemas(
            LoginRequest, LoginResponse, Role,
            CreateSubjectRequest, SubjectResponse,
            CreatePresentationRequest, UpdateStatusRequest, AssignTopicRequest,
            PresentationResponse, MyPresentationsResponse,
            CreateMessageRequest, MessageResponse, DeletedResponse,
            SyncResponse, StatusMessage, DiagnosticsResponse
        )
    ),
    tags(
        (name = "ClassCom API", description = "Classroom coordination: subjects, presentation topics and announcements.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Service Handlers
//=========================================================================================

/// GET / - Liveness message
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "The service is running", body = StatusMessage))
)]
pub async fn root_handler() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "ClassCom API is running".to_string(),
    })
}

/// GET /test - Report whether the database is configured and reachable
#[utoipa::path(
    get,
    path = "/test",
    responses((status = 200, description = "Connection diagnostics", body = DiagnosticsResponse))
)]
pub async fn diagnostics_handler(State(state): State<Arc<AppState>>) -> Json<DiagnosticsResponse> {
    let config = &state.config;
    let mut response = DiagnosticsResponse {
        backend: "Running".to_string(),
        database: "Not Available".to_string(),
        database_url: None,
        database_name: None,
        connection_status: "Not Connected".to_string(),
        collections: Vec::new(),
    };

    let Some(store) = state.store.as_deref() else {
        return Json(response);
    };

    response.database = "Available".to_string();
    response.database_url = Some(
        if config.database_url.is_some() { "Set" } else { "Not Set" }.to_string(),
    );
    response.database_name = Some(
        config
            .database_name
            .clone()
            .unwrap_or_else(|| store.describe()),
    );
    response.connection_status = "Connected".to_string();

    match store.list_collections().await {
        Ok(mut collections) => {
            collections.truncate(MAX_LISTED_COLLECTIONS);
            response.collections = collections;
            response.database = "Connected & Working".to_string();
        }
        Err(e) => {
            warn!("Diagnostics could not list collections: {}", e);
            let mut detail = e.to_string();
            detail.truncate(detail.char_indices().nth(50).map_or(detail.len(), |(i, _)| i));
            response.database = format!("Connected but Error: {}", detail);
        }
    }

    Json(response)
}
