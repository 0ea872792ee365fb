//! services/api/src/web/subjects.rs
//!
//! Subjects and their syllabus.

use crate::error::ApiError;
use crate::web::extract::JsonBody;
use crate::web::schemas::{CreateSubjectRequest, SubjectResponse};
use crate::web::state::AppState;
use axum::{extract::State, Json};
use classcom_core::domain::Subject;
use classcom_core::query::Filter;
use classcom_core::records;
use std::sync::Arc;
use tracing::info;

/// GET /api/subjects - List all subjects
#[utoipa::path(
    get,
    path = "/api/subjects",
    responses(
        (status = 200, description = "All subjects; empty when no database is configured", body = [SubjectResponse])
    )
)]
pub async fn list_subjects_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    let Some(store) = state.store.as_deref() else {
        return Ok(Json(Vec::new()));
    };
    let subjects = records::find_many::<Subject>(store, &Filter::All, None).await?;
    Ok(Json(subjects.into_iter().map(SubjectResponse::from).collect()))
}

/// POST /api/admin/subjects - Create a subject
#[utoipa::path(
    post,
    path = "/api/admin/subjects",
    request_body = CreateSubjectRequest,
    responses(
        (status = 200, description = "Subject created", body = SubjectResponse),
        (status = 400, description = "Invalid payload or subject code exists"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn create_subject_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateSubjectRequest>,
) -> Result<Json<SubjectResponse>, ApiError> {
    let store = state.store()?;

    let existing = records::find_one::<Subject>(store, &Filter::eq("code", req.code.as_str())).await?;
    if existing.is_some() {
        return Err(ApiError::BadRequest("Subject code exists".to_string()));
    }

    let subject = Subject {
        code: req.code,
        acronym: req.acronym,
        title: req.title,
        syllabus: req.syllabus.unwrap_or_default(),
    };
    // The unique index still rejects a concurrent duplicate as a 400.
    let id = records::insert(store, &subject).await?;
    info!("Created subject {}", subject.code);

    let created = records::get::<Subject>(store, id).await?;
    Ok(Json(created.into()))
}
