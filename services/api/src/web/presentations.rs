//! services/api/src/web/presentations.rs
//!
//! Presentation topics: listing for students, creation, status changes and
//! assignment for admins.

use crate::error::ApiError;
use crate::web::extract::{JsonBody, QueryParams};
use crate::web::schemas::{
    AssignTopicRequest, CreatePresentationRequest, MyPresentationsResponse, PresentationResponse,
    RollNumberFilter, RollNumberParam, UpdateStatusRequest,
};
use crate::web::{parse_id, roll_number_from, state::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use classcom_core::domain::{
    normalize_roll_number, Entity, Presentation, PresentationStatus, Stored, Student,
};
use classcom_core::ports::{format_timestamp, DocumentStore, UPDATED_AT};
use classcom_core::query::Filter;
use classcom_core::records;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const NOT_FOUND: &str = "Presentation not found";

/// GET /api/presentations - List topics visible to a student
#[utoipa::path(
    get,
    path = "/api/presentations",
    params(RollNumberFilter),
    responses(
        (status = 200, description = "All topics, or unassigned plus own when a roll number is given", body = [PresentationResponse])
    )
)]
pub async fn list_presentations_handler(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<RollNumberFilter>,
) -> Result<Json<Vec<PresentationResponse>>, ApiError> {
    let Some(store) = state.store.as_deref() else {
        return Ok(Json(Vec::new()));
    };

    let roll_number = query
        .roll_number
        .as_deref()
        .map(normalize_roll_number)
        .filter(|r| !r.is_empty());
    let filter = match roll_number {
        Some(roll) => Filter::Or(vec![
            Filter::is_null("assigned_to"),
            Filter::eq("assigned_to", roll),
        ]),
        None => Filter::All,
    };

    let presentations = records::find_many::<Presentation>(store, &filter, None).await?;
    Ok(Json(presentations.into_iter().map(PresentationResponse::from).collect()))
}

/// GET /api/presentations/my - A student's own topics split by status
#[utoipa::path(
    get,
    path = "/api/presentations/my",
    params(RollNumberParam),
    responses(
        (status = 200, description = "Own topics; everything not completed counts as upcoming", body = MyPresentationsResponse),
        (status = 400, description = "Missing roll number")
    )
)]
pub async fn my_presentations_handler(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<RollNumberParam>,
) -> Result<Json<MyPresentationsResponse>, ApiError> {
    let Some(store) = state.store.as_deref() else {
        return Ok(Json(MyPresentationsResponse::default()));
    };

    let roll_number = normalize_roll_number(&query.roll_number);
    let filter = Filter::eq("assigned_to", roll_number);
    let presentations = records::find_many::<Presentation>(store, &filter, None).await?;

    let (completed, upcoming): (Vec<_>, Vec<_>) = presentations
        .into_iter()
        .partition(|p| p.record.is_completed());
    Ok(Json(MyPresentationsResponse {
        upcoming: upcoming.into_iter().map(PresentationResponse::from).collect(),
        completed: completed.into_iter().map(PresentationResponse::from).collect(),
    }))
}

/// POST /api/admin/presentations - Create a topic
#[utoipa::path(
    post,
    path = "/api/admin/presentations",
    request_body = CreatePresentationRequest,
    responses(
        (status = 200, description = "Topic created", body = PresentationResponse),
        (status = 400, description = "Invalid payload"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn create_presentation_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreatePresentationRequest>,
) -> Result<Json<PresentationResponse>, ApiError> {
    let store = state.store()?;

    let presentation = Presentation {
        subject_code: req.subject_code,
        subject_acronym: req.subject_acronym,
        topic: req.topic,
        assigned_to: req
            .assigned_to
            .as_deref()
            .map(normalize_roll_number)
            .filter(|r| !r.is_empty()),
        due_date: req.due_date,
        status: PresentationStatus::Upcoming,
        submission_link: req.submission_link,
    };
    let id = records::insert(store, &presentation).await?;
    info!("Created presentation topic '{}' for {}", presentation.topic, presentation.subject_code);

    let created = records::get::<Presentation>(store, id).await?;
    Ok(Json(created.into()))
}

/// PATCH /api/admin/presentations/{presentation_id} - Change a topic's status
#[utoipa::path(
    patch,
    path = "/api/admin/presentations/{presentation_id}",
    request_body = UpdateStatusRequest,
    params(
        ("presentation_id" = String, Path, description = "Id of the presentation")
    ),
    responses(
        (status = 200, description = "Updated topic", body = PresentationResponse),
        (status = 400, description = "Invalid id or status"),
        (status = 404, description = "Presentation not found"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn update_presentation_status_handler(
    State(state): State<Arc<AppState>>,
    Path(presentation_id): Path<String>,
    JsonBody(req): JsonBody<UpdateStatusRequest>,
) -> Result<Json<PresentationResponse>, ApiError> {
    let store = state.store()?;
    let id = parse_id(&presentation_id)?;

    let patch = json!({ "status": req.status });
    let updated = patch_presentation(store, id, patch).await?;
    info!("Presentation {} is now {:?}", id, req.status);
    Ok(Json(updated.into()))
}

/// POST /api/admin/assign - Assign a topic to a student
#[utoipa::path(
    post,
    path = "/api/admin/assign",
    request_body = AssignTopicRequest,
    responses(
        (status = 200, description = "Updated topic", body = PresentationResponse),
        (status = 400, description = "Invalid id or blank roll number"),
        (status = 404, description = "Student or presentation not found"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn assign_topic_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AssignTopicRequest>,
) -> Result<Json<PresentationResponse>, ApiError> {
    let store = state.store()?;
    let roll_number = roll_number_from(&req.roll_number)?;

    let student_filter = Filter::eq("roll_number", roll_number.as_str());
    if store.count(Student::COLLECTION, &student_filter).await? == 0 {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let id = parse_id(&req.presentation_id)?;
    let patch = json!({ "assigned_to": roll_number });
    let updated = patch_presentation(store, id, patch).await?;
    info!("Assigned presentation {} to {}", id, roll_number);
    Ok(Json(updated.into()))
}

/// Applies `patch` plus a fresh `updated_at`, then reads the presentation back.
async fn patch_presentation(
    store: &dyn DocumentStore,
    id: Uuid,
    mut patch: Value,
) -> Result<Stored<Presentation>, ApiError> {
    patch[UPDATED_AT] = Value::String(format_timestamp(Utc::now()));
    let filter = Filter::Id(id);
    let matched = store
        .update_one(Presentation::COLLECTION, &filter, patch)
        .await?;
    if matched == 0 {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    records::find_one::<Presentation>(store, &filter)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))
}
