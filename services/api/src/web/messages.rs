//! services/api/src/web/messages.rs
//!
//! Announcements and alerts posted by admins.

use crate::error::ApiError;
use crate::web::extract::JsonBody;
use crate::web::schemas::{CreateMessageRequest, DeletedResponse, MessageResponse};
use crate::web::{parse_id, state::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use classcom_core::domain::{normalize_roll_number, Entity, Message};
use classcom_core::ports::CREATED_AT;
use classcom_core::query::{Filter, Sort};
use classcom_core::records;
use std::sync::Arc;
use tracing::info;

/// POST /api/admin/messages - Post a message or alert
#[utoipa::path(
    post,
    path = "/api/admin/messages",
    request_body = CreateMessageRequest,
    responses(
        (status = 200, description = "Message created", body = MessageResponse),
        (status = 400, description = "Invalid payload"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn create_message_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateMessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let store = state.store()?;

    let message = Message {
        kind: req.kind,
        title: req.title,
        body: req.body,
        created_by: req
            .created_by
            .as_deref()
            .map(normalize_roll_number)
            .filter(|r| !r.is_empty()),
    };
    let id = records::insert(store, &message).await?;
    info!("Posted {:?} '{}'", message.kind, message.title);

    let created = records::get::<Message>(store, id).await?;
    Ok(Json(created.into()))
}

/// GET /api/messages - List messages, newest first
#[utoipa::path(
    get,
    path = "/api/messages",
    responses(
        (status = 200, description = "Messages sorted by creation time, newest first", body = [MessageResponse])
    )
)]
pub async fn list_messages_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let Some(store) = state.store.as_deref() else {
        return Ok(Json(Vec::new()));
    };
    let newest_first = Sort::descending(CREATED_AT);
    let messages = records::find_many::<Message>(store, &Filter::All, Some(&newest_first)).await?;
    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// DELETE /api/admin/messages/{message_id} - Delete a message
#[utoipa::path(
    delete,
    path = "/api/admin/messages/{message_id}",
    params(
        ("message_id" = String, Path, description = "Id of the message")
    ),
    responses(
        (status = 200, description = "Message deleted", body = DeletedResponse),
        (status = 400, description = "Invalid id"),
        (status = 404, description = "Message not found"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn delete_message_handler(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let store = state.store()?;
    let id = parse_id(&message_id)?;

    let deleted = store.delete_one(Message::COLLECTION, &Filter::Id(id)).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Message not found".to_string()));
    }
    info!("Deleted message {}", id);
    Ok(Json(DeletedResponse { deleted: true }))
}
