//! services/api/src/web/auth.rs
//!
//! Roll-number login. There are no sessions: the client keeps the returned
//! roll number and role for the rest of its visit.

use crate::error::ApiError;
use crate::web::extract::JsonBody;
use crate::web::schemas::{LoginRequest, LoginResponse, Role};
use crate::web::{roll_number_from, state::AppState};
use axum::{extract::State, Json};
use classcom_core::domain::{Stored, Student};
use classcom_core::ports::{DocumentStore, PortError};
use classcom_core::query::Filter;
use classcom_core::records;
use std::sync::Arc;
use tracing::info;

/// POST /api/login - Log in by roll number, creating the student on first sight
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing or blank roll number"),
        (status = 401, description = "Admin password required or incorrect"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let store = state.store()?;
    let roll_number = roll_number_from(&req.roll_number)?;

    let student = find_or_create_student(store, &roll_number).await?;

    let is_admin = student.record.is_admin;
    let role = if is_admin {
        let password = req.password.as_deref().unwrap_or_default();
        if !state.config.admin_secret.verify(password) {
            return Err(ApiError::Unauthorized(
                "Admin password required or incorrect".to_string(),
            ));
        }
        Role::Admin
    } else {
        Role::Student
    };

    Ok(Json(LoginResponse {
        roll_number,
        name: student.record.name,
        role,
        is_admin,
    }))
}

async fn find_or_create_student(
    store: &dyn DocumentStore,
    roll_number: &str,
) -> Result<Stored<Student>, ApiError> {
    let filter = Filter::eq("roll_number", roll_number);
    if let Some(existing) = records::find_one::<Student>(store, &filter).await? {
        return Ok(existing);
    }

    match records::insert(store, &Student::new(roll_number)).await {
        Ok(id) => {
            info!("Registered new student {}", roll_number);
            Ok(records::get::<Student>(store, id).await?)
        }
        // A concurrent first login won the race for the unique roll number.
        Err(PortError::Conflict(_)) => records::find_one::<Student>(store, &filter)
            .await?
            .ok_or_else(|| ApiError::NotFound("Student not found".to_string())),
        Err(e) => Err(e.into()),
    }
}
