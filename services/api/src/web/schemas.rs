//! services/api/src/web/schemas.rs
//!
//! Request payloads and response bodies for the REST API. Stored records are
//! flattened into responses with their store id exposed as a string `id`.

use chrono::{DateTime, Utc};
use classcom_core::domain::{
    Message, MessageKind, Presentation, PresentationStatus, Stored, Subject,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Request Payloads
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub roll_number: String,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubjectRequest {
    pub code: String,
    pub acronym: String,
    pub title: String,
    #[serde(default)]
    pub syllabus: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePresentationRequest {
    pub subject_code: String,
    pub subject_acronym: String,
    pub topic: String,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub submission_link: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of `upcoming`, `completed`, `revoked`.
    #[schema(value_type = String, example = "completed")]
    pub status: PresentationStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignTopicRequest {
    pub presentation_id: String,
    pub roll_number: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    /// `message` (default) or `alert`.
    #[serde(rename = "type", default)]
    #[schema(value_type = String, example = "message")]
    pub kind: MessageKind,
    pub title: String,
    pub body: String,
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RollNumberFilter {
    /// Limits results to unassigned topics plus those assigned to this roll number.
    pub roll_number: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RollNumberParam {
    pub roll_number: String,
}

//=========================================================================================
// Response Bodies
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub roll_number: String,
    pub name: Option<String>,
    pub role: Role,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectResponse {
    pub id: String,
    pub code: String,
    pub acronym: String,
    pub title: String,
    pub syllabus: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Stored<Subject>> for SubjectResponse {
    fn from(stored: Stored<Subject>) -> Self {
        let Subject {
            code,
            acronym,
            title,
            syllabus,
        } = stored.record;
        Self {
            id: stored.id.to_string(),
            code,
            acronym,
            title,
            syllabus,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PresentationResponse {
    pub id: String,
    pub subject_code: String,
    pub subject_acronym: String,
    pub topic: String,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[schema(value_type = String, example = "upcoming")]
    pub status: PresentationStatus,
    pub submission_link: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Stored<Presentation>> for PresentationResponse {
    fn from(stored: Stored<Presentation>) -> Self {
        let Presentation {
            subject_code,
            subject_acronym,
            topic,
            assigned_to,
            due_date,
            status,
            submission_link,
        } = stored.record;
        Self {
            id: stored.id.to_string(),
            subject_code,
            subject_acronym,
            topic,
            assigned_to,
            due_date,
            status,
            submission_link,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

/// A student's own presentations, split by status.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct MyPresentationsResponse {
    pub upcoming: Vec<PresentationResponse>,
    pub completed: Vec<PresentationResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "alert")]
    pub kind: MessageKind,
    pub title: String,
    pub body: String,
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Stored<Message>> for MessageResponse {
    fn from(stored: Stored<Message>) -> Self {
        let Message {
            kind,
            title,
            body,
            created_by,
        } = stored.record;
        Self {
            id: stored.id.to_string(),
            kind,
            title,
            body,
            created_by,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse {
    pub synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusMessage {
    pub message: String,
}

/// Connection diagnostics; never contains the connection string itself.
#[derive(Debug, Serialize, ToSchema)]
pub struct DiagnosticsResponse {
    pub backend: String,
    pub database: String,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub connection_status: String,
    pub collections: Vec<String>,
}
