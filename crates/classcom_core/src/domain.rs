//! crates/classcom_core/src/domain.rs
//!
//! Defines the record types stored by the application, one per collection.
//! These are plain data contracts; the store keeps them as JSON documents and
//! the identifier lives outside the record (see `Stored`).

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// A record type that lives in its own named collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
}

/// A record together with the metadata the store keeps alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: Uuid,
    pub record: T,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Roll numbers are compared case-insensitively by storing them trimmed and uppercased.
pub fn normalize_roll_number(raw: &str) -> String {
    raw.trim().to_uppercase()
}

//=========================================================================================
// Student
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub roll_number: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Timestamp of the last time the student looked at the notifications.
    #[serde(default)]
    pub notifications_read_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Student {
    /// A regular, active student with no name yet, as created on first login.
    pub fn new(roll_number: impl Into<String>) -> Self {
        Self {
            roll_number: roll_number.into(),
            name: None,
            is_admin: false,
            is_active: true,
            notifications_read_at: None,
        }
    }

    pub fn admin(roll_number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            is_admin: true,
            ..Self::new(roll_number)
        }
    }
}

impl Entity for Student {
    const COLLECTION: &'static str = "student";
}

//=========================================================================================
// Subject
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub code: String,
    /// Short code used for tabs in the client, e.g. "CS".
    pub acronym: String,
    pub title: String,
    #[serde(default)]
    pub syllabus: Vec<String>,
}

impl Entity for Subject {
    const COLLECTION: &'static str = "subject";
}

//=========================================================================================
// Presentation
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationStatus {
    #[default]
    Upcoming,
    Completed,
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub subject_code: String,
    pub subject_acronym: String,
    pub topic: String,
    /// Roll number of the assigned student. Only checked against the student
    /// collection when an assignment is made.
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PresentationStatus,
    #[serde(default)]
    pub submission_link: Option<String>,
}

impl Presentation {
    pub fn is_completed(&self) -> bool {
        self.status == PresentationStatus::Completed
    }
}

impl Entity for Presentation {
    const COLLECTION: &'static str = "presentation";
}

//=========================================================================================
// Message
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Message,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl Entity for Message {
    const COLLECTION: &'static str = "message";
}

//=========================================================================================
// Meta
//=========================================================================================

/// Application-wide key/value flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub key: String,
    pub value: String,
}

impl Meta {
    pub const SYNCED: &'static str = "synced";
}

impl Entity for Meta {
    const COLLECTION: &'static str = "meta";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roll_numbers_are_trimmed_and_uppercased() {
        assert_eq!(normalize_roll_number("  cs21b042 "), "CS21B042");
        assert_eq!(normalize_roll_number(""), "");
    }

    #[test]
    fn student_defaults_fill_missing_fields() {
        let student: Student = serde_json::from_value(json!({ "roll_number": "A1" })).unwrap();
        assert_eq!(student, Student::new("A1"));
        assert!(student.is_active);
    }

    #[test]
    fn message_kind_is_stored_under_type() {
        let message = Message {
            kind: MessageKind::Alert,
            title: "Exam".into(),
            body: "Moved to Friday".into(),
            created_by: None,
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "alert");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = serde_json::from_value::<PresentationStatus>(json!("archived"));
        assert!(result.is_err());
        let status: PresentationStatus = serde_json::from_value(json!("revoked")).unwrap();
        assert_eq!(status, PresentationStatus::Revoked);
    }

    #[test]
    fn unassigned_presentation_serializes_null_assignee() {
        let presentation: Presentation = serde_json::from_value(json!({
            "subject_code": "CS101",
            "subject_acronym": "CS",
            "topic": "Hash Tables"
        }))
        .unwrap();
        assert_eq!(presentation.status, PresentationStatus::Upcoming);
        let value = serde_json::to_value(&presentation).unwrap();
        assert!(value["assigned_to"].is_null());
    }
}
