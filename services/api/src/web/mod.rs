pub mod auth;
pub mod extract;
pub mod messages;
pub mod presentations;
pub mod rest;
pub mod schemas;
pub mod state;
pub mod subjects;
pub mod sync;

use crate::error::ApiError;
use axum::{
    http::Method,
    routing::{delete, get, patch, post},
    Router,
};
use classcom_core::domain::normalize_roll_number;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Builds the API router with every endpoint, CORS and request tracing.
pub fn router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    // Open to everyone
    let public_routes = Router::new()
        .route("/", get(rest::root_handler))
        .route("/test", get(rest::diagnostics_handler))
        .route("/api/login", post(auth::login_handler))
        .route("/api/subjects", get(subjects::list_subjects_handler))
        .route("/api/presentations", get(presentations::list_presentations_handler))
        .route("/api/presentations/my", get(presentations::my_presentations_handler))
        .route("/api/messages", get(messages::list_messages_handler));

    // Admin actions; the client only offers them after an admin login
    let admin_routes = Router::new()
        .route("/api/admin/subjects", post(subjects::create_subject_handler))
        .route(
            "/api/admin/presentations",
            post(presentations::create_presentation_handler),
        )
        .route(
            "/api/admin/presentations/{presentation_id}",
            patch(presentations::update_presentation_status_handler),
        )
        .route("/api/admin/assign", post(presentations::assign_topic_handler))
        .route("/api/admin/messages", post(messages::create_message_handler))
        .route(
            "/api/admin/messages/{message_id}",
            delete(messages::delete_message_handler),
        )
        .route("/api/admin/sync", post(sync::sync_handler));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Parses a public id, failing with 400 "Invalid ID" when it is not one of ours.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::invalid_id())
}

/// Normalizes a roll number, rejecting blank ones.
pub(crate) fn roll_number_from(raw: &str) -> Result<String, ApiError> {
    let roll_number = normalize_roll_number(raw);
    if roll_number.is_empty() {
        return Err(ApiError::BadRequest("roll_number must not be empty".to_string()));
    }
    Ok(roll_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryDocumentStore;
    use crate::bootstrap;
    use crate::config::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use classcom_core::domain::{Entity, Meta, Student};
    use classcom_core::ports::DocumentStore;
    use classcom_core::query::Filter;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const ADMIN_PASSWORD: &str = "letmein";

    fn test_config() -> Arc<Config> {
        let config = Config::from_vars(|name| match name {
            "ADMIN_PASSWORD" => Some(ADMIN_PASSWORD.to_string()),
            "DATABASE_URL" => Some("memory://".to_string()),
            _ => None,
        })
        .unwrap();
        Arc::new(config)
    }

    fn app_with_store() -> (Router, Arc<MemoryDocumentStore>) {
        let store = Arc::new(MemoryDocumentStore::new());
        let shared: Arc<dyn DocumentStore> = store.clone();
        let state = Arc::new(AppState::new(Some(shared), test_config()));
        (router(state), store)
    }

    async fn seeded_app() -> (Router, Arc<MemoryDocumentStore>) {
        let (app, store) = app_with_store();
        bootstrap::run(store.as_ref()).await;
        (app, store)
    }

    fn app_without_store() -> Router {
        router(Arc::new(AppState::new(None, test_config())))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn first_topic_id(app: &Router) -> String {
        let (_, topics) = call(app, "GET", "/api/presentations", None).await;
        topics[0]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn root_reports_running() {
        let app = app_without_store();
        let (status, body) = call(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "ClassCom API is running");
    }

    #[tokio::test]
    async fn login_twice_creates_one_student() {
        let (app, store) = app_with_store();

        let (status, body) =
            call(&app, "POST", "/api/login", Some(json!({ "roll_number": " cs21b042 " }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roll_number"], "CS21B042");
        assert_eq!(body["role"], "student");
        assert_eq!(body["is_admin"], false);
        assert!(body["name"].is_null());

        let (status, _) =
            call(&app, "POST", "/api/login", Some(json!({ "roll_number": "CS21B042" }))).await;
        assert_eq!(status, StatusCode::OK);

        let filter = Filter::eq("roll_number", "CS21B042");
        assert_eq!(store.count(Student::COLLECTION, &filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn login_rejects_blank_or_missing_roll_number() {
        let (app, _) = app_with_store();
        let (status, _) = call(&app, "POST", "/api/login", Some(json!({ "roll_number": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&app, "POST", "/api/login", Some(json!({ "password": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_login_requires_the_password() {
        let (app, _) = seeded_app().await;

        let (status, body) = call(&app, "POST", "/api/login", Some(json!({ "roll_number": "admin" }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Admin password required or incorrect");

        let wrong = json!({ "roll_number": "ADMIN", "password": "admin123" });
        let (status, _) = call(&app, "POST", "/api/login", Some(wrong)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let right = json!({ "roll_number": "ADMIN", "password": ADMIN_PASSWORD });
        let (status, body) = call(&app, "POST", "/api/login", Some(right)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");
        assert_eq!(body["is_admin"], true);
        assert_eq!(body["name"], "Administrator");
    }

    #[tokio::test]
    async fn duplicate_subject_code_is_a_bad_request() {
        let (app, _) = seeded_app().await;
        let subject = json!({ "code": "EE201", "acronym": "EE", "title": "Circuits" });

        let (status, body) = call(&app, "POST", "/api/admin/subjects", Some(subject.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "EE201");
        assert_eq!(body["syllabus"], json!([]));
        assert!(body["id"].is_string());
        assert!(body.get("_id").is_none());

        let (status, body) = call(&app, "POST", "/api/admin/subjects", Some(subject)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Subject code exists");

        let (_, subjects) = call(&app, "GET", "/api/subjects", None).await;
        assert_eq!(subjects.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn subject_payload_shape_is_checked() {
        let (app, _) = app_with_store();
        let (status, _) = call(
            &app,
            "POST",
            "/api/admin/subjects",
            Some(json!({ "code": "X1", "acronym": "X", "title": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn assigning_to_unknown_student_is_not_found() {
        let (app, _) = seeded_app().await;
        let id = first_topic_id(&app).await;

        let payload = json!({ "presentation_id": id, "roll_number": "NOBODY" });
        let (status, body) = call(&app, "POST", "/api/admin/assign", Some(payload)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Student not found");
    }

    #[tokio::test]
    async fn assigning_checks_presentation_id() {
        let (app, _) = seeded_app().await;
        call(&app, "POST", "/api/login", Some(json!({ "roll_number": "R1" }))).await;

        let bad = json!({ "presentation_id": "not-an-id", "roll_number": "r1" });
        let (status, body) = call(&app, "POST", "/api/admin/assign", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Invalid ID");

        let missing = json!({ "presentation_id": Uuid::new_v4().to_string(), "roll_number": "r1" });
        let (status, body) = call(&app, "POST", "/api/admin/assign", Some(missing)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Presentation not found");
    }

    #[tokio::test]
    async fn student_sees_unassigned_and_own_topics() {
        let (app, _) = seeded_app().await;
        for roll in ["R1", "R2"] {
            call(&app, "POST", "/api/login", Some(json!({ "roll_number": roll }))).await;
        }
        let (_, topics) = call(&app, "GET", "/api/presentations", None).await;
        let ids: Vec<String> = topics
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids.len(), 9);

        for (id, roll) in [(&ids[0], "r1"), (&ids[1], "r2")] {
            let payload = json!({ "presentation_id": id, "roll_number": roll });
            let (status, body) = call(&app, "POST", "/api/admin/assign", Some(payload)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["assigned_to"], roll.to_uppercase());
        }

        let (_, visible) = call(&app, "GET", "/api/presentations?roll_number=r1", None).await;
        let visible = visible.as_array().unwrap();
        assert_eq!(visible.len(), 8);
        assert!(visible.iter().all(|t| t["assigned_to"].is_null() || t["assigned_to"] == "R1"));

        let (_, all) = call(&app, "GET", "/api/presentations", None).await;
        assert_eq!(all.as_array().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn my_presentations_partition_by_status() {
        let (app, _) = seeded_app().await;
        call(&app, "POST", "/api/login", Some(json!({ "roll_number": "R1" }))).await;
        let (_, topics) = call(&app, "GET", "/api/presentations", None).await;
        let ids: Vec<String> = topics
            .as_array()
            .unwrap()
            .iter()
            .take(3)
            .map(|t| t["id"].as_str().unwrap().to_string())
            .collect();

        for id in &ids {
            let payload = json!({ "presentation_id": id, "roll_number": "R1" });
            call(&app, "POST", "/api/admin/assign", Some(payload)).await;
        }
        let uri = format!("/api/admin/presentations/{}", ids[0]);
        let (status, body) = call(&app, "PATCH", &uri, Some(json!({ "status": "completed" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        let uri = format!("/api/admin/presentations/{}", ids[1]);
        call(&app, "PATCH", &uri, Some(json!({ "status": "revoked" }))).await;

        let (status, mine) = call(&app, "GET", "/api/presentations/my?roll_number=r1", None).await;
        assert_eq!(status, StatusCode::OK);
        let upcoming = mine["upcoming"].as_array().unwrap();
        let completed = mine["completed"].as_array().unwrap();
        assert_eq!(upcoming.len() + completed.len(), 3);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0]["id"], ids[0].as_str());
        assert!(upcoming.iter().all(|t| t["status"] != "completed"));
        assert!(upcoming.iter().any(|t| t["status"] == "revoked"));
    }

    #[tokio::test]
    async fn status_update_validates_input() {
        let (app, _) = seeded_app().await;
        let id = first_topic_id(&app).await;

        let uri = format!("/api/admin/presentations/{}", id);
        let (status, _) = call(&app, "PATCH", &uri, Some(json!({ "status": "archived" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, "PATCH", "/api/admin/presentations/42", Some(json!({ "status": "completed" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/api/admin/presentations/{}", Uuid::new_v4());
        let (status, _) = call(&app, "PATCH", &uri, Some(json!({ "status": "completed" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn created_presentation_starts_upcoming() {
        let (app, _) = app_with_store();
        let payload = json!({
            "subject_code": "CS101",
            "subject_acronym": "CS",
            "topic": "Tries",
            "due_date": "2024-09-01T10:00:00Z"
        });
        let (status, body) = call(&app, "POST", "/api/admin/presentations", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "upcoming");
        assert!(body["assigned_to"].is_null());
        assert_eq!(body["due_date"], "2024-09-01T10:00:00Z");
    }

    #[tokio::test]
    async fn deleting_messages() {
        let (app, _) = app_with_store();
        let (status, created) = call(
            &app,
            "POST",
            "/api/admin/messages",
            Some(json!({ "type": "alert", "title": "Exam", "body": "Room 4", "created_by": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["type"], "alert");
        assert_eq!(created["created_by"], "ADMIN");
        let id = created["id"].as_str().unwrap().to_string();

        let missing = format!("/api/admin/messages/{}", Uuid::new_v4());
        let (status, body) = call(&app, "DELETE", &missing, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Message not found");

        let (status, body) = call(&app, "DELETE", &format!("/api/admin/messages/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "deleted": true }));

        let (_, listed) = call(&app, "GET", "/api/messages", None).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn messages_are_listed_newest_first() {
        let (app, _) = app_with_store();
        for title in ["first", "second", "third"] {
            let payload = json!({ "title": title, "body": "..." });
            call(&app, "POST", "/api/admin/messages", Some(payload)).await;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let (_, listed) = call(&app, "GET", "/api/messages", None).await;
        let titles: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
        assert_eq!(listed[0]["type"], "message");
    }

    #[tokio::test]
    async fn sync_twice_keeps_one_flag() {
        let (app, store) = app_with_store();

        let (status, first) = call(&app, "POST", "/api/admin/sync", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, json!({ "synced": true }));

        let (_, second) = call(&app, "POST", "/api/admin/sync", None).await;
        assert_eq!(second["synced"], true);
        assert_eq!(second["message"], "Already synced");

        let flags = store
            .find_many(Meta::COLLECTION, &Filter::eq("key", Meta::SYNCED), None)
            .await
            .unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].body["value"], "true");
    }

    #[tokio::test]
    async fn without_a_store_writes_are_unavailable_and_reads_are_empty() {
        let app = app_without_store();

        let (status, body) = call(&app, "POST", "/api/login", Some(json!({ "roll_number": "R1" }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["detail"].as_str().unwrap().contains("DATABASE_URL"));

        let subject = json!({ "code": "A", "acronym": "A", "title": "A" });
        let (status, _) = call(&app, "POST", "/api/admin/subjects", Some(subject)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let (status, _) = call(&app, "DELETE", &format!("/api/admin/messages/{}", Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        for uri in ["/api/subjects", "/api/presentations", "/api/messages"] {
            let (status, body) = call(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!([]));
        }
        let (_, mine) = call(&app, "GET", "/api/presentations/my?roll_number=R1", None).await;
        assert_eq!(mine, json!({ "upcoming": [], "completed": [] }));

        let (_, sync) = call(&app, "POST", "/api/admin/sync", None).await;
        assert_eq!(sync, json!({ "synced": false, "message": "Database not configured" }));

        let (_, diagnostics) = call(&app, "GET", "/test", None).await;
        assert_eq!(diagnostics["connection_status"], "Not Connected");
    }

    #[tokio::test]
    async fn diagnostics_list_collections() {
        let (app, _) = seeded_app().await;
        let (status, body) = call(&app, "GET", "/test", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], "Connected & Working");
        assert_eq!(body["database_url"], "Set");
        assert_eq!(body["database_name"], "memory");
        assert_eq!(body["collections"], json!(["presentation", "student", "subject"]));
    }
}
