//! API route handlers for the gateway.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use studopt_bot::responses;
use studopt_channels::zalo::WebhookEvent;
use studopt_core::time;
use studopt_core::types::{
    new_id, Assignment, AssignmentStatus, ClassSubject, MessageKind, UserAssignment,
};

use crate::server::AppState;

pub(crate) fn unauthorized(error: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"ok": false, "error": error})),
    )
        .into_response()
}

fn store_failure(e: impl std::fmt::Display) -> Json<serde_json::Value> {
    tracing::error!("❌ Store error: {e}");
    Json(serde_json::json!({"ok": false, "error": e.to_string()}))
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "studopt-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Webhook intake. Every delivery is acknowledged with 200 once the secret
/// checks out; processing problems are answered to the user, not the
/// platform, so the platform never retries a poison message.
pub async fn webhook_inbound(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(event): Json<WebhookEvent>,
) -> Response {
    if !state.webhook_secret.is_empty() {
        let token = headers
            .get("X-Bot-Api-Secret-Token")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if token != state.webhook_secret {
            return unauthorized("invalid webhook secret token");
        }
    }

    let Some(incoming) = event.to_incoming() else {
        return Json(serde_json::json!({"ok": true, "ignored": true})).into_response();
    };

    let reply = match incoming.kind {
        MessageKind::Text => {
            if let Err(e) = state.sink.send_typing(&incoming.sender.external_id).await {
                tracing::debug!("Typing indicator failed: {e}");
            }
            match state.dispatch.handle_text(&incoming.sender, &incoming.content) {
                Ok(outcome) if outcome.handled && !outcome.response.is_empty() => {
                    Some(outcome.response)
                }
                Ok(_) => None,
                Err(e) => {
                    tracing::error!("❌ Dispatch failed for {}: {e}", incoming.sender.external_id);
                    Some(responses::GENERAL_ERROR.to_string())
                }
            }
        }
        kind => match state.dispatch.handle_media(&incoming.sender, kind, &incoming.content) {
            Ok(outcome) if outcome.handled => Some(outcome.response),
            Ok(_) => None,
            Err(e) => {
                tracing::error!("❌ Media dispatch failed: {e}");
                None
            }
        },
    };

    if let Some(text) = reply {
        match state.sink.send(&incoming.sender.external_id, &text).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("⚠️ Reply to {} not accepted", incoming.sender.external_id),
            Err(e) => tracing::warn!("⚠️ Reply to {} failed: {e}", incoming.sender.external_id),
        }
    }
    Json(serde_json::json!({"ok": true})).into_response()
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    match state.store.all_users() {
        Ok(users) => Json(serde_json::json!({"ok": true, "users": users})),
        Err(e) => store_failure(e),
    }
}

pub async fn list_classes(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    match state.store.all_class_subjects() {
        Ok(classes) => Json(serde_json::json!({"ok": true, "classes": classes})),
        Err(e) => store_failure(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub subject_id: String,
    pub subject_name: String,
    #[serde(default)]
    pub teacher: String,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub year: String,
    pub semester: u8,
    #[serde(default)]
    pub is_main: bool,
}

pub async fn create_class(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateClassRequest>,
) -> Json<serde_json::Value> {
    if req.day_of_week > 6 || time::parse_hhmm(&req.start_time).is_err() {
        return Json(serde_json::json!({"ok": false, "error": "invalid day_of_week or start_time"}));
    }
    let cls = ClassSubject {
        id: new_id(),
        subject_id: req.subject_id,
        subject_name: req.subject_name,
        teacher: req.teacher,
        day_of_week: req.day_of_week,
        start_time: req.start_time,
        end_time: req.end_time,
        year: req.year,
        semester: req.semester,
        is_main: req.is_main,
    };
    match state.store.insert_class_subject(&cls) {
        Ok(()) => Json(serde_json::json!({"ok": true, "class": cls})),
        Err(e) => store_failure(e),
    }
}

pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
) -> Json<serde_json::Value> {
    match state.store.assignments_for_class(&class_id) {
        Ok(assignments) => Json(serde_json::json!({"ok": true, "assignments": assignments})),
        Err(e) => store_failure(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Local time, `YYYY-MM-DD HH:MM`.
    pub deadline: String,
    #[serde(default = "default_true")]
    pub assign_to_enrolled: bool,
}

fn default_true() -> bool {
    true
}

/// Create an assignment under a class, optionally fanning a pending copy out
/// to every enrolled user.
pub async fn create_assignment(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
    Json(req): Json<CreateAssignmentRequest>,
) -> Json<serde_json::Value> {
    let cls = match state.store.find_class_by_id(&class_id) {
        Ok(Some(cls)) => cls,
        Ok(None) => return Json(serde_json::json!({"ok": false, "error": "class not found"})),
        Err(e) => return store_failure(e),
    };
    let deadline = match time::parse_local(&req.deadline, state.tz) {
        Ok(d) => d,
        Err(_) => {
            return Json(
                serde_json::json!({"ok": false, "error": "deadline must be YYYY-MM-DD HH:MM"}),
            )
        }
    };

    let assignment = Assignment {
        id: new_id(),
        class_subject_id: cls.id.clone(),
        name: req.name,
        description: req.description,
        deadline,
        deadline_remind: None,
        created_at: Utc::now(),
    };
    if let Err(e) = state.store.create_assignment(&assignment) {
        return store_failure(e);
    }

    let mut assigned = 0usize;
    if req.assign_to_enrolled {
        let users = match state.store.users_enrolled(&cls.id) {
            Ok(users) => users,
            Err(e) => return store_failure(e),
        };
        for user in users {
            let copy = UserAssignment {
                id: new_id(),
                assignment_id: assignment.id.clone(),
                user_id: user.id.clone(),
                status: AssignmentStatus::Pending,
                is_deleted: false,
                created_by: "admin-api".to_string(),
                created_at: Utc::now(),
            };
            match state.store.create_user_assignment(&copy) {
                Ok(()) => assigned += 1,
                Err(e) => tracing::warn!("⚠️ Failed to assign to {}: {e}", user.external_id),
            }
        }
    }
    Json(serde_json::json!({"ok": true, "assignment": assignment, "assigned": assigned}))
}

pub async fn delete_assignment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    match state.store.delete_assignment(&id) {
        Ok(()) => Json(serde_json::json!({"ok": true})),
        Err(e) => store_failure(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SetBotEnabledRequest {
    pub enabled: bool,
}

pub async fn set_bot_enabled(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetBotEnabledRequest>,
) -> Json<serde_json::Value> {
    match state.store.set_bot_enabled(req.enabled) {
        Ok(()) => {
            tracing::info!("🔘 Bot enabled set to {}", req.enabled);
            Json(serde_json::json!({"ok": true, "enabled": req.enabled}))
        }
        Err(e) => store_failure(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_router;
    use axum::body::Body;
    use axum::http::Request;
    use studopt_bot::DispatchEngine;
    use studopt_channels::RecordingSink;
    use studopt_core::config::StudoptConfig;
    use studopt_store::Store;
    use tower::util::ServiceExt;

    fn state() -> (AppState, Arc<Store>, Arc<RecordingSink>) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let sink = Arc::new(RecordingSink::new());
        let config = StudoptConfig::default();
        let state = AppState {
            store: store.clone(),
            dispatch: Arc::new(DispatchEngine::new(store.clone(), &config)),
            sink: sink.clone(),
            tz: config.tz(),
            webhook_secret: "hook-secret".to_string(),
            admin_secret: "admin-secret".to_string(),
        };
        (state, store, sink)
    }

    fn webhook_body(text: &str) -> String {
        serde_json::json!({
            "event_name": "message.text.received",
            "message": {
                "from": {"id": "z1", "display_name": "An"},
                "chat": {"id": "z1"},
                "text": text,
            }
        })
        .to_string()
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (state, _, _) = state();
        let app = build_router(state);
        let res = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_secret() {
        let (state, store, sink) = state();
        let app = build_router(state);
        let mut req = post_json("/webhook", webhook_body("/help"));
        req.headers_mut()
            .insert("X-Bot-Api-Secret-Token", "wrong".parse().unwrap());
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(sink.sent_count(), 0);
        assert!(store.find_user_by_external_id("z1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_webhook_text_turn_replies() {
        let (state, store, sink) = state();
        let app = build_router(state);
        let mut req = post_json("/webhook", webhook_body("/help"));
        req.headers_mut()
            .insert("X-Bot-Api-Secret-Token", "hook-secret".parse().unwrap());
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        assert_eq!(sink.typing_count(), 1);
        let sent = sink.sent_to("z1");
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("DANH SÁCH LỆNH"));
        // Both directions of the turn are on record.
        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        assert_eq!(store.message_count(&user.id).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_webhook_ignores_unknown_events() {
        let (state, _, sink) = state();
        let app = build_router(state);
        let mut req = post_json(
            "/webhook",
            serde_json::json!({"event_name": "oa.follow"}).to_string(),
        );
        req.headers_mut()
            .insert("X-Bot-Api-Secret-Token", "hook-secret".parse().unwrap());
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(sink.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_admin_routes_require_secret() {
        let (state, _, _) = state();
        let app = build_router(state);
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/classes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_create_class() {
        let (state, store, _) = state();
        let app = build_router(state);
        let mut req = post_json(
            "/api/v1/classes",
            serde_json::json!({
                "subject_id": "IT003.P12",
                "subject_name": "Cấu trúc dữ liệu",
                "teacher": "GV A",
                "day_of_week": 1,
                "start_time": "09:00",
                "end_time": "11:30",
                "year": "2025-2026",
                "semester": 3,
                "is_main": true,
            })
            .to_string(),
        );
        req.headers_mut()
            .insert("X-Admin-Secret", "admin-secret".parse().unwrap());
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(store.all_class_subjects().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_admin_assignment_fanout() {
        let (state, store, _) = state();
        let config = StudoptConfig::default();
        let dispatch = DispatchEngine::new(store.clone(), &config);
        let app = build_router(state);

        let cls = ClassSubject {
            id: new_id(),
            subject_id: "IT003".into(),
            subject_name: "Môn IT003".into(),
            teacher: "GV".into(),
            day_of_week: 1,
            start_time: "09:00".into(),
            end_time: "11:30".into(),
            year: "2025-2026".into(),
            semester: 3,
            is_main: true,
        };
        store.insert_class_subject(&cls).unwrap();
        let sender = studopt_core::types::Sender {
            external_id: "z1".into(),
            display_name: "An".into(),
            chat_id: "z1".into(),
        };
        dispatch.handle_text(&sender, "/register").unwrap();

        let mut req = post_json(
            &format!("/api/v1/classes/{}/assignments", cls.id),
            serde_json::json!({
                "name": "BT1",
                "deadline": "2026-03-01 10:00",
            })
            .to_string(),
        );
        req.headers_mut()
            .insert("X-Admin-Secret", "admin-secret".parse().unwrap());
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let user = store.find_user_by_external_id("z1").unwrap().unwrap();
        assert_eq!(store.user_assignments(&user.id).unwrap().len(), 1);
    }
}
