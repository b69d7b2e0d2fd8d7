//! HTTP API tests.
//!
//! Every test drives the router in-process with `oneshot`, backed by the
//! in-memory conversation and record stores.

use access_assistant::assistant::{ Assistant, TypingDelay };
use access_assistant::history::MemoryConversationStore;
use access_assistant::persistence::MemoryPersistence;
use access_assistant::sensors::BiometricReading;
use access_assistant::server::{ api, AppContext };
use axum::{ body::Body, http::{ Request, StatusCode } };
use chrono::Utc;
use serde_json::{ json, Value };
use std::sync::Arc;
use tokio::sync::watch;
use tower::ServiceExt;

fn context_with_reading(reading: BiometricReading) -> AppContext {
    let assistant = Assistant::new(Arc::new(MemoryConversationStore::new())).with_typing_delay(
        TypingDelay::NONE
    );
    // The receiver keeps serving the last value after the sender is gone.
    let (_tx, rx) = watch::channel(reading);
    AppContext {
        assistant: Arc::new(assistant),
        records: Arc::new(MemoryPersistence::new()),
        biometrics: rx,
        history_default_limit: 50,
    }
}

fn test_context() -> AppContext {
    context_with_reading(BiometricReading::baseline(Utc::now()))
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) =>
            builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let app = api::router(test_context());
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["rules"], 13);
}

#[tokio::test]
async fn test_classify() {
    let app = api::router(test_context());
    let (status, body) = send(
        &app,
        "POST",
        "/api/classify",
        Some(json!({ "text": "I need emergency help now" }))
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "emergency");
    assert!(body["suggestions"].as_array().is_some_and(|s| !s.is_empty()));

    let (_, body) = send(&app, "POST", "/api/classify", Some(json!({ "text": "" }))).await;
    assert_eq!(body["intent"], "fallback");
}

#[tokio::test]
async fn test_conversation_messages_and_history() {
    let app = api::router(test_context());

    let (status, body) = send(
        &app,
        "POST",
        "/api/conversations/desk-42/messages",
        Some(json!({ "text": "How do I use voice commands?" }))
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "voice_commands");
    assert_eq!(body["message"]["sender"], "bot");

    send(
        &app,
        "POST",
        "/api/conversations/desk-42/messages",
        Some(json!({ "text": "thank you" }))
    ).await;

    let (status, body) = send(&app, "GET", "/api/conversations/desk-42", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "desk-42");
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[0]["text"], "How do I use voice commands?");

    let (_, body) = send(&app, "GET", "/api/conversations/desk-42?limit=1", None).await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/api/conversations/nobody", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reload_without_rule_file() {
    let app = api::router(test_context());
    let (status, body) = send(&app, "GET", "/api/reload-rules", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Rules unchanged");
}

#[tokio::test]
async fn test_voice() {
    let app = api::router(test_context());

    let (status, body) = send(
        &app,
        "POST",
        "/api/voice",
        Some(json!({ "transcript": "Call for HELP!" }))
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recognized"], true);
    assert_eq!(body["matched"]["command"], "emergency_alert");

    let (_, body) = send(
        &app,
        "POST",
        "/api/voice",
        Some(json!({ "transcript": "purple elephant" }))
    ).await;
    assert_eq!(body["recognized"], false);
    assert!(body.get("matched").is_none());
}

#[tokio::test]
async fn test_biometrics_alerts() {
    let stressed = BiometricReading {
        heart_rate: 120,
        stress_level: 90,
        posture_score: 40,
        recorded_at: Utc::now(),
    };
    let app = api::router(context_with_reading(stressed));

    let (status, body) = send(&app, "GET", "/api/biometrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reading"]["heart_rate"], 120);
    let kinds: Vec<_> = body["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, vec!["poor_posture", "high_stress", "elevated_heart_rate"]);

    let app = api::router(test_context());
    let (_, body) = send(&app, "GET", "/api/biometrics", None).await;
    assert!(body["alerts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_record_crud() {
    let app = api::router(test_context());

    let (status, created) = send(
        &app,
        "POST",
        "/api/records/buddy_requests",
        Some(json!({ "requester": "sam", "floor": 3, "status": "pending" }))
    ).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["collection"], "buddy_requests");
    assert_eq!(created["data"]["requester"], "sam");

    send(
        &app,
        "POST",
        "/api/records/buddy_requests",
        Some(json!({ "requester": "kai", "floor": 5, "status": "pending" }))
    ).await;

    let (status, listed) = send(&app, "GET", "/api/records/buddy_requests", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let (_, filtered) = send(&app, "GET", "/api/records/buddy_requests?floor=3", None).await;
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["id"], id.as_str());

    let uri = format!("/api/records/buddy_requests/{}", id);
    let (status, updated) = send(&app, "PATCH", &uri, Some(json!({ "status": "matched" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["status"], "matched");
    assert_eq!(updated["data"]["requester"], "sam");

    let (status, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, updated);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id));
}

#[tokio::test]
async fn test_record_errors() {
    let app = api::router(test_context());

    let (status, body) = send(&app, "GET", "/api/records/parking_spots", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("parking_spots"));

    let (status, _) = send(&app, "POST", "/api/records/meetings", Some(json!(["not", "an", "object"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", "/api/records/check_ins/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
