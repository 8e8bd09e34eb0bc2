mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use common::{app_state, settle};
use pump_timer::create_router;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let (state, _) = app_state();
    let app = create_router(state);

    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn device_lifecycle_over_http() {
    let (state, _) = app_state();
    let app = create_router(state);

    let (status, body) = call(&app, Method::POST, "/devices", Some(json!({"key": "dev1"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["motorState"], "OFF");
    assert_eq!(body["timerRemaining"], "00:00");

    let (status, _) = call(&app, Method::POST, "/devices", Some(json!({"key": "dev1"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(
        &app,
        Method::PATCH,
        "/devices/dev1",
        Some(json!({"motorState": "on", "totalLitres": 120.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["motorState"], "ON");
    assert_eq!(body["totalLitres"], 120.0);

    let (status, body) = call(&app, Method::GET, "/devices?page=1&limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["lastPage"], 1);

    let (status, body) = call(&app, Method::POST, "/devices/dev1/heartbeat", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["lastHeartbeat"].is_string());

    let (status, _) = call(&app, Method::DELETE, "/devices/dev1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(&app, Method::GET, "/devices/dev1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("dev1"));
}

#[tokio::test(start_paused = true)]
async fn timer_status_follows_the_countdown() {
    let (state, _) = app_state();
    state.create_device("dev1").await.unwrap();
    let app = create_router(state);

    let (_, body) = call(&app, Method::GET, "/devices/dev1/timer", None).await;
    assert_eq!(body["active"], false);

    let (status, _) = call(
        &app,
        Method::PATCH,
        "/devices/dev1",
        Some(json!({"timerRemaining": "00:02"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    settle(10_500).await;
    let (status, body) = call(&app, Method::GET, "/devices/dev1/timer", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], true);
    assert_eq!(body["phase"], "running");
    assert_eq!(body["remainingSeconds"], 110);
    assert_eq!(body["timerRemaining"], "00:01");

    let (_, body) = call(&app, Method::GET, "/status", None).await;
    assert_eq!(body["activeTimers"], 1);

    let (status, _) = call(&app, Method::GET, "/devices/ghost/timer", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_timer_is_a_bad_request() {
    let (state, _) = app_state();
    state.create_device("dev1").await.unwrap();
    let app = create_router(state.clone());

    let (status, body) = call(
        &app,
        Method::PATCH,
        "/devices/dev1",
        Some(json!({"timerRemaining": "12:60", "height": 90.0})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("12:60"));
    assert_eq!(state.get_device("dev1").await.unwrap().height, 90.0);
    assert_eq!(state.active_timers(), 0);
}

#[tokio::test]
async fn patching_an_unknown_device_is_not_found() {
    let (state, _) = app_state();
    let app = create_router(state);

    let (status, _) = call(
        &app,
        Method::PATCH,
        "/devices/ghost",
        Some(json!({"motorState": "OFF"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
