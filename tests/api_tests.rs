mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use comicforge::config::Config;
use comicforge::state::SharedState;
use common::{Harness, HarnessBuilder};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> (Router, Harness) {
    let harness = HarnessBuilder::new().build().await;

    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.output_dir = harness.output.path().display().to_string();

    let shared = Arc::new(SharedState::with_pipeline(
        config,
        harness.store.clone(),
        harness.pipeline.clone(),
    ));
    let state = comicforge::api::create_app_state(shared, None);
    (comicforge::api::router(state).await, harness)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: &Router, uri: &str, payload: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

/// Reads a whole progress stream and returns the JSON of each event.
async fn read_progress(app: &Router, task_id: &str) -> Vec<Value> {
    let request = Request::builder()
        .uri(format!("/api/progress/{task_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);

    String::from_utf8(body)
        .unwrap()
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

fn custom_payload() -> Value {
    json!({
        "title": "Bear Visit",
        "story": "A black bear wandered into the downtown bakery on Main Street before dawn.",
        "location": "Lillooet",
        "user_id": 3
    })
}

#[tokio::test]
async fn test_custom_comic_streams_to_completion() {
    let (app, _harness) = spawn_app().await;

    let (status, body) = post_json(&app, "/api/comics/custom", &custom_payload()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let task_id = body["data"]["task_id"].as_str().unwrap().to_string();

    let (status, body) = get_json(&app, &format!("/api/tasks/{task_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["kind"], "custom");
    assert_eq!(body["data"]["parameters"]["title"], "Bear Visit");

    let events = read_progress(&app, &task_id).await;
    let last = events.last().unwrap();
    assert_eq!(last["success"], true);
    assert_eq!(last["result"]["comics"][0]["title"], "Bear Visit");

    let percents: Vec<u64> = events
        .iter()
        .filter_map(|e| e["progress"].as_u64())
        .collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));

    // The task is gone once its terminal event was delivered.
    let (status, _) = send(
        &app,
        Request::builder()
            .uri(format!("/api/progress/{task_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get_json(&app, "/api/comics?location=Lillooet&user_id=3").await;
    assert_eq!(status, StatusCode::OK);
    let comics = body["data"].as_array().unwrap();
    assert_eq!(comics.len(), 1);
    let image_url = comics[0]["image_urls"][0].as_str().unwrap();
    assert!(image_url.starts_with("/output/Lillooet_comics/"));

    let (status, served) = send(&app, Request::builder().uri(image_url).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, b"png");

    let id = comics[0]["id"].as_i64().unwrap();
    let (status, body) = get_json(&app, &format!("/api/comics/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["location"], "Lillooet");

    let (_, body) = get_json(&app, "/api/comics/locations").await;
    assert_eq!(body["data"], json!(["Lillooet"]));
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let (app, _harness) = spawn_app().await;

    let (status, body) = get_json(&app, "/api/progress/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("does-not-exist"));
}

#[tokio::test]
async fn test_missing_comic_is_not_found() {
    let (app, _harness) = spawn_app().await;

    let (status, _) = get_json(&app, "/api/comics/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_validation() {
    let (app, _harness) = spawn_app().await;

    let (status, body) = post_json(&app, "/api/comics/daily", &json!({ "location": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Location cannot be empty");

    let mut payload = custom_payload();
    payload["story"] = json!("");
    let (status, _) = post_json(&app, "/api/comics/custom", &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/api/comics/media",
        &json!({ "media_type": "video", "path": "/no/such/dir", "location": "Coast" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/api/comics?start_date=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_daily_without_events_reports_quiet_area() {
    let (app, _harness) = spawn_app().await;

    let (_, body) = post_json(&app, "/api/comics/daily", &json!({ "location": "Nowhere" })).await;
    let task_id = body["data"]["task_id"].as_str().unwrap().to_string();

    let events = read_progress(&app, &task_id).await;
    let last = events.last().unwrap();
    assert_eq!(last["success"], true);
    assert_eq!(last["result"]["no_current_events"], true);
    assert_eq!(last["result"]["comics"][0]["title"], "No Current News Events");
}

#[tokio::test]
async fn test_purge_and_health() {
    let (app, _harness) = spawn_app().await;

    let (_, body) = post_json(&app, "/api/comics/custom", &custom_payload()).await;
    let task_id = body["data"]["task_id"].as_str().unwrap().to_string();
    read_progress(&app, &task_id).await;

    let (status, body) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["active_tasks"], 0);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/comics")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["data"]["deleted"], 1);

    let (_, body) = get_json(&app, "/api/comics").await;
    assert!(body["data"].as_array().unwrap().is_empty());
}
