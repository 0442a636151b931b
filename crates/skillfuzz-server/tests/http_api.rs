//! HTTP API tests against a live server on an ephemeral port.

use serde_json::{json, Value};
use tokio::net::TcpListener;

use skillfuzz_core::pipeline::quiz;
use skillfuzz_server::{serve, AppState, ErrorBody, SkillfuzzConfig};

async fn spawn_server(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        serve(listener, state, true).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health() {
    let base = spawn_server(AppState::builtin().unwrap()).await;
    let response = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn topic_levels_for_several_topics() {
    let base = spawn_server(AppState::builtin().unwrap()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/compute-user-levels/"))
        .json(&json!({
            "user_id": "user-42",
            "topic_scores": {"algebra": 48, "geometry": 5, "calculus": 45},
            "total_time": 1800,
            "wrong_questions_data": {"geometry": [{"point": 5}, {"point": 10}]}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "topic_levels": {
                "algebra": "Advanced",
                "calculus": "Advanced",
                "geometry": "Beginner"
            },
            "overall_level": "Intermediate"
        })
    );
}

#[tokio::test]
async fn wrong_questions_data_is_optional() {
    let base = spawn_server(AppState::builtin().unwrap()).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/compute-user-levels"))
        .json(&json!({"user_id": "u", "topic_scores": {"algebra": 50}, "total_time": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["overall_level"], "Advanced");
}

#[tokio::test]
async fn evaluate_quiz() {
    let base = spawn_server(AppState::builtin().unwrap()).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/evaluate"))
        .json(&json!({"total_score": 260, "total_time": 500, "topic_scores": {"algebra": 60}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"level": "Advanced"}));
}

#[tokio::test]
async fn request_errors_are_422_with_kind() {
    let base = spawn_server(AppState::builtin().unwrap()).await;
    let client = reqwest::Client::new();

    let cases = [
        (
            "/evaluate",
            json!({"total_score": 0, "total_time": 5000, "topic_scores": {"algebra": 35}}),
            "degenerate_aggregate",
        ),
        (
            "/evaluate",
            json!({"total_score": 900, "total_time": 500, "topic_scores": {"algebra": 60}}),
            "invalid_input",
        ),
        (
            "/compute-user-levels/",
            json!({"user_id": "u", "topic_scores": {}, "total_time": 0}),
            "no_topics",
        ),
        (
            "/compute-user-levels/",
            json!({
                "user_id": "u",
                "topic_scores": {"algebra": 30},
                "total_time": 0,
                "wrong_questions_data": {"algebra": [{"point": 7}]}
            }),
            "invalid_input",
        ),
    ];

    for (path, body, kind) in cases {
        let response = client
            .post(format!("{base}{path}"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 422, "{path} {body}");
        let error: ErrorBody = response.json().await.unwrap();
        assert_eq!(error.kind, kind);
    }
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let base = spawn_server(AppState::builtin().unwrap()).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/evaluate"))
        .header("content-type", "application/json")
        .body("{\"total_score\": ")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn configured_pipeline_overrides_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quiz.toml");
    let strict = quiz::BUILTIN_DEFINITION.replace(
        "levels = { advanced = 50, intermediate = 25 }",
        "levels = { advanced = 65, intermediate = 25 }",
    );
    std::fs::write(&path, strict).unwrap();

    let mut config = SkillfuzzConfig::default();
    config.pipelines.quiz = Some(path);
    let base = spawn_server(AppState::from_config(&config).unwrap()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/evaluate"))
        .json(&json!({"total_score": 260, "total_time": 500, "topic_scores": {"algebra": 60}}))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    // 54.3 no longer clears the raised bar
    assert_eq!(body, json!({"level": "Intermediate"}));
}
