//! Integration tests for the `/detectface` trigger and `/getface` poll endpoints.
//!
//! Jobs are small `sh -c` scripts run in a temporary working directory.
#![cfg(unix)]

mod common;

use axum::http::StatusCode;
use common::{body_bytes, body_json, build_test_app, get, test_config, wait_for_job};
use serde_json::json;

const WRITE_WHITE_FACE: &str = r#"echo '{"faces":{"U":"white"}}' > latest_cube_state.json"#;

// ---------------------------------------------------------------------------
// Test: trigger, wait, poll returns the document, second poll returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_cycle_returns_document_then_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = build_test_app(test_config(dir.path(), WRITE_WHITE_FACE));

    let response = get(&app, "/detectface").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());

    wait_for_job(&state).await;

    let response = get(&app, "/getface").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
    assert_eq!(body_json(response).await, json!({ "faces": { "U": "white" } }));

    let response = get(&app, "/getface").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: poll before any trigger returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn poll_without_trigger_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let (_state, app) = build_test_app(test_config(dir.path(), WRITE_WHITE_FACE));

    let response = get(&app, "/getface").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: poll while the job runs returns 425 without waiting for it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn poll_while_running_returns_425_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = build_test_app(test_config(dir.path(), "sleep 5"));

    assert_eq!(get(&app, "/detectface").await.status(), StatusCode::OK);

    let started = std::time::Instant::now();
    let response = get(&app, "/getface").await;
    assert_eq!(response.status().as_u16(), 425);
    assert!(started.elapsed() < std::time::Duration::from_secs(1));

    state.coordinator.shutdown().await;
}

// ---------------------------------------------------------------------------
// Test: second trigger while running returns 423 and spawns nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_trigger_while_running_returns_423() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = build_test_app(test_config(
        dir.path(),
        "echo run >> runs.log; sleep 0.5",
    ));

    assert_eq!(get(&app, "/detectface").await.status(), StatusCode::OK);
    assert_eq!(get(&app, "/detectface").await.status(), StatusCode::LOCKED);

    wait_for_job(&state).await;

    let runs = std::fs::read_to_string(dir.path().join("runs.log")).unwrap();
    assert_eq!(runs.lines().count(), 1);
    assert_eq!(state.coordinator.status().jobs_started, 1);
}

// ---------------------------------------------------------------------------
// Test: concurrent triggers through the router start exactly one job
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_triggers_start_one_job() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = build_test_app(test_config(
        dir.path(),
        "echo run >> runs.log; sleep 0.3",
    ));

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { get(&app, "/detectface").await.status() })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        let status = handle.await.unwrap();
        if status == StatusCode::OK {
            accepted += 1;
        } else {
            assert_eq!(status, StatusCode::LOCKED);
        }
    }
    assert_eq!(accepted, 1);

    wait_for_job(&state).await;
    let runs = std::fs::read_to_string(dir.path().join("runs.log")).unwrap();
    assert_eq!(runs.lines().count(), 1);
}

// ---------------------------------------------------------------------------
// Test: missing result file yields 200 with the error document
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_result_file_returns_error_document() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = build_test_app(test_config(dir.path(), "exit 0"));

    get(&app, "/detectface").await;
    wait_for_job(&state).await;

    let response = get(&app, "/getface").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Cube state not available" })
    );
}

// ---------------------------------------------------------------------------
// Test: invalid JSON in the result file yields 200 with the error document
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_result_file_returns_error_document() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = build_test_app(test_config(
        dir.path(),
        "printf '{\"faces\": ' > latest_cube_state.json",
    ));

    get(&app, "/detectface").await;
    wait_for_job(&state).await;

    let response = get(&app, "/getface").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Cube state not available" })
    );
}

// ---------------------------------------------------------------------------
// Test: a non-zero exit still completes the cycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_job_still_returns_result_file() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = build_test_app(test_config(
        dir.path(),
        r#"echo '{"faces":{"F":"green"}}' > latest_cube_state.json; exit 1"#,
    ));

    get(&app, "/detectface").await;
    wait_for_job(&state).await;

    let response = get(&app, "/getface").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["faces"]["F"], "green");
}

// ---------------------------------------------------------------------------
// Test: a job that cannot be spawned returns 500 and leaves the service usable
// ---------------------------------------------------------------------------

#[tokio::test]
async fn spawn_failure_returns_500_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path(), "exit 0");
    config.job_program = "no-such-detector-binary".to_string();
    let (_state, app) = build_test_app(config);

    let response = get(&app, "/detectface").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "JOB_SPAWN_FAILED");

    let response = get(&app, "/getface").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: a hung job is killed by the timeout and the cycle completes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timed_out_job_completes_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path(), "sleep 30");
    config.job_timeout_secs = 1;
    let (state, app) = build_test_app(config);

    assert_eq!(get(&app, "/detectface").await.status(), StatusCode::OK);
    wait_for_job(&state).await;

    let response = get(&app, "/getface").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Cube state not available" })
    );
}

// ---------------------------------------------------------------------------
// Test: trailing-slash routes behave the same
// ---------------------------------------------------------------------------

#[tokio::test]
async fn trailing_slash_routes_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = build_test_app(test_config(dir.path(), WRITE_WHITE_FACE));

    assert_eq!(get(&app, "/getface/").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/detectface/").await.status(), StatusCode::OK);
    wait_for_job(&state).await;
    assert_eq!(get(&app, "/getface/").await.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Test: the finished job's document is served even if the file changes later
// ---------------------------------------------------------------------------

#[tokio::test]
async fn finished_result_survives_later_file_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let (state, app) = build_test_app(test_config(dir.path(), WRITE_WHITE_FACE));

    get(&app, "/detectface").await;
    wait_for_job(&state).await;

    std::fs::write(dir.path().join("latest_cube_state.json"), "").unwrap();

    let response = get(&app, "/getface").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "faces": { "U": "white" } }));
}
