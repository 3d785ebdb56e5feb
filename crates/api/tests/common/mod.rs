use std::path::Path;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use cubescan_api::config::ServerConfig;
use cubescan_api::router::build_app_router;
use cubescan_api::state::AppState;

/// Build a test `ServerConfig` whose job runs `script` through `sh -c` in `dir`.
pub fn test_config(dir: &Path, script: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        job_program: "sh".to_string(),
        job_args: vec!["-c".to_string(), script.to_string()],
        job_working_dir: dir.to_path_buf(),
        job_timeout_secs: 0,
    }
}

/// Build the shared state and the full application router for `config`.
///
/// The state is returned too so tests can inspect the coordinator directly.
pub fn build_test_app(config: ServerConfig) -> (AppState, Router) {
    let state = AppState::new(config.clone());
    let app = build_app_router(state.clone(), &config);
    (state, app)
}

/// Issue a GET request against `app`.
pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Collect a response body into raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Poll the coordinator until the job leaves `Running`.
pub async fn wait_for_job(state: &AppState) {
    use cubescan_core::status::JobStatus;

    for _ in 0..200 {
        if state.coordinator.status().status != JobStatus::Running {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
    panic!("job did not finish in time");
}
