use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cubescan_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `cubescan_core`.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                // Config validation fails at startup and poll degrades missing
                // state to its error document, so neither reaches a handler.
                CoreError::Validation(_) | CoreError::StateUnavailable { .. } => {
                    tracing::error!(error = %core, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
                CoreError::Spawn { program, source } => {
                    tracing::error!(%program, error = %source, "Detection job could not be started");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "JOB_SPAWN_FAILED",
                        "The detection job could not be started".to_string(),
                    )
                }
            },
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
