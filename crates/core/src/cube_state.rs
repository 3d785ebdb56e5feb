//! Loading the cube state document written by the detection program.
//!
//! The schema belongs to the external program; here it is only an untyped
//! JSON object.

use std::path::Path;

use serde_json::{json, Map, Value};

use crate::error::CoreError;

/// File the detection program writes into its working directory.
pub const RESULT_FILE_NAME: &str = "latest_cube_state.json";

/// Message returned in place of the document when it cannot be read.
pub const STATE_UNAVAILABLE_MESSAGE: &str = "Cube state not available";

/// An untyped cube state document.
pub type CubeState = Map<String, Value>;

/// Read and parse the cube state at `path`.
///
/// A missing file, an I/O error, invalid JSON, or a top-level value that is
/// not an object all map to [`CoreError::StateUnavailable`].
pub async fn load_cube_state(path: &Path) -> Result<CubeState, CoreError> {
    let unavailable = |reason: String| CoreError::StateUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    match serde_json::from_slice::<Value>(&bytes).map_err(|e| unavailable(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(unavailable(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

/// Read the cube state, degrading to [`unavailable_document`] on any failure.
pub async fn load_or_unavailable(path: &Path) -> Value {
    match load_cube_state(path).await {
        Ok(state) => Value::Object(state),
        Err(e) => {
            tracing::warn!(error = %e, "Cube state could not be loaded");
            unavailable_document()
        }
    }
}

/// `{"error": "Cube state not available"}`
pub fn unavailable_document() -> Value {
    json!({ "error": STATE_UNAVAILABLE_MESSAGE })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
