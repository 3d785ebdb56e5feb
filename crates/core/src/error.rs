use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cube state unavailable at {path}: {reason}")]
    StateUnavailable { path: PathBuf, reason: String },

    #[error("Failed to spawn job program '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
