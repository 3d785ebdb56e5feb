use std::sync::Arc;

use cubescan_core::coordinator::JobCoordinator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Single-flight coordinator for the detection job.
    pub coordinator: Arc<JobCoordinator>,
}

impl AppState {
    /// Build the state, deriving the coordinator's job from `config`.
    pub fn new(config: ServerConfig) -> Self {
        let coordinator = Arc::new(JobCoordinator::new(config.detection_job()));
        Self {
            config: Arc::new(config),
            coordinator,
        }
    }
}
