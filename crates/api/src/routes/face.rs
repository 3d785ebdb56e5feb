use axum::routing::get;
use axum::Router;

use crate::handlers::face;
use crate::state::AppState;

/// Mount the trigger and poll routes.
///
/// ```text
/// /detectface      trigger the detection job
/// /getface         poll for the result
/// ```
///
/// Trailing-slash variants are accepted as well.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/detectface", get(face::detect_face))
        .route("/detectface/", get(face::detect_face))
        .route("/getface", get(face::get_face))
        .route("/getface/", get(face::get_face))
}
