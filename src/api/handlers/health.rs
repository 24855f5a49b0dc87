use axum::response::IntoResponse;

use crate::api::error::ApiResponse;

/// Liveness probe. Static envelope, never touches the database.
pub async fn healthcheck() -> impl IntoResponse {
    ApiResponse::ok(serde_json::json!({}), "Everything is O.K.")
}
