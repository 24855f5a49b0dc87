pub mod comments;
pub mod dashboard;
pub mod dislikes;
pub mod health;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

use axum::extract::multipart::Field;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Common `?page=&limit=` query parameters. Out-of-range values are clamped
/// rather than rejected.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// Pagination block attached to list responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, params: &PageParams) -> Self {
        let limit = params.limit();
        Pagination {
            total,
            page: params.page(),
            limit,
            total_pages: (total + limit - 1) / limit.max(1),
        }
    }
}

/// A file pulled out of a multipart request, buffered in memory before it is
/// relayed to the asset store.
pub(crate) struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub(crate) async fn read_file_field(field: Field<'_>) -> Result<UploadedFile, ApiError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|_| ApiError::Validation("Failed to read uploaded file".to_string()))?
        .to_vec();
    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
    })
}

pub(crate) async fn read_text_field(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::Validation("Malformed multipart field".to_string()))
}

/// Trim a multipart/JSON text value and reject blank or missing input.
pub(crate) fn required_text(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::Validation(format!("{name} is required"))),
    }
}

/// Reject blank or missing passwords but hand back the value untouched.
/// Trimming here would make a whitespace-padded password unverifiable at
/// login, which hashes exactly what the client sent.
pub(crate) fn required_password(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::Validation(format!("{name} is required"))),
    }
}

/// Normalize an optional text value: trimmed, blank collapses to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_default_and_clamp() {
        let defaults = PageParams::default();
        assert_eq!(defaults.page(), 1);
        assert_eq!(defaults.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(defaults.offset(), 0);

        let wild = PageParams {
            page: Some(-3),
            limit: Some(10_000),
        };
        assert_eq!(wild.page(), 1);
        assert_eq!(wild.limit(), MAX_PAGE_SIZE);

        let third = PageParams {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(third.offset(), 40);
    }

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(
            required_text(Some("  chai  ".to_string()), "userName").unwrap(),
            "chai"
        );
        assert!(required_text(Some("   ".to_string()), "userName").is_err());
        assert!(required_text(None, "userName").is_err());
    }

    #[test]
    fn required_password_keeps_surrounding_whitespace() {
        assert_eq!(
            required_password(Some("  s3cret pw  ".to_string()), "password").unwrap(),
            "  s3cret pw  "
        );
        assert!(required_password(Some("   ".to_string()), "password").is_err());
        assert!(required_password(None, "password").is_err());
    }

    #[test]
    fn optional_text_collapses_blank_to_none() {
        assert_eq!(optional_text(Some("  x ".to_string())).as_deref(), Some("x"));
        assert_eq!(optional_text(Some("   ".to_string())), None);
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn pagination_rounds_total_pages_up() {
        let params = PageParams {
            page: Some(1),
            limit: Some(10),
        };
        assert_eq!(Pagination::new(0, &params).total_pages, 0);
        assert_eq!(Pagination::new(10, &params).total_pages, 1);
        assert_eq!(Pagination::new(11, &params).total_pages, 2);
    }
}
