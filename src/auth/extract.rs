use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::auth::tokens;
use crate::config::Config;
use crate::models::User;
use crate::schema::users;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Token from the `Authorization: Bearer ...` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
}

/// Value of a named cookie from the `Cookie` header, if present.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

async fn load_authenticated_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<User, ApiError> {
    let token = bearer_token(headers)
        .or_else(|| cookie_value(headers, ACCESS_TOKEN_COOKIE))
        .ok_or_else(|| ApiError::Auth("Access token not provided".to_string()))?;

    let claims = tokens::verify_access_token(&Config::get().auth, &token)
        .map_err(|_| ApiError::Auth("Invalid or expired access token".to_string()))?;
    let user_id: i32 = claims
        .sub
        .parse()
        .map_err(|_| ApiError::Auth("Invalid access token".to_string()))?;

    let mut conn = state.pool.get().await?;
    users::table
        .find(user_id)
        .first::<User>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::Auth("User belonging to this token no longer exists".to_string()))
}

/// Extractor for routes that require a logged-in caller. Verifies the access
/// token from the bearer header or cookie and loads the user row.
pub struct AuthUser {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let user = load_authenticated_user(state, &parts.headers).await?;
        Ok(AuthUser { user })
    }
}

/// Extractor for routes that are readable anonymously but compute
/// viewer-relative fields when a valid token is present. A missing or bad
/// token degrades to `None` rather than rejecting.
pub struct MaybeAuthUser(pub Option<User>);

impl MaybeAuthUser {
    pub fn viewer_id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.id)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        Ok(MaybeAuthUser(
            load_authenticated_user(state, &parts.headers).await.ok(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_authorization_header_yields_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; accessToken=tok123; lang=en"),
        );
        assert_eq!(
            cookie_value(&headers, ACCESS_TOKEN_COOKIE).as_deref(),
            Some("tok123")
        );
        assert_eq!(cookie_value(&headers, REFRESH_TOKEN_COOKIE), None);
    }
}
