//! Account lifecycle and session management.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResponse};
use crate::api::handlers::{
    optional_text, read_file_field, read_text_field, required_password, required_text, UploadedFile,
};
use crate::api::AppState;
use crate::assets::delete_best_effort;
use crate::auth::extract::{bearer_token, cookie_value, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::auth::{password, tokens, AuthUser};
use crate::config::Config;
use crate::models::playlist::{LIKED_VIDEOS_NAME, VISIBILITY_PRIVATE, WATCH_LATER_NAME};
use crate::models::user::UpdateAccountRequest;
use crate::models::{NewPlaylist, NewUser, User, Video};
use crate::schema::{playlists, users, videos, watch_history};
use crate::services::views;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Body returned by login and refresh: the user plus both tokens. The same
/// tokens also travel as HttpOnly cookies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

fn session_cookie(name: &str, value: &str, max_age_secs: i64) -> String {
    format!("{name}={value}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={max_age_secs}")
}

fn set_session_cookies(
    access: &str,
    refresh: &str,
) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    let auth = &Config::get().auth;
    AppendHeaders([
        (
            header::SET_COOKIE,
            session_cookie(ACCESS_TOKEN_COOKIE, access, auth.access_token_ttl_mins * 60),
        ),
        (
            header::SET_COOKIE,
            session_cookie(REFRESH_TOKEN_COOKIE, refresh, auth.refresh_token_ttl_days * 86_400),
        ),
    ])
}

fn clear_session_cookies() -> AppendHeaders<[(header::HeaderName, String); 2]> {
    AppendHeaders([
        (header::SET_COOKIE, session_cookie(ACCESS_TOKEN_COOKIE, "", 0)),
        (header::SET_COOKIE, session_cookie(REFRESH_TOKEN_COOKIE, "", 0)),
    ])
}

/// `POST /api/v1/users/register` (multipart)
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut full_name: Option<String> = None;
    let mut email: Option<String> = None;
    let mut user_name: Option<String> = None;
    let mut password: Option<String> = None;
    let mut avatar_file: Option<UploadedFile> = None;
    let mut cover_file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?
    {
        match field.name().unwrap_or_default() {
            "fullName" => full_name = Some(read_text_field(field).await?),
            "email" => email = Some(read_text_field(field).await?),
            "userName" => user_name = Some(read_text_field(field).await?),
            "password" => password = Some(read_text_field(field).await?),
            "avatar" => avatar_file = Some(read_file_field(field).await?),
            "coverImage" => cover_file = Some(read_file_field(field).await?),
            _ => {}
        }
    }

    let full_name = required_text(full_name, "fullName")?;
    let email = required_text(email, "email")?.to_lowercase();
    let user_name = required_text(user_name, "userName")?.to_lowercase();
    let password = required_password(password, "password")?;
    let avatar_file =
        avatar_file.ok_or_else(|| ApiError::Validation("Avatar file is required".to_string()))?;

    let mut conn = state.pool.get().await?;
    let existing: i64 = users::table
        .filter(users::user_name.eq(&user_name).or(users::email.eq(&email)))
        .count()
        .get_result(&mut conn)
        .await?;
    if existing > 0 {
        return Err(ApiError::Conflict(
            "User with this email or userName already exists".to_string(),
        ));
    }

    let avatar = state
        .assets
        .upload(&avatar_file.file_name, &avatar_file.content_type, avatar_file.bytes)
        .await?;
    let cover_image_url = match cover_file {
        Some(file) => Some(
            state
                .assets
                .upload(&file.file_name, &file.content_type, file.bytes)
                .await?
                .url,
        ),
        None => None,
    };

    let password_hash = password::hash_password(&password)?;
    let user: User = diesel::insert_into(users::table)
        .values(&NewUser {
            user_name,
            email,
            full_name,
            avatar_url: avatar.url,
            cover_image_url,
            password_hash,
        })
        .get_result(&mut conn)
        .await?;

    // Every account starts with its liked-videos and watch-later playlists.
    for (name, description) in [
        (LIKED_VIDEOS_NAME, "Liked Videos"),
        (WATCH_LATER_NAME, "Watch Later"),
    ] {
        diesel::insert_into(playlists::table)
            .values(&NewPlaylist {
                owner_id: user.id,
                name: name.to_string(),
                description: description.to_string(),
                visibility: VISIBILITY_PRIVATE.to_string(),
            })
            .execute(&mut conn)
            .await?;
    }

    Ok(ApiResponse::created(user, "User registered successfully!"))
}

/// `POST /api/v1/users/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;

    let user: Option<User> = if let Some(user_name) = optional_text(body.user_name) {
        users::table
            .filter(users::user_name.eq(user_name.to_lowercase()))
            .first(&mut conn)
            .await
            .optional()?
    } else if let Some(email) = optional_text(body.email) {
        users::table
            .filter(users::email.eq(email.to_lowercase()))
            .first(&mut conn)
            .await
            .optional()?
    } else {
        return Err(ApiError::Validation(
            "userName or email is required".to_string(),
        ));
    };

    let user = user.ok_or_else(|| ApiError::NotFound("User does not exist".to_string()))?;
    if !password::verify_password(&body.password, &user.password_hash)? {
        return Err(ApiError::Auth("Incorrect password".to_string()));
    }

    let auth = &Config::get().auth;
    let access = tokens::issue_access_token(auth, user.id, &user.user_name, &user.email)?;
    let refresh = tokens::issue_refresh_token(auth, user.id)?;
    diesel::update(users::table.find(user.id))
        .set(users::refresh_token.eq(Some(refresh.clone())))
        .execute(&mut conn)
        .await?;

    let cookies = set_session_cookies(&access, &refresh);
    let (status, body) = ApiResponse::ok(
        SessionPayload {
            user,
            access_token: access,
            refresh_token: refresh,
        },
        "User logged in successfully!",
    );
    Ok((status, cookies, body))
}

/// `POST /api/v1/users/logout`
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    diesel::update(users::table.find(auth_user.user.id))
        .set(users::refresh_token.eq(None::<String>))
        .execute(&mut conn)
        .await?;

    let (status, body) = ApiResponse::ok(serde_json::json!({}), "User logged out successfully!");
    Ok((status, clear_session_cookies(), body))
}

/// `POST /api/v1/users/refresh-token`
///
/// Verifies the presented refresh token against both its signature and the
/// single value stored on the user row, then rotates the pair.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = cookie_value(&headers, REFRESH_TOKEN_COOKIE)
        .or_else(|| bearer_token(&headers))
        .ok_or_else(|| ApiError::Auth("Refresh token not provided".to_string()))?;

    let auth = &Config::get().auth;
    let claims = tokens::verify_refresh_token(auth, &token)
        .map_err(|_| ApiError::Auth("Invalid or expired refresh token".to_string()))?;
    let user_id: i32 = claims
        .sub
        .parse()
        .map_err(|_| ApiError::Auth("Invalid refresh token".to_string()))?;

    let mut conn = state.pool.get().await?;
    let user: User = users::table
        .find(user_id)
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::Auth("User belonging to this token no longer exists".to_string()))?;

    if user.refresh_token.as_deref() != Some(token.as_str()) {
        return Err(ApiError::Auth(
            "Refresh token has been rotated or revoked".to_string(),
        ));
    }

    let access = tokens::issue_access_token(auth, user.id, &user.user_name, &user.email)?;
    let refresh = tokens::issue_refresh_token(auth, user.id)?;
    diesel::update(users::table.find(user.id))
        .set(users::refresh_token.eq(Some(refresh.clone())))
        .execute(&mut conn)
        .await?;

    let cookies = set_session_cookies(&access, &refresh);
    let (status, body) = ApiResponse::ok(
        SessionPayload {
            user,
            access_token: access,
            refresh_token: refresh,
        },
        "Tokens refreshed successfully!",
    );
    Ok((status, cookies, body))
}

/// `GET /api/v1/users/current`
pub async fn current_user(auth_user: AuthUser) -> Result<impl IntoResponse, ApiError> {
    Ok(ApiResponse::ok(
        auth_user.user,
        "Current user fetched successfully!",
    ))
}

/// `POST /api/v1/users/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_password = required_password(Some(body.new_password), "newPassword")?;
    if new_password != body.confirm_new_password {
        return Err(ApiError::Validation(
            "New password and confirmation do not match".to_string(),
        ));
    }
    if !password::verify_password(&body.password, &auth_user.user.password_hash)? {
        return Err(ApiError::Validation("Invalid password".to_string()));
    }

    let password_hash = password::hash_password(&new_password)?;
    let mut conn = state.pool.get().await?;
    diesel::update(users::table.find(auth_user.user.id))
        .set((
            users::password_hash.eq(password_hash),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Password changed successfully!",
    ))
}

/// `PATCH /api/v1/users/update-account`
pub async fn update_account(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let full_name = optional_text(body.full_name);
    let email = optional_text(body.email).map(|e| e.to_lowercase());
    if full_name.is_none() && email.is_none() {
        return Err(ApiError::Validation(
            "At least one of fullName or email is required".to_string(),
        ));
    }

    let mut conn = state.pool.get().await?;
    if let Some(ref email) = email {
        let taken: i64 = users::table
            .filter(users::email.eq(email))
            .filter(users::id.ne(auth_user.user.id))
            .count()
            .get_result(&mut conn)
            .await?;
        if taken > 0 {
            return Err(ApiError::Conflict("Email is already in use".to_string()));
        }
    }

    let user: User = diesel::update(users::table.find(auth_user.user.id))
        .set((
            users::full_name.eq(full_name.unwrap_or(auth_user.user.full_name)),
            users::email.eq(email.unwrap_or(auth_user.user.email)),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result(&mut conn)
        .await?;

    Ok(ApiResponse::ok(user, "Account updated successfully!"))
}

async fn single_file_field(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?
    {
        if field.name() == Some(field_name) {
            return read_file_field(field).await;
        }
    }
    Err(ApiError::Validation(format!("{field_name} file is required")))
}

/// `PATCH /api/v1/users/avatar`
pub async fn update_avatar(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let file = single_file_field(&mut multipart, "avatar").await?;
    let stored = state
        .assets
        .upload(&file.file_name, &file.content_type, file.bytes)
        .await?;

    let mut conn = state.pool.get().await?;
    let user: User = diesel::update(users::table.find(auth_user.user.id))
        .set((
            users::avatar_url.eq(stored.url),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result(&mut conn)
        .await?;

    delete_best_effort(state.assets.as_ref(), &auth_user.user.avatar_url).await;

    Ok(ApiResponse::ok(user, "Avatar updated successfully!"))
}

/// `PATCH /api/v1/users/cover-image`
pub async fn update_cover_image(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let file = single_file_field(&mut multipart, "coverImage").await?;
    let stored = state
        .assets
        .upload(&file.file_name, &file.content_type, file.bytes)
        .await?;

    let mut conn = state.pool.get().await?;
    let user: User = diesel::update(users::table.find(auth_user.user.id))
        .set((
            users::cover_image_url.eq(Some(stored.url)),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result(&mut conn)
        .await?;

    if let Some(old) = auth_user.user.cover_image_url.as_deref() {
        delete_best_effort(state.assets.as_ref(), old).await;
    }

    Ok(ApiResponse::ok(user, "Cover image updated successfully!"))
}

/// `GET /api/v1/users/profile/:userName`
pub async fn channel_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let profile = views::channel_profile(&mut conn, &user_name, Some(auth_user.user.id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Channel does not exist!".to_string()))?;

    Ok(ApiResponse::ok(
        profile,
        "Channel profile fetched successfully!",
    ))
}

/// `GET /api/v1/users/watch-history`
pub async fn watch_history(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let watched: Vec<Video> = watch_history::table
        .inner_join(videos::table.on(videos::id.eq(watch_history::video_id)))
        .filter(watch_history::user_id.eq(auth_user.user.id))
        .order(watch_history::watched_at.desc())
        .select(Video::as_select())
        .load(&mut conn)
        .await?;

    let history = views::videos_with_owners(&mut conn, watched).await?;
    Ok(ApiResponse::ok(
        history,
        "Watch history fetched successfully!",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only_and_scoped() {
        let cookie = session_cookie("accessToken", "tok", 3600);
        assert!(cookie.starts_with("accessToken=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=3600"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let cookie = session_cookie("refreshToken", "", 0);
        assert!(cookie.starts_with("refreshToken=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
