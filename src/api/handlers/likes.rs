//! Like toggles and the caller's liked-videos listing.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::api::error::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::models::reaction::TARGET_VIDEO;
use crate::models::{ReactionKind, ReactionTarget, Video};
use crate::schema::{likes, videos};
use crate::services::{reactions, views};

/// `POST /api/v1/likes/toggle/video/:videoId`
pub async fn toggle_video_like(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let summary = reactions::toggle(
        &mut conn,
        ReactionKind::Like,
        auth_user.user.id,
        ReactionTarget::Video(video_id),
    )
    .await?;
    Ok(ApiResponse::ok(summary, "Video like toggled successfully!"))
}

/// `POST /api/v1/likes/toggle/comment/:commentId`
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let summary = reactions::toggle(
        &mut conn,
        ReactionKind::Like,
        auth_user.user.id,
        ReactionTarget::Comment(comment_id),
    )
    .await?;
    Ok(ApiResponse::ok(summary, "Comment like toggled successfully!"))
}

/// `POST /api/v1/likes/toggle/tweet/:tweetId`
pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(tweet_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let summary = reactions::toggle(
        &mut conn,
        ReactionKind::Like,
        auth_user.user.id,
        ReactionTarget::Tweet(tweet_id),
    )
    .await?;
    Ok(ApiResponse::ok(summary, "Tweet like toggled successfully!"))
}

/// `GET /api/v1/likes/videos/self`
pub async fn liked_videos(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let liked: Vec<Video> = likes::table
        .inner_join(videos::table.on(videos::id.eq(likes::target_id)))
        .filter(likes::owner_id.eq(auth_user.user.id))
        .filter(likes::target_kind.eq(TARGET_VIDEO))
        .order(likes::created_at.desc())
        .select(Video::as_select())
        .load(&mut conn)
        .await?;

    let items = views::videos_with_owners(&mut conn, liked).await?;
    Ok(ApiResponse::ok(items, "Liked videos fetched successfully!"))
}
