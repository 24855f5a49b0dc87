//! Dislike toggles. Disliking a video also pulls it out of the caller's
//! liked-videos playlist; that side effect lives in the toggle service.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use crate::api::error::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::models::{ReactionKind, ReactionTarget};
use crate::services::reactions;

/// `POST /api/v1/dislikes/toggle/video/:videoId`
pub async fn toggle_video_dislike(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let summary = reactions::toggle(
        &mut conn,
        ReactionKind::Dislike,
        auth_user.user.id,
        ReactionTarget::Video(video_id),
    )
    .await?;
    Ok(ApiResponse::ok(summary, "Video dislike toggled successfully!"))
}

/// `POST /api/v1/dislikes/toggle/comment/:commentId`
pub async fn toggle_comment_dislike(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let summary = reactions::toggle(
        &mut conn,
        ReactionKind::Dislike,
        auth_user.user.id,
        ReactionTarget::Comment(comment_id),
    )
    .await?;
    Ok(ApiResponse::ok(
        summary,
        "Comment dislike toggled successfully!",
    ))
}

/// `POST /api/v1/dislikes/toggle/tweet/:tweetId`
pub async fn toggle_tweet_dislike(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(tweet_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let summary = reactions::toggle(
        &mut conn,
        ReactionKind::Dislike,
        auth_user.user.id,
        ReactionTarget::Tweet(tweet_id),
    )
    .await?;
    Ok(ApiResponse::ok(summary, "Tweet dislike toggled successfully!"))
}
