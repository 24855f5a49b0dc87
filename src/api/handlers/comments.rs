//! Per-video comments.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;

use crate::api::error::{ApiError, ApiResponse};
use crate::api::handlers::{required_text, PageParams, Pagination};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::models::reaction::TARGET_COMMENT;
use crate::models::{Comment, CommentView, NewComment};
use crate::schema::{comments, videos};
use crate::services::{cascade, reactions, views};

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub content: String,
}

async fn load_published_video_flag(
    conn: &mut crate::db::DbConnection,
    video_id: i32,
) -> Result<bool, ApiError> {
    videos::table
        .find(video_id)
        .select(videos::is_published)
        .first::<bool>(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Video does not exist!".to_string()))
}

/// `GET /api/v1/comments/:videoId`
pub async fn list_comments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<i32>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    load_published_video_flag(&mut conn, video_id).await?;

    let total: i64 = comments::table
        .filter(comments::video_id.eq(video_id))
        .count()
        .get_result(&mut conn)
        .await?;

    let page: Vec<Comment> = comments::table
        .filter(comments::video_id.eq(video_id))
        .order(comments::created_at.desc())
        .limit(params.limit())
        .offset(params.offset())
        .load(&mut conn)
        .await?;

    let owner_ids: Vec<i32> = page.iter().map(|c| c.owner_id).collect();
    let comment_ids: Vec<i32> = page.iter().map(|c| c.id).collect();
    let owners = views::owners_by_id(&mut conn, &owner_ids).await?;
    let mut summaries =
        reactions::summaries(&mut conn, Some(auth_user.user.id), TARGET_COMMENT, &comment_ids)
            .await?;

    let items: Vec<CommentView> = page
        .into_iter()
        .filter_map(|comment| {
            owners.get(&comment.owner_id).cloned().map(|owner| CommentView {
                id: comment.id,
                content: comment.content,
                created_at: comment.created_at,
                owner,
                reactions: summaries.remove(&comment.id).unwrap_or_default(),
            })
        })
        .collect();

    Ok(ApiResponse::ok(
        serde_json::json!({
            "comments": items,
            "pagination": Pagination::new(total, &params),
        }),
        "Comments fetched successfully!",
    ))
}

/// `POST /api/v1/comments/add/:videoId`
pub async fn add_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<i32>,
    Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let content = required_text(Some(body.content), "content")?;

    let mut conn = state.pool.get().await?;
    let published = load_published_video_flag(&mut conn, video_id).await?;
    if !published {
        return Err(ApiError::Forbidden(
            "Video is not published yet!".to_string(),
        ));
    }

    let comment: Comment = diesel::insert_into(comments::table)
        .values(&NewComment {
            video_id,
            owner_id: auth_user.user.id,
            content,
        })
        .get_result(&mut conn)
        .await?;

    Ok(ApiResponse::created(comment, "Comment added successfully!"))
}

/// `PATCH /api/v1/comments/update/:commentId`
pub async fn update_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<i32>,
    Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let content = required_text(Some(body.content), "content")?;

    let mut conn = state.pool.get().await?;
    let comment: Comment = comments::table
        .find(comment_id)
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Comment does not exist!".to_string()))?;
    if comment.owner_id != auth_user.user.id {
        return Err(ApiError::Forbidden(
            "You are not allowed to modify this comment!".to_string(),
        ));
    }

    let updated: Comment = diesel::update(comments::table.find(comment_id))
        .set((
            comments::content.eq(content),
            comments::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result(&mut conn)
        .await?;

    Ok(ApiResponse::ok(updated, "Comment updated successfully!"))
}

/// `DELETE /api/v1/comments/delete/:commentId`
pub async fn delete_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let comment: Comment = comments::table
        .find(comment_id)
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Comment does not exist!".to_string()))?;
    if comment.owner_id != auth_user.user.id {
        return Err(ApiError::Forbidden(
            "You are not allowed to delete this comment!".to_string(),
        ));
    }

    cascade::delete_comment(&mut conn, comment_id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Comment deleted successfully!",
    ))
}
