//! Owner-scoped channel dashboard.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResponse};
use crate::api::handlers::videos::{apply_sort, filtered_videos, VideoSortKey};
use crate::api::handlers::{optional_text, PageParams, Pagination};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::models::reaction::TARGET_VIDEO;
use crate::models::Video;
use crate::schema::{likes, videos};
use crate::services::views;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl DashboardQuery {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardVideo {
    #[serde(flatten)]
    video: Video,
    likes_count: i64,
}

/// `GET /api/v1/dashboard/stats`
///
/// Channel totals over the caller's published videos, all derived at read
/// time.
pub async fn channel_stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;

    let video_ids = views::published_video_ids(&mut conn, auth_user.user.id).await?;
    let view_counts: Vec<i64> = videos::table
        .filter(videos::id.eq_any(&video_ids))
        .select(videos::views)
        .load(&mut conn)
        .await?;
    let total_views: i64 = view_counts.into_iter().sum();

    let total_likes: i64 = if video_ids.is_empty() {
        0
    } else {
        likes::table
            .filter(likes::target_kind.eq(TARGET_VIDEO))
            .filter(likes::target_id.eq_any(&video_ids))
            .count()
            .get_result(&mut conn)
            .await?
    };

    let subscribers = views::subscribers_count(&mut conn, auth_user.user.id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({
            "totalVideos": video_ids.len(),
            "totalVideosViews": total_views,
            "totalVideosLikes": total_likes,
            "totalSubscribers": subscribers,
        }),
        "Channel stats fetched successfully!",
    ))
}

/// `GET /api/v1/dashboard/videos`
///
/// The caller's own videos, unpublished included, each with its like count.
pub async fn channel_videos(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sort_key = match optional_text(params.sort_by.clone()) {
        Some(ref field) => VideoSortKey::from_param(field).ok_or_else(|| {
            ApiError::Validation(
                "sortBy must be one of createdAt, views, durationSecs, title".to_string(),
            )
        })?,
        None => VideoSortKey::CreatedAt,
    };
    let descending = !matches!(params.sort_type.as_deref(), Some("asc"));
    let owner = Some(auth_user.user.id);
    let viewer = Some(auth_user.user.id);
    let paging = params.page_params();

    let mut conn = state.pool.get().await?;
    let total: i64 = filtered_videos(None, owner, viewer)
        .count()
        .get_result(&mut conn)
        .await?;

    let page: Vec<Video> = apply_sort(filtered_videos(None, owner, viewer), sort_key, descending)
        .limit(paging.limit())
        .offset(paging.offset())
        .load(&mut conn)
        .await?;

    let video_ids: Vec<i32> = page.iter().map(|v| v.id).collect();
    let like_counts = views::video_like_counts(&mut conn, &video_ids).await?;

    let items: Vec<DashboardVideo> = page
        .into_iter()
        .map(|video| DashboardVideo {
            likes_count: like_counts.get(&video.id).copied().unwrap_or(0),
            video,
        })
        .collect();

    Ok(ApiResponse::ok(
        serde_json::json!({
            "videos": items,
            "pagination": Pagination::new(total, &paging),
        }),
        "Channel videos fetched successfully!",
    ))
}
