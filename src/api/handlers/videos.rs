//! Video listing, upload, playback view, and lifecycle.

use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;

use crate::api::error::{ApiError, ApiResponse};
use crate::api::handlers::{
    optional_text, read_file_field, read_text_field, required_text, PageParams, Pagination,
    UploadedFile,
};
use crate::api::AppState;
use crate::assets::delete_best_effort;
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::models::user::OwnerPublic;
use crate::models::video::UpdateVideo;
use crate::models::{NewVideo, Video, VideoWithOwner};
use crate::schema::{users, videos, watch_history};
use crate::services::{cascade, views};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub query: Option<String>,
    pub user_id: Option<i32>,
    pub user_name: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    // serde_urlencoded cannot flatten numeric fields, so the paging params
    // are repeated here instead of embedding PageParams.
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl VideoListQuery {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Allow-listed sort fields for video listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VideoSortKey {
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSortKey {
    pub(crate) fn from_param(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(VideoSortKey::CreatedAt),
            "views" => Some(VideoSortKey::Views),
            "durationSecs" => Some(VideoSortKey::Duration),
            "title" => Some(VideoSortKey::Title),
            _ => None,
        }
    }
}

pub(crate) type BoxedVideos = videos::BoxedQuery<'static, Pg>;

/// Shared filter stack for the listing's page and count queries. Unpublished
/// videos stay hidden unless the owner is listing their own.
pub(crate) fn filtered_videos(
    search: Option<&str>,
    owner_id: Option<i32>,
    viewer_id: Option<i32>,
) -> BoxedVideos {
    let mut query = videos::table.into_boxed();

    if let Some(owner) = owner_id {
        query = query.filter(videos::owner_id.eq(owner));
    }
    let owner_is_viewer = owner_id.is_some() && owner_id == viewer_id;
    if !owner_is_viewer {
        query = query.filter(videos::is_published.eq(true));
    }
    if let Some(term) = search {
        let pattern = format!("%{term}%");
        query = query.filter(
            videos::title
                .ilike(pattern.clone())
                .or(videos::description.ilike(pattern)),
        );
    }
    query
}

pub(crate) fn apply_sort(query: BoxedVideos, key: VideoSortKey, descending: bool) -> BoxedVideos {
    match (key, descending) {
        (VideoSortKey::CreatedAt, true) => query.order(videos::created_at.desc()),
        (VideoSortKey::CreatedAt, false) => query.order(videos::created_at.asc()),
        (VideoSortKey::Views, true) => query.order(videos::views.desc()),
        (VideoSortKey::Views, false) => query.order(videos::views.asc()),
        (VideoSortKey::Duration, true) => query.order(videos::duration_secs.desc()),
        (VideoSortKey::Duration, false) => query.order(videos::duration_secs.asc()),
        (VideoSortKey::Title, true) => query.order(videos::title.desc()),
        (VideoSortKey::Title, false) => query.order(videos::title.asc()),
    }
}

/// `GET /api/v1/videos`
pub async fn list_videos(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(params): Query<VideoListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;

    let owner_id: Option<i32> = if let Some(id) = params.user_id {
        Some(id)
    } else if let Some(name) = optional_text(params.user_name.clone()) {
        let id = users::table
            .filter(users::user_name.eq(name.to_lowercase()))
            .select(users::id)
            .first::<i32>(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| ApiError::NotFound("User does not exist!".to_string()))?;
        Some(id)
    } else {
        None
    };

    let sort_key = match optional_text(params.sort_by.clone()) {
        Some(ref field) => VideoSortKey::from_param(field).ok_or_else(|| {
            ApiError::Validation(
                "sortBy must be one of createdAt, views, durationSecs, title".to_string(),
            )
        })?,
        None => VideoSortKey::CreatedAt,
    };
    let descending = !matches!(params.sort_type.as_deref(), Some("asc"));
    let search = optional_text(params.query.clone());

    let paging = params.page_params();

    let total: i64 = filtered_videos(search.as_deref(), owner_id, viewer.viewer_id())
        .count()
        .get_result(&mut conn)
        .await?;

    let page: Vec<Video> = apply_sort(
        filtered_videos(search.as_deref(), owner_id, viewer.viewer_id()),
        sort_key,
        descending,
    )
    .limit(paging.limit())
    .offset(paging.offset())
    .load(&mut conn)
    .await?;

    let items = views::videos_with_owners(&mut conn, page).await?;
    Ok(ApiResponse::ok(
        serde_json::json!({
            "videos": items,
            "pagination": Pagination::new(total, &paging),
        }),
        "Videos fetched successfully!",
    ))
}

/// `POST /api/v1/videos/upload` (multipart)
pub async fn upload_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut video_file: Option<UploadedFile> = None;
    let mut thumbnail_file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?
    {
        match field.name().unwrap_or_default() {
            "title" => title = Some(read_text_field(field).await?),
            "description" => description = Some(read_text_field(field).await?),
            "videoFile" => video_file = Some(read_file_field(field).await?),
            "thumbnail" => thumbnail_file = Some(read_file_field(field).await?),
            _ => {}
        }
    }

    let title = required_text(title, "title")?;
    let description = required_text(description, "description")?;
    let video_file =
        video_file.ok_or_else(|| ApiError::Validation("videoFile is required".to_string()))?;
    let thumbnail_file =
        thumbnail_file.ok_or_else(|| ApiError::Validation("thumbnail is required".to_string()))?;

    let stored_video = state
        .assets
        .upload(&video_file.file_name, &video_file.content_type, video_file.bytes)
        .await?;
    let duration_secs = stored_video.duration.ok_or_else(|| {
        ApiError::Upload("Asset store did not report a video duration".to_string())
    })?;
    let stored_thumbnail = state
        .assets
        .upload(
            &thumbnail_file.file_name,
            &thumbnail_file.content_type,
            thumbnail_file.bytes,
        )
        .await?;

    let mut conn = state.pool.get().await?;
    let video: Video = diesel::insert_into(videos::table)
        .values(&NewVideo {
            owner_id: auth_user.user.id,
            video_url: stored_video.url,
            thumbnail_url: stored_thumbnail.url,
            title,
            description,
            duration_secs,
        })
        .get_result(&mut conn)
        .await?;

    let owner = OwnerPublic {
        id: auth_user.user.id,
        user_name: auth_user.user.user_name,
        full_name: auth_user.user.full_name,
        avatar_url: auth_user.user.avatar_url,
    };
    Ok(ApiResponse::created(
        VideoWithOwner { video, owner },
        "Video uploaded successfully!",
    ))
}

/// `GET /api/v1/videos/view/:videoId`
///
/// The playback view: bumps the view counter, moves the video to the front
/// of the caller's watch history, and returns the full detail shape.
pub async fn view_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let mut video: Video = videos::table
        .find(video_id)
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Video does not exist!".to_string()))?;

    if !video.is_published && video.owner_id != auth_user.user.id {
        return Err(ApiError::NotFound("Video does not exist!".to_string()));
    }

    diesel::update(videos::table.find(video_id))
        .set(videos::views.eq(videos::views + 1))
        .execute(&mut conn)
        .await?;
    video.views += 1;

    let now = Utc::now().naive_utc();
    diesel::insert_into(watch_history::table)
        .values((
            watch_history::user_id.eq(auth_user.user.id),
            watch_history::video_id.eq(video_id),
            watch_history::watched_at.eq(now),
        ))
        .on_conflict((watch_history::user_id, watch_history::video_id))
        .do_update()
        .set(watch_history::watched_at.eq(now))
        .execute(&mut conn)
        .await?;

    let detail = views::video_detail(&mut conn, Some(auth_user.user.id), video).await?;
    Ok(ApiResponse::ok(detail, "Video fetched successfully!"))
}

/// `PATCH /api/v1/videos/update/:videoId` (multipart; all fields optional)
pub async fn update_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut thumbnail_file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?
    {
        match field.name().unwrap_or_default() {
            "title" => title = Some(read_text_field(field).await?),
            "description" => description = Some(read_text_field(field).await?),
            "thumbnail" => thumbnail_file = Some(read_file_field(field).await?),
            _ => {}
        }
    }

    let title = optional_text(title);
    let description = optional_text(description);
    if title.is_none() && description.is_none() && thumbnail_file.is_none() {
        return Err(ApiError::Validation("Nothing to update".to_string()));
    }

    let mut conn = state.pool.get().await?;
    let video: Video = videos::table
        .find(video_id)
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Video does not exist!".to_string()))?;
    if video.owner_id != auth_user.user.id {
        return Err(ApiError::Forbidden(
            "You are not allowed to modify this video!".to_string(),
        ));
    }

    let thumbnail_url = match thumbnail_file {
        Some(file) => Some(
            state
                .assets
                .upload(&file.file_name, &file.content_type, file.bytes)
                .await?
                .url,
        ),
        None => None,
    };
    let replaced_thumbnail = thumbnail_url.is_some();

    let updated: Video = diesel::update(videos::table.find(video_id))
        .set(&UpdateVideo {
            title,
            description,
            thumbnail_url,
            updated_at: Some(Utc::now().naive_utc()),
        })
        .get_result(&mut conn)
        .await?;

    if replaced_thumbnail {
        delete_best_effort(state.assets.as_ref(), &video.thumbnail_url).await;
    }

    Ok(ApiResponse::ok(updated, "Video updated successfully!"))
}

/// `PATCH /api/v1/videos/toggle/publish/:videoId`
pub async fn toggle_publish(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let video: Video = videos::table
        .find(video_id)
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Video does not exist!".to_string()))?;
    if video.owner_id != auth_user.user.id {
        return Err(ApiError::Forbidden(
            "You are not allowed to modify this video!".to_string(),
        ));
    }

    let updated: Video = diesel::update(videos::table.find(video_id))
        .set((
            videos::is_published.eq(!video.is_published),
            videos::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result(&mut conn)
        .await?;

    Ok(ApiResponse::ok(
        updated,
        "Publish state toggled successfully!",
    ))
}

/// `DELETE /api/v1/videos/delete/:videoId`
pub async fn delete_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(video_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let video: Video = videos::table
        .find(video_id)
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Video does not exist!".to_string()))?;
    if video.owner_id != auth_user.user.id {
        return Err(ApiError::Forbidden(
            "You are not allowed to delete this video!".to_string(),
        ));
    }

    cascade::delete_video(&mut conn, video_id).await?;

    // The records are gone; the stored media can fail to delete without
    // affecting the response.
    delete_best_effort(state.assets.as_ref(), &video.video_url).await;
    delete_best_effort(state.assets.as_ref(), &video.thumbnail_url).await;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Video deleted successfully!",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_allow_list_is_closed() {
        assert_eq!(
            VideoSortKey::from_param("createdAt"),
            Some(VideoSortKey::CreatedAt)
        );
        assert_eq!(VideoSortKey::from_param("views"), Some(VideoSortKey::Views));
        assert_eq!(
            VideoSortKey::from_param("durationSecs"),
            Some(VideoSortKey::Duration)
        );
        assert_eq!(VideoSortKey::from_param("title"), Some(VideoSortKey::Title));
        assert_eq!(VideoSortKey::from_param("ownerId"), None);
        assert_eq!(VideoSortKey::from_param("views; DROP TABLE"), None);
    }
}
