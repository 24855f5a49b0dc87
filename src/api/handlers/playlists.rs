//! Playlists, including the two reserved per-user playlists created at
//! registration (`LL` liked videos, `WL` watch later).

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;

use crate::api::error::{ApiError, ApiResponse};
use crate::api::handlers::{optional_text, required_text};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::DbConnection;
use crate::models::playlist::{
    is_reserved_name, is_valid_visibility, PlaylistOwner, UpdatePlaylist, UpdatePlaylistRequest,
    LIKED_VIDEOS_NAME, VISIBILITY_PRIVATE, VISIBILITY_PUBLIC, WATCH_LATER_NAME,
};
use crate::models::{NewPlaylist, Playlist, PlaylistDetail, Video};
use crate::schema::{playlist_videos, playlists, users, videos};
use crate::services::{cascade, views};

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<String>,
}

async fn load_playlist(conn: &mut DbConnection, playlist_id: i32) -> Result<Playlist, ApiError> {
    playlists::table
        .find(playlist_id)
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Playlist does not exist!".to_string()))
}

fn ensure_owned(playlist: &Playlist, user_id: i32) -> Result<(), ApiError> {
    if playlist.owner_id != user_id {
        return Err(ApiError::Forbidden(
            "You are not allowed to modify this playlist!".to_string(),
        ));
    }
    Ok(())
}

async fn ensure_published_video(conn: &mut DbConnection, video_id: i32) -> Result<(), ApiError> {
    let published = videos::table
        .find(video_id)
        .select(videos::is_published)
        .first::<bool>(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Video does not exist!".to_string()))?;
    if !published {
        return Err(ApiError::Forbidden(
            "Video is not published yet!".to_string(),
        ));
    }
    Ok(())
}

/// `POST /api/v1/playlists/create`
pub async fn create_playlist(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(body): Json<CreatePlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = required_text(body.name, "name")?;
    let description = required_text(body.description, "description")?;
    if is_reserved_name(&name) {
        return Err(ApiError::Validation(format!(
            "{name} is a reserved playlist name"
        )));
    }
    let visibility = match optional_text(body.visibility) {
        Some(v) if is_valid_visibility(&v) => v,
        Some(_) => {
            return Err(ApiError::Validation(format!(
                "visibility must be {VISIBILITY_PUBLIC} or {VISIBILITY_PRIVATE}"
            )))
        }
        None => VISIBILITY_PRIVATE.to_string(),
    };

    let mut conn = state.pool.get().await?;
    let playlist: Playlist = diesel::insert_into(playlists::table)
        .values(&NewPlaylist {
            owner_id: auth_user.user.id,
            name,
            description,
            visibility,
        })
        .get_result(&mut conn)
        .await?;

    Ok(ApiResponse::created(
        playlist,
        "Playlist created successfully!",
    ))
}

/// `GET /api/v1/playlists/user/:userId`
///
/// A user's playlists excluding the liked-videos playlist; other viewers
/// only see public ones.
pub async fn user_playlists(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let user_exists: i64 = users::table
        .filter(users::id.eq(user_id))
        .count()
        .get_result(&mut conn)
        .await?;
    if user_exists == 0 {
        return Err(ApiError::NotFound("User does not exist!".to_string()));
    }

    let mut query = playlists::table
        .filter(playlists::owner_id.eq(user_id))
        .filter(playlists::name.ne(LIKED_VIDEOS_NAME))
        .into_boxed();
    if auth_user.user.id != user_id {
        query = query.filter(playlists::visibility.eq(VISIBILITY_PUBLIC));
    }

    let items: Vec<Playlist> = query
        .order(playlists::created_at.desc())
        .load(&mut conn)
        .await?;

    Ok(ApiResponse::ok(items, "Playlists fetched successfully!"))
}

/// `GET /api/v1/playlists/:playlistId`
pub async fn playlist_detail(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(playlist_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let playlist = load_playlist(&mut conn, playlist_id).await?;
    if playlist.visibility == VISIBILITY_PRIVATE && playlist.owner_id != auth_user.user.id {
        return Err(ApiError::Forbidden("This playlist is private".to_string()));
    }

    let owner = views::owner_public(&mut conn, playlist.owner_id).await?;
    let owner = PlaylistOwner {
        subscribers_count: views::subscribers_count(&mut conn, playlist.owner_id).await?,
        id: owner.id,
        user_name: owner.user_name,
        full_name: owner.full_name,
        avatar_url: owner.avatar_url,
    };

    let members: Vec<Video> = playlist_videos::table
        .inner_join(videos::table.on(videos::id.eq(playlist_videos::video_id)))
        .filter(playlist_videos::playlist_id.eq(playlist_id))
        .filter(videos::is_published.eq(true))
        .order(playlist_videos::added_at.desc())
        .select(Video::as_select())
        .load(&mut conn)
        .await?;
    let members = views::videos_with_owners(&mut conn, members).await?;

    let detail = PlaylistDetail {
        id: playlist.id,
        name: playlist.name,
        description: playlist.description,
        visibility: playlist.visibility,
        created_at: playlist.created_at,
        owner,
        videos: members,
    };
    Ok(ApiResponse::ok(detail, "Playlist fetched successfully!"))
}

/// `PATCH /api/v1/playlists/add/:playlistId/:videoId`
///
/// Membership is unique per (playlist, video); re-adding refreshes
/// `added_at`, moving the video to the front instead of duplicating it.
pub async fn add_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((playlist_id, video_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let playlist = load_playlist(&mut conn, playlist_id).await?;
    ensure_owned(&playlist, auth_user.user.id)?;
    ensure_published_video(&mut conn, video_id).await?;

    let now = Utc::now().naive_utc();
    diesel::insert_into(playlist_videos::table)
        .values((
            playlist_videos::playlist_id.eq(playlist_id),
            playlist_videos::video_id.eq(video_id),
            playlist_videos::added_at.eq(now),
        ))
        .on_conflict((playlist_videos::playlist_id, playlist_videos::video_id))
        .do_update()
        .set(playlist_videos::added_at.eq(now))
        .execute(&mut conn)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Video added to playlist successfully!",
    ))
}

/// `PATCH /api/v1/playlists/remove/:playlistId/:videoId`
pub async fn remove_video(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((playlist_id, video_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let playlist = load_playlist(&mut conn, playlist_id).await?;
    ensure_owned(&playlist, auth_user.user.id)?;

    diesel::delete(
        playlist_videos::table
            .filter(playlist_videos::playlist_id.eq(playlist_id))
            .filter(playlist_videos::video_id.eq(video_id)),
    )
    .execute(&mut conn)
    .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Video removed from playlist successfully!",
    ))
}

/// Update rules for the reserved playlists: `WL` refuses any edit, and `LL`
/// keeps its name because the dislike side effect finds it by name.
fn ensure_update_allowed(current_name: &str, new_name: Option<&str>) -> Result<(), ApiError> {
    if current_name == WATCH_LATER_NAME {
        return Err(ApiError::Forbidden(
            "Watch Later playlist cannot be modified".to_string(),
        ));
    }
    if let Some(name) = new_name {
        if is_reserved_name(name) {
            return Err(ApiError::Validation(format!(
                "{name} is a reserved playlist name"
            )));
        }
        if current_name == LIKED_VIDEOS_NAME {
            return Err(ApiError::Forbidden(
                "Liked Videos playlist cannot be renamed".to_string(),
            ));
        }
    }
    Ok(())
}

/// `PATCH /api/v1/playlists/update/:playlistId`
pub async fn update_playlist(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(playlist_id): Path<i32>,
    Json(body): Json<UpdatePlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let playlist = load_playlist(&mut conn, playlist_id).await?;
    ensure_owned(&playlist, auth_user.user.id)?;

    let name = optional_text(body.name);
    let description = optional_text(body.description);
    let visibility = optional_text(body.visibility);
    ensure_update_allowed(&playlist.name, name.as_deref())?;
    if name.is_none() && description.is_none() && visibility.is_none() {
        return Err(ApiError::Validation("Nothing to update".to_string()));
    }
    if let Some(ref visibility) = visibility {
        if !is_valid_visibility(visibility) {
            return Err(ApiError::Validation(format!(
                "visibility must be {VISIBILITY_PUBLIC} or {VISIBILITY_PRIVATE}"
            )));
        }
    }

    let updated: Playlist = diesel::update(playlists::table.find(playlist_id))
        .set(&UpdatePlaylist {
            name,
            description,
            visibility,
            updated_at: Some(Utc::now().naive_utc()),
        })
        .get_result(&mut conn)
        .await?;

    Ok(ApiResponse::ok(updated, "Playlist updated successfully!"))
}

/// `DELETE /api/v1/playlists/delete/:playlistId`
pub async fn delete_playlist(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(playlist_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let playlist = load_playlist(&mut conn, playlist_id).await?;
    ensure_owned(&playlist, auth_user.user.id)?;
    if is_reserved_name(&playlist.name) {
        return Err(ApiError::Forbidden(
            "Reserved playlists cannot be deleted".to_string(),
        ));
    }

    cascade::delete_playlist(&mut conn, playlist_id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Playlist deleted successfully!",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(owner_id: i32, name: &str) -> Playlist {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 5, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Playlist {
            id: 1,
            owner_id,
            name: name.to_string(),
            description: String::new(),
            visibility: VISIBILITY_PRIVATE.to_string(),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn watch_later_rejects_any_update() {
        assert!(matches!(
            ensure_update_allowed(WATCH_LATER_NAME, None),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            ensure_update_allowed(WATCH_LATER_NAME, Some("My list")),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn liked_videos_keeps_its_name() {
        assert!(matches!(
            ensure_update_allowed(LIKED_VIDEOS_NAME, Some("Favourites")),
            Err(ApiError::Forbidden(_))
        ));
        // Description/visibility edits carry no name and stay allowed.
        assert!(ensure_update_allowed(LIKED_VIDEOS_NAME, None).is_ok());
    }

    #[test]
    fn ordinary_playlists_cannot_take_reserved_names() {
        assert!(matches!(
            ensure_update_allowed("Road trip", Some(WATCH_LATER_NAME)),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            ensure_update_allowed("Road trip", Some(LIKED_VIDEOS_NAME)),
            Err(ApiError::Validation(_))
        ));
        assert!(ensure_update_allowed("Road trip", Some("Summer 2024")).is_ok());
    }

    #[test]
    fn non_owner_is_forbidden() {
        let list = playlist(7, "Road trip");
        assert!(ensure_owned(&list, 7).is_ok());
        assert!(matches!(
            ensure_owned(&list, 8),
            Err(ApiError::Forbidden(_))
        ));
    }
}
