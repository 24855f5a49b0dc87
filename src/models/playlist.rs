use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::video::VideoWithOwner;
use crate::schema::playlists;

/// Reserved playlist created at registration: liked videos.
pub const LIKED_VIDEOS_NAME: &str = "LL";
/// Reserved playlist created at registration: watch later.
pub const WATCH_LATER_NAME: &str = "WL";

pub const VISIBILITY_PUBLIC: &str = "public";
pub const VISIBILITY_PRIVATE: &str = "private";

/// Whether a playlist name is one of the two per-user reserved playlists.
pub fn is_reserved_name(name: &str) -> bool {
    name == LIKED_VIDEOS_NAME || name == WATCH_LATER_NAME
}

pub fn is_valid_visibility(value: &str) -> bool {
    value == VISIBILITY_PUBLIC || value == VISIBILITY_PRIVATE
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = playlists)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub description: String,
    pub visibility: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = playlists)]
pub struct NewPlaylist {
    pub owner_id: i32,
    pub name: String,
    pub description: String,
    pub visibility: String,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = playlists)]
pub struct UpdatePlaylist {
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Owner slice embedded in the playlist detail view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistOwner {
    pub id: i32,
    pub user_name: String,
    pub full_name: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
    pub subscribers_count: i64,
}

/// Playlist read-model: fields, owner, and the published member videos in
/// most-recently-added-first order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub visibility: String,
    pub created_at: NaiveDateTime,
    pub owner: PlaylistOwner,
    pub videos: Vec<VideoWithOwner>,
}

/// Body for `PATCH /playlists/update/:playlistId`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names_cover_both_auto_playlists() {
        assert!(is_reserved_name(LIKED_VIDEOS_NAME));
        assert!(is_reserved_name(WATCH_LATER_NAME));
        assert!(!is_reserved_name("Faves"));
        assert!(!is_reserved_name("ll"));
    }

    #[test]
    fn visibility_values_are_closed() {
        assert!(is_valid_visibility("public"));
        assert!(is_valid_visibility("private"));
        assert!(!is_valid_visibility("unlisted"));
    }
}
