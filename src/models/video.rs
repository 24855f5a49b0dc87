use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::models::user::OwnerPublic;
use crate::schema::videos;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = videos)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i32,
    pub owner_id: i32,
    #[serde(rename = "videoFile")]
    pub video_url: String,
    #[serde(rename = "thumbnail")]
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "duration")]
    pub duration_secs: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = videos)]
pub struct NewVideo {
    pub owner_id: i32,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration_secs: f64,
}

/// Partial metadata update; absent fields are left untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = videos)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Video plus its owner's public fields, used in listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    #[serde(flatten)]
    pub video: Video,
    pub owner: OwnerPublic,
}

/// Owner slice embedded in the video detail view: public fields plus the
/// channel facts relative to the viewer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    pub id: i32,
    pub user_name: String,
    pub full_name: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
    pub subscribers_count: i64,
    pub is_subscribed: bool,
}

/// Full read-model for a single video.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: Video,
    pub owner: VideoOwner,
    pub likes_count: i64,
    pub is_liked: bool,
    pub dislikes_count: i64,
    pub is_disliked: bool,
    pub comments_count: i64,
}
