use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::users;

/// Account row. The password hash and stored refresh token never leave the
/// server, so they are skipped during serialization.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub user_name: String,
    pub email: String,
    pub full_name: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
    #[serde(rename = "coverImage")]
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub password_hash: String,
}

/// The public slice of a user embedded in owned content (videos, comments,
/// tweets, playlists).
#[derive(Debug, Clone, Queryable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerPublic {
    pub id: i32,
    pub user_name: String,
    pub full_name: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
}

/// Channel profile view: public fields plus derived subscription facts
/// relative to the viewer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: i32,
    pub user_name: String,
    pub email: String,
    pub full_name: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
    #[serde(rename = "coverImage")]
    pub cover_image_url: Option<String>,
    pub subscribers_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed: bool,
}

/// Body for `PATCH /users/update-account`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}
