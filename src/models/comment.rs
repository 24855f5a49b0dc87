use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::models::reaction::ReactionSummary;
use crate::models::user::OwnerPublic;
use crate::schema::comments;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = comments)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub video_id: i32,
    pub owner_id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub video_id: i32,
    pub owner_id: i32,
    pub content: String,
}

/// Comment as it appears in the per-video list: content, author, and
/// viewer-relative reaction facts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub owner: OwnerPublic,
    #[serde(flatten)]
    pub reactions: ReactionSummary,
}
