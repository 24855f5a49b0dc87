use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::models::reaction::ReactionSummary;
use crate::models::user::OwnerPublic;
use crate::schema::tweets;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = tweets)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: i32,
    pub owner_id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = tweets)]
pub struct NewTweet {
    pub owner_id: i32,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetView {
    pub id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub owner: OwnerPublic,
    #[serde(flatten)]
    pub reactions: ReactionSummary,
}
