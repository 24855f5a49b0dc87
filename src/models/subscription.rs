use diesel::prelude::*;
use serde::Serialize;

use crate::schema::subscriptions;

#[derive(Debug, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct NewSubscription {
    pub subscriber_id: i32,
    pub channel_id: i32,
}

/// Channel entry in a subscribed-channels list, with viewer-relative facts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCard {
    pub id: i32,
    pub user_name: String,
    pub full_name: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
    pub subscribers_count: i64,
    pub is_subscribed: bool,
}
