//! Channel subscriptions: the toggle plus both directions of listing.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::HashMap;

use crate::api::error::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::DbConnection;
use crate::models::{ChannelCard, NewSubscription, OwnerPublic};
use crate::schema::{subscriptions, users};
use crate::services::views;

async fn ensure_channel_exists(conn: &mut DbConnection, channel_id: i32) -> Result<(), ApiError> {
    let count: i64 = users::table
        .filter(users::id.eq(channel_id))
        .count()
        .get_result(conn)
        .await?;
    if count == 0 {
        return Err(ApiError::NotFound("Channel does not exist!".to_string()));
    }
    Ok(())
}

/// `POST /api/v1/subscriptions/toggle/:channelId`
pub async fn toggle_subscription(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(channel_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    ensure_channel_exists(&mut conn, channel_id).await?;

    let removed = diesel::delete(
        subscriptions::table
            .filter(subscriptions::subscriber_id.eq(auth_user.user.id))
            .filter(subscriptions::channel_id.eq(channel_id)),
    )
    .execute(&mut conn)
    .await?;

    if removed == 0 {
        diesel::insert_into(subscriptions::table)
            .values(&NewSubscription {
                subscriber_id: auth_user.user.id,
                channel_id,
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await?;
    }

    let subscribers_count = views::subscribers_count(&mut conn, channel_id).await?;
    Ok(ApiResponse::ok(
        serde_json::json!({
            "isSubscribed": removed == 0,
            "subscribersCount": subscribers_count,
        }),
        "Subscription toggled successfully!",
    ))
}

/// `GET /api/v1/subscriptions/channels`
///
/// Channels the caller subscribes to, most recent first, each with its
/// subscriber count.
pub async fn subscribed_channels(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let channels: Vec<OwnerPublic> = subscriptions::table
        .inner_join(users::table.on(users::id.eq(subscriptions::channel_id)))
        .filter(subscriptions::subscriber_id.eq(auth_user.user.id))
        .order(subscriptions::created_at.desc())
        .select((users::id, users::user_name, users::full_name, users::avatar_url))
        .load(&mut conn)
        .await?;

    let channel_ids: Vec<i32> = channels.iter().map(|c| c.id).collect();
    let counts: HashMap<i32, i64> = if channel_ids.is_empty() {
        HashMap::new()
    } else {
        subscriptions::table
            .filter(subscriptions::channel_id.eq_any(&channel_ids))
            .group_by(subscriptions::channel_id)
            .select((subscriptions::channel_id, diesel::dsl::count_star()))
            .load::<(i32, i64)>(&mut conn)
            .await?
            .into_iter()
            .collect()
    };

    let cards: Vec<ChannelCard> = channels
        .into_iter()
        .map(|channel| ChannelCard {
            subscribers_count: counts.get(&channel.id).copied().unwrap_or(0),
            // Every row comes from the caller's own subscription list.
            is_subscribed: true,
            id: channel.id,
            user_name: channel.user_name,
            full_name: channel.full_name,
            avatar_url: channel.avatar_url,
        })
        .collect();

    Ok(ApiResponse::ok(
        cards,
        "Subscribed channels fetched successfully!",
    ))
}

/// `GET /api/v1/subscriptions/subscribers/:channelId`
pub async fn channel_subscribers(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(channel_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    ensure_channel_exists(&mut conn, channel_id).await?;

    let subscribers: Vec<OwnerPublic> = subscriptions::table
        .inner_join(users::table.on(users::id.eq(subscriptions::subscriber_id)))
        .filter(subscriptions::channel_id.eq(channel_id))
        .order(subscriptions::created_at.desc())
        .select((users::id, users::user_name, users::full_name, users::avatar_url))
        .load(&mut conn)
        .await?;

    Ok(ApiResponse::ok(
        subscribers,
        "Subscribers fetched successfully!",
    ))
}
