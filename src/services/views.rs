//! Read-side composition: counts, viewer flags, and owner hydration for the
//! aggregated response shapes. Counts are always derived here at read time,
//! never stored.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::HashMap;

use crate::api::error::ApiError;
use crate::db::DbConnection;
use crate::models::reaction::TARGET_VIDEO;
use crate::models::{
    ChannelProfile, OwnerPublic, Video, VideoDetail, VideoWithOwner,
};
use crate::models::video::VideoOwner;
use crate::schema::{comments, subscriptions, users, videos};
use crate::services::reactions;

pub async fn subscribers_count(conn: &mut DbConnection, channel_id: i32) -> Result<i64, ApiError> {
    Ok(subscriptions::table
        .filter(subscriptions::channel_id.eq(channel_id))
        .count()
        .get_result(conn)
        .await?)
}

pub async fn subscribed_to_count(conn: &mut DbConnection, user_id: i32) -> Result<i64, ApiError> {
    Ok(subscriptions::table
        .filter(subscriptions::subscriber_id.eq(user_id))
        .count()
        .get_result(conn)
        .await?)
}

/// Whether `viewer` is subscribed to `channel_id`. Anonymous viewers are
/// never subscribed.
pub async fn is_subscribed(
    conn: &mut DbConnection,
    viewer_id: Option<i32>,
    channel_id: i32,
) -> Result<bool, ApiError> {
    let Some(viewer) = viewer_id else {
        return Ok(false);
    };
    let count: i64 = subscriptions::table
        .filter(subscriptions::subscriber_id.eq(viewer))
        .filter(subscriptions::channel_id.eq(channel_id))
        .count()
        .get_result(conn)
        .await?;
    Ok(count > 0)
}

pub async fn owner_public(conn: &mut DbConnection, user_id: i32) -> Result<OwnerPublic, ApiError> {
    users::table
        .find(user_id)
        .select((users::id, users::user_name, users::full_name, users::avatar_url))
        .first::<OwnerPublic>(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("User does not exist!".to_string()))
}

/// Batched owner lookup for list responses. Missing ids are simply absent
/// from the map.
pub async fn owners_by_id(
    conn: &mut DbConnection,
    user_ids: &[i32],
) -> Result<HashMap<i32, OwnerPublic>, ApiError> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let owners: Vec<OwnerPublic> = users::table
        .filter(users::id.eq_any(user_ids))
        .select((users::id, users::user_name, users::full_name, users::avatar_url))
        .load(conn)
        .await?;
    Ok(owners.into_iter().map(|o| (o.id, o)).collect())
}

pub async fn comments_count(conn: &mut DbConnection, video_id: i32) -> Result<i64, ApiError> {
    Ok(comments::table
        .filter(comments::video_id.eq(video_id))
        .count()
        .get_result(conn)
        .await?)
}

/// Attach owner cards to a page of videos with a single batched user query.
pub async fn videos_with_owners(
    conn: &mut DbConnection,
    videos_page: Vec<Video>,
) -> Result<Vec<VideoWithOwner>, ApiError> {
    let owner_ids: Vec<i32> = videos_page.iter().map(|v| v.owner_id).collect();
    let owners = owners_by_id(conn, &owner_ids).await?;
    Ok(videos_page
        .into_iter()
        .filter_map(|video| {
            owners
                .get(&video.owner_id)
                .cloned()
                .map(|owner| VideoWithOwner { video, owner })
        })
        .collect())
}

/// The full single-video shape: owner with channel stats, reaction summary,
/// and comment count, all computed for the current viewer.
pub async fn video_detail(
    conn: &mut DbConnection,
    viewer_id: Option<i32>,
    video: Video,
) -> Result<VideoDetail, ApiError> {
    let owner = owner_public(conn, video.owner_id).await?;
    let owner = VideoOwner {
        id: owner.id,
        user_name: owner.user_name,
        full_name: owner.full_name,
        avatar_url: owner.avatar_url,
        subscribers_count: subscribers_count(conn, video.owner_id).await?,
        is_subscribed: is_subscribed(conn, viewer_id, video.owner_id).await?,
    };

    let reactions =
        reactions::summary(conn, viewer_id, crate::models::ReactionTarget::Video(video.id)).await?;
    let comments_count = comments_count(conn, video.id).await?;

    Ok(VideoDetail {
        video,
        owner,
        likes_count: reactions.likes_count,
        is_liked: reactions.is_liked,
        dislikes_count: reactions.dislikes_count,
        is_disliked: reactions.is_disliked,
        comments_count,
    })
}

/// Channel header for a profile page, looked up by userName. Returns `None`
/// when no such channel exists.
pub async fn channel_profile(
    conn: &mut DbConnection,
    user_name: &str,
    viewer_id: Option<i32>,
) -> Result<Option<ChannelProfile>, ApiError> {
    let normalized = user_name.trim().to_lowercase();
    let user: Option<(i32, String, String, String, String, Option<String>)> = users::table
        .filter(users::user_name.eq(&normalized))
        .select((
            users::id,
            users::user_name,
            users::email,
            users::full_name,
            users::avatar_url,
            users::cover_image_url,
        ))
        .first(conn)
        .await
        .optional()?;

    let Some((id, user_name, email, full_name, avatar_url, cover_image_url)) = user else {
        return Ok(None);
    };

    Ok(Some(ChannelProfile {
        id,
        user_name,
        email,
        full_name,
        avatar_url,
        cover_image_url,
        subscribers_count: subscribers_count(conn, id).await?,
        subscribed_to_count: subscribed_to_count(conn, id).await?,
        is_subscribed: is_subscribed(conn, viewer_id, id).await?,
    }))
}

/// Batched per-video like counts, used by the dashboard listing.
pub async fn video_like_counts(
    conn: &mut DbConnection,
    video_ids: &[i32],
) -> Result<HashMap<i32, i64>, ApiError> {
    let summaries = reactions::summaries(conn, None, TARGET_VIDEO, video_ids).await?;
    Ok(summaries
        .into_iter()
        .map(|(id, s)| (id, s.likes_count))
        .collect())
}

/// Published videos owned by a channel, newest first. Used by the profile
/// page and the dashboard totals.
pub async fn published_video_ids(
    conn: &mut DbConnection,
    owner_id: i32,
) -> Result<Vec<i32>, ApiError> {
    Ok(videos::table
        .filter(videos::owner_id.eq(owner_id))
        .filter(videos::is_published.eq(true))
        .select(videos::id)
        .load(conn)
        .await?)
}
