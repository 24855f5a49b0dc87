//! Lifecycle cascades. Each delete removes the record and every dependent
//! row (reactions, comments, playlist membership, watch history) inside one
//! database transaction so a failure cannot leave orphans behind.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::api::error::ApiError;
use crate::db::DbConnection;
use crate::models::reaction::{TARGET_COMMENT, TARGET_TWEET, TARGET_VIDEO};
use crate::schema::{
    comments, dislikes, likes, playlist_videos, playlists, tweets, videos, watch_history,
};

/// Delete a video with its comments, the reactions on the video and on each
/// of those comments, every playlist membership, and watch-history rows.
pub async fn delete_video(conn: &mut DbConnection, video_id: i32) -> Result<(), ApiError> {
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        async move {
            let comment_ids: Vec<i32> = comments::table
                .filter(comments::video_id.eq(video_id))
                .select(comments::id)
                .load(conn)
                .await?;

            if !comment_ids.is_empty() {
                diesel::delete(
                    likes::table
                        .filter(likes::target_kind.eq(TARGET_COMMENT))
                        .filter(likes::target_id.eq_any(&comment_ids)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    dislikes::table
                        .filter(dislikes::target_kind.eq(TARGET_COMMENT))
                        .filter(dislikes::target_id.eq_any(&comment_ids)),
                )
                .execute(conn)
                .await?;
            }

            diesel::delete(comments::table.filter(comments::video_id.eq(video_id)))
                .execute(conn)
                .await?;
            diesel::delete(
                likes::table
                    .filter(likes::target_kind.eq(TARGET_VIDEO))
                    .filter(likes::target_id.eq(video_id)),
            )
            .execute(conn)
            .await?;
            diesel::delete(
                dislikes::table
                    .filter(dislikes::target_kind.eq(TARGET_VIDEO))
                    .filter(dislikes::target_id.eq(video_id)),
            )
            .execute(conn)
            .await?;
            diesel::delete(
                playlist_videos::table.filter(playlist_videos::video_id.eq(video_id)),
            )
            .execute(conn)
            .await?;
            diesel::delete(watch_history::table.filter(watch_history::video_id.eq(video_id)))
                .execute(conn)
                .await?;
            diesel::delete(videos::table.find(video_id)).execute(conn).await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await?;
    Ok(())
}

/// Delete a comment together with the reactions placed on it.
pub async fn delete_comment(conn: &mut DbConnection, comment_id: i32) -> Result<(), ApiError> {
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        async move {
            diesel::delete(
                likes::table
                    .filter(likes::target_kind.eq(TARGET_COMMENT))
                    .filter(likes::target_id.eq(comment_id)),
            )
            .execute(conn)
            .await?;
            diesel::delete(
                dislikes::table
                    .filter(dislikes::target_kind.eq(TARGET_COMMENT))
                    .filter(dislikes::target_id.eq(comment_id)),
            )
            .execute(conn)
            .await?;
            diesel::delete(comments::table.find(comment_id)).execute(conn).await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await?;
    Ok(())
}

/// Delete a tweet together with the reactions placed on it.
pub async fn delete_tweet(conn: &mut DbConnection, tweet_id: i32) -> Result<(), ApiError> {
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        async move {
            diesel::delete(
                likes::table
                    .filter(likes::target_kind.eq(TARGET_TWEET))
                    .filter(likes::target_id.eq(tweet_id)),
            )
            .execute(conn)
            .await?;
            diesel::delete(
                dislikes::table
                    .filter(dislikes::target_kind.eq(TARGET_TWEET))
                    .filter(dislikes::target_id.eq(tweet_id)),
            )
            .execute(conn)
            .await?;
            diesel::delete(tweets::table.find(tweet_id)).execute(conn).await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await?;
    Ok(())
}

/// Delete a playlist and its membership rows.
pub async fn delete_playlist(conn: &mut DbConnection, playlist_id: i32) -> Result<(), ApiError> {
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        async move {
            diesel::delete(
                playlist_videos::table.filter(playlist_videos::playlist_id.eq(playlist_id)),
            )
            .execute(conn)
            .await?;
            diesel::delete(playlists::table.find(playlist_id)).execute(conn).await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await?;
    Ok(())
}
