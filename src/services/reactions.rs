//! The like/dislike toggle and its read-time summaries.
//!
//! A toggle is a presence check followed by a delete (toggled off) or an
//! opposite-kind delete plus insert (toggled on). The unique index on
//! (owner_id, target_kind, target_id) makes concurrent toggles collapse to
//! one row, so inserts go through `on_conflict_do_nothing`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::{HashMap, HashSet};

use crate::api::error::ApiError;
use crate::db::DbConnection;
use crate::models::playlist::LIKED_VIDEOS_NAME;
use crate::models::{ReactionKind, ReactionSummary, ReactionTarget};
use crate::schema::{comments, dislikes, likes, playlist_videos, playlists, tweets, videos};

/// Flip the actor's reaction of `kind` on `target` and return the
/// recomputed summary. Like and dislike are mutually exclusive per
/// (actor, target): toggling one on removes the other.
pub async fn toggle(
    conn: &mut DbConnection,
    kind: ReactionKind,
    actor_id: i32,
    target: ReactionTarget,
) -> Result<ReactionSummary, ApiError> {
    ensure_target_reactable(conn, target).await?;

    let removed = match kind {
        ReactionKind::Like => {
            diesel::delete(
                likes::table
                    .filter(likes::owner_id.eq(actor_id))
                    .filter(likes::target_kind.eq(target.kind()))
                    .filter(likes::target_id.eq(target.id())),
            )
            .execute(conn)
            .await?
        }
        ReactionKind::Dislike => {
            diesel::delete(
                dislikes::table
                    .filter(dislikes::owner_id.eq(actor_id))
                    .filter(dislikes::target_kind.eq(target.kind()))
                    .filter(dislikes::target_id.eq(target.id())),
            )
            .execute(conn)
            .await?
        }
    };

    if removed == 0 {
        match kind {
            ReactionKind::Like => {
                diesel::delete(
                    dislikes::table
                        .filter(dislikes::owner_id.eq(actor_id))
                        .filter(dislikes::target_kind.eq(target.kind()))
                        .filter(dislikes::target_id.eq(target.id())),
                )
                .execute(conn)
                .await?;
                diesel::insert_into(likes::table)
                    .values((
                        likes::owner_id.eq(actor_id),
                        likes::target_kind.eq(target.kind()),
                        likes::target_id.eq(target.id()),
                    ))
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
            }
            ReactionKind::Dislike => {
                diesel::delete(
                    likes::table
                        .filter(likes::owner_id.eq(actor_id))
                        .filter(likes::target_kind.eq(target.kind()))
                        .filter(likes::target_id.eq(target.id())),
                )
                .execute(conn)
                .await?;
                diesel::insert_into(dislikes::table)
                    .values((
                        dislikes::owner_id.eq(actor_id),
                        dislikes::target_kind.eq(target.kind()),
                        dislikes::target_id.eq(target.id()),
                    ))
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
                // Disliking a video also drops it from the actor's liked-videos
                // playlist.
                if let ReactionTarget::Video(video_id) = target {
                    remove_from_liked_playlist(conn, actor_id, video_id).await?;
                }
            }
        }
    }

    summary(conn, Some(actor_id), target).await
}

/// Targets must exist before a reaction can touch them; video targets must
/// additionally be published.
async fn ensure_target_reactable(
    conn: &mut DbConnection,
    target: ReactionTarget,
) -> Result<(), ApiError> {
    match target {
        ReactionTarget::Video(id) => {
            let published = videos::table
                .find(id)
                .select(videos::is_published)
                .first::<bool>(conn)
                .await
                .optional()?;
            match published {
                None => Err(ApiError::NotFound("Video does not exist!".to_string())),
                Some(false) => Err(ApiError::Forbidden(
                    "Video is not published yet!".to_string(),
                )),
                Some(true) => Ok(()),
            }
        }
        ReactionTarget::Comment(id) => {
            let count: i64 = comments::table
                .filter(comments::id.eq(id))
                .count()
                .get_result(conn)
                .await?;
            if count == 0 {
                return Err(ApiError::NotFound("Comment does not exist!".to_string()));
            }
            Ok(())
        }
        ReactionTarget::Tweet(id) => {
            let count: i64 = tweets::table
                .filter(tweets::id.eq(id))
                .count()
                .get_result(conn)
                .await?;
            if count == 0 {
                return Err(ApiError::NotFound("Tweet does not exist!".to_string()));
            }
            Ok(())
        }
    }
}

async fn remove_from_liked_playlist(
    conn: &mut DbConnection,
    actor_id: i32,
    video_id: i32,
) -> Result<(), ApiError> {
    let liked_playlist: Option<i32> = playlists::table
        .filter(playlists::owner_id.eq(actor_id))
        .filter(playlists::name.eq(LIKED_VIDEOS_NAME))
        .select(playlists::id)
        .first(conn)
        .await
        .optional()?;

    if let Some(playlist_id) = liked_playlist {
        diesel::delete(
            playlist_videos::table
                .filter(playlist_videos::playlist_id.eq(playlist_id))
                .filter(playlist_videos::video_id.eq(video_id)),
        )
        .execute(conn)
        .await?;
    }
    Ok(())
}

/// Recompute the reaction summary for one target. Counts always come from
/// the authoritative tables; viewer flags are false for anonymous reads.
pub async fn summary(
    conn: &mut DbConnection,
    viewer_id: Option<i32>,
    target: ReactionTarget,
) -> Result<ReactionSummary, ApiError> {
    let likes_count: i64 = likes::table
        .filter(likes::target_kind.eq(target.kind()))
        .filter(likes::target_id.eq(target.id()))
        .count()
        .get_result(conn)
        .await?;
    let dislikes_count: i64 = dislikes::table
        .filter(dislikes::target_kind.eq(target.kind()))
        .filter(dislikes::target_id.eq(target.id()))
        .count()
        .get_result(conn)
        .await?;

    let (is_liked, is_disliked) = match viewer_id {
        Some(viewer) => {
            let liked: i64 = likes::table
                .filter(likes::owner_id.eq(viewer))
                .filter(likes::target_kind.eq(target.kind()))
                .filter(likes::target_id.eq(target.id()))
                .count()
                .get_result(conn)
                .await?;
            let disliked: i64 = dislikes::table
                .filter(dislikes::owner_id.eq(viewer))
                .filter(dislikes::target_kind.eq(target.kind()))
                .filter(dislikes::target_id.eq(target.id()))
                .count()
                .get_result(conn)
                .await?;
            (liked > 0, disliked > 0)
        }
        None => (false, false),
    };

    Ok(ReactionSummary {
        likes_count,
        is_liked,
        dislikes_count,
        is_disliked,
    })
}

/// Batched variant of [`summary`] for list views: grouped counts plus the
/// viewer's own reaction rows, four queries total regardless of list size.
pub async fn summaries(
    conn: &mut DbConnection,
    viewer_id: Option<i32>,
    target_kind: &str,
    target_ids: &[i32],
) -> Result<HashMap<i32, ReactionSummary>, ApiError> {
    let mut result: HashMap<i32, ReactionSummary> = target_ids
        .iter()
        .map(|id| (*id, ReactionSummary::default()))
        .collect();
    if target_ids.is_empty() {
        return Ok(result);
    }

    let like_counts: Vec<(i32, i64)> = likes::table
        .filter(likes::target_kind.eq(target_kind))
        .filter(likes::target_id.eq_any(target_ids))
        .group_by(likes::target_id)
        .select((likes::target_id, diesel::dsl::count_star()))
        .load(conn)
        .await?;
    for (id, count) in like_counts {
        if let Some(entry) = result.get_mut(&id) {
            entry.likes_count = count;
        }
    }

    let dislike_counts: Vec<(i32, i64)> = dislikes::table
        .filter(dislikes::target_kind.eq(target_kind))
        .filter(dislikes::target_id.eq_any(target_ids))
        .group_by(dislikes::target_id)
        .select((dislikes::target_id, diesel::dsl::count_star()))
        .load(conn)
        .await?;
    for (id, count) in dislike_counts {
        if let Some(entry) = result.get_mut(&id) {
            entry.dislikes_count = count;
        }
    }

    if let Some(viewer) = viewer_id {
        let liked: HashSet<i32> = likes::table
            .filter(likes::owner_id.eq(viewer))
            .filter(likes::target_kind.eq(target_kind))
            .filter(likes::target_id.eq_any(target_ids))
            .select(likes::target_id)
            .load::<i32>(conn)
            .await?
            .into_iter()
            .collect();
        let disliked: HashSet<i32> = dislikes::table
            .filter(dislikes::owner_id.eq(viewer))
            .filter(dislikes::target_kind.eq(target_kind))
            .filter(dislikes::target_id.eq_any(target_ids))
            .select(dislikes::target_id)
            .load::<i32>(conn)
            .await?
            .into_iter()
            .collect();
        for (id, entry) in result.iter_mut() {
            entry.is_liked = liked.contains(id);
            entry.is_disliked = disliked.contains(id);
        }
    }

    Ok(result)
}
