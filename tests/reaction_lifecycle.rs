//! Database-backed tests for the reaction toggle and the delete cascades.
//! They run against `TEST_DATABASE_URL` and skip quietly when it is unset.

use diesel::prelude::*;
use diesel::{Connection, PgConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_async::RunQueryDsl;
use diesel_migrations::MigrationHarness;
use uuid::Uuid;

use vodhub::api::error::ApiError;
use vodhub::db::{DbConnection, DbPool, MIGRATIONS};
use vodhub::models::playlist::{LIKED_VIDEOS_NAME, VISIBILITY_PRIVATE};
use vodhub::models::reaction::{TARGET_COMMENT, TARGET_VIDEO};
use vodhub::models::{NewComment, NewPlaylist, NewUser, NewVideo, ReactionKind, ReactionTarget};
use vodhub::schema::{comments, dislikes, likes, playlist_videos, videos, watch_history};
use vodhub::schema::{playlists, users};
use vodhub::services::{cascade, reactions};

fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

// Tests run in parallel; only one may apply migrations at a time.
static MIGRATE: std::sync::Mutex<()> = std::sync::Mutex::new(());

async fn test_pool(url: &str) -> DbPool {
    {
        let _guard = MIGRATE.lock().unwrap();
        let mut conn = PgConnection::establish(url).expect("connect for migrations");
        conn.run_pending_migrations(MIGRATIONS).expect("migrations");
    }

    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
    DbPool::builder(manager)
        .max_size(2)
        .runtime(deadpool::Runtime::Tokio1)
        .build()
        .expect("pool builder")
}

async fn seed_user(conn: &mut DbConnection) -> i32 {
    let tag = Uuid::new_v4().simple().to_string();
    diesel::insert_into(users::table)
        .values(&NewUser {
            user_name: format!("user{tag}"),
            email: format!("{tag}@example.com"),
            full_name: "Test User".to_string(),
            avatar_url: "http://assets.local/avatar.png".to_string(),
            cover_image_url: None,
            password_hash: "unused".to_string(),
        })
        .returning(users::id)
        .get_result(conn)
        .await
        .expect("seed user")
}

async fn seed_video(conn: &mut DbConnection, owner_id: i32) -> i32 {
    diesel::insert_into(videos::table)
        .values(&NewVideo {
            owner_id,
            video_url: "http://assets.local/clip.mp4".to_string(),
            thumbnail_url: "http://assets.local/thumb.png".to_string(),
            title: "Test clip".to_string(),
            description: "A clip".to_string(),
            duration_secs: 12.5,
        })
        .returning(videos::id)
        .get_result(conn)
        .await
        .expect("seed video")
}

async fn like_rows(conn: &mut DbConnection, owner_id: i32, target_id: i32) -> i64 {
    likes::table
        .filter(likes::owner_id.eq(owner_id))
        .filter(likes::target_kind.eq(TARGET_VIDEO))
        .filter(likes::target_id.eq(target_id))
        .count()
        .get_result(conn)
        .await
        .expect("count likes")
}

#[tokio::test]
async fn toggling_a_like_twice_returns_to_the_initial_state() {
    let Some(url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let pool = test_pool(&url).await;
    let mut conn = pool.get().await.unwrap();
    let user_id = seed_user(&mut conn).await;
    let video_id = seed_video(&mut conn, user_id).await;
    let target = ReactionTarget::Video(video_id);

    let on = reactions::toggle(&mut conn, ReactionKind::Like, user_id, target)
        .await
        .unwrap();
    assert_eq!(on.likes_count, 1);
    assert!(on.is_liked);

    let off = reactions::toggle(&mut conn, ReactionKind::Like, user_id, target)
        .await
        .unwrap();
    assert_eq!(off.likes_count, 0);
    assert!(!off.is_liked);
    assert_eq!(like_rows(&mut conn, user_id, video_id).await, 0);
}

#[tokio::test]
async fn like_and_dislike_are_mutually_exclusive() {
    let Some(url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let pool = test_pool(&url).await;
    let mut conn = pool.get().await.unwrap();
    let user_id = seed_user(&mut conn).await;
    let video_id = seed_video(&mut conn, user_id).await;
    let target = ReactionTarget::Video(video_id);

    reactions::toggle(&mut conn, ReactionKind::Like, user_id, target)
        .await
        .unwrap();
    let after_dislike = reactions::toggle(&mut conn, ReactionKind::Dislike, user_id, target)
        .await
        .unwrap();

    assert_eq!(after_dislike.likes_count, 0);
    assert!(!after_dislike.is_liked);
    assert_eq!(after_dislike.dislikes_count, 1);
    assert!(after_dislike.is_disliked);
    assert_eq!(like_rows(&mut conn, user_id, video_id).await, 0);
}

#[tokio::test]
async fn disliking_a_video_pulls_it_from_the_liked_playlist() {
    let Some(url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let pool = test_pool(&url).await;
    let mut conn = pool.get().await.unwrap();
    let user_id = seed_user(&mut conn).await;
    let video_id = seed_video(&mut conn, user_id).await;

    let playlist_id: i32 = diesel::insert_into(playlists::table)
        .values(&NewPlaylist {
            owner_id: user_id,
            name: LIKED_VIDEOS_NAME.to_string(),
            description: "Liked Videos".to_string(),
            visibility: VISIBILITY_PRIVATE.to_string(),
        })
        .returning(playlists::id)
        .get_result(&mut conn)
        .await
        .unwrap();
    diesel::insert_into(playlist_videos::table)
        .values((
            playlist_videos::playlist_id.eq(playlist_id),
            playlist_videos::video_id.eq(video_id),
        ))
        .execute(&mut conn)
        .await
        .unwrap();

    reactions::toggle(
        &mut conn,
        ReactionKind::Dislike,
        user_id,
        ReactionTarget::Video(video_id),
    )
    .await
    .unwrap();

    let members: i64 = playlist_videos::table
        .filter(playlist_videos::playlist_id.eq(playlist_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(members, 0);
}

#[tokio::test]
async fn unpublished_videos_reject_reactions() {
    let Some(url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let pool = test_pool(&url).await;
    let mut conn = pool.get().await.unwrap();
    let user_id = seed_user(&mut conn).await;
    let video_id = seed_video(&mut conn, user_id).await;
    diesel::update(videos::table.find(video_id))
        .set(videos::is_published.eq(false))
        .execute(&mut conn)
        .await
        .unwrap();

    let err = reactions::toggle(
        &mut conn,
        ReactionKind::Like,
        user_id,
        ReactionTarget::Video(video_id),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let missing = reactions::toggle(
        &mut conn,
        ReactionKind::Like,
        user_id,
        ReactionTarget::Video(-1),
    )
    .await
    .unwrap_err();
    assert!(matches!(missing, ApiError::NotFound(_)));
}

#[tokio::test]
async fn deleting_a_video_removes_every_dependent_row() {
    let Some(url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let pool = test_pool(&url).await;
    let mut conn = pool.get().await.unwrap();
    let owner_id = seed_user(&mut conn).await;
    let viewer_id = seed_user(&mut conn).await;
    let video_id = seed_video(&mut conn, owner_id).await;

    let comment_id: i32 = diesel::insert_into(comments::table)
        .values(&NewComment {
            video_id,
            owner_id: viewer_id,
            content: "nice".to_string(),
        })
        .returning(comments::id)
        .get_result(&mut conn)
        .await
        .unwrap();
    reactions::toggle(
        &mut conn,
        ReactionKind::Like,
        viewer_id,
        ReactionTarget::Video(video_id),
    )
    .await
    .unwrap();
    reactions::toggle(
        &mut conn,
        ReactionKind::Dislike,
        owner_id,
        ReactionTarget::Comment(comment_id),
    )
    .await
    .unwrap();

    let playlist_id: i32 = diesel::insert_into(playlists::table)
        .values(&NewPlaylist {
            owner_id: viewer_id,
            name: "Road trip".to_string(),
            description: "mix".to_string(),
            visibility: VISIBILITY_PRIVATE.to_string(),
        })
        .returning(playlists::id)
        .get_result(&mut conn)
        .await
        .unwrap();
    diesel::insert_into(playlist_videos::table)
        .values((
            playlist_videos::playlist_id.eq(playlist_id),
            playlist_videos::video_id.eq(video_id),
        ))
        .execute(&mut conn)
        .await
        .unwrap();
    diesel::insert_into(watch_history::table)
        .values((
            watch_history::user_id.eq(viewer_id),
            watch_history::video_id.eq(video_id),
        ))
        .execute(&mut conn)
        .await
        .unwrap();

    cascade::delete_video(&mut conn, video_id).await.unwrap();

    let video_rows: i64 = videos::table
        .filter(videos::id.eq(video_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(video_rows, 0);

    let comment_rows: i64 = comments::table
        .filter(comments::video_id.eq(video_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(comment_rows, 0);

    let video_likes: i64 = likes::table
        .filter(likes::target_kind.eq(TARGET_VIDEO))
        .filter(likes::target_id.eq(video_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(video_likes, 0);

    let comment_dislikes: i64 = dislikes::table
        .filter(dislikes::target_kind.eq(TARGET_COMMENT))
        .filter(dislikes::target_id.eq(comment_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(comment_dislikes, 0);

    let memberships: i64 = playlist_videos::table
        .filter(playlist_videos::video_id.eq(video_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(memberships, 0);

    let history: i64 = watch_history::table
        .filter(watch_history::video_id.eq(video_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(history, 0);
}
