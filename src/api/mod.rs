pub mod error;
pub mod handlers;

use crate::assets::AssetStore;
use crate::config::Config;
use crate::db::DbPool;
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

// Axum's default body limit is 2 MB, far below a real upload. The multipart
// routes raise it explicitly; everything else keeps the default.
const IMAGE_UPLOAD_LIMIT_BYTES: usize = 16 * 1024 * 1024;
const VIDEO_UPLOAD_LIMIT_BYTES: usize = 1024 * 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub assets: Arc<dyn AssetStore>,
}

/// Build the full router. Split out from the server start so tests can drive
/// it with `tower::ServiceExt::oneshot`.
pub fn app(state: AppState) -> Router {
    Router::new()
        // General routes
        .route("/api/v1/healthcheck", get(handlers::health::healthcheck))
        // User routes
        .route(
            "/api/v1/users/register",
            post(handlers::users::register).layer(DefaultBodyLimit::max(IMAGE_UPLOAD_LIMIT_BYTES)),
        )
        .route("/api/v1/users/login", post(handlers::users::login))
        .route("/api/v1/users/logout", post(handlers::users::logout))
        .route("/api/v1/users/refresh-token", post(handlers::users::refresh_token))
        .route("/api/v1/users/current", get(handlers::users::current_user))
        .route("/api/v1/users/change-password", post(handlers::users::change_password))
        .route("/api/v1/users/update-account", patch(handlers::users::update_account))
        .route(
            "/api/v1/users/avatar",
            patch(handlers::users::update_avatar)
                .layer(DefaultBodyLimit::max(IMAGE_UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/api/v1/users/cover-image",
            patch(handlers::users::update_cover_image)
                .layer(DefaultBodyLimit::max(IMAGE_UPLOAD_LIMIT_BYTES)),
        )
        .route("/api/v1/users/profile/:userName", get(handlers::users::channel_profile))
        .route("/api/v1/users/watch-history", get(handlers::users::watch_history))
        // Video routes
        .route("/api/v1/videos", get(handlers::videos::list_videos))
        .route(
            "/api/v1/videos/upload",
            post(handlers::videos::upload_video)
                .layer(DefaultBodyLimit::max(VIDEO_UPLOAD_LIMIT_BYTES)),
        )
        .route("/api/v1/videos/view/:videoId", get(handlers::videos::view_video))
        .route(
            "/api/v1/videos/update/:videoId",
            patch(handlers::videos::update_video)
                .layer(DefaultBodyLimit::max(IMAGE_UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/api/v1/videos/toggle/publish/:videoId",
            patch(handlers::videos::toggle_publish),
        )
        .route("/api/v1/videos/delete/:videoId", delete(handlers::videos::delete_video))
        // Comment routes
        .route("/api/v1/comments/:videoId", get(handlers::comments::list_comments))
        .route("/api/v1/comments/add/:videoId", post(handlers::comments::add_comment))
        .route(
            "/api/v1/comments/update/:commentId",
            patch(handlers::comments::update_comment),
        )
        .route(
            "/api/v1/comments/delete/:commentId",
            delete(handlers::comments::delete_comment),
        )
        // Like routes
        .route("/api/v1/likes/toggle/video/:videoId", post(handlers::likes::toggle_video_like))
        .route(
            "/api/v1/likes/toggle/comment/:commentId",
            post(handlers::likes::toggle_comment_like),
        )
        .route("/api/v1/likes/toggle/tweet/:tweetId", post(handlers::likes::toggle_tweet_like))
        .route("/api/v1/likes/videos/self", get(handlers::likes::liked_videos))
        // Dislike routes
        .route(
            "/api/v1/dislikes/toggle/video/:videoId",
            post(handlers::dislikes::toggle_video_dislike),
        )
        .route(
            "/api/v1/dislikes/toggle/comment/:commentId",
            post(handlers::dislikes::toggle_comment_dislike),
        )
        .route(
            "/api/v1/dislikes/toggle/tweet/:tweetId",
            post(handlers::dislikes::toggle_tweet_dislike),
        )
        // Subscription routes
        .route(
            "/api/v1/subscriptions/toggle/:channelId",
            post(handlers::subscriptions::toggle_subscription),
        )
        .route(
            "/api/v1/subscriptions/channels",
            get(handlers::subscriptions::subscribed_channels),
        )
        .route(
            "/api/v1/subscriptions/subscribers/:channelId",
            get(handlers::subscriptions::channel_subscribers),
        )
        // Playlist routes
        .route("/api/v1/playlists/create", post(handlers::playlists::create_playlist))
        .route("/api/v1/playlists/user/:userId", get(handlers::playlists::user_playlists))
        .route("/api/v1/playlists/:playlistId", get(handlers::playlists::playlist_detail))
        .route(
            "/api/v1/playlists/add/:playlistId/:videoId",
            patch(handlers::playlists::add_video),
        )
        .route(
            "/api/v1/playlists/remove/:playlistId/:videoId",
            patch(handlers::playlists::remove_video),
        )
        .route(
            "/api/v1/playlists/update/:playlistId",
            patch(handlers::playlists::update_playlist),
        )
        .route(
            "/api/v1/playlists/delete/:playlistId",
            delete(handlers::playlists::delete_playlist),
        )
        // Tweet routes
        .route("/api/v1/tweets/create", post(handlers::tweets::create_tweet))
        .route("/api/v1/tweets/users/:userId", get(handlers::tweets::user_tweets))
        .route("/api/v1/tweets/update/:tweetId", patch(handlers::tweets::update_tweet))
        .route("/api/v1/tweets/delete/:tweetId", delete(handlers::tweets::delete_tweet))
        // Dashboard routes
        .route("/api/v1/dashboard/stats", get(handlers::dashboard::channel_stats))
        .route("/api/v1/dashboard/videos", get(handlers::dashboard::channel_videos))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the API server
pub async fn start_api_server(pool: DbPool, assets: Arc<dyn AssetStore>) -> Result<()> {
    let config = Config::get();

    // Set up CORS
    let cors = if config.server.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::permissive()
    };

    let app = app(AppState { pool, assets }).layer(cors);

    let addr = format!("{}:{}", config.server.host, config.server.port).parse::<SocketAddr>()?;

    info!("Starting API server on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received, stopping API server");
}
