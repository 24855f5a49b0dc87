//! Short text posts attached to a channel.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;

use crate::api::error::{ApiError, ApiResponse};
use crate::api::handlers::required_text;
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::models::reaction::TARGET_TWEET;
use crate::models::{NewTweet, Tweet, TweetView};
use crate::schema::{tweets, users};
use crate::services::{cascade, reactions, views};

#[derive(Debug, Deserialize)]
pub struct TweetBody {
    pub content: String,
}

/// `POST /api/v1/tweets/create`
pub async fn create_tweet(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(body): Json<TweetBody>,
) -> Result<impl IntoResponse, ApiError> {
    let content = required_text(Some(body.content), "content")?;

    let mut conn = state.pool.get().await?;
    let tweet: Tweet = diesel::insert_into(tweets::table)
        .values(&NewTweet {
            owner_id: auth_user.user.id,
            content,
        })
        .get_result(&mut conn)
        .await?;

    Ok(ApiResponse::created(tweet, "Tweet created successfully!"))
}

/// `GET /api/v1/tweets/users/:userId`
pub async fn user_tweets(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let user_exists: i64 = users::table
        .filter(users::id.eq(user_id))
        .count()
        .get_result(&mut conn)
        .await?;
    if user_exists == 0 {
        return Err(ApiError::NotFound("User does not exist!".to_string()));
    }

    let page: Vec<Tweet> = tweets::table
        .filter(tweets::owner_id.eq(user_id))
        .order(tweets::created_at.desc())
        .load(&mut conn)
        .await?;

    let owner = views::owner_public(&mut conn, user_id).await?;
    let tweet_ids: Vec<i32> = page.iter().map(|t| t.id).collect();
    let mut summaries =
        reactions::summaries(&mut conn, Some(auth_user.user.id), TARGET_TWEET, &tweet_ids).await?;

    let items: Vec<TweetView> = page
        .into_iter()
        .map(|tweet| TweetView {
            id: tweet.id,
            content: tweet.content,
            created_at: tweet.created_at,
            owner: owner.clone(),
            reactions: summaries.remove(&tweet.id).unwrap_or_default(),
        })
        .collect();

    Ok(ApiResponse::ok(items, "Tweets fetched successfully!"))
}

/// `PATCH /api/v1/tweets/update/:tweetId`
pub async fn update_tweet(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(tweet_id): Path<i32>,
    Json(body): Json<TweetBody>,
) -> Result<impl IntoResponse, ApiError> {
    let content = required_text(Some(body.content), "content")?;

    let mut conn = state.pool.get().await?;
    let tweet: Tweet = tweets::table
        .find(tweet_id)
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Tweet does not exist!".to_string()))?;
    if tweet.owner_id != auth_user.user.id {
        return Err(ApiError::Forbidden(
            "You are not allowed to modify this tweet!".to_string(),
        ));
    }

    let updated: Tweet = diesel::update(tweets::table.find(tweet_id))
        .set((
            tweets::content.eq(content),
            tweets::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result(&mut conn)
        .await?;

    Ok(ApiResponse::ok(updated, "Tweet updated successfully!"))
}

/// `DELETE /api/v1/tweets/delete/:tweetId`
pub async fn delete_tweet(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(tweet_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = state.pool.get().await?;
    let tweet: Tweet = tweets::table
        .find(tweet_id)
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Tweet does not exist!".to_string()))?;
    if tweet.owner_id != auth_user.user.id {
        return Err(ApiError::Forbidden(
            "You are not allowed to delete this tweet!".to_string(),
        ));
    }

    cascade::delete_tweet(&mut conn, tweet_id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Tweet deleted successfully!",
    ))
}
