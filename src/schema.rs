use diesel::allow_tables_to_appear_in_same_query;
use diesel::table;

table! {
    users (id) {
        id -> Integer,
        user_name -> Varchar,
        email -> Varchar,
        full_name -> Varchar,
        avatar_url -> Varchar,
        cover_image_url -> Nullable<Varchar>,
        password_hash -> Varchar,
        refresh_token -> Nullable<Varchar>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    videos (id) {
        id -> Integer,
        owner_id -> Integer,
        video_url -> Varchar,
        thumbnail_url -> Varchar,
        title -> Varchar,
        description -> Text,
        duration_secs -> Double,
        views -> Bigint,
        is_published -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    comments (id) {
        id -> Integer,
        video_id -> Integer,
        owner_id -> Integer,
        content -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    tweets (id) {
        id -> Integer,
        owner_id -> Integer,
        content -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    likes (id) {
        id -> Integer,
        owner_id -> Integer,
        target_kind -> Varchar,
        target_id -> Integer,
        created_at -> Timestamp,
    }
}

table! {
    dislikes (id) {
        id -> Integer,
        owner_id -> Integer,
        target_kind -> Varchar,
        target_id -> Integer,
        created_at -> Timestamp,
    }
}

table! {
    subscriptions (id) {
        id -> Integer,
        subscriber_id -> Integer,
        channel_id -> Integer,
        created_at -> Timestamp,
    }
}

table! {
    playlists (id) {
        id -> Integer,
        owner_id -> Integer,
        name -> Varchar,
        description -> Text,
        visibility -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    playlist_videos (id) {
        id -> Integer,
        playlist_id -> Integer,
        video_id -> Integer,
        added_at -> Timestamp,
    }
}

table! {
    watch_history (id) {
        id -> Integer,
        user_id -> Integer,
        video_id -> Integer,
        watched_at -> Timestamp,
    }
}

allow_tables_to_appear_in_same_query!(
    users,
    videos,
    comments,
    tweets,
    likes,
    dislikes,
    subscriptions,
    playlists,
    playlist_videos,
    watch_history,
);
