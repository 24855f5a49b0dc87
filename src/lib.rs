pub mod api;
pub mod assets;
pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod schema;
pub mod services;
