pub mod cascade;
pub mod reactions;
pub mod views;
