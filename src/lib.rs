pub mod admin;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod metadata;
pub mod models;
pub mod search;
pub mod state;
pub mod store;
pub mod utils;
