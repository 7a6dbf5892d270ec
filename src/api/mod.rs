pub mod data;
pub mod extract;
pub mod search;
pub mod server;
pub mod tables;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;

/// HTTP routes / 路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(server::health_check))
        .route("/api/search", get(search::global_search))
        .route("/api/search/suggest", get(search::suggest))
        .route("/api/tables", get(tables::list_tables))
        .route("/api/tables", post(tables::create_table))
        .route("/api/tables/:name", get(tables::get_schema))
        .route("/api/tables/:name", patch(tables::update_table))
        .route("/api/tables/:name", axum::routing::delete(tables::delete_table))
        .route("/api/tables/:name/search-meta", put(tables::update_search_meta))
        .route("/api/data/:table", get(data::list_rows))
        .route("/api/data/:table", post(data::insert_row))
        .route("/api/data/:table/:id", put(data::update_row))
        .route("/api/data/:table/:id", axum::routing::delete(data::delete_row))
        .with_state(state)
}
