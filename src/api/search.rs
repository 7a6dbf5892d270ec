use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::extract::AppQuery;
use crate::error::{AppError, AppResult};
use crate::search::{self, CategorizedResults, Suggestion};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: Option<String>,
}

impl SearchQuery {
    /// Rejected before any index work when missing or empty / 缺少查询词时直接拒绝
    fn required(&self) -> AppResult<&str> {
        match self.query.as_deref() {
            Some(q) if !q.is_empty() => Ok(q),
            _ => Err(AppError::BadRequest("Query parameter is required".to_string())),
        }
    }
}

/// GET /api/search - 全局搜索
pub async fn global_search(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<SearchQuery>,
) -> AppResult<Json<CategorizedResults>> {
    let query = params.required()?;
    let results = search::global_search(&state.store, &state.metadata, &state.config.search, query).await?;
    Ok(Json(results))
}

/// GET /api/search/suggest - 搜索建议
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<SearchQuery>,
) -> AppResult<Json<Vec<Suggestion>>> {
    let query = params.required()?;
    let suggestions = search::suggest(&state.store, &state.metadata, &state.config.search, query).await?;
    Ok(Json(suggestions))
}
