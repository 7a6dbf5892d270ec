use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::extract::{AppJson, AppPath};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::Record;
use crate::utils::validate_identifier;

/// GET /api/data/:table - 查询全部数据
pub async fn list_rows(
    State(state): State<Arc<AppState>>,
    AppPath(table): AppPath<String>,
) -> AppResult<Json<Vec<Record>>> {
    validate_identifier(&table)?;
    state.store.require_table(&table).await?;
    Ok(Json(state.store.fetch_rows(&table).await?))
}

/// POST /api/data/:table - 插入数据
pub async fn insert_row(
    State(state): State<Arc<AppState>>,
    AppPath(table): AppPath<String>,
    AppJson(record): AppJson<Record>,
) -> AppResult<(StatusCode, Json<Value>)> {
    validate_identifier(&table)?;
    state.store.require_table(&table).await?;

    let id = state.store.insert_row(&table, &record).await?;
    tracing::debug!("Inserted row {} into {}", id, table);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Data inserted successfully.", "id": id })),
    ))
}

/// PUT /api/data/:table/:id - 更新数据
pub async fn update_row(
    State(state): State<Arc<AppState>>,
    AppPath((table, id)): AppPath<(String, i64)>,
    AppJson(record): AppJson<Record>,
) -> AppResult<Json<Value>> {
    validate_identifier(&table)?;
    state.store.require_table(&table).await?;

    if state.store.update_row(&table, id, &record).await? == 0 {
        return Err(AppError::NotFound(format!("Row {} not found in \"{}\".", id, table)));
    }
    Ok(Json(json!({ "message": "Data updated successfully." })))
}

/// DELETE /api/data/:table/:id - 删除数据
pub async fn delete_row(
    State(state): State<Arc<AppState>>,
    AppPath((table, id)): AppPath<(String, i64)>,
) -> AppResult<Json<Value>> {
    validate_identifier(&table)?;
    state.store.require_table(&table).await?;

    if state.store.delete_row(&table, id).await? == 0 {
        return Err(AppError::NotFound(format!("Row {} not found in \"{}\".", id, table)));
    }
    Ok(Json(json!({ "message": "Data deleted successfully." })))
}
