use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::extract::{AppJson, AppPath};
use crate::error::{AppError, AppResult};
use crate::models::{ColumnSchema, CreateTableRequest, UpdateSearchMetaRequest, UpdateTableRequest, UpdateTableResponse};
use crate::state::AppState;

/// GET /api/tables - 表列表
pub async fn list_tables(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.admin.list_tables().await?))
}

/// POST /api/tables - 创建表
pub async fn create_table(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateTableRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (name, columns) = match (req.name, req.columns) {
        (Some(name), Some(columns)) if !name.is_empty() && !columns.is_empty() => (name, columns),
        _ => return Err(AppError::BadRequest("Table name and columns are required".to_string())),
    };

    state.admin.create_table(&name, &columns).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": format!("Table \"{}\" created successfully.", name) })),
    ))
}

/// GET /api/tables/:name - 表结构
pub async fn get_schema(
    State(state): State<Arc<AppState>>,
    AppPath(name): AppPath<String>,
) -> AppResult<Json<Vec<ColumnSchema>>> {
    Ok(Json(state.admin.get_schema(&name).await?))
}

/// DELETE /api/tables/:name - 删除表
pub async fn delete_table(
    State(state): State<Arc<AppState>>,
    AppPath(name): AppPath<String>,
) -> AppResult<Json<Value>> {
    state.admin.delete_table(&name).await?;
    Ok(Json(json!({ "message": format!("Table \"{}\" deleted successfully.", name) })))
}

/// PATCH /api/tables/:name - 修改表结构
pub async fn update_table(
    State(state): State<Arc<AppState>>,
    AppPath(name): AppPath<String>,
    AppJson(req): AppJson<UpdateTableRequest>,
) -> AppResult<Json<UpdateTableResponse>> {
    Ok(Json(state.admin.update_table(&name, &req).await?))
}

/// PUT /api/tables/:name/search-meta - 更新可搜索标记
pub async fn update_search_meta(
    State(state): State<Arc<AppState>>,
    AppPath(name): AppPath<String>,
    AppJson(req): AppJson<UpdateSearchMetaRequest>,
) -> AppResult<Json<Value>> {
    state.admin.update_search_flags(&name, &req.columns).await?;
    Ok(Json(json!({ "message": "Search metadata updated successfully." })))
}
