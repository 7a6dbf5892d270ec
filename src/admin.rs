//! Table & metadata administration / 表与元数据管理
//!
//! Every schema mutation updates `_search_metadata` right after the relation changes,
//! so metadata never names a table or column that no longer exists.

use std::collections::HashSet;

use crate::error::{AppError, AppResult};
use crate::metadata::MetadataStore;
use crate::models::{
    ColumnSchema, ColumnSpec, DropColumnResult, SearchFlag, UpdateTableRequest, UpdateTableResponse,
};
use crate::store::Store;
use crate::utils::validate_identifier;

#[derive(Clone)]
pub struct TableAdmin {
    store: Store,
    metadata: MetadataStore,
}

impl TableAdmin {
    pub fn new(store: Store, metadata: MetadataStore) -> Self {
        Self { store, metadata }
    }

    pub async fn list_tables(&self) -> AppResult<Vec<String>> {
        self.store.list_tables().await
    }

    /// Create a table and record one flag per column / 创建表并写入列标记
    pub async fn create_table(&self, name: &str, columns: &[ColumnSpec]) -> AppResult<()> {
        validate_identifier(name)?;
        if columns.is_empty() {
            return Err(AppError::BadRequest("Table name and columns are required".to_string()));
        }

        // SQLite table names are case-insensitive / 表名不区分大小写
        if self.store.table_exists(name).await? {
            return Err(AppError::Conflict(format!("Table \"{}\" already exists.", name)));
        }

        self.store.create_table(name, columns).await?;
        for column in columns {
            self.metadata.set_flag(name, &column.name, column.searchable()).await?;
        }

        tracing::info!("Table {} created with {} columns", name, columns.len());
        Ok(())
    }

    /// 删除表及其元数据
    pub async fn delete_table(&self, name: &str) -> AppResult<()> {
        validate_identifier(name)?;
        self.store.require_table(name).await?;

        self.store.drop_table(name).await?;
        let removed = self.metadata.delete_table(name).await?;

        tracing::info!("Table {} deleted ({} metadata entries removed)", name, removed);
        Ok(())
    }

    /// Apply rename → rename columns → drop columns → add columns / 依次执行表结构变更
    ///
    /// A failing column drop is reported in the response and does not stop the
    /// remaining steps. Any other failure aborts the request.
    pub async fn update_table(&self, name: &str, request: &UpdateTableRequest) -> AppResult<UpdateTableResponse> {
        validate_identifier(name)?;
        self.store.require_table(name).await?;

        let mut current = name.to_string();

        if let Some(new_name) = request.new_name.as_deref().filter(|n| *n != name) {
            validate_identifier(new_name)?;
            self.store.rename_table(&current, new_name).await?;
            self.metadata.rename_table(&current, new_name).await?;
            tracing::info!("Table {} renamed to {}", current, new_name);
            current = new_name.to_string();
        }

        for rename in &request.rename_columns {
            validate_identifier(&rename.new_name)?;
            self.store.rename_column(&current, &rename.old_name, &rename.new_name).await?;
            self.metadata.rename_column(&current, &rename.old_name, &rename.new_name).await?;
        }

        let mut dropped_columns = Vec::with_capacity(request.drop_columns.len());
        for column in &request.drop_columns {
            dropped_columns.push(self.drop_column(&current, column).await);
        }

        for column in &request.add_columns {
            self.store.add_column(&current, column).await?;
            self.metadata.set_flag(&current, &column.name, column.searchable()).await?;
        }

        Ok(UpdateTableResponse {
            message: format!("Table \"{}\" updated successfully.", current),
            new_name: current,
            dropped_columns,
        })
    }

    async fn drop_column(&self, table: &str, column: &str) -> DropColumnResult {
        let outcome = async {
            self.store.drop_column(table, column).await?;
            self.metadata.delete_column(table, column).await?;
            Ok::<_, AppError>(())
        }
        .await;

        match outcome {
            Ok(()) => DropColumnResult { column: column.to_string(), dropped: true, error: None },
            Err(e) => {
                tracing::error!("Failed to drop column {} from {}: {}", column, table, e);
                DropColumnResult { column: column.to_string(), dropped: false, error: Some(e.to_string()) }
            }
        }
    }

    /// Upsert searchable flags for existing columns / 更新列的可搜索标记
    pub async fn update_search_flags(&self, table: &str, flags: &[SearchFlag]) -> AppResult<()> {
        validate_identifier(table)?;
        self.store.require_table(table).await?;

        let known: HashSet<String> = self.store.columns(table).await?.into_iter().map(|c| c.name).collect();
        if let Some(unknown) = flags.iter().find(|f| !known.contains(&f.column_name)) {
            return Err(AppError::BadRequest(format!(
                "Column \"{}\" does not exist on table \"{}\"",
                unknown.column_name, table
            )));
        }

        for flag in flags {
            self.metadata.set_flag(table, &flag.column_name, flag.is_searchable).await?;
        }
        tracing::debug!("Updated {} search flags on {}", flags.len(), table);
        Ok(())
    }

    /// Live columns merged with their flags (default searchable) / 列结构合并标记
    pub async fn get_schema(&self, table: &str) -> AppResult<Vec<ColumnSchema>> {
        validate_identifier(table)?;
        let columns = self.store.columns(table).await?;
        if columns.is_empty() {
            return Err(AppError::NotFound(format!("Table \"{}\" not found.", table)));
        }

        let flags = self.metadata.flags_for_table(table).await?;
        Ok(columns
            .into_iter()
            .map(|column| {
                let is_searchable = flags.get(&column.name).copied().unwrap_or(true);
                ColumnSchema { column, is_searchable }
            })
            .collect())
    }
}
