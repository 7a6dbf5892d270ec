//! Search metadata side-table / 搜索元数据表
//!
//! One row per (table, column) recording whether that column contributes to the
//! search index. Columns without a row are searchable. Names compare case-insensitively,
//! like SQLite identifiers. The table is created by the first write; reads against a
//! database that never had a write see no entries.

use sqlx::SqlitePool;
use std::collections::HashMap;

pub const METADATA_TABLE: &str = "_search_metadata";

#[derive(Clone)]
pub struct MetadataStore {
    db: SqlitePool,
}

impl MetadataStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create the side-table if missing / 不存在时创建元数据表
    pub async fn ensure_table(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _search_metadata (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                table_name TEXT NOT NULL COLLATE NOCASE,
                column_name TEXT NOT NULL COLLATE NOCASE,
                is_searchable INTEGER NOT NULL DEFAULT 1,
                UNIQUE(table_name, column_name)
            )
            "#,
        )
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn table_exists(&self) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(METADATA_TABLE)
        .fetch_one(&self.db)
        .await?;
        Ok(count > 0)
    }

    /// Upsert one flag / 写入单个标记
    pub async fn set_flag(&self, table: &str, column: &str, searchable: bool) -> Result<(), sqlx::Error> {
        self.ensure_table().await?;
        sqlx::query(
            "INSERT INTO _search_metadata (table_name, column_name, is_searchable) VALUES (?, ?, ?)
             ON CONFLICT(table_name, column_name) DO UPDATE SET is_searchable = excluded.is_searchable",
        )
        .bind(table)
        .bind(column)
        .bind(searchable)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Flags recorded for a table, keyed by column / 获取表的全部标记
    pub async fn flags_for_table(&self, table: &str) -> Result<HashMap<String, bool>, sqlx::Error> {
        if !self.table_exists().await? {
            return Ok(HashMap::new());
        }
        let rows: Vec<(String, bool)> = sqlx::query_as(
            "SELECT column_name, is_searchable FROM _search_metadata WHERE table_name = ?",
        )
        .bind(table)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Move every entry of `old` to `new` / 表重命名时同步
    pub async fn rename_table(&self, old: &str, new: &str) -> Result<u64, sqlx::Error> {
        self.ensure_table().await?;
        let result = sqlx::query("UPDATE _search_metadata SET table_name = ? WHERE table_name = ?")
            .bind(new)
            .bind(old)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// 列重命名时同步
    pub async fn rename_column(&self, table: &str, old: &str, new: &str) -> Result<u64, sqlx::Error> {
        self.ensure_table().await?;
        let result = sqlx::query(
            "UPDATE _search_metadata SET column_name = ? WHERE table_name = ? AND column_name = ?",
        )
        .bind(new)
        .bind(table)
        .bind(old)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_column(&self, table: &str, column: &str) -> Result<u64, sqlx::Error> {
        self.ensure_table().await?;
        let result = sqlx::query("DELETE FROM _search_metadata WHERE table_name = ? AND column_name = ?")
            .bind(table)
            .bind(column)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_table(&self, table: &str) -> Result<u64, sqlx::Error> {
        self.ensure_table().await?;
        let result = sqlx::query("DELETE FROM _search_metadata WHERE table_name = ?")
            .bind(table)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
