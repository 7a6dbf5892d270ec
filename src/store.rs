//! Relational store access / 关系存储访问
//!
//! Dynamic tables: names come from user input or from the catalog, rows are decoded
//! into ordered JSON objects by their SQLite storage class, values are always bound.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::error::{AppError, AppResult};
use crate::metadata::METADATA_TABLE;
use crate::models::{ColumnInfo, ColumnSpec};
use crate::utils::{quote_identifier, quoted, validate_column_type};

/// One row as an ordered column → value object / 一行数据
pub type Record = Map<String, Value>;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

#[derive(Clone)]
pub struct Store {
    db: SqlitePool,
}

impl Store {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// User tables in creation order / 用户表列表
    pub async fn list_tables(&self) -> AppResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' AND name != ?",
        )
        .bind(METADATA_TABLE)
        .fetch_all(&self.db)
        .await?;
        Ok(names)
    }

    pub async fn table_exists(&self, table: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE",
        )
        .bind(table)
        .fetch_one(&self.db)
        .await?;
        Ok(count > 0)
    }

    /// 不存在时返回 404
    pub async fn require_table(&self, table: &str) -> AppResult<()> {
        if self.table_exists(table).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Table \"{}\" not found.", table)))
        }
    }

    /// Live column definitions; empty when the table does not exist / 列结构
    pub async fn columns(&self, table: &str) -> AppResult<Vec<ColumnInfo>> {
        let columns = sqlx::query_as::<_, ColumnInfo>(
            r#"SELECT cid, name, type, "notnull", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid"#,
        )
        .bind(table)
        .fetch_all(&self.db)
        .await?;
        Ok(columns)
    }

    /// All rows of a user-named table / 查询全部数据
    pub async fn fetch_rows(&self, table: &str) -> AppResult<Vec<Record>> {
        let sql = format!("SELECT * FROM {}", quoted(table)?);
        self.select_records(&sql).await
    }

    /// All rows of a table whose name came from the catalog / 按目录中的表名扫描
    pub async fn scan_table(&self, table: &str) -> AppResult<Vec<Record>> {
        let sql = format!("SELECT * FROM {}", quote_identifier(table));
        self.select_records(&sql).await
    }

    async fn select_records(&self, sql: &str) -> AppResult<Vec<Record>> {
        let rows = sqlx::query(sql).fetch_all(&self.db).await?;
        let records = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Insert one row, returning its rowid / 插入数据
    pub async fn insert_row(&self, table: &str, record: &Record) -> AppResult<i64> {
        let table = quoted(table)?;
        let sql = if record.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table)
        } else {
            let columns = record
                .keys()
                .map(|k| quoted(k))
                .collect::<AppResult<Vec<_>>>()?
                .join(", ");
            let placeholders = vec!["?"; record.len()].join(", ");
            format!("INSERT INTO {} ({}) VALUES ({})", table, columns, placeholders)
        };

        let mut query = sqlx::query(&sql);
        for value in record.values() {
            query = bind_value(query, value);
        }
        let result = query.execute(&self.db).await?;
        Ok(result.last_insert_rowid())
    }

    /// 更新数据
    pub async fn update_row(&self, table: &str, id: i64, record: &Record) -> AppResult<u64> {
        if record.is_empty() {
            return Err(AppError::BadRequest("No columns to update".to_string()));
        }
        let set_clause = record
            .keys()
            .map(|k| quoted(k).map(|c| format!("{} = ?", c)))
            .collect::<AppResult<Vec<_>>>()?
            .join(", ");
        let sql = format!("UPDATE {} SET {} WHERE id = ?", quoted(table)?, set_clause);

        let mut query = sqlx::query(&sql);
        for value in record.values() {
            query = bind_value(query, value);
        }
        let result = query.bind(id).execute(&self.db).await?;
        Ok(result.rows_affected())
    }

    /// 删除数据
    pub async fn delete_row(&self, table: &str, id: i64) -> AppResult<u64> {
        let sql = format!("DELETE FROM {} WHERE id = ?", quoted(table)?);
        let result = sqlx::query(&sql).bind(id).execute(&self.db).await?;
        Ok(result.rows_affected())
    }

    /// 创建表
    pub async fn create_table(&self, table: &str, columns: &[ColumnSpec]) -> AppResult<()> {
        let definitions = columns
            .iter()
            .map(column_definition)
            .collect::<AppResult<Vec<_>>>()?
            .join(", ");
        let sql = format!("CREATE TABLE {} ({})", quoted(table)?, definitions);
        self.execute(&sql).await
    }

    pub async fn drop_table(&self, table: &str) -> AppResult<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", quoted(table)?);
        self.execute(&sql).await
    }

    pub async fn rename_table(&self, old: &str, new: &str) -> AppResult<()> {
        let sql = format!("ALTER TABLE {} RENAME TO {}", quoted(old)?, quoted(new)?);
        self.execute(&sql).await
    }

    pub async fn rename_column(&self, table: &str, old: &str, new: &str) -> AppResult<()> {
        let sql = format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quoted(table)?,
            quoted(old)?,
            quoted(new)?
        );
        self.execute(&sql).await
    }

    pub async fn add_column(&self, table: &str, column: &ColumnSpec) -> AppResult<()> {
        let sql = format!("ALTER TABLE {} ADD COLUMN {}", quoted(table)?, column_definition(column)?);
        self.execute(&sql).await
    }

    pub async fn drop_column(&self, table: &str, column: &str) -> AppResult<()> {
        let sql = format!("ALTER TABLE {} DROP COLUMN {}", quoted(table)?, quoted(column)?);
        self.execute(&sql).await
    }

    async fn execute(&self, sql: &str) -> AppResult<()> {
        tracing::debug!("Executing DDL: {}", sql);
        sqlx::query(sql).execute(&self.db).await?;
        Ok(())
    }
}

fn column_definition(column: &ColumnSpec) -> AppResult<String> {
    Ok(format!("{} {}", quoted(&column.name)?, validate_column_type(&column.column_type)?))
}

/// Bind a JSON value with its native SQLite type / 按类型绑定参数
fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

/// Decode a row by storage class / 按存储类型解码
fn decode_row(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => Value::from(row.try_get_unchecked::<i64, _>(index)?),
                "REAL" => Value::from(row.try_get_unchecked::<f64, _>(index)?),
                "BLOB" => Value::String(STANDARD.encode(row.try_get_unchecked::<Vec<u8>, _>(index)?)),
                _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
            }
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use serde_json::json;

    fn spec(name: &str, column_type: &str) -> ColumnSpec {
        ColumnSpec { name: name.to_string(), column_type: column_type.to_string(), is_searchable: None }
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    async fn orders_store() -> Store {
        let store = Store::new(connect_memory().await);
        store
            .create_table("orders", &[spec("id", "INTEGER PRIMARY KEY"), spec("status", "TEXT"), spec("total", "REAL")])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_list_tables_hides_internal_tables() {
        let store = orders_store().await;
        store.create_table("users", &[spec("name", "TEXT")]).await.unwrap();
        sqlx::query("CREATE TABLE _search_metadata (x)").execute(store.pool()).await.unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT)").execute(store.pool()).await.unwrap();

        let tables = store.list_tables().await.unwrap();
        assert_eq!(tables, vec!["orders", "users", "t"]);
    }

    #[tokio::test]
    async fn test_insert_and_fetch_keeps_column_order_and_types() {
        let store = orders_store().await;
        let id = store
            .insert_row("orders", &record(json!({"status": "shipped", "total": 12.5})))
            .await
            .unwrap();
        assert_eq!(id, 1);
        store.insert_row("orders", &record(json!({"status": null}))).await.unwrap();

        let rows = store.fetch_rows("orders").await.unwrap();
        assert_eq!(rows.len(), 2);
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["id", "status", "total"]);
        assert_eq!(rows[0]["id"], json!(1));
        assert_eq!(rows[0]["status"], json!("shipped"));
        assert_eq!(rows[0]["total"], json!(12.5));
        assert_eq!(rows[1]["status"], Value::Null);
    }

    #[tokio::test]
    async fn test_insert_default_values() {
        let store = orders_store().await;
        let id = store.insert_row("orders", &Record::new()).await.unwrap();
        assert_eq!(id, 1);
        assert_eq!(store.fetch_rows("orders").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blob_decodes_as_base64() {
        let store = Store::new(connect_memory().await);
        sqlx::query("CREATE TABLE files (data BLOB)").execute(store.pool()).await.unwrap();
        sqlx::query("INSERT INTO files (data) VALUES (x'010203')").execute(store.pool()).await.unwrap();

        let rows = store.fetch_rows("files").await.unwrap();
        assert_eq!(rows[0]["data"], json!("AQID"));
    }

    #[tokio::test]
    async fn test_update_and_delete_row() {
        let store = orders_store().await;
        let id = store.insert_row("orders", &record(json!({"status": "new"}))).await.unwrap();

        let updated = store.update_row("orders", id, &record(json!({"status": "paid"}))).await.unwrap();
        assert_eq!(updated, 1);
        assert_eq!(store.fetch_rows("orders").await.unwrap()[0]["status"], json!("paid"));

        assert!(matches!(
            store.update_row("orders", id, &Record::new()).await,
            Err(AppError::BadRequest(_))
        ));

        assert_eq!(store.delete_row("orders", id).await.unwrap(), 1);
        assert!(store.fetch_rows("orders").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identifiers_are_validated() {
        let store = orders_store().await;
        assert!(matches!(
            store.fetch_rows("orders; DROP TABLE orders").await,
            Err(AppError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            store.insert_row("orders", &record(json!({"status = 1 --": "x"}))).await,
            Err(AppError::InvalidIdentifier(_))
        ));
        assert!(store.table_exists("orders").await.unwrap());
    }

    #[tokio::test]
    async fn test_ddl_operations() {
        let store = orders_store().await;

        store.rename_table("orders", "purchases").await.unwrap();
        assert!(!store.table_exists("orders").await.unwrap());
        assert!(store.table_exists("purchases").await.unwrap());

        store.rename_column("purchases", "status", "state").await.unwrap();
        store.add_column("purchases", &spec("note", "TEXT DEFAULT 0")).await.unwrap();
        store.drop_column("purchases", "total").await.unwrap();

        let names: Vec<String> = store.columns("purchases").await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["id", "state", "note"]);

        assert!(store.drop_column("purchases", "id").await.is_err());

        store.drop_table("purchases").await.unwrap();
        assert!(store.columns("purchases").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_columns_info() {
        let store = orders_store().await;
        let columns = store.columns("orders").await.unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].name, "id");
        assert_eq!(columns[0].column_type, "INTEGER");
        assert_eq!(columns[0].pk, 1);
        assert_eq!(columns[1].pk, 0);
    }
}
