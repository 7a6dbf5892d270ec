//! Document collector / 文档收集
//!
//! Walks the live database and emits one table document per table followed by one
//! data document per row with searchable content.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use super::schema::SearchDocument;
use crate::error::AppResult;
use crate::metadata::MetadataStore;
use crate::store::{Record, Store};

/// Read access the collector needs from the database / 收集器所需的数据源接口
#[async_trait]
pub trait TableSource: Send + Sync {
    /// User tables in catalog order / 用户表列表
    async fn list_tables(&self) -> AppResult<Vec<String>>;

    async fn table_exists(&self, table: &str) -> AppResult<bool>;

    /// Every row of a catalog table / 扫描整表
    async fn scan_table(&self, table: &str) -> AppResult<Vec<Record>>;

    /// Searchable flags keyed by column / 列的可搜索标记
    async fn searchable_flags(&self, table: &str) -> AppResult<HashMap<String, bool>>;
}

/// The live store plus its metadata side-table / 实时数据库
pub struct LiveTables<'a> {
    pub store: &'a Store,
    pub metadata: &'a MetadataStore,
}

#[async_trait]
impl TableSource for LiveTables<'_> {
    async fn list_tables(&self) -> AppResult<Vec<String>> {
        self.store.list_tables().await
    }

    async fn table_exists(&self, table: &str) -> AppResult<bool> {
        self.store.table_exists(table).await
    }

    async fn scan_table(&self, table: &str) -> AppResult<Vec<Record>> {
        self.store.scan_table(table).await
    }

    async fn searchable_flags(&self, table: &str) -> AppResult<HashMap<String, bool>> {
        Ok(self.metadata.flags_for_table(table).await?)
    }
}

/// Rows of one table plus its searchable flags / 单表快照
struct TableSnapshot {
    name: String,
    rows: Vec<Record>,
    flags: HashMap<String, bool>,
}

/// Collect every document representing the current database state / 收集当前数据库的全部文档
pub async fn collect_documents(store: &Store, metadata: &MetadataStore) -> AppResult<Vec<SearchDocument>> {
    collect_from(&LiveTables { store, metadata }).await
}

/// A table that disappears between listing and scanning is skipped as a whole (its
/// table document included); any other source error fails the collection.
pub async fn collect_from(source: &dyn TableSource) -> AppResult<Vec<SearchDocument>> {
    let table_names = source.list_tables().await?;

    let mut snapshots = Vec::with_capacity(table_names.len());
    for name in table_names {
        let rows = match source.scan_table(&name).await {
            Ok(rows) => rows,
            Err(e) => {
                if source.table_exists(&name).await? {
                    return Err(e);
                }
                tracing::warn!("Table {} disappeared during collection, skipping: {}", name, e);
                continue;
            }
        };
        let flags = source.searchable_flags(&name).await?;
        snapshots.push(TableSnapshot { name, rows, flags });
    }

    Ok(build_documents(snapshots))
}

fn build_documents(snapshots: Vec<TableSnapshot>) -> Vec<SearchDocument> {
    let mut documents: Vec<SearchDocument> = snapshots
        .iter()
        .map(|snapshot| SearchDocument::table(&snapshot.name))
        .collect();

    // Fallback ids for rows without one, scoped to this pass / 无 id 行的本次临时编号
    let mut fallback_id: i64 = 1;

    for snapshot in snapshots {
        for row in snapshot.rows {
            let text = row_text(&row, &snapshot.flags);
            if text.trim().is_empty() {
                continue;
            }
            let data_id = row.get("id").and_then(Value::as_i64);
            let doc_key = data_id.unwrap_or_else(|| {
                let key = fallback_id;
                fallback_id += 1;
                key
            });
            documents.push(SearchDocument::data(&snapshot.name, doc_key, data_id, text, row));
        }
    }

    documents
}

/// `column: value` pairs of searchable, non-empty columns in column order / 行文本
pub fn row_text(row: &Record, flags: &HashMap<String, bool>) -> String {
    row.iter()
        .filter(|(column, _)| flags.get(*column).copied().unwrap_or(true))
        .filter_map(|(column, value)| value_text(value).map(|v| format!("{}: {}", column, v)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use crate::models::ColumnSpec;
    use crate::error::AppError;
    use crate::search::schema::DocumentKind;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn spec(name: &str, column_type: &str) -> ColumnSpec {
        ColumnSpec { name: name.to_string(), column_type: column_type.to_string(), is_searchable: None }
    }

    #[test]
    fn test_row_text_respects_flags_and_order() {
        let row = record(json!({"id": 7, "name": "Ada", "secret": "x", "note": null, "blank": "  "}));
        let flags = HashMap::from([("secret".to_string(), false), ("name".to_string(), true)]);
        assert_eq!(row_text(&row, &flags), "id: 7 name: Ada");
    }

    #[test]
    fn test_build_documents_skips_empty_rows_and_assigns_fallback_ids() {
        let snapshots = vec![
            TableSnapshot { name: "empty".into(), rows: vec![], flags: HashMap::new() },
            TableSnapshot {
                name: "logs".into(),
                rows: vec![
                    record(json!({"message": "boot"})),
                    record(json!({"message": null})),
                    record(json!({"message": "halt"})),
                ],
                flags: HashMap::new(),
            },
        ];

        let docs = build_documents(snapshots);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["table-empty", "table-logs", "data-logs-1", "data-logs-2"]);
        assert_eq!(docs[2].fields.data_id, None);
        assert_eq!(docs[3].text, "message: halt");
    }

    #[tokio::test]
    async fn test_collect_documents() {
        let pool = connect_memory().await;
        let store = Store::new(pool.clone());
        let metadata = MetadataStore::new(pool);

        store.create_table("users", &[spec("id", "INTEGER PRIMARY KEY"), spec("name", "TEXT")]).await.unwrap();
        store
            .create_table("orders", &[spec("id", "INTEGER PRIMARY KEY"), spec("status", "TEXT"), spec("card", "TEXT")])
            .await
            .unwrap();
        metadata.set_flag("orders", "card", false).await.unwrap();
        store
            .insert_row("orders", &record(json!({"id": 42, "status": "shipped", "card": "4111"})))
            .await
            .unwrap();

        let docs = collect_documents(&store, &metadata).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["table-users", "table-orders", "data-orders-42"]);

        let data = &docs[2];
        assert_eq!(data.fields.kind, DocumentKind::Data);
        assert_eq!(data.fields.table_name.as_deref(), Some("orders"));
        assert_eq!(data.fields.data_id, Some(42));
        assert_eq!(data.text, "id: 42 status: shipped");
        // the raw row still carries every column / 原始行保留全部列
        assert_eq!(data.fields.raw.as_ref().unwrap()["card"], json!("4111"));
    }

    /// In-memory source whose catalog can drift from what scans see / 可模拟表消失的数据源
    struct FakeTables {
        listed: Vec<&'static str>,
        existing: Vec<&'static str>,
        failing: Vec<&'static str>,
        rows: HashMap<&'static str, Vec<Record>>,
    }

    #[async_trait]
    impl TableSource for FakeTables {
        async fn list_tables(&self) -> AppResult<Vec<String>> {
            Ok(self.listed.iter().map(|t| t.to_string()).collect())
        }

        async fn table_exists(&self, table: &str) -> AppResult<bool> {
            Ok(self.existing.iter().any(|t| *t == table))
        }

        async fn scan_table(&self, table: &str) -> AppResult<Vec<Record>> {
            if self.failing.iter().any(|t| *t == table) || !self.existing.iter().any(|t| *t == table) {
                return Err(AppError::Internal(anyhow::anyhow!("no such table: {}", table)));
            }
            Ok(self.rows.get(table).cloned().unwrap_or_default())
        }

        async fn searchable_flags(&self, _table: &str) -> AppResult<HashMap<String, bool>> {
            Ok(HashMap::new())
        }
    }

    #[tokio::test]
    async fn test_vanished_table_is_skipped() {
        let source = FakeTables {
            listed: vec!["gone", "orders"],
            existing: vec!["orders"],
            failing: vec![],
            rows: HashMap::from([("orders", vec![record(json!({"id": 1, "status": "open"}))])]),
        };

        let docs = collect_from(&source).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["table-orders", "data-orders-1"]);
    }

    #[tokio::test]
    async fn test_scan_error_on_existing_table_fails_collection() {
        let source = FakeTables {
            listed: vec!["orders", "users"],
            existing: vec!["orders", "users"],
            failing: vec!["users"],
            rows: HashMap::new(),
        };

        let err = collect_from(&source).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.to_string().contains("users"));
    }

    #[tokio::test]
    async fn test_row_without_searchable_columns_is_not_indexed() {
        let pool = connect_memory().await;
        let store = Store::new(pool.clone());
        let metadata = MetadataStore::new(pool);

        store.create_table("secrets", &[spec("token", "TEXT")]).await.unwrap();
        metadata.set_flag("secrets", "token", false).await.unwrap();
        store.insert_row("secrets", &record(json!({"token": "abc"}))).await.unwrap();

        let docs = collect_documents(&store, &metadata).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "table-secrets");
    }
}
