use serde::{Deserialize, Serialize};

/// Column definition used by table creation and `addColumns` / 列定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(rename = "isSearchable", default, skip_serializing_if = "Option::is_none")]
    pub is_searchable: Option<bool>,
}

impl ColumnSpec {
    /// Searchable unless explicitly disabled / 未显式关闭时默认可搜索
    pub fn searchable(&self) -> bool {
        self.is_searchable != Some(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTableRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<ColumnSpec>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameColumn {
    #[serde(rename = "oldName")]
    pub old_name: String,
    #[serde(rename = "newName")]
    pub new_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTableRequest {
    #[serde(rename = "newName", default)]
    pub new_name: Option<String>,
    #[serde(rename = "renameColumns", default)]
    pub rename_columns: Vec<RenameColumn>,
    #[serde(rename = "dropColumns", default)]
    pub drop_columns: Vec<String>,
    #[serde(rename = "addColumns", default)]
    pub add_columns: Vec<ColumnSpec>,
}

/// Per-column outcome of a drop request / 删除列的逐列结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropColumnResult {
    pub column: String,
    pub dropped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateTableResponse {
    pub message: String,
    #[serde(rename = "newName")]
    pub new_name: String,
    #[serde(rename = "droppedColumns")]
    pub dropped_columns: Vec<DropColumnResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFlag {
    pub column_name: String,
    pub is_searchable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSearchMetaRequest {
    pub columns: Vec<SearchFlag>,
}

/// Live column definition from `pragma_table_info` / 列结构
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub column_type: String,
    pub notnull: i64,
    pub dflt_value: Option<String>,
    pub pk: i64,
}

/// Column definition merged with its searchable flag / 合并搜索标记后的列结构
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSchema {
    #[serde(flatten)]
    pub column: ColumnInfo,
    #[serde(rename = "isSearchable")]
    pub is_searchable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_spec_defaults_to_searchable() {
        let spec: ColumnSpec = serde_json::from_str(r#"{"name": "title", "type": "TEXT"}"#).unwrap();
        assert!(spec.searchable());

        let spec: ColumnSpec =
            serde_json::from_str(r#"{"name": "secret", "type": "TEXT", "isSearchable": false}"#).unwrap();
        assert!(!spec.searchable());
    }

    #[test]
    fn test_update_request_all_optional() {
        let req: UpdateTableRequest = serde_json::from_str("{}").unwrap();
        assert!(req.new_name.is_none());
        assert!(req.rename_columns.is_empty());
        assert!(req.drop_columns.is_empty());
        assert!(req.add_columns.is_empty());
    }

    #[test]
    fn test_column_schema_serializes_flat() {
        let schema = ColumnSchema {
            column: ColumnInfo {
                cid: 0,
                name: "id".into(),
                column_type: "INTEGER".into(),
                notnull: 0,
                dflt_value: None,
                pk: 1,
            },
            is_searchable: true,
        };
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["name"], "id");
        assert_eq!(value["type"], "INTEGER");
        assert_eq!(value["isSearchable"], true);
    }
}
