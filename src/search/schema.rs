//! Search index schema definition / 搜索索引的 Schema 定义

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SearchConfig;

pub const TABLES_CATEGORY: &str = "Tables";
pub const DATA_CATEGORY: &str = "Relevant data";

/// Document type / 文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Table,
    Data,
}

/// Fields returned with every hit (not indexed) / 随结果返回的存储字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFields {
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "tableName", skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(rename = "dataId", skip_serializing_if = "Option::is_none")]
    pub data_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Map<String, Value>>,
    pub category: String,
}

/// Ephemeral indexed unit: one table or one row / 索引文档（表或行）
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDocument {
    /// `table-<name>` or `data-<table>-<rowId>` / 文档ID
    pub id: String,
    /// Indexed text field / 索引文本
    pub text: String,
    pub fields: StoredFields,
}

impl SearchDocument {
    /// Table document; its text is the table name / 表文档
    pub fn table(name: &str) -> Self {
        Self {
            id: format!("table-{}", name),
            text: name.to_string(),
            fields: StoredFields {
                kind: DocumentKind::Table,
                name: Some(name.to_string()),
                table_name: None,
                data_id: None,
                raw: None,
                category: TABLES_CATEGORY.to_string(),
            },
        }
    }

    /// Data document / 数据文档
    pub fn data(
        table: &str,
        doc_key: i64,
        data_id: Option<i64>,
        text: String,
        raw: Map<String, Value>,
    ) -> Self {
        Self {
            id: format!("data-{}-{}", table, doc_key),
            text,
            fields: StoredFields {
                kind: DocumentKind::Data,
                name: None,
                table_name: Some(table.to_string()),
                data_id,
                raw: Some(raw),
                category: DATA_CATEGORY.to_string(),
            },
        }
    }

    /// Indexed `name` field / 索引的 name 字段
    pub fn name(&self) -> Option<&str> {
        self.fields.name.as_deref()
    }
}

/// Search hit / 搜索结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    /// Relevance score / 相关性分数
    pub score: f64,
    /// Indexed terms the query matched / 命中的索引词
    pub terms: Vec<String>,
    #[serde(flatten)]
    pub fields: StoredFields,
}

/// Auto-suggest entry / 搜索建议
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub suggestion: String,
    pub terms: Vec<String>,
    pub score: f64,
}

/// How query terms are combined / 查询词组合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// Any term may match / 任一匹配
    Or,
    /// Every term must match / 全部匹配
    And,
}

/// Which query terms get prefix matching / 前缀匹配范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixMode {
    None,
    All,
    /// Only the last (possibly partial) term / 仅最后一个词
    Trailing,
}

impl PrefixMode {
    pub fn applies(self, index: usize, total: usize) -> bool {
        match self {
            PrefixMode::None => false,
            PrefixMode::All => true,
            PrefixMode::Trailing => index + 1 == total,
        }
    }
}

/// Search query options / 搜索查询选项
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Fuzzy tolerance as a fraction of term length (0 disables) / 模糊容差
    pub fuzzy: f64,
    /// Upper bound for the edit distance / 最大编辑距离
    pub max_fuzzy: usize,
    pub prefix: PrefixMode,
    /// Boost of `name` relative to `text` / name 字段权重
    pub name_boost: f64,
    pub combine: Combine,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

impl SearchOptions {
    /// Options for a global search: OR, prefix on every term / 全局搜索选项
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            fuzzy: config.fuzzy,
            max_fuzzy: config.max_fuzzy,
            prefix: if config.prefix { PrefixMode::All } else { PrefixMode::None },
            name_boost: f64::from(config.name_boost),
            combine: Combine::Or,
        }
    }

    /// Options for auto-suggest: AND, prefix on the trailing term / 自动建议选项
    pub fn suggest_from_config(config: &SearchConfig) -> Self {
        Self {
            prefix: if config.prefix { PrefixMode::Trailing } else { PrefixMode::None },
            combine: Combine::And,
            ..Self::from_config(config)
        }
    }

    /// Edit distance allowed for a term of `len` chars / 允许的编辑距离
    pub fn max_distance(&self, len: usize) -> usize {
        if self.fuzzy <= 0.0 {
            return 0;
        }
        ((len as f64 * self.fuzzy).round() as usize).min(self.max_fuzzy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_ids() {
        assert_eq!(SearchDocument::table("users").id, "table-users");
        let doc = SearchDocument::data("orders", 42, Some(42), "status: shipped".into(), Map::new());
        assert_eq!(doc.id, "data-orders-42");
        assert_eq!(doc.fields.category, "Relevant data");
        assert!(doc.name().is_none());
    }

    #[test]
    fn test_hit_serialization() {
        let hit = SearchHit {
            id: "table-users".into(),
            score: 1.5,
            terms: vec!["users".into()],
            fields: SearchDocument::table("users").fields,
        };
        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "table-users",
                "score": 1.5,
                "terms": ["users"],
                "type": "table",
                "name": "users",
                "category": "Tables"
            })
        );
    }

    #[test]
    fn test_max_distance() {
        let options = SearchOptions::default();
        assert_eq!(options.max_distance(2), 0);
        assert_eq!(options.max_distance(5), 1);
        assert_eq!(options.max_distance(8), 2);
        assert_eq!(options.max_distance(100), 6);

        let exact = SearchOptions { fuzzy: 0.0, ..SearchOptions::default() };
        assert_eq!(exact.max_distance(10), 0);
    }

    #[test]
    fn test_prefix_mode() {
        assert!(PrefixMode::All.applies(0, 3));
        assert!(!PrefixMode::Trailing.applies(0, 3));
        assert!(PrefixMode::Trailing.applies(2, 3));
        assert!(!PrefixMode::None.applies(2, 3));
    }

    #[test]
    fn test_suggest_options() {
        let options = SearchOptions::suggest_from_config(&SearchConfig::default());
        assert_eq!(options.combine, Combine::And);
        assert_eq!(options.prefix, PrefixMode::Trailing);
        assert!((options.name_boost - 2.0).abs() < f64::EPSILON);
    }
}
