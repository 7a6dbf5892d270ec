//! Result categorization / 结果分类
//!
//! Ranked hits are split into top matches, tables and relevant data. A document id
//! appears in at most one bucket and empty buckets are left out of the response.

use serde::Serialize;
use std::collections::HashSet;

use super::schema::{DocumentKind, SearchHit};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategorizedResults {
    #[serde(rename = "topMatches", skip_serializing_if = "Option::is_none")]
    pub top_matches: Option<Vec<SearchHit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<SearchHit>>,
    #[serde(rename = "relevantData", skip_serializing_if = "Option::is_none")]
    pub relevant_data: Option<Vec<SearchHit>>,
}

impl CategorizedResults {
    pub fn is_empty(&self) -> bool {
        self.top_matches.is_none() && self.tables.is_none() && self.relevant_data.is_none()
    }
}

/// Partition ranked hits / 对排序后的结果分类
///
/// Top matches: the best hit, plus any data hit whose id equals the query's leading
/// integer regardless of its rank / 第一名以及 ID 精确匹配的数据
pub fn categorize(hits: Vec<SearchHit>, query: &str) -> CategorizedResults {
    let numeric_query = leading_integer(query);

    let mut top_matches = Vec::new();
    let mut tables = Vec::new();
    let mut relevant_data = Vec::new();

    for (index, hit) in hits.into_iter().enumerate() {
        let is_exact_id = hit.fields.kind == DocumentKind::Data
            && numeric_query.is_some()
            && hit.fields.data_id == numeric_query;

        if index == 0 || is_exact_id {
            top_matches.push(hit.clone());
        }

        match hit.fields.kind {
            DocumentKind::Table => tables.push(hit),
            DocumentKind::Data => relevant_data.push(hit),
        }
    }

    let top_ids: HashSet<String> = top_matches.iter().map(|m| m.id.clone()).collect();
    tables.retain(|t| !top_ids.contains(&t.id));
    relevant_data.retain(|d| !top_ids.contains(&d.id));

    CategorizedResults {
        top_matches: non_empty(top_matches),
        tables: non_empty(tables),
        relevant_data: non_empty(relevant_data),
    }
}

/// Optional sign and leading digits after whitespace, e.g. `"42 shipped"` → 42 / 提取开头的整数
fn leading_integer(query: &str) -> Option<i64> {
    let trimmed = query.trim_start();
    let digits_start = usize::from(trimmed.starts_with(['+', '-']));
    let digits_len = trimmed[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len() - digits_start);
    if digits_len == 0 {
        return None;
    }
    trimmed[..digits_start + digits_len].parse().ok()
}

fn non_empty(hits: Vec<SearchHit>) -> Option<Vec<SearchHit>> {
    if hits.is_empty() {
        None
    } else {
        Some(hits)
    }
}
