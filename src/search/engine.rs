//! Search engine - in-memory full-text search implementation / 搜索引擎
//!
//! Primitive operations only / 只暴露原语操作:
//! - index_document / index_batch: add documents / 索引文档
//! - search: fuzzy + prefix query ranked by BM25+ / 搜索
//! - auto_suggest: completion phrases for a partial query / 自动建议
//!
//! An engine is built for a single request and dropped afterwards, so it owns its
//! data outright and needs no locking.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::schema::{Combine, SearchDocument, SearchHit, SearchOptions, Suggestion};
use super::tokenizer::{contains_cjk, tokenize};

/// BM25+ parameters / BM25+ 参数
const BM25_K1: f64 = 1.2;
const BM25_B: f64 = 0.7;
const BM25_DELTA: f64 = 0.5;

/// Match quality weights / 匹配方式权重
const PREFIX_WEIGHT: f64 = 0.375;
const FUZZY_WEIGHT: f64 = 0.45;

/// Indexed fields / 索引字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name = 0,
    Text = 1,
}

const FIELDS: [Field; 2] = [Field::Name, Field::Text];

/// Inverted index entry / 倒排索引条目
#[derive(Debug, Clone)]
struct PostingEntry {
    doc: usize,
    term_frequency: u32,
}

/// Score accumulated by one document / 单个文档的累计得分
#[derive(Debug, Default)]
struct DocMatch {
    score: f64,
    terms: Vec<String>,
}

impl DocMatch {
    fn add(&mut self, score: f64, term: &str) {
        self.score += score;
        if !self.terms.iter().any(|t| t == term) {
            self.terms.push(term.to_string());
        }
    }

    fn merge(&mut self, other: DocMatch) {
        self.score += other.score;
        for term in other.terms {
            if !self.terms.contains(&term) {
                self.terms.push(term);
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub document_count: usize,
    pub term_count: usize,
}

/// Search engine / 搜索引擎
///
/// Inverted index over two fields (`name`, `text`). Terms are kept sorted so prefix
/// matches are a range scan / 词项有序存储，前缀匹配为区间扫描
pub struct SearchEngine {
    documents: Vec<SearchDocument>,
    /// term -> postings per field / 倒排索引
    inverted_index: BTreeMap<String, [Vec<PostingEntry>; 2]>,
    /// Token count of each field per document / 每个文档的字段长度
    field_lengths: Vec<[usize; 2]>,
    total_field_lengths: [usize; 2],
}

impl SearchEngine {
    /// Create new search engine instance / 创建新的搜索引擎实例
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            inverted_index: BTreeMap::new(),
            field_lengths: Vec::new(),
            total_field_lengths: [0, 0],
        }
    }

    /// Get index statistics / 获取索引统计信息
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            document_count: self.documents.len(),
            term_count: self.inverted_index.len(),
        }
    }

    /// Index single document / 索引单个文档
    pub fn index_document(&mut self, doc: SearchDocument) {
        let doc_idx = self.documents.len();
        let mut lengths = [0usize; 2];

        for field in FIELDS {
            let value = match field {
                Field::Name => doc.name().unwrap_or_default(),
                Field::Text => doc.text.as_str(),
            };
            let tokens = tokenize(value);
            lengths[field as usize] = tokens.len();

            let mut frequencies: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *frequencies.entry(token).or_default() += 1;
            }
            for (token, term_frequency) in frequencies {
                self.inverted_index.entry(token).or_default()[field as usize].push(PostingEntry {
                    doc: doc_idx,
                    term_frequency,
                });
            }
        }

        self.total_field_lengths[0] += lengths[0];
        self.total_field_lengths[1] += lengths[1];
        self.field_lengths.push(lengths);
        self.documents.push(doc);
    }

    /// 批量索引文档
    pub fn index_batch(&mut self, docs: Vec<SearchDocument>) -> usize {
        let count = docs.len();
        for doc in docs {
            self.index_document(doc);
        }
        count
    }

    /// 获取文档数量
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Search, hits ordered by descending score / 搜索（按分数降序）
    ///
    /// Equal scores keep document insertion order / 同分保持插入顺序
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() || self.documents.is_empty() {
            return Vec::new();
        }

        let total = query_terms.len();
        let mut combined: Option<HashMap<usize, DocMatch>> = None;

        for (i, term) in query_terms.iter().enumerate() {
            let prefix = options.prefix.applies(i, total);
            let matches = self.score_term(term, prefix, options);

            combined = Some(match (combined, options.combine) {
                (None, _) => matches,
                (Some(mut acc), Combine::Or) => {
                    for (doc, m) in matches {
                        acc.entry(doc).or_default().merge(m);
                    }
                    acc
                }
                (Some(acc), Combine::And) => {
                    let mut matches = matches;
                    acc.into_iter()
                        .filter_map(|(doc, mut m)| {
                            let other = matches.remove(&doc)?;
                            m.merge(other);
                            Some((doc, m))
                        })
                        .collect()
                }
            });
        }

        let mut ranked: Vec<(usize, DocMatch)> = combined.unwrap_or_default().into_iter().collect();
        ranked.sort_by(|(a_doc, a), (b_doc, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a_doc.cmp(b_doc))
        });

        ranked
            .into_iter()
            .map(|(doc_idx, m)| {
                let doc = &self.documents[doc_idx];
                SearchHit {
                    id: doc.id.clone(),
                    score: m.score,
                    terms: m.terms,
                    fields: doc.fields.clone(),
                }
            })
            .collect()
    }

    /// Completion phrases for a partial query / 自动补全建议
    ///
    /// Hits are grouped by the phrase of terms they matched; a group scores the mean
    /// of its hits / 按命中词组分组，取平均分
    pub fn auto_suggest(&self, query: &str, options: &SearchOptions, limit: usize) -> Vec<Suggestion> {
        let mut groups: Vec<(Suggestion, usize)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for hit in self.search(query, options) {
            let phrase = hit.terms.join(" ");
            match positions.get(&phrase) {
                Some(&pos) => {
                    groups[pos].0.score += hit.score;
                    groups[pos].1 += 1;
                }
                None => {
                    positions.insert(phrase.clone(), groups.len());
                    groups.push((
                        Suggestion { suggestion: phrase, terms: hit.terms, score: hit.score },
                        1,
                    ));
                }
            }
        }

        let mut suggestions: Vec<Suggestion> = groups
            .into_iter()
            .map(|(mut s, count)| {
                s.score /= count as f64;
                s
            })
            .collect();
        suggestions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        suggestions.truncate(limit);
        suggestions
    }

    /// Score every document matching one query term / 计算单个查询词的得分
    fn score_term(&self, term: &str, prefix: bool, options: &SearchOptions) -> HashMap<usize, DocMatch> {
        let mut results: HashMap<usize, DocMatch> = HashMap::new();
        let doc_count = self.documents.len() as f64;

        for (indexed, weight) in self.expand_term(term, prefix, options) {
            let Some(postings) = self.inverted_index.get(indexed) else {
                continue;
            };
            for field in FIELDS {
                let field_postings = &postings[field as usize];
                if field_postings.is_empty() {
                    continue;
                }
                let boost = match field {
                    Field::Name => options.name_boost,
                    Field::Text => 1.0,
                };
                let avg_length = self.total_field_lengths[field as usize] as f64 / doc_count;
                let df = field_postings.len() as f64;

                for posting in field_postings {
                    let field_length = self.field_lengths[posting.doc][field as usize] as f64;
                    let relevance = bm25_plus(
                        f64::from(posting.term_frequency),
                        df,
                        doc_count,
                        field_length,
                        avg_length,
                    );
                    results.entry(posting.doc).or_default().add(weight * boost * relevance, indexed);
                }
            }
        }

        results
    }

    /// Indexed terms matching a query term with their match weight / 查询词扩展
    ///
    /// Exact 1.0, prefix and fuzzy matches are discounted by how much they differ.
    /// An indexed term keeps its best weight / 取最高权重
    fn expand_term<'a>(&'a self, term: &str, prefix: bool, options: &SearchOptions) -> Vec<(&'a str, f64)> {
        let mut weights: BTreeMap<&'a str, f64> = BTreeMap::new();
        let term_len = term.chars().count() as f64;

        if let Some((indexed, _)) = self.inverted_index.get_key_value(term) {
            weights.insert(indexed.as_str(), 1.0);
        }

        if prefix {
            for (indexed, _) in self
                .inverted_index
                .range::<str, _>((std::ops::Bound::Excluded(term), std::ops::Bound::Unbounded))
                .take_while(|(indexed, _)| indexed.starts_with(term))
            {
                let extra = indexed.chars().count() as f64 - term_len;
                let weight = PREFIX_WEIGHT * term_len / (term_len + 0.3 * extra);
                keep_best(&mut weights, indexed, weight);
            }
        }

        // Edit distance is meaningless for CJK words / 中日韩词不做编辑距离匹配
        let max_distance = options.max_distance(term.chars().count());
        if max_distance > 0 && !contains_cjk(term) {
            for indexed in self.inverted_index.keys() {
                if indexed == term {
                    continue;
                }
                if let Some(distance) = fuzzy_distance(term, indexed, max_distance) {
                    let weight = FUZZY_WEIGHT * term_len / (term_len + distance as f64);
                    keep_best(&mut weights, indexed, weight);
                }
            }
        }

        weights.into_iter().collect()
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn keep_best<'a>(weights: &mut BTreeMap<&'a str, f64>, term: &'a str, weight: f64) {
    let entry = weights.entry(term).or_insert(0.0);
    if weight > *entry {
        *entry = weight;
    }
}

/// BM25+ relevance of one term in one field / BM25+ 相关性
fn bm25_plus(tf: f64, df: f64, doc_count: f64, field_length: f64, avg_length: f64) -> f64 {
    let idf = (1.0 + (doc_count - df + 0.5) / (df + 0.5)).ln();
    let norm = if avg_length > 0.0 { field_length / avg_length } else { 1.0 };
    idf * (BM25_DELTA + tf * (BM25_K1 + 1.0) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * norm)))
}

/// Edit distance if within `max_distance` / 编辑距离在阈值内时返回
fn fuzzy_distance(s1: &str, s2: &str, max_distance: usize) -> Option<usize> {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();

    // 长度差太大直接返回
    if len1.abs_diff(len2) > max_distance {
        return None;
    }

    let distance = levenshtein_distance(s1, s2);
    (distance <= max_distance).then_some(distance)
}

/// 计算 Levenshtein 编辑距离
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 { return len2; }
    if len2 == 0 { return len1; }

    let mut prev: Vec<usize> = (0..=len2).collect();
    let mut curr = vec![0usize; len2 + 1];

    for i in 1..=len1 {
        curr[0] = i;
        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[len2]
}
