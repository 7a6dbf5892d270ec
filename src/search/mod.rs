//! Search module / 搜索模块
//!
//! Every request rebuilds the index from the live database / 每次请求都从数据库重建索引:
//! collect documents → index → query → categorize
//!
//! Nothing is cached between requests, so concurrent searches never share index state.
//! The cost is a full scan of every table per query.

pub mod categorize;
pub mod collector;
pub mod engine;
pub mod schema;
pub mod tokenizer;

pub use categorize::{categorize, CategorizedResults};
pub use collector::collect_documents;
pub use engine::SearchEngine;
pub use schema::{SearchDocument, SearchHit, SearchOptions, Suggestion};

use crate::config::SearchConfig;
use crate::error::AppResult;
use crate::metadata::MetadataStore;
use crate::store::Store;

/// Build a fresh index over the current database / 基于当前数据库构建索引
pub async fn build_engine(store: &Store, metadata: &MetadataStore) -> AppResult<SearchEngine> {
    let documents = collect_documents(store, metadata).await?;

    let mut engine = SearchEngine::new();
    engine.index_batch(documents);

    let stats = engine.stats();
    tracing::debug!(
        "Search index built: {} documents, {} terms",
        stats.document_count,
        stats.term_count
    );
    Ok(engine)
}

/// Global search across table names and row contents / 全局搜索
pub async fn global_search(
    store: &Store,
    metadata: &MetadataStore,
    config: &SearchConfig,
    query: &str,
) -> AppResult<CategorizedResults> {
    let engine = build_engine(store, metadata).await?;
    let hits = engine.search(query, &SearchOptions::from_config(config));
    tracing::debug!("Search {:?}: {} hits", query, hits.len());
    Ok(categorize(hits, query))
}

/// Completion suggestions for a partial query / 搜索建议
pub async fn suggest(
    store: &Store,
    metadata: &MetadataStore,
    config: &SearchConfig,
    query: &str,
) -> AppResult<Vec<Suggestion>> {
    let engine = build_engine(store, metadata).await?;
    let options = SearchOptions::suggest_from_config(config);
    Ok(engine.auto_suggest(query, &options, config.suggest_limit))
}
