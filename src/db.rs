//! Relational store connection / 数据库连接
//!
//! The process opens exactly one logical connection at startup and hands clones of the
//! pool to every collaborator. One connection also keeps `sqlite::memory:` databases
//! alive and shared for the lifetime of the pool.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Open the store / 打开数据库
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    tracing::info!("Database connected: {}", database_url);
    Ok(pool)
}

/// In-memory store for tests / 测试用内存数据库
#[cfg(test)]
pub async fn connect_memory() -> SqlitePool {
    connect("sqlite::memory:").await.expect("in-memory sqlite")
}
