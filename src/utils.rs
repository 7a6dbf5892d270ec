/// Identifier utility functions / 标识符工具函数
///
/// Table and column names arrive from user input and end up interpolated into DDL/DML,
/// so they are checked against an allow-list before any SQL is assembled.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};
use crate::metadata::METADATA_TABLE;

/// Allowed table/column name / 允许的表名列名
static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("valid identifier regex"));

/// Allowed column type clause, e.g. `INTEGER PRIMARY KEY`, `VARCHAR(255) NOT NULL` / 允许的列类型
static COLUMN_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\s*\(\s*\d+\s*(,\s*\d+\s*)?\))?(\s+[A-Za-z0-9_]+)*$")
        .expect("valid column type regex")
});

/// Validate a user supplied table or column name / 校验表名或列名
pub fn validate_identifier(name: &str) -> AppResult<&str> {
    if !IDENTIFIER_RE.is_match(name) {
        return Err(AppError::InvalidIdentifier(name.to_string()));
    }
    // Reserved by SQLite itself or by the metadata side-table / 保留名
    if name.to_ascii_lowercase().starts_with("sqlite_") || name.eq_ignore_ascii_case(METADATA_TABLE) {
        return Err(AppError::InvalidIdentifier(name.to_string()));
    }
    Ok(name)
}

/// Validate a column type clause / 校验列类型
pub fn validate_column_type(column_type: &str) -> AppResult<&str> {
    let column_type = column_type.trim();
    if column_type.is_empty() || !COLUMN_TYPE_RE.is_match(column_type) {
        return Err(AppError::BadRequest(format!("Invalid column type: {}", column_type)));
    }
    Ok(column_type)
}

/// Quote an already validated identifier / 给已校验的标识符加引号
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Validate and quote in one step / 校验并加引号
pub fn quoted(name: &str) -> AppResult<String> {
    validate_identifier(name).map(quote_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("order_items2").is_ok());

        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("users; DROP TABLE x").is_err());
        assert!(validate_identifier("na\"me").is_err());
        assert!(validate_identifier("with space").is_err());
        assert!(validate_identifier(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_reserved_identifiers() {
        assert!(validate_identifier("sqlite_master").is_err());
        assert!(validate_identifier("SQLITE_sequence").is_err());
        assert!(validate_identifier("_search_metadata").is_err());
    }

    #[test]
    fn test_validate_column_type() {
        assert_eq!(validate_column_type("TEXT").unwrap(), "TEXT");
        assert_eq!(validate_column_type(" INTEGER PRIMARY KEY AUTOINCREMENT ").unwrap(), "INTEGER PRIMARY KEY AUTOINCREMENT");
        assert!(validate_column_type("VARCHAR(255) NOT NULL").is_ok());
        assert!(validate_column_type("DECIMAL(10, 2)").is_ok());
        assert!(validate_column_type("INTEGER DEFAULT 0").is_ok());

        assert!(validate_column_type("").is_err());
        assert!(validate_column_type("TEXT); DROP TABLE users; --").is_err());
        assert!(validate_column_type("TEXT DEFAULT 'x'").is_err());
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quoted("orders").unwrap(), "\"orders\"");
        assert!(quoted("bad name").is_err());
    }
}
