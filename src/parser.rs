//! SQL text handling: operation extraction and resource normalization.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::connection::Statement;

/// Placeholder resource for statements with no usable text.
pub const UNKNOWN_QUERY: &str = "<unknown query>";

/// SQL operation families, used for span tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Delete,
    Begin,
    Commit,
    Rollback,
    Other,
}

impl SqlOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlOperation::Select => "SELECT",
            SqlOperation::Insert => "INSERT",
            SqlOperation::Update => "UPDATE",
            SqlOperation::Delete => "DELETE",
            SqlOperation::Begin => "BEGIN",
            SqlOperation::Commit => "COMMIT",
            SqlOperation::Rollback => "ROLLBACK",
            SqlOperation::Other => "QUERY",
        }
    }
}

impl std::fmt::Display for SqlOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Parse the operation family from a query string.
pub fn parse_operation(sql: &str) -> SqlOperation {
    let upper_start: String = sql.trim_start().chars().take(10).collect::<String>().to_uppercase();

    if upper_start.starts_with("SELECT") || upper_start.starts_with("WITH") {
        SqlOperation::Select
    } else if upper_start.starts_with("INSERT") {
        SqlOperation::Insert
    } else if upper_start.starts_with("UPDATE") {
        SqlOperation::Update
    } else if upper_start.starts_with("DELETE") {
        SqlOperation::Delete
    } else if upper_start.starts_with("BEGIN") || upper_start.starts_with("START") {
        SqlOperation::Begin
    } else if upper_start.starts_with("COMMIT") {
        SqlOperation::Commit
    } else if upper_start.starts_with("ROLLBACK") {
        SqlOperation::Rollback
    } else {
        SqlOperation::Other
    }
}

/// Collapse runs of whitespace so multi-line queries read as one resource
/// string.
pub fn normalize_sql(sql: &str) -> String {
    WHITESPACE.replace_all(sql.trim(), " ").into_owned()
}

/// Best-effort resource string for a statement. Total: statements with no
/// usable text yield [`UNKNOWN_QUERY`] rather than failing.
pub fn resource_for(statement: &Statement) -> String {
    match statement.sql() {
        Some(sql) if !sql.trim().is_empty() => normalize_sql(sql),
        _ => UNKNOWN_QUERY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operation_families() {
        assert_eq!(parse_operation("SELECT * FROM users"), SqlOperation::Select);
        assert_eq!(
            parse_operation("WITH cte AS (SELECT 1) SELECT * FROM cte"),
            SqlOperation::Select
        );
        assert_eq!(
            parse_operation("insert into users (name) values ('x')"),
            SqlOperation::Insert
        );
        assert_eq!(parse_operation("START TRANSACTION"), SqlOperation::Begin);
        assert_eq!(parse_operation("VACUUM"), SqlOperation::Other);
    }

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(
            normalize_sql("SELECT *\n  FROM users\n  WHERE id = 1"),
            "SELECT * FROM users WHERE id = 1"
        );
    }

    #[test]
    fn resource_falls_back_to_placeholder() {
        assert_eq!(resource_for(&Statement::opaque()), UNKNOWN_QUERY);
        assert_eq!(resource_for(&Statement::from_string("   ")), UNKNOWN_QUERY);
        assert_eq!(
            resource_for(&Statement::from_string("SELECT 1")),
            "SELECT 1"
        );
    }
}
