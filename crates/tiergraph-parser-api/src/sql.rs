//! Raw SQL query records.
//!
//! Records come either from an external mapper-resource parser or from the
//! in-source JDBC/JPA scanners of a language extractor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statement kind of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl QueryKind {
    /// Detect the kind from the leading keyword, ignoring case and whitespace.
    pub fn detect(sql: &str) -> Option<QueryKind> {
        let head: String = sql
            .trim_start()
            .chars()
            .take(6)
            .collect::<String>()
            .to_ascii_uppercase();
        match head.as_str() {
            "SELECT" => Some(QueryKind::Select),
            "INSERT" => Some(QueryKind::Insert),
            "UPDATE" => Some(QueryKind::Update),
            "DELETE" => Some(QueryKind::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Select => "SELECT",
            QueryKind::Insert => "INSERT",
            QueryKind::Update => "UPDATE",
            QueryKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One SQL statement owned by a namespace (mapper interface or DAO class)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlQueryRecord {
    /// Owner identifier, usually a fully qualified class name
    pub namespace: String,

    /// Query id; for mapper statements this is the method name
    pub id: String,

    /// SQL text
    pub sql: String,

    /// Declared result type class, if any
    pub result_type: Option<String>,

    pub query_type: QueryKind,
}

impl SqlQueryRecord {
    /// Create a record, detecting the kind from the SQL and defaulting to SELECT.
    pub fn new(namespace: impl Into<String>, id: impl Into<String>, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let query_type = QueryKind::detect(&sql).unwrap_or(QueryKind::Select);
        Self {
            namespace: namespace.into(),
            id: id.into(),
            sql,
            result_type: None,
            query_type,
        }
    }

    pub fn with_result_type(mut self, result_type: impl Into<String>) -> Self {
        self.result_type = Some(result_type.into());
        self
    }

    pub fn with_query_type(mut self, kind: QueryKind) -> Self {
        self.query_type = kind;
        self
    }

    /// Simple class name of the namespace (`com.shop.OrderMapper` gives `OrderMapper`)
    pub fn owner_class(&self) -> &str {
        self.namespace.rsplit('.').next().unwrap_or(&self.namespace)
    }

    /// Graph key of the owning method, `OwnerClass.queryId`.
    pub fn method_key(&self) -> Option<String> {
        if self.namespace.is_empty() || self.id.is_empty() {
            return None;
        }
        Some(format!("{}.{}", self.owner_class(), self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(QueryKind::detect("  select * from t"), Some(QueryKind::Select));
        assert_eq!(QueryKind::detect("INSERT INTO t"), Some(QueryKind::Insert));
        assert_eq!(QueryKind::detect("update t set a=1"), Some(QueryKind::Update));
        assert_eq!(QueryKind::detect("DELETE FROM t"), Some(QueryKind::Delete));
        assert_eq!(QueryKind::detect("MERGE INTO t"), None);
        assert_eq!(QueryKind::detect(""), None);
    }

    #[test]
    fn test_method_key_uses_simple_owner() {
        let record = SqlQueryRecord::new("com.shop.mapper.OrderMapper", "selectById", "SELECT 1");
        assert_eq!(record.owner_class(), "OrderMapper");
        assert_eq!(record.method_key().as_deref(), Some("OrderMapper.selectById"));

        let anonymous = SqlQueryRecord::new("", "q", "SELECT 1");
        assert_eq!(anonymous.method_key(), None);
    }

    #[test]
    fn test_kind_serializes_uppercase() {
        let record = SqlQueryRecord::new("A", "b", "delete from t");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["query_type"], "DELETE");
        assert!(json["result_type"].is_null());
    }
}
