//! In-source SQL scanning for JDBC and JPA code.
//!
//! Literals are attributed to methods by splitting the file at method
//! headers, so a literal belongs to the nearest preceding header.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tiergraph_parser_api::{FileInfo, QueryKind, SqlQueryRecord};

use crate::fallback::METHOD_RE;

/// Which in-source SQL idiom to scan for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InSourceSql {
    Jdbc,
    Jpa,
}

static JDBC_CALLS: Lazy<Vec<(Regex, QueryKind)>> = Lazy::new(|| {
    vec![
        (literal_arg("prepareStatement"), QueryKind::Select),
        (literal_arg("executeQuery"), QueryKind::Select),
        (literal_arg("executeUpdate"), QueryKind::Update),
        (literal_arg("execute"), QueryKind::Select),
    ]
});

static JPA_CALLS: Lazy<Vec<(Regex, QueryKind)>> = Lazy::new(|| {
    vec![
        (literal_arg("createQuery"), QueryKind::Select),
        (literal_arg("createNativeQuery"), QueryKind::Select),
    ]
});

static QUERY_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)@Query\s*\(\s*(?:value\s*=\s*)?["']([^"']+)["']"#).unwrap()
});

static NAMED_QUERY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)@NamedQuery\s*\(\s*name\s*=\s*["']([^"']+)["']\s*,\s*query\s*=\s*["']([^"']+)["']"#,
    )
    .unwrap()
});

fn literal_arg(call: &str) -> Regex {
    Regex::new(&format!(r#"(?is){call}\s*\(\s*["']([^"']+)["']"#)).unwrap()
}

/// Namespace for records scanned from a file: the first class's qualified name.
pub fn namespace_of(info: &FileInfo) -> Option<String> {
    info.classes.first().map(|c| c.qualified_name())
}

/// Dispatch to the scanner for `kind`.
pub fn scan_source_sql(source: &str, namespace: &str, kind: InSourceSql) -> Vec<SqlQueryRecord> {
    match kind {
        InSourceSql::Jdbc => scan_jdbc_sql(source, namespace),
        InSourceSql::Jpa => scan_jpa_sql(source, namespace),
    }
}

/// SQL literals passed to `prepareStatement`, `executeQuery`,
/// `executeUpdate` and `execute`, one record per literal with the enclosing
/// method name as id.
pub fn scan_jdbc_sql(source: &str, namespace: &str) -> Vec<SqlQueryRecord> {
    scan_method_bodies(source, namespace, &JDBC_CALLS)
}

/// JPQL and native SQL from `@Query`, `@NamedQuery`, `createQuery` and
/// `createNativeQuery`.
pub fn scan_jpa_sql(source: &str, namespace: &str) -> Vec<SqlQueryRecord> {
    let mut records = Vec::new();

    for caps in QUERY_ANNOTATION.captures_iter(source) {
        let (Some(whole), Some(sql)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // Attributed to the method that follows the annotation
        let id = METHOD_RE
            .captures(&source[whole.end()..])
            .and_then(|c| c.get(1))
            .map_or("unknown", |m| m.as_str());
        records.push(record(namespace, id, sql.as_str(), QueryKind::Select));
    }

    for caps in NAMED_QUERY.captures_iter(source) {
        let (Some(name), Some(sql)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        records.push(record(namespace, name.as_str(), sql.as_str(), QueryKind::Select));
    }

    records.extend(scan_method_bodies(source, namespace, &JPA_CALLS));
    records
}

fn scan_method_bodies(
    source: &str,
    namespace: &str,
    patterns: &[(Regex, QueryKind)],
) -> Vec<SqlQueryRecord> {
    let headers: Vec<(usize, &str)> = METHOD_RE
        .captures_iter(source)
        .filter_map(|c| Some((c.get(0)?.start(), c.get(1)?.as_str())))
        .collect();

    let mut records = Vec::new();
    for (i, &(start, method)) in headers.iter().enumerate() {
        let end = headers.get(i + 1).map_or(source.len(), |&(next, _)| next);
        let body = &source[start..end];
        for (pattern, default_kind) in patterns {
            for caps in pattern.captures_iter(body) {
                if let Some(sql) = caps.get(1) {
                    records.push(record(namespace, method, sql.as_str(), *default_kind));
                }
            }
        }
    }

    log::debug!("Scanned {} SQL literals in {}", records.len(), namespace);
    records
}

fn record(namespace: &str, id: &str, sql: &str, default_kind: QueryKind) -> SqlQueryRecord {
    let sql = sql.trim();
    let kind = QueryKind::detect(sql).unwrap_or(default_kind);
    SqlQueryRecord::new(namespace, id, sql).with_query_type(kind)
}
