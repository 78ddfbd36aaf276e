//! SQL strategies: table and column names referenced by a query.
//!
//! The keyword strategy is a token scanner, not a SQL parser. Tables are the
//! identifiers after `FROM`, `JOIN`, `INTO` and `UPDATE` (comma-separated
//! `FROM` lists included); columns are the remaining identifiers minus
//! keywords, functions, tables and aliases. Names are returned lowercase.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tiergraph_java::InSourceSql;

use crate::error::AnalysisError;

/// How SQL is embedded in the analyzed project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SqlWrappingType {
    /// Mapper XML statements with dynamic tags and `#{}` placeholders
    #[default]
    MyBatis,
    /// String literals passed to JDBC statements
    Jdbc,
    /// `@Query`, named queries and `createQuery` literals
    Jpa,
}

impl SqlWrappingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlWrappingType::MyBatis => "mybatis",
            SqlWrappingType::Jdbc => "jdbc",
            SqlWrappingType::Jpa => "jpa",
        }
    }

    /// In-source scanner for this wrapping type, if SQL lives in Java files
    pub fn in_source(&self) -> Option<InSourceSql> {
        match self {
            SqlWrappingType::MyBatis => None,
            SqlWrappingType::Jdbc => Some(InSourceSql::Jdbc),
            SqlWrappingType::Jpa => Some(InSourceSql::Jpa),
        }
    }
}

impl fmt::Display for SqlWrappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlWrappingType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mybatis" => Ok(SqlWrappingType::MyBatis),
            "jdbc" => Ok(SqlWrappingType::Jdbc),
            "jpa" => Ok(SqlWrappingType::Jpa),
            other => Err(AnalysisError::config(format!(
                "unknown sql_wrapping_type: {other}"
            ))),
        }
    }
}

/// Extracts referenced tables and columns from SQL text.
pub trait SqlStrategy: Send + Sync {
    /// Strategy name, for logging
    fn name(&self) -> &str;

    /// Tables referenced by `sql`, lowercase, in order of appearance.
    fn extract_table_names(&self, sql: &str) -> Vec<String>;

    /// Columns referenced by `sql` that may belong to `table_name`.
    ///
    /// Columns qualified with another table or its alias are excluded.
    fn extract_column_names(&self, sql: &str, table_name: &str) -> Vec<String>;
}

/// Create the strategy for a wrapping type.
pub fn create_strategy(kind: SqlWrappingType) -> Box<dyn SqlStrategy> {
    match kind {
        SqlWrappingType::MyBatis => Box::new(KeywordSqlStrategy::mybatis()),
        SqlWrappingType::Jdbc | SqlWrappingType::Jpa => Box::new(KeywordSqlStrategy::plain()),
    }
}

static CDATA: Lazy<Regex> = Lazy::new(|| Regex::new(r"<!\[CDATA\[|\]\]>").unwrap());
static XML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>").unwrap());
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[#$]\{[^}]*\}").unwrap());
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/|--[^\n]*").unwrap());
static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(?:[^']|'')*'").unwrap());
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_$]*(?:\.(?:[A-Za-z_][A-Za-z0-9_$]*|\*))*|[,()]").unwrap()
});

const TABLE_INTRODUCERS: &[&str] = &["FROM", "JOIN", "INTO", "UPDATE"];

/// `UPDATE` after these words is a clause (`FOR UPDATE`, `ON DUPLICATE KEY UPDATE`), not a statement.
fn is_lock_or_upsert(previous: Option<&str>) -> bool {
    matches!(previous, Some("FOR" | "KEY"))
}

const KEYWORDS: &[&str] = &[
    "ALL", "AND", "AS", "ASC", "AVG", "BETWEEN", "BY", "CASE", "COALESCE", "COUNT", "CROSS",
    "CURRENT_DATE", "CURRENT_TIMESTAMP", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DUPLICATE",
    "ELSE", "END", "EXISTS", "FALSE", "FETCH", "FIRST", "FOR", "FROM", "FULL", "GROUP", "HAVING",
    "IN", "INNER", "INSERT", "INTERVAL", "INTO", "IS", "JOIN", "KEY", "LEFT", "LIKE", "LIMIT",
    "LOCKED", "MAX", "MIN", "NEXT", "NOT", "NOW", "NOWAIT", "NULL", "NVL", "OF", "OFFSET", "ON",
    "ONLY", "OR", "ORDER", "OUTER", "RETURNING", "RIGHT", "ROWNUM", "ROWS", "SELECT", "SET",
    "SKIP", "SUM", "SYSDATE", "THEN", "TOP", "TRUE", "UNION", "UPDATE", "USING", "VALUES", "WHEN",
    "WHERE", "WITH",
];

fn is_keyword(word: &str) -> bool {
    let upper = word.to_ascii_uppercase();
    KEYWORDS.contains(&upper.as_str())
}

/// Remove MyBatis markup: CDATA markers, dynamic tags, `#{}`/`${}` placeholders
/// and the common XML entities.
pub fn strip_mybatis(sql: &str) -> String {
    let text = CDATA.replace_all(sql, " ");
    let text = XML_TAG.replace_all(&text, " ");
    let text = PLACEHOLDER.replace_all(&text, "?");
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Comma,
    Open,
    Close,
}

#[derive(Debug, Default)]
struct SqlShape {
    tables: Vec<String>,
    aliases: HashMap<String, String>,
    /// (lowercase qualifier, lowercase column) in order of appearance
    columns: Vec<(Option<String>, String)>,
}

impl SqlShape {
    fn is_table_or_alias(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t == name) || self.aliases.contains_key(name)
    }

    fn owner_of(&self, qualifier: &str) -> Option<&str> {
        self.aliases
            .get(qualifier)
            .map(String::as_str)
            .or_else(|| self.tables.iter().find(|t| *t == qualifier).map(String::as_str))
    }
}

/// Token-scanning strategy shared by all wrapping types
#[derive(Debug, Clone, Copy)]
pub struct KeywordSqlStrategy {
    strip_markup: bool,
}

impl KeywordSqlStrategy {
    /// Strategy for mapper XML statements
    pub fn mybatis() -> Self {
        Self { strip_markup: true }
    }

    /// Strategy for plain SQL strings
    pub fn plain() -> Self {
        Self {
            strip_markup: false,
        }
    }

    fn tokenize(&self, sql: &str) -> Vec<Token> {
        let text = if self.strip_markup {
            strip_mybatis(sql)
        } else {
            sql.to_string()
        };
        let text = COMMENT.replace_all(&text, " ");
        let text = STRING_LITERAL.replace_all(&text, "''");

        TOKEN
            .find_iter(&text)
            .map(|m| match m.as_str() {
                "," => Token::Comma,
                "(" => Token::Open,
                ")" => Token::Close,
                word => Token::Word(word.to_string()),
            })
            .collect()
    }

    fn shape(&self, sql: &str) -> SqlShape {
        let tokens = self.tokenize(sql);
        let mut shape = SqlShape::default();
        let mut expect_table = false;
        let mut in_from_list = false;
        let mut previous: Option<String> = None;
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Word(word) => {
                    let upper = word.to_ascii_uppercase();
                    let introduces = TABLE_INTRODUCERS.contains(&upper.as_str())
                        && !(upper == "UPDATE" && is_lock_or_upsert(previous.as_deref()));
                    previous = Some(upper.clone());
                    if introduces {
                        expect_table = true;
                        in_from_list = upper == "FROM";
                    } else if expect_table {
                        expect_table = false;
                        let table = last_segment(word).to_lowercase();
                        if !shape.tables.contains(&table) {
                            shape.tables.push(table.clone());
                        }
                        i = self.read_alias(&tokens, i + 1, &table, &mut shape);
                        continue;
                    } else if is_keyword(word) {
                        in_from_list = false;
                    } else if tokens.get(i + 1) != Some(&Token::Open) {
                        shape.columns.push(split_column(word));
                    }
                }
                Token::Comma => {
                    if in_from_list {
                        expect_table = true;
                    }
                }
                Token::Open => expect_table = false,
                Token::Close => {}
            }
            i += 1;
        }

        shape
    }

    /// Consume an optional `[AS] alias` after a table; returns the next index.
    fn read_alias(&self, tokens: &[Token], mut i: usize, table: &str, shape: &mut SqlShape) -> usize {
        if matches!(tokens.get(i), Some(Token::Word(w)) if w.eq_ignore_ascii_case("AS")) {
            i += 1;
        }
        if let Some(Token::Word(alias)) = tokens.get(i) {
            if !is_keyword(alias) && !alias.contains('.') {
                shape.aliases.insert(alias.to_lowercase(), table.to_string());
                return i + 1;
            }
        }
        i
    }
}

impl SqlStrategy for KeywordSqlStrategy {
    fn name(&self) -> &str {
        if self.strip_markup {
            "mybatis"
        } else {
            "plain"
        }
    }

    fn extract_table_names(&self, sql: &str) -> Vec<String> {
        self.shape(sql).tables
    }

    fn extract_column_names(&self, sql: &str, table_name: &str) -> Vec<String> {
        let shape = self.shape(sql);
        let target = table_name.to_lowercase();
        let mut columns: Vec<String> = Vec::new();

        for (qualifier, column) in &shape.columns {
            if column == "*" || is_keyword(column) {
                continue;
            }
            if let Some(owner) = qualifier.as_deref().and_then(|q| shape.owner_of(q)) {
                if owner != target {
                    continue;
                }
            } else if qualifier.is_none() && shape.is_table_or_alias(column) {
                continue;
            }
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn split_column(word: &str) -> (Option<String>, String) {
    match word.rsplit_once('.') {
        Some((qualifier, column)) => (
            Some(last_segment(qualifier).to_lowercase()),
            column.to_lowercase(),
        ),
        None => (None, word.to_lowercase()),
    }
}
