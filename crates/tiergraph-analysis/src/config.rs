//! Analysis configuration.

use serde::{Deserialize, Serialize};
use tiergraph_parser_api::ParserConfig;

use crate::error::{AnalysisError, Result};
use crate::sql_strategy::SqlWrappingType;

/// A table whose accesses should be traced, with the columns of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableTarget {
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl TableTarget {
    /// Create a target; names are lowercased.
    pub fn new<I, S>(table_name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut target = Self {
            table_name: table_name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        };
        target.normalize();
        target
    }

    fn normalize(&mut self) {
        self.table_name = self.table_name.trim().to_lowercase();
        for column in &mut self.columns {
            *column = column.trim().to_lowercase();
        }
        self.columns.retain(|c| !c.is_empty());
    }
}

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Tables to correlate against the call graph
    pub access_tables: Vec<TableTarget>,

    /// How SQL is embedded in the project: `mybatis`, `jdbc` or `jpa`
    pub sql_wrapping_type: SqlWrappingType,

    /// Depth bound for call chains and call trees
    pub max_chain_depth: usize,

    /// Depth bound for the caller walk from a matched query
    pub max_upstream_depth: usize,

    /// Extractor settings
    pub parser: ParserConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            access_tables: Vec::new(),
            sql_wrapping_type: SqlWrappingType::MyBatis,
            max_chain_depth: 10,
            max_upstream_depth: 20,
            parser: ParserConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a JSON configuration document.
    ///
    /// Missing keys take their defaults; table and column names are
    /// lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Serialization`] for malformed JSON and
    /// [`AnalysisError::Config`] for a table entry without a name.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: AnalysisConfig = serde_json::from_str(json)?;
        for table in &mut config.access_tables {
            table.normalize();
        }
        if config.access_tables.iter().any(|t| t.table_name.is_empty()) {
            return Err(AnalysisError::config("access_tables entry without table_name"));
        }
        Ok(config)
    }

    pub fn with_table(mut self, table: TableTarget) -> Self {
        self.access_tables.push(table);
        self
    }

    pub fn with_sql_wrapping_type(mut self, kind: SqlWrappingType) -> Self {
        self.sql_wrapping_type = kind;
        self
    }

    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }
}
