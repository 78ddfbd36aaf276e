//! tiergraph Parser API
//!
//! Shared records and contracts for tiergraph source extractors.
//!
//! This crate provides the vocabulary that flows from a language extractor into
//! the call-graph builder and the DB access correlator:
//!
//! - **SourceExtractor trait**: the interface every extractor implements
//! - **Records**: classes, fields, methods, parameters, local variables
//! - **SQL records**: raw query records from resource files or in-source scans
//! - **Configuration**: encodings, limits, parallelism, fallback behavior
//! - **Metrics**: success and timing counters
//! - **Error handling**: per-file error taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use tiergraph_parser_api::{FileInfo, ParserConfig, ParserError, ParserMetrics, SourceExtractor};
//! use std::path::Path;
//!
//! struct MyExtractor {
//!     config: ParserConfig,
//! }
//!
//! impl SourceExtractor for MyExtractor {
//!     fn language(&self) -> &str {
//!         "mylang"
//!     }
//!
//!     fn file_extensions(&self) -> &[&str] {
//!         &[".my"]
//!     }
//!
//!     fn parse_file(&self, path: &Path) -> Result<FileInfo, ParserError> {
//!         todo!()
//!     }
//!
//!     fn parse_source(&self, source: &str, file_path: &Path) -> Result<FileInfo, ParserError> {
//!         todo!()
//!     }
//!
//!     fn config(&self) -> &ParserConfig {
//!         &self.config
//!     }
//!
//!     fn metrics(&self) -> ParserMetrics {
//!         ParserMetrics::default()
//!     }
//!
//!     fn reset_metrics(&mut self) {}
//! }
//! ```

pub mod config;
pub mod errors;
pub mod metrics;
pub mod records;
pub mod sql;
pub mod traits;

// Re-export commonly used types
pub use config::{ParserConfig, SourceEncoding};
pub use errors::{ParserError, ParserResult};
pub use metrics::ParserMetrics;
pub use records::{
    base_type, ClassKind, ClassRecord, FieldRecord, LocalVariable, MethodRecord, Parameter,
};
pub use sql::{QueryKind, SqlQueryRecord};
pub use traits::{FallbackScan, FileInfo, ProjectInfo, SourceExtractor};
