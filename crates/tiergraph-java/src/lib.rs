//! # tiergraph-java
//!
//! Java structural extractor for tiergraph: turns Java sources into class,
//! field and method records with normalized call sites.
//!
//! ## Features
//!
//! - Decode sources by trying an ordered list of encodings
//! - Extract classes, interfaces, enums and records (nested types included)
//! - Collect parameters, local variables and call sites per method
//! - Degrade to a pattern scanner when a file does not parse
//! - Scan JDBC/JPA sources for embedded SQL
//! - Parse sequentially or on a rayon pool, with a per-run parse cache
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tiergraph_java::JavaParser;
//! use tiergraph_parser_api::SourceExtractor;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let parser = JavaParser::new();
//!
//! let file_info = parser.parse_file(Path::new("OrderService.java"))?;
//! for class in &file_info.classes {
//!     println!("{} has {} methods", class.qualified_name(), class.methods.len());
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod call_site;
mod decode;
mod extractor;
mod fallback;
mod parser_impl;
mod sql_scan;
mod visitor;

// Re-export parser-api types for convenience
pub use tiergraph_parser_api::{
    FileInfo, ParserConfig, ParserError, ParserMetrics, ProjectInfo, SourceExtractor,
};

pub use cache::ParseCache;
pub use decode::{decode_bytes, DecodedSource};
pub use extractor::extract;
pub use fallback::{fallback_scan, skeletal_classes};
pub use parser_impl::JavaParser;
pub use sql_scan::{namespace_of, scan_jdbc_sql, scan_jpa_sql, scan_source_sql, InSourceSql};
