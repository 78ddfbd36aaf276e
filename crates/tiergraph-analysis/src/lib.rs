//! # tiergraph-analysis
//!
//! Builds a layered call graph from extracted Java classes and correlates it
//! with SQL queries to find which files touch which database tables.
//!
//! ## Features
//!
//! - Resolve call sites through field, parameter and local variable types
//! - Classify methods into Controller/Service/Mapper/Repository/DAO/Entity layers
//! - Detect HTTP endpoints and enumerate their call chains and trees
//! - Report circular call references
//! - Attribute table access to files by layer via an upstream caller walk
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tiergraph_analysis::{AnalysisConfig, AnalysisRun, TableTarget};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnalysisConfig::default().with_table(TableTarget::new("orders", ["id", "status"]));
//! let mut run = AnalysisRun::new(config);
//!
//! let report = run.run(&[PathBuf::from("src/main/java")], Vec::new())?;
//! for table in &report.table_access {
//!     println!("{}: {} files, mostly {}", table.table_name, table.access_files.len(), table.layer);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod builder;
pub mod config;
pub mod db_access;
pub mod endpoint;
pub mod error;
pub mod layer;
pub mod run;
pub mod sql_strategy;
pub mod type_index;

pub use builder::{CallGraphBuilder, CallRelation, EndpointCallTree, MethodMetadata};
pub use config::{AnalysisConfig, TableTarget};
pub use db_access::{DbAccessCorrelator, TableAccessInfo, INTERFACE_LAYER};
pub use endpoint::{combine_paths, identify_endpoints, Endpoint};
pub use error::{AnalysisError, Result};
pub use layer::{classify_layer, classify_layer_with_rule, LayerRule};
pub use run::{AnalysisReport, AnalysisRun, SkippedFile};
pub use sql_strategy::{create_strategy, KeywordSqlStrategy, SqlStrategy, SqlWrappingType};
pub use type_index::TypeIndex;
