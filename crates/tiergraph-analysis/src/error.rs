//! Error types for analysis runs.
//!
//! Per-file extraction failures never surface here; they are collected as
//! skipped files. These errors cover configuration and whole-run failures.

use thiserror::Error;
use tiergraph::GraphError;
use tiergraph_parser_api::ParserError;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Error type for analysis operations.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Extraction failed for the run as a whole (e.g. unreadable source root)
    #[error("Parser error: {0}")]
    Parser(#[from] ParserError),

    /// Graph construction or query failed
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Invalid analysis configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
