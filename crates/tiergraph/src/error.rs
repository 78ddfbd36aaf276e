//! Error types for call-graph operations.
//!
//! All fallible operations return [`Result<T>`] with context-rich error messages.

use thiserror::Error;

/// Result type alias for tiergraph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Error type for all graph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Node not found in the graph
    #[error("Node not found: {signature}")]
    NodeNotFound {
        /// Signature or id of the missing node
        signature: String,
    },

    /// Invalid operation (e.g., edge to an unknown node id)
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GraphError {
    /// Create a serialization error from a message and optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a node-not-found error for an id.
    pub fn missing_id(id: crate::NodeId) -> Self {
        Self::NodeNotFound {
            signature: format!("#{id}"),
        }
    }
}
