//! # tiergraph
//!
//! A directed method-level call graph for multi-tier server code.
//!
//! ## Core Principles
//!
//! - **Signature keyed**: every node is a `ClassName.methodName` string
//! - **Idempotent edges**: a caller/callee pair is stored once
//! - **Bounded exploration**: chain and tree walks stop at a depth bound and on cycles
//! - **Deterministic output**: adjacency keeps insertion order, exports are sorted
//!
//! ## Example
//!
//! ```rust
//! use tiergraph::{CallGraph, Layer, MethodNode};
//!
//! let mut graph = CallGraph::new();
//! let a = graph.add_node(MethodNode::new("OrderController.get", "OrderController", "OrderController.java", Layer::Controller));
//! let b = graph.add_node(MethodNode::unresolved("OrderService.find"));
//! graph.add_edge(a, b).unwrap();
//!
//! let chains = graph.call_chains(a, 10).unwrap();
//! assert_eq!(chains.len(), 1);
//! assert!(!chains[0].is_circular);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod export;
pub mod graph;

// Re-export main types
pub use error::{GraphError, Result};
pub use graph::{CallChain, CallGraph, CallTreeNode, Direction, Layer, MethodNode, NodeId};
