//! Core graph types and operations.
//!
//! This module defines the fundamental building blocks:
//! - [`MethodNode`]: a method signature with class, file and layer metadata
//! - [`CallGraph`]: the directed caller → callee graph
//! - [`algorithms`]: SCCs, cycle recovery, chain enumeration, tree building, walks

mod callgraph;
mod types;
pub mod algorithms;

pub use callgraph::CallGraph;
pub use types::{CallChain, CallTreeNode, Direction, Layer, MethodNode, NodeId};
