//! JSON snapshot export.
//!
//! Nodes are sorted by signature and edges by (caller, callee), so two builds
//! over the same input produce byte-identical output.

use crate::{CallGraph, GraphError, Result};
use serde_json::{json, Value};

/// Build the JSON value for a graph snapshot.
pub fn to_json_value(graph: &CallGraph) -> Value {
    let mut nodes: Vec<_> = graph.nodes().map(|(_, node)| node).collect();
    nodes.sort_by(|a, b| a.signature.cmp(&b.signature));

    let nodes_array: Vec<Value> = nodes
        .into_iter()
        .map(|node| {
            json!({
                "signature": node.signature,
                "class_name": node.class_name,
                "file_path": node.file_path,
                "layer": node.layer,
            })
        })
        .collect();

    let edges_array: Vec<Value> = graph
        .sorted_edges()
        .into_iter()
        .map(|(caller, callee)| json!({ "caller": caller, "callee": callee }))
        .collect();

    json!({
        "nodes": nodes_array,
        "edges": edges_array,
    })
}

/// Export graph to pretty-printed JSON.
///
/// # Errors
///
/// Returns [`GraphError::Serialization`] if encoding fails.
pub fn export_json(graph: &CallGraph) -> Result<String> {
    serde_json::to_string_pretty(&to_json_value(graph))
        .map_err(|e| GraphError::serialization("Failed to serialize call graph", Some(e)))
}
