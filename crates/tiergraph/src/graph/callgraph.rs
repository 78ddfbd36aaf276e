//! The call graph: signature-keyed nodes with insertion-ordered adjacency.

use super::algorithms;
use super::types::{CallChain, CallTreeNode, Direction, MethodNode, NodeId};
use crate::error::{GraphError, Result};
use log::{debug, trace};
use std::collections::{HashMap, HashSet};

/// Directed caller → callee graph over method signatures.
///
/// Nodes are created once per signature; the first metadata supplied for a
/// signature is kept. Edges are idempotent: adding the same pair twice is a
/// no-op. Successor and predecessor lists keep insertion order so that every
/// traversal is deterministic for a given build order.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: Vec<MethodNode>,
    index: HashMap<String, NodeId>,
    adjacency_out: Vec<Vec<NodeId>>,
    adjacency_in: Vec<Vec<NodeId>>,
    edge_set: HashSet<(NodeId, NodeId)>,
    edge_order: Vec<(NodeId, NodeId)>,
}

impl CallGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, or return the id of the existing node with that signature.
    ///
    /// Metadata of an existing node is left untouched.
    pub fn add_node(&mut self, node: MethodNode) -> NodeId {
        if let Some(&id) = self.index.get(&node.signature) {
            trace!("Node {} already present as #{id}", node.signature);
            return id;
        }
        let id = self.nodes.len();
        debug!("Adding node: id={id}, signature={}, layer={}", node.signature, node.layer);
        self.index.insert(node.signature.clone(), id);
        self.nodes.push(node);
        self.adjacency_out.push(Vec::new());
        self.adjacency_in.push(Vec::new());
        id
    }

    /// Add a caller → callee edge.
    ///
    /// Returns `true` when the edge is new.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if either id is unknown.
    pub fn add_edge(&mut self, caller: NodeId, callee: NodeId) -> Result<bool> {
        self.node(caller)?;
        self.node(callee)?;
        if !self.edge_set.insert((caller, callee)) {
            trace!("Edge #{caller} -> #{callee} already present");
            return Ok(false);
        }
        debug!("Adding edge: #{caller} -> #{callee}");
        self.adjacency_out[caller].push(callee);
        self.adjacency_in[callee].push(caller);
        self.edge_order.push((caller, callee));
        Ok(true)
    }

    /// Get a node by id.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node doesn't exist.
    pub fn node(&self, id: NodeId) -> Result<&MethodNode> {
        self.nodes.get(id).ok_or_else(|| GraphError::missing_id(id))
    }

    /// Id of the node with the given signature.
    pub fn node_id(&self, signature: &str) -> Option<NodeId> {
        self.index.get(signature).copied()
    }

    /// Node with the given signature.
    pub fn node_by_signature(&self, signature: &str) -> Option<&MethodNode> {
        self.node_id(signature).map(|id| &self.nodes[id])
    }

    /// Whether a node with this signature exists.
    pub fn contains(&self, signature: &str) -> bool {
        self.index.contains_key(signature)
    }

    /// Whether the caller → callee edge exists (by signature).
    pub fn has_edge(&self, caller: &str, callee: &str) -> bool {
        match (self.node_id(caller), self.node_id(callee)) {
            (Some(a), Some(b)) => self.edge_set.contains(&(a, b)),
            _ => false,
        }
    }

    /// Neighbors of a node in edge-insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node doesn't exist.
    pub fn get_neighbors(&self, id: NodeId, direction: Direction) -> Result<&[NodeId]> {
        self.node(id)?;
        Ok(match direction {
            Direction::Outgoing => &self.adjacency_out[id],
            Direction::Incoming => &self.adjacency_in[id],
        })
    }

    /// Callees of a node; empty for unknown ids.
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        self.adjacency_out.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Callers of a node; empty for unknown ids.
    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        self.adjacency_in.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.edge_order.len()
    }

    /// True when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &MethodNode)> {
        self.nodes.iter().enumerate()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.edge_order.iter().copied()
    }

    /// All edges as signature pairs, sorted lexicographically.
    pub fn sorted_edges(&self) -> Vec<(String, String)> {
        let mut edges: Vec<_> = self
            .edge_order
            .iter()
            .map(|&(a, b)| (self.nodes[a].signature.clone(), self.nodes[b].signature.clone()))
            .collect();
        edges.sort();
        edges
    }

    /// All signatures, sorted lexicographically.
    pub fn sorted_signatures(&self) -> Vec<String> {
        let mut sigs: Vec<_> = self.nodes.iter().map(|n| n.signature.clone()).collect();
        sigs.sort();
        sigs
    }

    /// Signatures of a list of ids.
    pub fn signatures(&self, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .filter_map(|&id| self.nodes.get(id))
            .map(|n| n.signature.clone())
            .collect()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        debug!("Clearing call graph ({} nodes)", self.nodes.len());
        *self = Self::default();
    }

    // ===== Algorithm shortcuts =====

    /// Enumerate call chains starting at `start`, bounded by `max_depth`.
    ///
    /// See [`algorithms::enumerate_chains`].
    pub fn call_chains(&self, start: NodeId, max_depth: usize) -> Result<Vec<CallChain>> {
        algorithms::enumerate_chains(self, start, max_depth)
    }

    /// Build the call tree rooted at `root`.
    ///
    /// See [`algorithms::build_tree`].
    pub fn call_tree(&self, root: NodeId, max_depth: usize) -> Result<CallTreeNode> {
        algorithms::build_tree(self, root, max_depth)
    }

    /// Strongly connected components with more than one node.
    pub fn find_strongly_connected_components(&self) -> Vec<Vec<NodeId>> {
        algorithms::find_strongly_connected_components(self)
    }

    /// One concrete cycle per multi-node component, as signatures.
    pub fn circular_references(&self) -> Vec<Vec<String>> {
        algorithms::circular_references(self)
    }

    /// Preorder walk in `direction`, bounded by `max_depth`.
    ///
    /// See [`algorithms::walk`].
    pub fn walk(&self, start: NodeId, direction: Direction, max_depth: usize) -> Result<Vec<NodeId>> {
        algorithms::walk(self, start, direction, max_depth)
    }

    /// Export the graph to deterministic JSON.
    pub fn export_json(&self) -> Result<String> {
        crate::export::export_json(self)
    }
}
