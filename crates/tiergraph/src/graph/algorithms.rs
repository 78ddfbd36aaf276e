//! Graph traversal and analysis algorithms.
//!
//! Provides Tarjan's SCC, cycle recovery, bounded call-chain enumeration, call
//! tree construction and bounded walks. Every traversal uses an explicit stack
//! so deep or adversarial graphs cannot overflow the thread stack.

use crate::error::{GraphError, Result};
use crate::graph::{CallChain, CallGraph, CallTreeNode, Direction, NodeId};
use log::trace;
use std::collections::{HashMap, HashSet, VecDeque};

/// Find all strongly connected components using Tarjan's algorithm.
///
/// A strongly connected component is a maximal set of nodes where every node
/// is reachable from every other node. Only components with more than one node
/// are returned; in a call graph these are mutual-recursion cycles.
pub fn find_strongly_connected_components(graph: &CallGraph) -> Vec<Vec<NodeId>> {
    let n = graph.node_count();
    let mut index = 0usize;
    let mut indices: Vec<Option<usize>> = vec![None; n];
    let mut lowlinks = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<NodeId> = Vec::new();
    let mut sccs = Vec::new();

    // (node, next successor position)
    let mut call_stack: Vec<(NodeId, usize)> = Vec::new();

    for root in 0..n {
        if indices[root].is_some() {
            continue;
        }
        call_stack.push((root, 0));

        while let Some(&(v, pos)) = call_stack.last() {
            if pos == 0 && indices[v].is_none() {
                indices[v] = Some(index);
                lowlinks[v] = index;
                index += 1;
                stack.push(v);
                on_stack[v] = true;
            }

            let successors = graph.successors(v);
            if pos < successors.len() {
                let w = successors[pos];
                if let Some(top) = call_stack.last_mut() {
                    top.1 += 1;
                }
                match indices[w] {
                    None => call_stack.push((w, 0)),
                    Some(w_index) if on_stack[w] => {
                        lowlinks[v] = lowlinks[v].min(w_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            // All successors done: close v
            call_stack.pop();
            if let Some(&(parent, _)) = call_stack.last() {
                lowlinks[parent] = lowlinks[parent].min(lowlinks[v]);
            }

            if Some(lowlinks[v]) == indices[v] {
                let mut scc = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    scc.push(w);
                    if w == v {
                        break;
                    }
                }
                sccs.push(scc);
            }
        }
    }

    // Filter to only return SCCs with more than one node (actual cycles)
    sccs.into_iter().filter(|scc| scc.len() > 1).collect()
}

/// Recover one concrete cycle through `start` inside `component`.
///
/// Returns the path `[start, .., start]`. Breadth-first over the component's
/// internal edges, so the cycle is a shortest one through `start`.
pub fn find_cycle(graph: &CallGraph, component: &[NodeId], start: NodeId) -> Option<Vec<NodeId>> {
    let members: HashSet<NodeId> = component.iter().copied().collect();
    if !members.contains(&start) {
        return None;
    }

    let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for &next in graph.successors(current) {
            if !members.contains(&next) {
                continue;
            }
            if next == start {
                let mut back = Vec::new();
                let mut cursor = current;
                while cursor != start {
                    back.push(cursor);
                    cursor = parent[&cursor];
                }
                let mut cycle = Vec::with_capacity(back.len() + 2);
                cycle.push(start);
                cycle.extend(back.into_iter().rev());
                cycle.push(start);
                return Some(cycle);
            }
            if let std::collections::hash_map::Entry::Vacant(slot) = parent.entry(next) {
                slot.insert(current);
                queue.push_back(next);
            }
        }
    }
    None
}

/// One cycle per multi-node strongly connected component, as signatures.
///
/// The cycle starts at the lexicographically smallest signature of its
/// component; components are ordered by that signature.
pub fn circular_references(graph: &CallGraph) -> Vec<Vec<String>> {
    let mut cycles = Vec::new();
    for component in find_strongly_connected_components(graph) {
        let start = component
            .iter()
            .copied()
            .min_by(|&a, &b| {
                let sa = graph.node(a).map(|n| n.signature.as_str()).unwrap_or("");
                let sb = graph.node(b).map(|n| n.signature.as_str()).unwrap_or("");
                sa.cmp(sb)
            });
        if let Some(start) = start {
            if let Some(cycle) = find_cycle(graph, &component, start) {
                trace!("Cycle through #{start}: {} hops", cycle.len() - 1);
                cycles.push(graph.signatures(&cycle));
            }
        }
    }
    cycles.sort();
    cycles
}

enum ChainFrame {
    Enter(NodeId, usize),
    Exit,
}

/// Enumerate call chains from `start`.
///
/// Depth-first with an explicit path stack:
/// - a node deeper than `max_depth` is dropped without emitting a chain;
/// - a node already on the live path emits a circular chain `path + [node]`;
/// - a path prefix seen before in this run is abandoned;
/// - a node without callees emits the current path;
/// - otherwise each callee is explored in edge order.
///
/// # Errors
///
/// Returns [`GraphError::NodeNotFound`](crate::GraphError::NodeNotFound) if
/// `start` is not in the graph.
pub fn enumerate_chains(graph: &CallGraph, start: NodeId, max_depth: usize) -> Result<Vec<CallChain>> {
    graph.node(start)?;

    let mut chains = Vec::new();
    let mut path: Vec<NodeId> = Vec::new();
    let mut on_path: HashSet<NodeId> = HashSet::new();
    let mut visited_paths: HashSet<Vec<NodeId>> = HashSet::new();
    let mut stack = vec![ChainFrame::Enter(start, 0)];

    while let Some(frame) = stack.pop() {
        match frame {
            ChainFrame::Exit => {
                if let Some(node) = path.pop() {
                    on_path.remove(&node);
                }
            }
            ChainFrame::Enter(node, depth) => {
                if depth > max_depth {
                    trace!("Depth bound reached at #{node}");
                    continue;
                }

                if on_path.contains(&node) {
                    let mut ids = path.clone();
                    ids.push(node);
                    chains.push(to_chain(graph, &ids, true));
                    continue;
                }

                path.push(node);
                if !visited_paths.insert(path.clone()) {
                    path.pop();
                    continue;
                }
                on_path.insert(node);
                stack.push(ChainFrame::Exit);

                let successors = graph.successors(node);
                if successors.is_empty() {
                    chains.push(to_chain(graph, &path, false));
                } else {
                    for &next in successors.iter().rev() {
                        stack.push(ChainFrame::Enter(next, depth + 1));
                    }
                }
            }
        }
    }

    Ok(chains)
}

fn to_chain(graph: &CallGraph, ids: &[NodeId], is_circular: bool) -> CallChain {
    let mut chain = Vec::with_capacity(ids.len());
    let mut layers = Vec::with_capacity(ids.len());
    for &id in ids {
        if let Ok(node) = graph.node(id) {
            chain.push(node.signature.clone());
            layers.push(node.layer);
        }
    }
    CallChain {
        chain,
        layers,
        is_circular,
    }
}

struct TreeFrame {
    id: NodeId,
    depth: usize,
    next_child: usize,
    node: CallTreeNode,
}

/// Build the nested call tree rooted at `root`.
///
/// A callee already on the path from the root becomes a leaf marked
/// `is_circular`; its subtree is not expanded. Callees deeper than
/// `max_depth` are omitted.
///
/// # Errors
///
/// Returns [`GraphError::NodeNotFound`](crate::GraphError::NodeNotFound) if
/// `root` is not in the graph.
pub fn build_tree(graph: &CallGraph, root: NodeId, max_depth: usize) -> Result<CallTreeNode> {
    let root_node = tree_node(graph, root, false)?;
    let mut on_path: HashSet<NodeId> = HashSet::new();
    on_path.insert(root);
    let mut stack = vec![TreeFrame {
        id: root,
        depth: 0,
        next_child: 0,
        node: root_node,
    }];

    while let Some(top) = stack.last_mut() {
        let successors = graph.successors(top.id);
        if top.next_child < successors.len() {
            let child = successors[top.next_child];
            top.next_child += 1;
            let depth = top.depth + 1;
            if depth > max_depth {
                continue;
            }
            if on_path.contains(&child) {
                top.node.children.push(tree_node(graph, child, true)?);
                continue;
            }
            on_path.insert(child);
            let node = tree_node(graph, child, false)?;
            stack.push(TreeFrame {
                id: child,
                depth,
                next_child: 0,
                node,
            });
            continue;
        }

        // Children exhausted: attach to parent or finish
        let Some(finished) = stack.pop() else { break };
        on_path.remove(&finished.id);
        match stack.last_mut() {
            Some(parent) => parent.node.children.push(finished.node),
            None => return Ok(finished.node),
        }
    }

    Err(GraphError::InvalidOperation {
        message: format!("call tree for #{root} ended without a root"),
    })
}

fn tree_node(graph: &CallGraph, id: NodeId, is_circular: bool) -> Result<CallTreeNode> {
    let node = graph.node(id)?;
    let known = !node.class_name.is_empty() || !node.file_path.is_empty();
    Ok(CallTreeNode {
        method_signature: node.signature.clone(),
        layer: node.layer,
        is_circular,
        class_name: if known && !is_circular { Some(node.class_name.clone()) } else { None },
        file_path: if known && !is_circular { Some(node.file_path.clone()) } else { None },
        children: Vec::new(),
    })
}

/// Preorder walk from `start` following `direction`.
///
/// The start node is included. Nodes deeper than `max_depth` are not visited;
/// each node is visited at most once (global visited set).
///
/// # Errors
///
/// Returns [`GraphError::NodeNotFound`](crate::GraphError::NodeNotFound) if
/// `start` is not in the graph.
pub fn walk(graph: &CallGraph, start: NodeId, direction: Direction, max_depth: usize) -> Result<Vec<NodeId>> {
    graph.node(start)?;

    let mut visited = HashSet::new();
    let mut stack = vec![(start, 0usize)];
    let mut result = Vec::new();

    while let Some((current, depth)) = stack.pop() {
        if depth > max_depth || !visited.insert(current) {
            continue;
        }
        result.push(current);

        let neighbors = graph.get_neighbors(current, direction)?;
        for &next in neighbors.iter().rev() {
            if !visited.contains(&next) {
                stack.push((next, depth + 1));
            }
        }
    }

    Ok(result)
}
