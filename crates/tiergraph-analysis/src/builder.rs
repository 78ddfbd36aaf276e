//! Call graph construction and queries.
//!
//! A build takes the complete set of extracted classes, resolves every call
//! site to a `ClassName.methodName` signature, classifies layers and detects
//! endpoints. Each build replaces all previous state.
//!
//! Call-site resolution for `receiver.method`:
//! - receiver is a field of the calling class: use the field's type;
//! - else receiver is a parameter or local: use the variable's type;
//! - else keep the call-site text verbatim (static call, unknown object).
//!
//! A bare `method` call resolves to the calling class.

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tiergraph::{CallChain, CallGraph, CallTreeNode, Layer, MethodNode};
use tiergraph_parser_api::{base_type, ClassRecord, FileInfo, MethodRecord, ProjectInfo, SourceExtractor};

use crate::endpoint::{identify_endpoints, Endpoint};
use crate::error::Result;
use crate::layer::classify_layer;
use crate::type_index::TypeIndex;

/// Metadata recorded for every declared method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMetadata {
    pub class_name: String,
    pub file_path: String,
    pub package: String,
    pub annotations: Vec<String>,
    pub layer: Layer,
}

/// One resolved call with the files of both ends
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallRelation {
    pub caller: String,
    pub callee: String,
    pub caller_file: String,
    pub callee_file: String,
}

/// Call tree of one endpoint; the endpoint sits next to the root's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointCallTree {
    #[serde(flatten)]
    pub tree: CallTreeNode,
    pub endpoint: Endpoint,
}

#[derive(Debug)]
struct BuildState {
    graph: CallGraph,
    types: TypeIndex,
    metadata: HashMap<String, MethodMetadata>,
    endpoints: Vec<Endpoint>,
    skipped_files: Vec<(PathBuf, String)>,
    degraded_files: Vec<PathBuf>,
}

/// Builds and queries the method-level call graph.
#[derive(Debug, Default)]
pub struct CallGraphBuilder {
    state: Option<BuildState>,
}

impl CallGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract `paths` with `extractor` and build the graph.
    ///
    /// Files that fail to extract are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only when the extractor cannot run at all.
    pub fn build(&mut self, extractor: &dyn SourceExtractor, paths: &[PathBuf]) -> Result<&CallGraph> {
        let project = extractor.parse_files(paths)?;
        Ok(self.build_from_project(project))
    }

    /// Build from an extracted project, keeping its skipped-file list.
    pub fn build_from_project(&mut self, project: ProjectInfo) -> &CallGraph {
        for (path, reason) in &project.failed_files {
            warn!("Skipping {}: {reason}", path.display());
        }
        let ProjectInfo {
            files,
            failed_files,
            degraded_files,
            ..
        } = project;
        self.build_state(files, failed_files, degraded_files)
    }

    /// Build from already extracted files.
    pub fn build_from_parsed(&mut self, files: Vec<FileInfo>) -> &CallGraph {
        self.build_state(files, Vec::new(), Vec::new())
    }

    fn build_state(
        &mut self,
        files: Vec<FileInfo>,
        skipped_files: Vec<(PathBuf, String)>,
        degraded_files: Vec<PathBuf>,
    ) -> &CallGraph {
        let types = TypeIndex::from_files(&files);
        let metadata = collect_metadata(&types);
        let graph = assemble_graph(&types, &metadata);
        let endpoints = identify_endpoints(types.classes());

        info!(
            "Built call graph: {} nodes, {} edges, {} endpoints from {} classes ({} files skipped)",
            graph.node_count(),
            graph.edge_count(),
            endpoints.len(),
            types.len(),
            skipped_files.len()
        );

        let state = self.state.insert(BuildState {
            graph,
            types,
            metadata,
            endpoints,
            skipped_files,
            degraded_files,
        });
        &state.graph
    }

    fn built(&self, query: &str) -> Option<&BuildState> {
        if self.state.is_none() {
            error!("Call graph has not been built; call build() before {query}()");
        }
        self.state.as_ref()
    }

    pub fn is_built(&self) -> bool {
        self.state.is_some()
    }

    /// The graph of the last build
    pub fn graph(&self) -> Option<&CallGraph> {
        self.state.as_ref().map(|s| &s.graph)
    }

    /// Class index of the last build
    pub fn type_index(&self) -> Option<&TypeIndex> {
        self.state.as_ref().map(|s| &s.types)
    }

    /// Endpoints of the last build, in class and method order
    pub fn endpoints(&self) -> &[Endpoint] {
        self.state.as_ref().map(|s| s.endpoints.as_slice()).unwrap_or(&[])
    }

    /// Files that failed to extract in the last build
    pub fn skipped_files(&self) -> &[(PathBuf, String)] {
        self.state
            .as_ref()
            .map(|s| s.skipped_files.as_slice())
            .unwrap_or(&[])
    }

    /// Files recovered only by the pattern scanner in the last build
    pub fn degraded_files(&self) -> &[PathBuf] {
        self.state
            .as_ref()
            .map(|s| s.degraded_files.as_slice())
            .unwrap_or(&[])
    }

    /// Call chains from one endpoint, or from every endpoint when `None`.
    ///
    /// Endpoints whose method never appears in a call are skipped.
    pub fn call_chains(&self, endpoint: Option<&Endpoint>, max_depth: usize) -> Vec<CallChain> {
        let Some(state) = self.built("call_chains") else {
            return Vec::new();
        };

        let starts: Vec<&str> = match endpoint {
            Some(ep) => vec![ep.method_signature.as_str()],
            None => state
                .endpoints
                .iter()
                .map(|ep| ep.method_signature.as_str())
                .collect(),
        };

        let mut chains = Vec::new();
        for start in starts {
            let Some(id) = state.graph.node_id(start) else {
                debug!("Endpoint {start} has no calls; no chains");
                continue;
            };
            match state.graph.call_chains(id, max_depth) {
                Ok(found) => chains.extend(found),
                Err(e) => warn!("Chain enumeration from {start} failed: {e}"),
            }
        }
        chains
    }

    /// Nested call tree rooted at an endpoint's method.
    pub fn call_tree(&self, endpoint: &Endpoint, max_depth: usize) -> Option<EndpointCallTree> {
        let state = self.built("call_tree")?;
        let Some(root) = state.graph.node_id(&endpoint.method_signature) else {
            warn!("Endpoint {} is not in the call graph", endpoint.method_signature);
            return None;
        };
        match state.graph.call_tree(root, max_depth) {
            Ok(tree) => Some(EndpointCallTree {
                tree,
                endpoint: endpoint.clone(),
            }),
            Err(e) => {
                warn!("Call tree for {} failed: {e}", endpoint.method_signature);
                None
            }
        }
    }

    /// Call trees of every endpoint that appears in the graph.
    pub fn call_trees(&self, max_depth: usize) -> Vec<EndpointCallTree> {
        if self.built("call_trees").is_none() {
            return Vec::new();
        }
        self.endpoints()
            .iter()
            .filter_map(|ep| self.call_tree(ep, max_depth))
            .collect()
    }

    /// One concrete cycle per strongly connected component with more than one method.
    pub fn detect_circular_references(&self) -> Vec<Vec<String>> {
        match self.built("detect_circular_references") {
            Some(state) => state.graph.circular_references(),
            None => Vec::new(),
        }
    }

    /// Every edge with the files of both ends, sorted.
    pub fn call_relations(&self) -> Vec<CallRelation> {
        let Some(state) = self.built("call_relations") else {
            return Vec::new();
        };
        let file_of = |signature: &str| {
            state
                .metadata
                .get(signature)
                .map(|m| m.file_path.clone())
                .or_else(|| state.graph.node_by_signature(signature).map(|n| n.file_path.clone()))
                .unwrap_or_default()
        };
        let mut relations: Vec<CallRelation> = state
            .graph
            .sorted_edges()
            .into_iter()
            .map(|(caller, callee)| CallRelation {
                caller_file: file_of(&caller),
                callee_file: file_of(&callee),
                caller,
                callee,
            })
            .collect();
        relations.sort();
        relations
    }

    /// Classes declared in `file_path`
    pub fn classes_for_file(&self, file_path: &str) -> Vec<&ClassRecord> {
        self.built("classes_for_file")
            .map(|s| s.types.classes_in_file(file_path))
            .unwrap_or_default()
    }

    /// Every parsed file with its classes, sorted by path
    pub fn all_parsed_classes(&self) -> BTreeMap<&str, Vec<&ClassRecord>> {
        self.built("all_parsed_classes")
            .map(|s| s.types.files().collect())
            .unwrap_or_default()
    }

    /// Class by simple or qualified name
    pub fn class_by_name(&self, name: &str) -> Option<&ClassRecord> {
        self.built("class_by_name")?.types.resolve(name, None)
    }

    /// Layer of a signature; `Unknown` when it is not a known method or node.
    pub fn layer_of(&self, signature: &str) -> Layer {
        let Some(state) = self.built("layer_of") else {
            return Layer::Unknown;
        };
        state
            .metadata
            .get(signature)
            .map(|m| m.layer)
            .or_else(|| state.graph.node_by_signature(signature).map(|n| n.layer))
            .unwrap_or_default()
    }

    pub fn method_metadata(&self, signature: &str) -> Option<&MethodMetadata> {
        self.built("method_metadata")?.metadata.get(signature)
    }

    /// Deterministic JSON snapshot of the graph (empty before a build).
    pub fn export_json(&self) -> Result<String> {
        match self.built("export_json") {
            Some(state) => Ok(state.graph.export_json()?),
            None => Ok(CallGraph::new().export_json()?),
        }
    }
}

/// Resolve every call site and add one edge per (caller, callee) pair.
fn assemble_graph(types: &TypeIndex, metadata: &HashMap<String, MethodMetadata>) -> CallGraph {
    let mut resolved_classes: HashMap<String, &ClassRecord> = HashMap::new();
    let mut relations = Vec::new();

    for class in types.classes() {
        let fields = field_types(class);
        for method in &class.methods {
            let caller = format!("{}.{}", class.name, method.name);
            let variables = variable_types(method);
            for call in &method.method_calls {
                let (callee, target) = resolve_call(types, class, &fields, &variables, call);
                debug!("{caller}: {call} -> {callee}");
                if let Some(target) = target {
                    resolved_classes.entry(callee.clone()).or_insert(target);
                }
                relations.push((caller.clone(), callee));
            }
        }
    }

    // Declared methods use their own metadata; undeclared methods of a
    // resolved class fall back to that class
    let node_for = |signature: &str| -> MethodNode {
        if let Some(meta) = metadata.get(signature) {
            MethodNode::new(signature, &meta.class_name, &meta.file_path, meta.layer)
        } else if let Some(class) = resolved_classes.get(signature) {
            MethodNode::new(
                signature,
                &class.name,
                &class.file_path,
                classify_layer(class, None),
            )
        } else {
            MethodNode::unresolved(signature)
        }
    };

    let mut graph = CallGraph::new();
    for (caller, callee) in &relations {
        let from = graph.add_node(node_for(caller));
        let to = graph.add_node(node_for(callee));
        if let Err(e) = graph.add_edge(from, to) {
            error!("Failed to add edge {caller} -> {callee}: {e}");
        }
    }
    graph
}

/// Metadata per signature; with overloads or duplicate class names the last declaration wins.
fn collect_metadata(types: &TypeIndex) -> HashMap<String, MethodMetadata> {
    let mut metadata = HashMap::new();
    for class in types.classes() {
        for method in &class.methods {
            metadata.insert(
                format!("{}.{}", class.name, method.name),
                MethodMetadata {
                    class_name: class.name.clone(),
                    file_path: class.file_path.clone(),
                    package: class.package.clone(),
                    annotations: method.annotations.clone(),
                    layer: classify_layer(class, Some(method)),
                },
            );
        }
    }
    metadata
}

fn field_types(class: &ClassRecord) -> HashMap<&str, &str> {
    class
        .fields
        .iter()
        .filter(|f| !f.name.is_empty() && !f.field_type.is_empty())
        .map(|f| (f.name.as_str(), base_type(&f.field_type)))
        .collect()
}

/// Parameters, then locals; a later declaration of the same name wins.
fn variable_types(method: &MethodRecord) -> HashMap<&str, &str> {
    let params = method
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.param_type.as_str()));
    let locals = method
        .local_variables
        .iter()
        .map(|l| (l.name.as_str(), l.var_type.as_str()));
    params
        .chain(locals)
        .filter(|(name, ty)| !name.is_empty() && !ty.is_empty())
        .map(|(name, ty)| (name, base_type(ty)))
        .collect()
}

/// Resolve one call site to a callee signature and, when known, its class.
fn resolve_call<'a>(
    types: &'a TypeIndex,
    class: &'a ClassRecord,
    fields: &HashMap<&str, &str>,
    variables: &HashMap<&str, &str>,
    call: &str,
) -> (String, Option<&'a ClassRecord>) {
    let Some((receiver, _)) = call.split_once('.') else {
        return (format!("{}.{call}", class.name), Some(class));
    };
    let method_name = call.rsplit('.').next().unwrap_or(call);

    let Some(declared) = fields.get(receiver).or_else(|| variables.get(receiver)) else {
        return (call.to_string(), None);
    };

    match types.resolve(declared, Some(class)) {
        Some(target) => (format!("{}.{method_name}", target.name), Some(target)),
        None => (format!("{declared}.{method_name}"), None),
    }
}
