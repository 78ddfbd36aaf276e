//! Core graph types: node ids, layers, nodes, chains and trees.

use serde::{Deserialize, Serialize};

/// Dense index of a node inside a [`CallGraph`](super::CallGraph).
pub type NodeId = usize;

/// Architectural tier of a method.
///
/// `Unknown` is the bottom value; classification never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Layer {
    /// Request handlers
    Controller,
    /// Business logic
    Service,
    /// MyBatis-style mapper interfaces
    Mapper,
    /// JPA/Spring Data repositories
    Repository,
    /// Hand-written data access objects
    #[serde(rename = "DAO")]
    Dao,
    /// Persistent entities and domain models
    Entity,
    /// No rule matched
    #[default]
    Unknown,
}

impl Layer {
    /// Canonical name, as used in reports and layer-file keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Controller => "Controller",
            Layer::Service => "Service",
            Layer::Mapper => "Mapper",
            Layer::Repository => "Repository",
            Layer::Dao => "DAO",
            Layer::Entity => "Entity",
            Layer::Unknown => "Unknown",
        }
    }

    /// True for every layer except `Unknown`
    pub fn is_known(&self) -> bool {
        *self != Layer::Unknown
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Layer {
    type Err = std::convert::Infallible;

    /// Case-insensitive; anything unrecognized maps to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "controller" => Layer::Controller,
            "service" => Layer::Service,
            "mapper" => Layer::Mapper,
            "repository" => Layer::Repository,
            "dao" => Layer::Dao,
            "entity" => Layer::Entity,
            _ => Layer::Unknown,
        })
    }
}

/// Direction for neighbor queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Follow caller → callee edges
    Outgoing,
    /// Follow callee → caller edges
    Incoming,
}

/// A method node of the call graph.
///
/// Unresolved callees still get a node, with empty class and file and
/// layer `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodNode {
    /// `ClassName.methodName`, the node key
    pub signature: String,
    /// Simple name of the declaring class ("" when unresolved)
    pub class_name: String,
    /// Source file of the declaring class ("" when unresolved)
    pub file_path: String,
    /// Classified layer
    pub layer: Layer,
}

impl MethodNode {
    /// Create a node with full metadata.
    pub fn new(
        signature: impl Into<String>,
        class_name: impl Into<String>,
        file_path: impl Into<String>,
        layer: Layer,
    ) -> Self {
        Self {
            signature: signature.into(),
            class_name: class_name.into(),
            file_path: file_path.into(),
            layer,
        }
    }

    /// Create a node for a signature with no known declaration.
    pub fn unresolved(signature: impl Into<String>) -> Self {
        Self::new(signature, "", "", Layer::Unknown)
    }

    /// Method-name part of the signature
    pub fn method_name(&self) -> &str {
        self.signature
            .rsplit('.')
            .next()
            .unwrap_or(self.signature.as_str())
    }
}

/// One enumerated path from a start node to a leaf or to a repeated node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallChain {
    /// Signatures in call order
    pub chain: Vec<String>,
    /// Layer of each signature in `chain`
    pub layers: Vec<Layer>,
    /// The last signature already appeared earlier on the path
    pub is_circular: bool,
}

impl CallChain {
    /// Number of signatures on the chain
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// True for an empty chain
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

/// Nested call tree rooted at one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTreeNode {
    /// Signature of this node
    pub method_signature: String,
    /// Layer of this node
    pub layer: Layer,
    /// Marked leaf: this signature is already on the path from the root
    pub is_circular: bool,
    /// Declaring class, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Declaring file, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Callees in edge order
    pub children: Vec<CallTreeNode>,
}

impl CallTreeNode {
    /// Total number of nodes in this subtree
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CallTreeNode::size).sum::<usize>()
    }

    /// Depth of this subtree (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(CallTreeNode::depth).max().unwrap_or(0)
    }
}
