//! Node Data Structures
//!
//! This module defines the `Node` struct and the related shapes used to move
//! organization hierarchy entries between the store, the engine and the wire.
//!
//! # Shapes
//!
//! - [`Node`] - flat record, exactly what the store persists
//! - [`NodeWithRelations`] - a node plus its parent and direct children
//! - [`NodeTree`] - a node with its nested children, used for the forest listing
//!
//! # Examples
//!
//! ```rust
//! use orgtree_core::models::{Node, NodeType};
//!
//! let node = Node {
//!     id: 7,
//!     name: "West".to_string(),
//!     node_type: NodeType::Location,
//!     color: "#F6AF8E".to_string(),
//!     parent_id: Some(1),
//! };
//! assert!(node.node_type.is_color_source());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Store-assigned node identifier
pub type NodeId = i64;

/// Color of any node without a LOCATION/DEPARTMENT ancestor
pub const DEFAULT_COLOR: &str = "#FFFFFF";

/// Name given to the synthetic root created for parent-less inserts
pub const ROOT_NODE_NAME: &str = "Root Node";

/// Maximum length of a node name (matches the `name` column width)
pub const MAX_NAME_LENGTH: usize = 100;

/// Kind of hierarchy entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Location,
    Department,
    Employee,
    Organization,
}

impl NodeType {
    /// All variants in wire order
    pub const ALL: [NodeType; 4] = [
        NodeType::Location,
        NodeType::Department,
        NodeType::Employee,
        NodeType::Organization,
    ];

    /// Whether nodes of this type own an authoritative color drawn from the pool.
    ///
    /// Every other type inherits the color of its nearest color-source ancestor.
    pub fn is_color_source(self) -> bool {
        matches!(self, NodeType::Location | NodeType::Department)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Location => "LOCATION",
            NodeType::Department => "DEPARTMENT",
            NodeType::Employee => "EMPLOYEE",
            NodeType::Organization => "ORGANIZATION",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the four node types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown node type '{0}'")]
pub struct UnknownNodeType(pub String);

impl FromStr for NodeType {
    type Err = UnknownNodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownNodeType(s.to_string()))
    }
}

/// A single organization hierarchy entry.
///
/// The `parent_id` edge defines the tree shape; children are never stored on
/// the node itself and are computed by the store on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Store-assigned identifier, immutable after creation
    pub id: NodeId,

    /// Display name (non-empty)
    pub name: String,

    /// Node type, serialized as `type`
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// `#RRGGBB` color, authoritative for color sources, inherited otherwise
    pub color: String,

    /// Owning parent, `None` only for roots
    pub parent_id: Option<NodeId>,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Fields for a node that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
    pub name: String,
    pub node_type: NodeType,
    pub color: String,
    pub parent_id: Option<NodeId>,
}

impl NewNode {
    /// The synthetic ORGANIZATION root used when a create has no parent
    pub fn implicit_root() -> Self {
        Self {
            name: ROOT_NODE_NAME.to_string(),
            node_type: NodeType::Organization,
            color: DEFAULT_COLOR.to_string(),
            parent_id: None,
        }
    }
}

/// Column-level change to a stored node
///
/// `None` leaves the stored value alone, so concurrent writers touching
/// other columns are not overwritten. `parent_id: Some(None)` detaches the
/// node into a root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePatch {
    pub name: Option<String>,
    pub node_type: Option<NodeType>,
    pub color: Option<String>,
    pub parent_id: Option<Option<NodeId>>,
}

impl NodePatch {
    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Self::default()
        }
    }

    pub fn parent(parent_id: Option<NodeId>) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.node_type.is_none()
            && self.color.is_none()
            && self.parent_id.is_none()
    }

    /// `node` with this patch applied
    pub fn apply_to(&self, mut node: Node) -> Node {
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(node_type) = self.node_type {
            node.node_type = node_type;
        }
        if let Some(color) = &self.color {
            node.color = color.clone();
        }
        if let Some(parent_id) = self.parent_id {
            node.parent_id = parent_id;
        }
        node
    }
}

/// A node loaded together with its parent and direct children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeWithRelations {
    pub node: Node,
    pub parent: Option<Node>,
    pub children: Vec<Node>,
}

/// A node with its full nested subtree
///
/// Serializes flat: the node's own fields plus a `children` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTree {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<NodeTree>,
}

impl NodeTree {
    pub fn leaf(node: Node) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this tree, including the root
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(NodeTree::size).sum::<usize>()
    }

    /// Depth-first search for a node by id
    pub fn find(&self, id: NodeId) -> Option<&NodeTree> {
        if self.node.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Assemble nested trees from a flat node list
    ///
    /// Roots and siblings keep the order they have in `nodes`. Nodes whose
    /// parent is not in the list are dropped.
    pub fn build_forest(nodes: Vec<Node>) -> Vec<NodeTree> {
        let mut by_parent: HashMap<Option<NodeId>, Vec<Node>> = HashMap::new();
        for node in nodes {
            by_parent.entry(node.parent_id).or_default().push(node);
        }

        fn attach(node: Node, by_parent: &mut HashMap<Option<NodeId>, Vec<Node>>) -> NodeTree {
            let children = by_parent
                .remove(&Some(node.id))
                .unwrap_or_default()
                .into_iter()
                .map(|child| attach(child, by_parent))
                .collect();
            NodeTree { node, children }
        }

        let roots = by_parent.remove(&None).unwrap_or_default();
        roots
            .into_iter()
            .map(|root| attach(root, &mut by_parent))
            .collect()
    }

    /// Pre-order flat listing of a forest; inverse of [`NodeTree::build_forest`]
    pub fn flatten_forest(forest: &[NodeTree]) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut stack: Vec<&NodeTree> = forest.iter().rev().collect();
        while let Some(tree) = stack.pop() {
            nodes.push(tree.node.clone());
            stack.extend(tree.children.iter().rev());
        }
        nodes
    }
}
