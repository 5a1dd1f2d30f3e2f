//! Data Models
//!
//! - [`node`] - `Node`, `NodeType` and the nested/related shapes
//! - [`validation`] - raw request bodies and their typed, validated forms

pub mod node;
pub mod validation;

pub use node::{
    NewNode, Node, NodeId, NodePatch, NodeTree, NodeType, NodeWithRelations, UnknownNodeType,
    DEFAULT_COLOR, MAX_NAME_LENGTH, ROOT_NODE_NAME,
};
pub use validation::{
    parse_node_id, CreateNodeInput, CreateNodeRequest, DeleteOption, MoveNodeInput, MoveOption,
    UpdateNodeValueInput, UpdateNodeValueRequest, ValidationError,
};
