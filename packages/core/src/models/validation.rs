//! Input validation
//!
//! Raw request bodies arrive as loosely typed JSON (`parentId` may be a number
//! or a numeric string, any field may be missing). This module turns them into
//! the typed requests consumed by [`crate::services::NodeService`] and rejects
//! malformed input before it reaches the engine.

use crate::models::node::{NodeId, NodeType, MAX_NAME_LENGTH};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Validation errors for node requests
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Node name must not be empty")]
    EmptyName,

    #[error("Node name is {len} characters long, maximum is {max}")]
    NameTooLong { len: usize, max: usize },

    #[error("Invalid node type: {0}")]
    InvalidNodeType(String),

    #[error("Invalid {field}: {value} is not a positive integer id")]
    InvalidId { field: &'static str, value: String },

    #[error("Invalid {field}: '{value}' (expected one of {expected})")]
    InvalidOption {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// How a re-parenting request treats the node's existing children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveOption {
    /// The whole subtree follows the node
    Move,
    /// The node's direct children stay behind under its former parent
    Shift,
}

impl MoveOption {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveOption::Move => "move",
            MoveOption::Shift => "shift",
        }
    }
}

impl fmt::Display for MoveOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoveOption {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "move" => Ok(MoveOption::Move),
            "shift" => Ok(MoveOption::Shift),
            other => Err(ValidationError::InvalidOption {
                field: "option",
                value: other.to_string(),
                expected: "move, shift",
            }),
        }
    }
}

/// What happens to a deleted node's children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteOption {
    /// Delete the whole subtree
    RemoveAll,
    /// Re-parent direct children to the deleted node's parent first
    ShiftChildren,
}

impl DeleteOption {
    pub fn as_str(self) -> &'static str {
        match self {
            DeleteOption::RemoveAll => "remove-all",
            DeleteOption::ShiftChildren => "shift-children",
        }
    }
}

impl fmt::Display for DeleteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeleteOption {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remove-all" => Ok(DeleteOption::RemoveAll),
            "shift-children" => Ok(DeleteOption::ShiftChildren),
            other => Err(ValidationError::InvalidOption {
                field: "option",
                value: other.to_string(),
                expected: "remove-all, shift-children",
            }),
        }
    }
}

/// Validated create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNodeRequest {
    pub name: String,
    pub node_type: NodeType,
    /// `None` asks the engine to synthesize a new ORGANIZATION root
    pub parent_id: Option<NodeId>,
}

/// Validated partial update of a node's value fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNodeValueRequest {
    pub node_id: NodeId,
    pub name: Option<String>,
    pub node_type: Option<NodeType>,
}

/// Raw create body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub parent_id: Option<Value>,
}

impl CreateNodeInput {
    pub fn validate(self) -> Result<CreateNodeRequest, ValidationError> {
        let name = self.name.ok_or(ValidationError::MissingField("name"))?;
        let node_type = self.node_type.ok_or(ValidationError::MissingField("type"))?;

        Ok(CreateNodeRequest {
            name: validate_name(&name)?,
            node_type: validate_node_type(&node_type)?,
            parent_id: optional_id("parentId", self.parent_id)?,
        })
    }
}

/// Raw value-update body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeValueInput {
    pub node_id: Option<Value>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
}

impl UpdateNodeValueInput {
    pub fn validate(self) -> Result<UpdateNodeValueRequest, ValidationError> {
        let node_id = optional_id("nodeId", self.node_id)?
            .ok_or(ValidationError::MissingField("nodeId"))?;

        Ok(UpdateNodeValueRequest {
            node_id,
            name: self.name.as_deref().map(validate_name).transpose()?,
            node_type: self
                .node_type
                .as_deref()
                .map(validate_node_type)
                .transpose()?,
        })
    }
}

/// Raw re-parenting body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveNodeInput {
    pub new_parent_id: Option<Value>,
    pub option: Option<String>,
}

impl MoveNodeInput {
    pub fn validate(self) -> Result<(NodeId, MoveOption), ValidationError> {
        let new_parent_id = optional_id("newParentId", self.new_parent_id)?
            .ok_or(ValidationError::MissingField("newParentId"))?;
        let option = self
            .option
            .ok_or(ValidationError::MissingField("option"))?
            .parse()?;
        Ok((new_parent_id, option))
    }
}

/// Parse a node id taken from a URL path segment
pub fn parse_node_id(raw: &str) -> Result<NodeId, ValidationError> {
    parse_id_str("id", raw)
}

fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let len = name.chars().count();
    if len > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong {
            len,
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name.to_string())
}

fn validate_node_type(raw: &str) -> Result<NodeType, ValidationError> {
    raw.parse()
        .map_err(|_| ValidationError::InvalidNodeType(raw.to_string()))
}

fn optional_id(field: &'static str, raw: Option<Value>) -> Result<Option<NodeId>, ValidationError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(id) if id > 0 => Ok(Some(id)),
            _ => Err(ValidationError::InvalidId {
                field,
                value: n.to_string(),
            }),
        },
        Some(Value::String(s)) => parse_id_str(field, &s).map(Some),
        Some(other) => Err(ValidationError::InvalidId {
            field,
            value: other.to_string(),
        }),
    }
}

fn parse_id_str(field: &'static str, raw: &str) -> Result<NodeId, ValidationError> {
    match raw.trim().parse::<NodeId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidId {
            field,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: Value) -> Result<CreateNodeRequest, ValidationError> {
        serde_json::from_value::<CreateNodeInput>(body)
            .unwrap()
            .validate()
    }

    #[test]
    fn test_create_accepts_numeric_string_parent() {
        let req = create(json!({"name": " West ", "type": "LOCATION", "parentId": "12"})).unwrap();
        assert_eq!(req.name, "West");
        assert_eq!(req.node_type, NodeType::Location);
        assert_eq!(req.parent_id, Some(12));
    }

    #[test]
    fn test_create_without_parent_means_new_root() {
        let req = create(json!({"name": "HQ", "type": "ORGANIZATION"})).unwrap();
        assert_eq!(req.parent_id, None);

        let req = create(json!({"name": "HQ", "type": "ORGANIZATION", "parentId": null})).unwrap();
        assert_eq!(req.parent_id, None);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        assert_eq!(
            create(json!({"type": "EMPLOYEE"})),
            Err(ValidationError::MissingField("name"))
        );
        assert_eq!(
            create(json!({"name": "   ", "type": "EMPLOYEE"})),
            Err(ValidationError::EmptyName)
        );
        assert!(matches!(
            create(json!({"name": "a", "type": "MANAGER"})),
            Err(ValidationError::InvalidNodeType(_))
        ));
        assert!(matches!(
            create(json!({"name": "a", "type": "EMPLOYEE", "parentId": "abc"})),
            Err(ValidationError::InvalidId { field: "parentId", .. })
        ));
        assert!(matches!(
            create(json!({"name": "a", "type": "EMPLOYEE", "parentId": -4})),
            Err(ValidationError::InvalidId { .. })
        ));
        assert!(matches!(
            create(json!({"name": "x".repeat(101), "type": "EMPLOYEE"})),
            Err(ValidationError::NameTooLong { len: 101, max: 100 })
        ));
    }

    #[test]
    fn test_update_value_is_partial() {
        let input: UpdateNodeValueInput =
            serde_json::from_value(json!({"nodeId": 4, "type": "DEPARTMENT"})).unwrap();
        let req = input.validate().unwrap();
        assert_eq!(req.node_id, 4);
        assert_eq!(req.name, None);
        assert_eq!(req.node_type, Some(NodeType::Department));

        let input: UpdateNodeValueInput = serde_json::from_value(json!({"name": "x"})).unwrap();
        assert_eq!(input.validate(), Err(ValidationError::MissingField("nodeId")));
    }

    #[test]
    fn test_move_input_and_options() {
        let input: MoveNodeInput =
            serde_json::from_value(json!({"newParentId": "9", "option": "shift"})).unwrap();
        assert_eq!(input.validate().unwrap(), (9, MoveOption::Shift));

        let input: MoveNodeInput =
            serde_json::from_value(json!({"newParentId": 9, "option": "jump"})).unwrap();
        assert!(matches!(
            input.validate(),
            Err(ValidationError::InvalidOption { .. })
        ));

        assert_eq!("remove-all".parse::<DeleteOption>().unwrap(), DeleteOption::RemoveAll);
        assert_eq!(
            "shift-children".parse::<DeleteOption>().unwrap(),
            DeleteOption::ShiftChildren
        );
        assert!("cascade".parse::<DeleteOption>().is_err());
    }

    #[test]
    fn test_parse_node_id() {
        assert_eq!(parse_node_id("17"), Ok(17));
        assert!(parse_node_id("0").is_err());
        assert!(parse_node_id("seven").is_err());
    }
}
