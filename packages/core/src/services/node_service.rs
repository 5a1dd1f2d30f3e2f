//! Node Service - Tree Mutation Engine
//!
//! This module provides the business logic layer for the organization
//! hierarchy:
//!
//! - Creation with color assignment (and implicit root synthesis)
//! - Value updates (name/type) with color re-rolls on type changes
//! - Cycle-safe re-parenting with `move` and `shift` semantics
//! - Deletion with `remove-all` and `shift-children` policies
//! - Cache-first listing of the full forest
//!
//! # Color Inheritance
//!
//! LOCATION and DEPARTMENT nodes own a color drawn from the [`ColorPool`].
//! Every other node takes the color of its nearest LOCATION/DEPARTMENT
//! ancestor, or [`DEFAULT_COLOR`] when there is none. Whenever a color
//! source is created or re-typed its color is pushed down the subtree,
//! stopping at nested color sources.
//!
//! Re-parenting does **not** re-derive colors: a moved subtree keeps the
//! colors it had under its old ancestry.
//!
//! # Store Writes
//!
//! Every write goes through [`HierarchyStore::patch_node`] with only the
//! columns the operation changes, so a node read earlier in the operation
//! never overwrites a concurrent move or rename.
//!
//! # Cache Consistency
//!
//! Every mutation that reached the store deletes the forest snapshot before
//! returning, including multi-step mutations that fail halfway.

use crate::db::HierarchyStore;
use crate::models::{
    CreateNodeRequest, DeleteOption, MoveOption, NewNode, Node, NodeId, NodePatch, NodeTree,
    NodeWithRelations, UpdateNodeValueRequest, DEFAULT_COLOR,
};
use crate::services::color_pool::ColorPool;
use crate::services::error::NodeServiceError;
use crate::services::forest_cache::ForestCache;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Acknowledgement returned by [`NodeService::delete_node`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub message: String,
    pub node_id: NodeId,
    pub option: DeleteOption,
    /// Nodes removed, including the target itself
    pub removed: u64,
    /// Direct children handed to the former parent (`shift-children` only)
    pub reparented: usize,
}

/// Outcome of pushing a color down a subtree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Descendants whose color was rewritten
    pub updated: usize,
    /// Descendants that already had the color
    pub unchanged: usize,
    /// Descendants behind a nested LOCATION/DEPARTMENT, left alone
    pub shielded: usize,
    /// Descendants whose persist failed; they keep their old color
    pub failed: Vec<NodeId>,
}

impl PropagationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Tree mutation engine
///
/// Stateless per call: durable state lives in the [`HierarchyStore`], the
/// forest snapshot in the [`ForestCache`]. Cloning is cheap and clones share
/// the same store, cache and color cursor.
#[derive(Clone)]
pub struct NodeService {
    store: Arc<dyn HierarchyStore>,
    cache: ForestCache,
    colors: Arc<ColorPool>,
}

impl NodeService {
    pub fn new(store: Arc<dyn HierarchyStore>, cache: ForestCache, colors: Arc<ColorPool>) -> Self {
        Self {
            store,
            cache,
            colors,
        }
    }

    pub fn store(&self) -> &Arc<dyn HierarchyStore> {
        &self.store
    }

    pub fn cache(&self) -> &ForestCache {
        &self.cache
    }

    pub fn colors(&self) -> &Arc<ColorPool> {
        &self.colors
    }

    /// Create a node
    ///
    /// Without a `parent_id` a fresh ORGANIZATION root is persisted first and
    /// used as the parent; every such call creates a new root.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if `parent_id` does not exist
    /// - `Unavailable` on store failure
    pub async fn create_node(&self, request: CreateNodeRequest) -> Result<Node, NodeServiceError> {
        let parent = match request.parent_id {
            None => {
                let root = self
                    .store
                    .create_node(NewNode::implicit_root())
                    .await
                    .map_err(|e| NodeServiceError::from_store("create", e))?;
                self.cache.invalidate().await;
                tracing::info!("Synthesized root node {} for '{}'", root.id, request.name);
                root
            }
            Some(parent_id) => self
                .store
                .get_node(parent_id)
                .await
                .map_err(|e| NodeServiceError::from_store("create", e))?
                .ok_or_else(|| NodeServiceError::parent_not_found(parent_id))?,
        };

        let color = if request.node_type.is_color_source() {
            self.colors.next().to_string()
        } else {
            self.inherited_color(&parent).await?
        };

        let node = self
            .store
            .create_node(NewNode {
                name: request.name,
                node_type: request.node_type,
                color,
                parent_id: Some(parent.id),
            })
            .await
            .map_err(|e| NodeServiceError::from_store("create", e))?;

        if node.node_type.is_color_source() {
            self.propagate_color(&node).await;
        }

        self.cache.invalidate().await;
        tracing::info!(
            "Created {} node {} '{}' under {} with color {}",
            node.node_type,
            node.id,
            node.name,
            parent.id,
            node.color
        );
        Ok(node)
    }

    /// Full forest, served from the cache when a snapshot is present
    pub async fn get_all_nodes(&self) -> Result<Vec<NodeTree>, NodeServiceError> {
        if let Some(forest) = self.cache.get().await {
            return Ok(forest);
        }

        let forest = self
            .store
            .get_forest()
            .await
            .map_err(|e| NodeServiceError::from_store("list", e))?;
        self.cache.put(&forest).await;
        Ok(forest)
    }

    /// Single node by id
    pub async fn get_node(&self, id: NodeId) -> Result<Node, NodeServiceError> {
        self.store
            .get_node(id)
            .await
            .map_err(|e| NodeServiceError::from_store("get", e))?
            .ok_or_else(|| NodeServiceError::node_not_found(id))
    }

    /// Partial update of name and/or type
    ///
    /// Submitting a LOCATION/DEPARTMENT type always draws a new color, even if
    /// the node already had that type, and pushes it down the subtree.
    pub async fn update_node_value(
        &self,
        request: UpdateNodeValueRequest,
    ) -> Result<Node, NodeServiceError> {
        let node = self.get_node(request.node_id).await?;

        let recolor = request.node_type.is_some_and(|t| t.is_color_source());
        let patch = NodePatch {
            name: request.name,
            node_type: request.node_type,
            color: recolor.then(|| self.colors.next().to_string()),
            parent_id: None,
        };

        let node = self
            .store
            .patch_node(node.id, &patch)
            .await
            .map_err(|e| NodeServiceError::from_store("update", e))?;

        if recolor {
            self.propagate_color(&node).await;
        }

        self.cache.invalidate().await;
        tracing::info!("Updated node {} ('{}', {})", node.id, node.name, node.node_type);
        Ok(node)
    }

    /// Re-parent `node_id` under `new_parent_id`
    ///
    /// - `move`: the node takes its whole subtree along
    /// - `shift`: the node's direct children are handed to its current parent
    ///   first, then the node alone moves
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if either node is missing
    /// - `InvalidOperation` for self-parenting, moving into the node's own
    ///   subtree, or shifting a root
    pub async fn update_node(
        &self,
        node_id: NodeId,
        new_parent_id: NodeId,
        option: MoveOption,
    ) -> Result<Node, NodeServiceError> {
        let operation = option.as_str();
        let NodeWithRelations {
            node,
            parent,
            children,
        } = self.get_with_relations(operation, node_id).await?;

        let new_parent = self
            .store
            .get_node(new_parent_id)
            .await
            .map_err(|e| NodeServiceError::from_store(operation, e))?
            .ok_or_else(|| NodeServiceError::new_parent_not_found(new_parent_id))?;

        if new_parent.id == node.id {
            return Err(NodeServiceError::invalid_operation(
                operation,
                node_id,
                "a node cannot be its own parent",
            ));
        }

        let descendants = self
            .store
            .get_descendants(node.id)
            .await
            .map_err(|e| NodeServiceError::from_store(operation, e))?;
        if descendants.iter().any(|d| d.id == new_parent.id) {
            return Err(NodeServiceError::invalid_operation(
                operation,
                node_id,
                format!("cannot move into own descendant {}", new_parent.id),
            ));
        }

        if option == MoveOption::Shift {
            let current_parent = parent.ok_or_else(|| {
                NodeServiceError::invalid_operation(
                    operation,
                    node_id,
                    "node has no parent to take over its children",
                )
            })?;
            self.reparent_children(operation, node_id, children, current_parent.id)
                .await?;
        }

        let saved = self
            .store
            .patch_node(node.id, &NodePatch::parent(Some(new_parent.id)))
            .await;
        self.cache.invalidate().await;
        let node = saved.map_err(|e| {
            if option == MoveOption::Shift {
                tracing::error!(
                    "Shift of node {} left its children under their new parent but the node itself did not move: {}",
                    node_id,
                    e
                );
            }
            NodeServiceError::from_store(operation, e)
        })?;

        tracing::info!("{} node {} under {}", capitalize(operation), node.id, new_parent.id);
        Ok(node)
    }

    /// Delete `node_id`
    ///
    /// - `remove-all`: the node and its entire subtree are removed
    /// - `shift-children`: direct children are handed to the node's parent,
    ///   then the node is removed; roots are refused
    pub async fn delete_node(
        &self,
        node_id: NodeId,
        option: DeleteOption,
    ) -> Result<DeleteResult, NodeServiceError> {
        let NodeWithRelations {
            node,
            parent,
            children,
        } = self.get_with_relations("delete", node_id).await?;

        let reparented = match option {
            DeleteOption::RemoveAll => 0,
            DeleteOption::ShiftChildren => {
                let parent = parent.ok_or_else(|| {
                    NodeServiceError::invalid_operation(
                        "delete",
                        node_id,
                        "a root's children would have nowhere to go",
                    )
                })?;
                self.reparent_children("delete", node_id, children, parent.id)
                    .await?
            }
        };

        let removed = self.store.delete_node(node.id).await;
        self.cache.invalidate().await;
        let removed = removed.map_err(|e| {
            if reparented > 0 {
                tracing::error!(
                    "Delete of node {} failed after its {} children were re-parented: {}",
                    node_id,
                    reparented,
                    e
                );
            }
            NodeServiceError::from_store("delete", e)
        })?;

        tracing::info!(
            "Deleted node {} ({}): {} removed, {} re-parented",
            node_id,
            option,
            removed,
            reparented
        );
        Ok(DeleteResult {
            message: "Node deleted successfully".to_string(),
            node_id,
            option,
            removed,
            reparented,
        })
    }

    /// Push `source`'s color down its subtree
    ///
    /// Best effort: a failed persist is logged and recorded in the report, and
    /// the walk continues with the remaining descendants. Nested
    /// LOCATION/DEPARTMENT nodes and everything below them are left alone.
    pub async fn propagate_color(&self, source: &Node) -> PropagationReport {
        let mut report = PropagationReport::default();

        let descendants = match self.store.get_descendants(source.id).await {
            Ok(descendants) => descendants,
            Err(e) => {
                tracing::warn!("Skipping color propagation from node {}: {}", source.id, e);
                return report;
            }
        };

        // Descendants arrive ordered by depth, so a parent is always seen
        // before its children.
        let mut shielded: HashSet<NodeId> = HashSet::new();
        for descendant in descendants {
            let behind_boundary = descendant
                .parent_id
                .is_some_and(|parent_id| shielded.contains(&parent_id));

            if descendant.node_type.is_color_source() || behind_boundary {
                if behind_boundary {
                    report.shielded += 1;
                }
                shielded.insert(descendant.id);
                continue;
            }

            if descendant.color == source.color {
                report.unchanged += 1;
                continue;
            }

            match self
                .store
                .patch_node(descendant.id, &NodePatch::color(source.color.as_str()))
                .await
            {
                Ok(_) => report.updated += 1,
                Err(e) => {
                    tracing::warn!(
                        "Color propagation from node {} could not update node {}: {}",
                        source.id,
                        descendant.id,
                        e
                    );
                    report.failed.push(descendant.id);
                }
            }
        }

        tracing::debug!("Color propagation from node {}: {:?}", source.id, report);
        report
    }

    /// Color a new child of `parent` inherits
    ///
    /// The parent itself counts as the nearest candidate, then its ancestors
    /// nearest first.
    pub async fn inherited_color(&self, parent: &Node) -> Result<String, NodeServiceError> {
        if parent.node_type.is_color_source() {
            return Ok(parent.color.clone());
        }

        let ancestors = self
            .store
            .get_ancestors(parent.id)
            .await
            .map_err(|e| NodeServiceError::from_store("create", e))?;

        Ok(ancestors
            .into_iter()
            .find(|a| a.node_type.is_color_source())
            .map(|a| a.color)
            .unwrap_or_else(|| DEFAULT_COLOR.to_string()))
    }

    async fn get_with_relations(
        &self,
        operation: &'static str,
        node_id: NodeId,
    ) -> Result<NodeWithRelations, NodeServiceError> {
        self.store
            .get_node_with_relations(node_id)
            .await
            .map_err(|e| NodeServiceError::from_store(operation, e))?
            .ok_or_else(|| NodeServiceError::node_not_found(node_id))
    }

    /// Hand every child to `new_parent_id`, stopping at the first failure
    ///
    /// A failure after some children were moved is logged with the progress
    /// made, and the cache is invalidated before the error is returned.
    async fn reparent_children(
        &self,
        operation: &'static str,
        node_id: NodeId,
        children: Vec<Node>,
        new_parent_id: NodeId,
    ) -> Result<usize, NodeServiceError> {
        let total = children.len();

        let patch = NodePatch::parent(Some(new_parent_id));
        for (done, child) in children.into_iter().enumerate() {
            if let Err(e) = self.store.patch_node(child.id, &patch).await {
                if done > 0 {
                    tracing::error!(
                        "{} of node {} stopped after re-parenting {}/{} children to {}: child {} failed: {}",
                        capitalize(operation),
                        node_id,
                        done,
                        total,
                        new_parent_id,
                        child.id,
                        e
                    );
                    self.cache.invalidate().await;
                }
                return Err(NodeServiceError::from_store(operation, e));
            }
        }

        Ok(total)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "node_service_test.rs"]
mod node_service_test;
