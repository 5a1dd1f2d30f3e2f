//! SqliteHierarchyStore - HierarchyStore over libsql with a closure table
//!
//! Every mutation that touches ancestry runs inside one `BEGIN IMMEDIATE`
//! transaction on a single connection, so the cycle check and the rewrite of
//! the closure rows see the same snapshot.
//!
//! # Re-parenting
//!
//! Moving node `N` under `P` is the classic closure-table subtree move:
//!
//! 1. drop every (ancestor, descendant) pair that links an outside ancestor
//!    to a node inside `N`'s subtree
//! 2. cross-join `P`'s ancestors (including `P`) with `N`'s subtree to insert
//!    the new pairs
//!
//! Pairs internal to the subtree are untouched, so the subtree keeps its shape.
//!
//! # Partial writes
//!
//! [`HierarchyStore::patch_node`] merges a [`NodePatch`] into the row as read
//! inside the transaction. Columns the patch leaves unset keep whatever a
//! concurrent writer committed, so a color write never reverts a move.

use crate::db::hierarchy_store::{HierarchyStore, StoreResult};
use crate::db::{DatabaseError, DatabaseService};
use crate::models::{NewNode, Node, NodeId, NodePatch, NodeTree, NodeWithRelations};
use async_trait::async_trait;
use libsql::params::IntoParams;
use libsql::{Connection, Row};
use std::path::PathBuf;
use std::sync::Arc;

const NODE_COLUMNS: &str = "n.id, n.name, n.node_type, n.color, n.parent_id";

/// libsql-backed [`HierarchyStore`]
pub struct SqliteHierarchyStore {
    db: Arc<DatabaseService>,
}

impl SqliteHierarchyStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Open the database at `db_path` and wrap it
    pub async fn open(db_path: PathBuf) -> StoreResult<Self> {
        Ok(Self::new(Arc::new(DatabaseService::new(db_path).await?)))
    }

    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }

    fn row_to_node(row: &Row) -> StoreResult<Node> {
        let id: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::corrupt_row(format!("id: {}", e)))?;
        let name: String = row
            .get(1)
            .map_err(|e| DatabaseError::corrupt_row(format!("name of {}: {}", id, e)))?;
        let node_type: String = row
            .get(2)
            .map_err(|e| DatabaseError::corrupt_row(format!("node_type of {}: {}", id, e)))?;
        let color: String = row
            .get(3)
            .map_err(|e| DatabaseError::corrupt_row(format!("color of {}: {}", id, e)))?;
        let parent_id: Option<i64> = row
            .get(4)
            .map_err(|e| DatabaseError::corrupt_row(format!("parent_id of {}: {}", id, e)))?;

        Ok(Node {
            id,
            name,
            node_type: node_type
                .parse()
                .map_err(|e| DatabaseError::corrupt_row(format!("node {}: {}", id, e)))?,
            color,
            parent_id,
        })
    }

    async fn query_nodes(
        conn: &Connection,
        sql: &str,
        params: impl IntoParams,
    ) -> StoreResult<Vec<Node>> {
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("{}: {}", sql, e)))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await? {
            nodes.push(Self::row_to_node(&row)?);
        }
        Ok(nodes)
    }

    async fn query_node(conn: &Connection, id: NodeId) -> StoreResult<Option<Node>> {
        let sql = format!("SELECT {} FROM nodes n WHERE n.id = ?", NODE_COLUMNS);
        Ok(Self::query_nodes(conn, &sql, [id]).await?.into_iter().next())
    }

    async fn exists(conn: &Connection, id: NodeId) -> StoreResult<bool> {
        let mut rows = conn
            .query("SELECT 1 FROM nodes WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("existence check for {}: {}", id, e)))?;
        Ok(rows.next().await?.is_some())
    }

    /// Whether `candidate` is `id` or lies somewhere below it
    async fn in_subtree(conn: &Connection, id: NodeId, candidate: NodeId) -> StoreResult<bool> {
        let mut rows = conn
            .query(
                "SELECT 1 FROM node_closure WHERE ancestor = ? AND descendant = ?",
                [id, candidate],
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("subtree check for {}: {}", id, e)))?;
        Ok(rows.next().await?.is_some())
    }

    async fn begin(conn: &Connection) -> StoreResult<()> {
        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e)))?;
        Ok(())
    }

    /// Commit on success, roll back on failure, and hand back the outcome
    async fn finish<T>(conn: &Connection, outcome: StoreResult<T>) -> StoreResult<T> {
        match outcome {
            Ok(value) => {
                if let Err(e) = conn.execute("COMMIT", ()).await {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    return Err(DatabaseError::sql_execution(format!(
                        "Failed to commit transaction: {}",
                        e
                    )));
                }
                Ok(value)
            }
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn insert_node(conn: &Connection, node: NewNode) -> StoreResult<Node> {
        if let Some(parent_id) = node.parent_id {
            if !Self::exists(conn, parent_id).await? {
                return Err(DatabaseError::not_persisted(parent_id));
            }
        }

        conn.execute(
            "INSERT INTO nodes (name, node_type, color, parent_id) VALUES (?, ?, ?, ?)",
            (
                node.name.as_str(),
                node.node_type.as_str(),
                node.color.as_str(),
                node.parent_id,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert node: {}", e)))?;
        let id = conn.last_insert_rowid();

        conn.execute(
            "INSERT INTO node_closure (ancestor, descendant, depth) VALUES (?1, ?1, 0)",
            [id],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert self closure: {}", e)))?;

        if let Some(parent_id) = node.parent_id {
            conn.execute(
                "INSERT INTO node_closure (ancestor, descendant, depth)
                 SELECT ancestor, ?1, depth + 1 FROM node_closure WHERE descendant = ?2",
                [id, parent_id],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to link node {} under {}: {}", id, parent_id, e))
            })?;
        }

        Ok(Node {
            id,
            name: node.name,
            node_type: node.node_type,
            color: node.color,
            parent_id: node.parent_id,
        })
    }

    async fn relink(conn: &Connection, id: NodeId, new_parent_id: Option<NodeId>) -> StoreResult<()> {
        if let Some(parent_id) = new_parent_id {
            if !Self::exists(conn, parent_id).await? {
                return Err(DatabaseError::not_persisted(parent_id));
            }
            if Self::in_subtree(conn, id, parent_id).await? {
                return Err(DatabaseError::cycle_rejected(id, parent_id));
            }
        }

        conn.execute(
            "DELETE FROM node_closure
             WHERE descendant IN (SELECT descendant FROM node_closure WHERE ancestor = ?1)
               AND ancestor NOT IN (SELECT descendant FROM node_closure WHERE ancestor = ?1)",
            [id],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to detach subtree of {}: {}", id, e)))?;

        if let Some(parent_id) = new_parent_id {
            conn.execute(
                "INSERT INTO node_closure (ancestor, descendant, depth)
                 SELECT sup.ancestor, sub.descendant, sup.depth + sub.depth + 1
                 FROM node_closure sup
                 JOIN node_closure sub
                 WHERE sup.descendant = ?2 AND sub.ancestor = ?1",
                [id, parent_id],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to attach subtree of {} under {}: {}", id, parent_id, e))
            })?;
        }

        Ok(())
    }

    async fn update_node(conn: &Connection, id: NodeId, patch: &NodePatch) -> StoreResult<Node> {
        let stored = Self::query_node(conn, id)
            .await?
            .ok_or_else(|| DatabaseError::not_persisted(id))?;

        if let Some(parent_id) = patch.parent_id {
            if parent_id != stored.parent_id {
                Self::relink(conn, id, parent_id).await?;
            }
        }

        let node = patch.apply_to(stored);
        conn.execute(
            "UPDATE nodes SET name = ?, node_type = ?, color = ?, parent_id = ? WHERE id = ?",
            (
                node.name.as_str(),
                node.node_type.as_str(),
                node.color.as_str(),
                node.parent_id,
                node.id,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update node {}: {}", id, e)))?;

        Ok(node)
    }

    /// Returns the subtree size counted before deletion; rows removed by the
    /// parent_id cascade are not reported by the DELETE itself.
    async fn remove_subtree(conn: &Connection, id: NodeId) -> StoreResult<u64> {
        let count: i64 = {
            let mut rows = conn
                .query("SELECT COUNT(*) FROM node_closure WHERE ancestor = ?", [id])
                .await
                .map_err(|e| DatabaseError::sql_execution(format!("Failed to size subtree of {}: {}", id, e)))?;
            match rows.next().await? {
                Some(row) => row.get(0)?,
                None => 0,
            }
        };

        conn.execute(
            "DELETE FROM nodes WHERE id IN
             (SELECT descendant FROM node_closure WHERE ancestor = ?)",
            [id],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete node {}: {}", id, e)))?;

        Ok(count as u64)
    }
}

#[async_trait]
impl HierarchyStore for SqliteHierarchyStore {
    async fn create_node(&self, node: NewNode) -> StoreResult<Node> {
        let conn = self.db.connect().await?;
        Self::begin(&conn).await?;
        let outcome = Self::insert_node(&conn, node).await;
        Self::finish(&conn, outcome).await
    }

    async fn save_node(&self, node: &Node) -> StoreResult<Node> {
        let conn = self.db.connect().await?;
        Self::begin(&conn).await?;
        let patch = NodePatch {
            name: Some(node.name.clone()),
            node_type: Some(node.node_type),
            color: Some(node.color.clone()),
            parent_id: Some(node.parent_id),
        };
        let outcome = Self::update_node(&conn, node.id, &patch).await;
        Self::finish(&conn, outcome).await
    }

    async fn patch_node(&self, id: NodeId, patch: &NodePatch) -> StoreResult<Node> {
        let conn = self.db.connect().await?;
        Self::begin(&conn).await?;
        let outcome = Self::update_node(&conn, id, patch).await;
        Self::finish(&conn, outcome).await
    }

    async fn get_node(&self, id: NodeId) -> StoreResult<Option<Node>> {
        let conn = self.db.connect().await?;
        Self::query_node(&conn, id).await
    }

    async fn get_node_with_relations(&self, id: NodeId) -> StoreResult<Option<NodeWithRelations>> {
        let conn = self.db.connect().await?;
        let Some(node) = Self::query_node(&conn, id).await? else {
            return Ok(None);
        };

        let parent = match node.parent_id {
            Some(parent_id) => Self::query_node(&conn, parent_id).await?,
            None => None,
        };
        let sql = format!(
            "SELECT {} FROM nodes n WHERE n.parent_id = ? ORDER BY n.id",
            NODE_COLUMNS
        );
        let children = Self::query_nodes(&conn, &sql, [id]).await?;

        Ok(Some(NodeWithRelations {
            node,
            parent,
            children,
        }))
    }

    async fn get_descendants(&self, id: NodeId) -> StoreResult<Vec<Node>> {
        let conn = self.db.connect().await?;
        let sql = format!(
            "SELECT {} FROM node_closure c JOIN nodes n ON n.id = c.descendant
             WHERE c.ancestor = ? AND c.depth > 0
             ORDER BY c.depth, n.id",
            NODE_COLUMNS
        );
        Self::query_nodes(&conn, &sql, [id]).await
    }

    async fn get_ancestors(&self, id: NodeId) -> StoreResult<Vec<Node>> {
        let conn = self.db.connect().await?;
        let sql = format!(
            "SELECT {} FROM node_closure c JOIN nodes n ON n.id = c.ancestor
             WHERE c.descendant = ? AND c.depth > 0
             ORDER BY c.depth",
            NODE_COLUMNS
        );
        Self::query_nodes(&conn, &sql, [id]).await
    }

    async fn get_forest(&self) -> StoreResult<Vec<NodeTree>> {
        let conn = self.db.connect().await?;
        let sql = format!("SELECT {} FROM nodes n ORDER BY n.id", NODE_COLUMNS);
        let nodes = Self::query_nodes(&conn, &sql, ()).await?;
        Ok(NodeTree::build_forest(nodes))
    }

    async fn delete_node(&self, id: NodeId) -> StoreResult<u64> {
        let conn = self.db.connect().await?;
        Self::begin(&conn).await?;
        let outcome = Self::remove_subtree(&conn, id).await;
        let removed = Self::finish(&conn, outcome).await?;

        tracing::debug!("Deleted node {} with {} node(s) in its subtree", id, removed);
        Ok(removed)
    }
}
