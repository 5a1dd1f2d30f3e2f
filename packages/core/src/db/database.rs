//! Database Service
//!
//! Owns the libsql database handle, applies connection settings and creates
//! the hierarchy schema. SQL for individual hierarchy operations lives in
//! [`crate::db::SqliteHierarchyStore`].
//!
//! # Schema
//!
//! - `nodes`: one row per node, `parent_id` is the ownership edge
//! - `node_closure`: one row per (ancestor, descendant) pair including the
//!   depth-0 self pair, so ancestor walks and subtree fetches are single
//!   indexed queries
//!
//! Both tables cascade on delete, so removing a node removes its subtree and
//! every closure row that mentions it.

use crate::db::DatabaseError;
use libsql::{Builder, Connection, Database};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Busy timeout applied to every connection
const BUSY_TIMEOUT_MS: u32 = 5000;

const CREATE_NODES_TABLE: &str = "CREATE TABLE IF NOT EXISTS nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 100),
    node_type TEXT NOT NULL DEFAULT 'EMPLOYEE'
        CHECK (node_type IN ('LOCATION', 'DEPARTMENT', 'EMPLOYEE', 'ORGANIZATION')),
    color TEXT NOT NULL DEFAULT '#FFFFFF' CHECK (length(color) = 7),
    parent_id INTEGER REFERENCES nodes(id) ON DELETE CASCADE,
    CHECK (parent_id IS NULL OR parent_id <> id)
)";

const CREATE_CLOSURE_TABLE: &str = "CREATE TABLE IF NOT EXISTS node_closure (
    ancestor INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    descendant INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    depth INTEGER NOT NULL CHECK (depth >= 0),
    PRIMARY KEY (ancestor, descendant)
)";

const CREATE_INDEXES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_closure_descendant ON node_closure(descendant, depth)",
];

/// Handle to the on-disk hierarchy database
pub struct DatabaseService {
    db: Arc<Database>,
    db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` and initialize the schema
    ///
    /// The parent directory is created when missing. Schema creation is
    /// idempotent, so reopening an existing database is safe.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created, the
    /// connection fails, or a schema statement fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };
        service.initialize_schema().await?;

        tracing::info!("Hierarchy database ready at {}", service.db_path.display());
        Ok(service)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements may return rows, so they go through query() rather
    /// than execute().
    async fn execute_pragma(conn: &Connection, pragma: &str) -> Result<(), DatabaseError> {
        conn.query(pragma, ())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e)))?;
        Ok(())
    }

    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect().await?;

        Self::execute_pragma(&conn, "PRAGMA journal_mode = WAL").await?;

        for statement in [CREATE_NODES_TABLE, CREATE_CLOSURE_TABLE]
            .into_iter()
            .chain(CREATE_INDEXES)
        {
            conn.execute(statement, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!("{}: {}", first_line(statement), e))
            })?;
        }

        Ok(())
    }

    /// Get a connection with busy timeout and foreign keys configured
    ///
    /// Both settings are per-connection in SQLite, so every caller must go
    /// through here rather than `Database::connect` directly.
    pub async fn connect(&self) -> Result<Connection, DatabaseError> {
        let conn = self.db.connect()?;
        Self::execute_pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS)).await?;
        Self::execute_pragma(&conn, "PRAGMA foreign_keys = ON").await?;
        Ok(conn)
    }
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or(sql)
}
