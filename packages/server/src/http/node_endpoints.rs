//! Node endpoints
//!
//! Thin mapping from routes to [`NodeService`](orgtree_core::NodeService)
//! calls. Bodies are validated here, then the engine does the work.
//!
//! # Endpoints
//!
//! - `GET /api/v1/info` - Liveness check
//! - `POST /api/v1/nodes` - Create a node
//! - `GET /api/v1/nodes` - Full forest
//! - `POST /api/v1/nodes/update` - Update a node's name and/or type
//! - `PUT /api/v1/nodes/:id` - Re-parent a node (`move` or `shift`)
//! - `DELETE /api/v1/nodes/:id?option=` - Delete a node (`remove-all` or `shift-children`)

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use orgtree_core::models::{
    parse_node_id, CreateNodeInput, DeleteOption, MoveNodeInput, UpdateNodeValueInput,
    ValidationError,
};
use orgtree_core::{DeleteResult, Node, NodeTree};
use serde::{Deserialize, Serialize};

use crate::http::{AppState, HttpError};

/// Success envelope shared by every node endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: T,
}

impl<T> Envelope<T> {
    fn success(data: T) -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
            data,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeData {
    pub node: Node,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodesData {
    pub nodes: Vec<NodeTree>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    option: Option<String>,
}

/// Unwrap a JSON body, reporting malformed input as a validation error
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| HttpError::new(rejection.body_text(), "VALIDATION_ERROR"))
}

/// Liveness check
///
/// ```bash
/// curl http://localhost:3001/api/v1/info
/// ```
async fn info() -> Json<&'static str> {
    Json("Api is working fine")
}

/// Create a node
///
/// Omitting `parentId` creates the node under a freshly synthesized root.
///
/// ```bash
/// curl -X POST http://localhost:3001/api/v1/nodes \
///   -H "Content-Type: application/json" \
///   -d '{"name": "West", "type": "LOCATION", "parentId": 1}'
/// ```
async fn create_node(
    State(state): State<AppState>,
    payload: Result<Json<CreateNodeInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<NodeData>>), HttpError> {
    let request = body(payload)?.validate()?;
    let node = state.node_service.create_node(request).await?;

    tracing::debug!("Created node {} via HTTP", node.id);
    Ok((StatusCode::CREATED, Envelope::success(NodeData { node })))
}

/// Full forest, roots first, children nested
async fn get_all_nodes(
    State(state): State<AppState>,
) -> Result<Json<Envelope<NodesData>>, HttpError> {
    let nodes = state.node_service.get_all_nodes().await?;
    Ok(Envelope::success(NodesData { nodes }))
}

/// Update name and/or type
///
/// ```bash
/// curl -X POST http://localhost:3001/api/v1/nodes/update \
///   -H "Content-Type: application/json" \
///   -d '{"nodeId": 4, "type": "DEPARTMENT"}'
/// ```
async fn update_node_value(
    State(state): State<AppState>,
    payload: Result<Json<UpdateNodeValueInput>, JsonRejection>,
) -> Result<Json<Envelope<NodeData>>, HttpError> {
    let request = body(payload)?.validate()?;
    let node = state.node_service.update_node_value(request).await?;
    Ok(Envelope::success(NodeData { node }))
}

/// Re-parent a node
///
/// ```bash
/// curl -X PUT http://localhost:3001/api/v1/nodes/4 \
///   -H "Content-Type: application/json" \
///   -d '{"newParentId": 2, "option": "shift"}'
/// ```
async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MoveNodeInput>, JsonRejection>,
) -> Result<Json<Envelope<NodeData>>, HttpError> {
    let node_id = parse_node_id(&id)?;
    let (new_parent_id, option) = body(payload)?.validate()?;

    let node = state
        .node_service
        .update_node(node_id, new_parent_id, option)
        .await?;
    Ok(Envelope::success(NodeData { node }))
}

/// Delete a node
///
/// ```bash
/// curl -X DELETE "http://localhost:3001/api/v1/nodes/4?option=shift-children"
/// ```
async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Envelope<DeleteResult>>, HttpError> {
    let node_id = parse_node_id(&id)?;
    let option: DeleteOption = query
        .option
        .ok_or(ValidationError::MissingField("option"))?
        .parse()?;

    let result = state.node_service.delete_node(node_id, option).await?;
    Ok(Envelope::success(result))
}

/// Routes mounted under `/api/v1`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/info", get(info))
        .route("/nodes", post(create_node).get(get_all_nodes))
        .route("/nodes/update", post(update_node_value))
        .route("/nodes/:id", put(update_node).delete(delete_node))
}
