//! Integration tests for the HTTP surface
//!
//! Each test drives a fresh router over a temp-dir database with
//! `tower::ServiceExt::oneshot`, the way a client would.

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use orgtree_core::cache::InMemoryCacheStore;
use orgtree_core::db::SqliteHierarchyStore;
use orgtree_core::{ColorPool, ForestCache, NodeService};
use orgtree_server::http::{create_router, AppState, RateLimiter};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

/// Test helper: Create a router over a fresh database
async fn create_test_app(max_requests: u32) -> Result<(Router, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = SqliteHierarchyStore::open(temp_dir.path().join("test.db")).await?;
    let service = NodeService::new(
        Arc::new(store),
        ForestCache::new(Arc::new(InMemoryCacheStore::new())),
        Arc::new(ColorPool::default()),
    );
    let state = AppState::new(service, RateLimiter::new(max_requests, Duration::from_secs(600)));
    Ok((create_router(state, None), temp_dir))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

async fn create(app: &Router, body: Value) -> Result<Value> {
    let (status, response) = send(app, Method::POST, "/api/v1/nodes", Some(body)).await?;
    assert_eq!(status, StatusCode::CREATED, "{response}");
    Ok(response["data"]["node"].clone())
}

#[tokio::test]
async fn test_info() -> Result<()> {
    let (app, _temp_dir) = create_test_app(100).await?;

    let (status, body) = send(&app, Method::GET, "/api/v1/info", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Api is working fine"));
    Ok(())
}

#[tokio::test]
async fn test_create_and_list() -> Result<()> {
    let (app, _temp_dir) = create_test_app(100).await?;

    let hq = create(&app, json!({"name": "HQ", "type": "ORGANIZATION"})).await?;
    let root_id = hq["parentId"].as_i64().expect("synthesized root id");

    let west = create(&app, json!({"name": "West", "type": "LOCATION", "parentId": hq["id"]})).await?;
    assert_eq!(west["color"], "#F6AF8E");
    assert_eq!(west["type"], "LOCATION");

    // Numeric strings are accepted for ids
    let alice = create(
        &app,
        json!({"name": "  Alice ", "type": "EMPLOYEE", "parentId": west["id"].to_string()}),
    )
    .await?;
    assert_eq!(alice["name"], "Alice");
    assert_eq!(alice["color"], "#F6AF8E");

    let (status, body) = send(&app, Method::GET, "/api/v1/nodes", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let nodes = body["data"]["nodes"].as_array().expect("forest array");
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["id"], root_id);
    assert_eq!(nodes[0]["name"], "Root Node");
    assert_eq!(nodes[0]["children"][0]["name"], "HQ");
    assert_eq!(nodes[0]["children"][0]["children"][0]["children"][0]["name"], "Alice");
    Ok(())
}

#[tokio::test]
async fn test_create_validation_errors() -> Result<()> {
    let (app, _temp_dir) = create_test_app(100).await?;

    for body in [
        json!({"type": "EMPLOYEE"}),
        json!({"name": "", "type": "EMPLOYEE"}),
        json!({"name": "x".repeat(101), "type": "EMPLOYEE"}),
        json!({"name": "Bob", "type": "INTERN"}),
        json!({"name": "Bob", "type": "EMPLOYEE", "parentId": "abc"}),
        json!({"name": "Bob", "type": "EMPLOYEE", "parentId": -4}),
    ] {
        let (status, error) = send(&app, Method::POST, "/api/v1/nodes", Some(body.clone())).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(error["code"], "VALIDATION_ERROR");
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/nodes")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, error) = send(
        &app,
        Method::POST,
        "/api/v1/nodes",
        Some(json!({"name": "Bob", "type": "EMPLOYEE", "parentId": 999})),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_update_value() -> Result<()> {
    let (app, _temp_dir) = create_test_app(100).await?;

    let org = create(&app, json!({"name": "Org", "type": "ORGANIZATION"})).await?;
    let team = create(&app, json!({"name": "Team", "type": "EMPLOYEE", "parentId": org["id"]})).await?;
    let member = create(&app, json!({"name": "Member", "type": "EMPLOYEE", "parentId": team["id"]})).await?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/nodes/update",
        Some(json!({"nodeId": team["id"], "name": "Platform", "type": "DEPARTMENT"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let updated = &body["data"]["node"];
    assert_eq!(updated["name"], "Platform");
    assert_eq!(updated["type"], "DEPARTMENT");
    assert_eq!(updated["color"], "#F6AF8E");

    let (_, body) = send(&app, Method::GET, "/api/v1/nodes", None).await?;
    let platform = &body["data"]["nodes"][0]["children"][0]["children"][0];
    assert_eq!(platform["id"], team["id"]);
    assert_eq!(platform["children"][0]["id"], member["id"]);
    assert_eq!(platform["children"][0]["color"], "#F6AF8E");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/nodes/update",
        Some(json!({"name": "No id"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/nodes/update",
        Some(json!({"nodeId": 12345, "name": "Ghost"})),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_move_and_shift() -> Result<()> {
    let (app, _temp_dir) = create_test_app(100).await?;

    let org = create(&app, json!({"name": "Org", "type": "ORGANIZATION"})).await?;
    let a = create(&app, json!({"name": "A", "type": "EMPLOYEE", "parentId": org["id"]})).await?;
    let child = create(&app, json!({"name": "C", "type": "EMPLOYEE", "parentId": a["id"]})).await?;
    let b = create(&app, json!({"name": "B", "type": "EMPLOYEE", "parentId": org["id"]})).await?;

    // Into own descendant
    let (status, error) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/nodes/{}", a["id"]),
        Some(json!({"newParentId": child["id"], "option": "move"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "INVALID_OPERATION");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/nodes/{}", a["id"]),
        Some(json!({"newParentId": b["id"], "option": "sideways"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/nodes/{}", a["id"]),
        Some(json!({"newParentId": b["id"], "option": "shift"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["node"]["parentId"], b["id"]);

    // The child stayed behind with the former parent
    let (_, body) = send(&app, Method::GET, "/api/v1/nodes", None).await?;
    let org_children: Vec<Value> = body["data"]["nodes"][0]["children"][0]["children"]
        .as_array()
        .expect("org children")
        .iter()
        .map(|c| c["id"].clone())
        .collect();
    assert_eq!(org_children, vec![child["id"].clone(), b["id"].clone()]);
    Ok(())
}

#[tokio::test]
async fn test_delete() -> Result<()> {
    let (app, _temp_dir) = create_test_app(100).await?;

    let org = create(&app, json!({"name": "Org", "type": "ORGANIZATION"})).await?;
    let a = create(&app, json!({"name": "A", "type": "EMPLOYEE", "parentId": org["id"]})).await?;
    create(&app, json!({"name": "C", "type": "EMPLOYEE", "parentId": a["id"]})).await?;

    let uri = format!("/api/v1/nodes/{}", a["id"]);
    let (status, _) = send(&app, Method::DELETE, &uri, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "option is required");

    let (status, body) = send(&app, Method::DELETE, &format!("{uri}?option=shift-children"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["message"], "Node deleted successfully");
    assert_eq!(body["data"]["reparented"], 1);

    let (status, error) = send(&app, Method::DELETE, &format!("{uri}?option=remove-all"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "NOT_FOUND");

    let (status, _) = send(&app, Method::DELETE, "/api/v1/nodes/abc?option=remove-all", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_not_found() -> Result<()> {
    let (app, _temp_dir) = create_test_app(100).await?;

    let (status, error) = send(&app, Method::GET, "/api/v2/whatever", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], "Not found");
    assert_eq!(error["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_rate_limit() -> Result<()> {
    let (app, _temp_dir) = create_test_app(2).await?;

    for _ in 0..2 {
        let (status, _) = send(&app, Method::GET, "/api/v1/info", None).await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, error) = send(&app, Method::GET, "/api/v1/info", None).await?;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(error["code"], "RATE_LIMITED");
    Ok(())
}
