use std::sync::Arc;

use api_sync::api::routes::create_router;
use api_sync::store::MemoryStore;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

fn app() -> Router {
    create_router::<MemoryStore>().with_state(Arc::new(MemoryStore::new()))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_and_docs_respond() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn init_is_idempotent() {
    let app = app();

    let (status, first) = send(&app, Method::POST, "/init", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["message"], "Project created successfully");

    let (status, second) = send(&app, Method::POST, "/init", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["message"], "Project already exists");
    assert_eq!(first["project"]["id"], second["project"]["id"]);
}

#[tokio::test]
async fn creating_without_project_bootstraps_the_default() {
    let app = app();

    let (status, endpoint) = send(
        &app,
        Method::POST,
        "/endpoints",
        Some(serde_json::json!({"path": "/users", "method": "POST"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(endpoint["status"], "UNDEFINED");
    assert!(endpoint["conflicts"].as_array().unwrap().is_empty());

    let (status, projects) = send(&app, Method::GET, "/projects", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(projects["total"], 1);
    assert_eq!(projects["items"][0]["name"], "Default Project");
    assert_eq!(endpoint["project_id"], projects["items"][0]["id"]);
}

#[tokio::test]
async fn creating_with_unknown_project_is_not_found() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/endpoints",
        Some(serde_json::json!({
            "path": "/users",
            "method": "GET",
            "project_id": "missing"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn empty_path_is_a_validation_error() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/endpoints",
        Some(serde_json::json!({"path": "  ", "method": "GET"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn client_supplied_status_is_discarded() {
    let app = app();
    let (status, endpoint) = send(
        &app,
        Method::POST,
        "/endpoints",
        Some(serde_json::json!({
            "path": "/users",
            "method": "GET",
            "status": "SYNCED"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(endpoint["status"], "UNDEFINED");
}

#[tokio::test]
async fn full_reconciliation_lifecycle() {
    let app = app();

    // Create with a frontend spec only: PENDING.
    let (status, endpoint) = send(
        &app,
        Method::POST,
        "/endpoints",
        Some(serde_json::json!({
            "path": "/users/{id}",
            "method": "GET",
            "name": "Get user",
            "frontend_spec": {
                "parameters": [{"name": "id", "type": "STRING", "required": true}]
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(endpoint["status"], "PENDING");
    let id = endpoint["id"].as_str().unwrap().to_string();

    // Backend declares a different type: CONFLICT with one record.
    let (status, endpoint) = send(
        &app,
        Method::PUT,
        &format!("/endpoints/{}/specs/backend", id),
        Some(serde_json::json!({
            "parameters": [{"name": "id", "type": "NUMBER", "required": true}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(endpoint["status"], "CONFLICT");
    let conflicts = endpoint["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["field"], "parameters.id.type");
    assert_eq!(conflicts[0]["severity"], "MEDIUM");
    assert_eq!(conflicts[0]["type"], "PARAMETER_MISMATCH");
    let conflict_id = conflicts[0]["id"].as_str().unwrap().to_string();

    // A second frontend spec without replace is rejected.
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/endpoints/{}/specs/frontend", id),
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_SPEC_SIDE");

    // Resolving the only conflict flips the endpoint to SYNCED; the record
    // is kept but no longer listed.
    let (status, endpoint) = send(
        &app,
        Method::POST,
        &format!("/endpoints/{}/conflicts/{}/resolve", id, conflict_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(endpoint["status"], "SYNCED");
    assert!(endpoint["conflicts"].as_array().unwrap().is_empty());

    // Removing the backend spec downgrades to PENDING.
    let (status, endpoint) = send(
        &app,
        Method::DELETE,
        &format!("/endpoints/{}/specs/backend", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(endpoint["status"], "PENDING");

    // Delete cascades; lookups afterwards are 404.
    let (status, _) = send(&app, Method::DELETE, &format!("/endpoints/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::GET, &format!("/endpoints/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn filtered_listing_and_summary() {
    let app = app();

    send(
        &app,
        Method::POST,
        "/endpoints",
        Some(serde_json::json!({"path": "/users", "method": "GET"})),
    )
    .await;
    send(
        &app,
        Method::POST,
        "/endpoints",
        Some(serde_json::json!({
            "path": "/orders",
            "method": "POST",
            "frontend_spec": {"authentication": "bearer"},
            "backend_spec": {}
        })),
    )
    .await;

    // The orders endpoint has a CRITICAL authentication conflict.
    let (status, list) = send(&app, Method::GET, "/endpoints?status=CONFLICT", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["path"], "/orders");
    assert_eq!(
        list["items"][0]["conflicts"][0]["type"],
        "AUTHENTICATION_MISMATCH"
    );
    assert_eq!(list["items"][0]["conflicts"][0]["severity"], "CRITICAL");

    let (status, list) = send(
        &app,
        Method::GET,
        "/endpoints?method=GET,PUT&search=users",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["path"], "/users");

    let (status, body) = send(&app, Method::GET, "/endpoints?status=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");

    let (status, summary) = send(&app, Method::GET, "/endpoints/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["conflicts"], 1);
    assert_eq!(summary["undefined"], 1);
    assert_eq!(summary["synced"], 0);
}

#[tokio::test]
async fn stale_writes_are_rejected_with_conflict() {
    let app = app();

    let (_, endpoint) = send(
        &app,
        Method::POST,
        "/endpoints",
        Some(serde_json::json!({"path": "/users", "method": "GET"})),
    )
    .await;
    let id = endpoint["id"].as_str().unwrap().to_string();
    let version = endpoint["version"].as_i64().unwrap();

    // First writer succeeds and bumps the version.
    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/endpoints/{}", id),
        Some(serde_json::json!({"name": "Users", "expected_version": version})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["version"].as_i64().unwrap(), version + 1);

    // Second writer still holds the old version and must re-fetch.
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/endpoints/{}", id),
        Some(serde_json::json!({"name": "Accounts", "expected_version": version})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "STALE_WRITE");
}

#[tokio::test]
async fn null_metadata_fields_leave_existing_values_unchanged() {
    let app = app();

    let (_, endpoint) = send(
        &app,
        Method::POST,
        "/endpoints",
        Some(serde_json::json!({
            "path": "/users",
            "method": "GET",
            "name": "List users",
            "description": "Paginated listing"
        })),
    )
    .await;
    let id = endpoint["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/endpoints/{}", id),
        Some(serde_json::json!({"name": null, "description": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "List users");
    assert_eq!(updated["description"], "Paginated listing");
}

#[tokio::test]
async fn invalid_spec_side_is_a_validation_error() {
    let app = app();
    let (_, endpoint) = send(
        &app,
        Method::POST,
        "/endpoints",
        Some(serde_json::json!({"path": "/users", "method": "GET"})),
    )
    .await;
    let id = endpoint["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/endpoints/{}/specs/server", id),
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn duplicate_parameter_names_are_rejected_before_persistence() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/endpoints",
        Some(serde_json::json!({
            "path": "/users",
            "method": "GET",
            "frontend_spec": {
                "parameters": [
                    {"name": "id", "type": "STRING"},
                    {"name": "id", "type": "NUMBER"}
                ]
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");

    // Nothing was persisted.
    let (_, list) = send(&app, Method::GET, "/endpoints", None).await;
    assert_eq!(list["total"], 0);
}
