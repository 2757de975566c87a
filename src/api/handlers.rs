use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::CoreError;
use crate::logic::{
    resolve_or_create_default_project, validate_path, EndpointFilter, Reconciler, Workspace,
};
use crate::model::{
    Conflict, Endpoint, EndpointSpec, EndpointStatus, EndpointUpdate, HttpMethod, Id, NewEndpoint,
    NewProject, Project, Side, SpecInput,
};
use crate::store::traits::Store;

pub type AppState<S> = Arc<S>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Endpoint as consumed by the presentation layer: specs resolved per side
/// and only the unresolved conflicts listed.
#[derive(Debug, Serialize)]
pub struct EndpointView {
    pub id: Id,
    pub project_id: Id,
    pub path: String,
    pub method: HttpMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: EndpointStatus,
    pub version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_spec: Option<EndpointSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_spec: Option<EndpointSpec>,
    pub conflicts: Vec<Conflict>,
}

impl From<Endpoint> for EndpointView {
    fn from(endpoint: Endpoint) -> Self {
        let conflicts = endpoint
            .conflicts
            .iter()
            .filter(|c| !c.resolved)
            .cloned()
            .collect();
        Self {
            id: endpoint.id,
            project_id: endpoint.project_id,
            path: endpoint.path,
            method: endpoint.method,
            name: endpoint.name,
            description: endpoint.description,
            status: endpoint.status,
            version: endpoint.version,
            frontend_spec: endpoint.frontend_spec,
            backend_spec: endpoint.backend_spec,
            conflicts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total: usize,
    pub conflicts: usize,
    pub synced: usize,
    pub pending: usize,
    pub undefined: usize,
}

#[derive(Debug, Serialize)]
pub struct InitResponse {
    pub message: String,
    pub project: Project,
}

#[derive(Debug, Deserialize)]
pub struct EndpointListQuery {
    pub project: Option<Id>,
    /// Comma-separated status values, e.g. `CONFLICT,PENDING`.
    pub status: Option<String>,
    /// Comma-separated methods, e.g. `GET,POST`.
    pub method: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub project: Option<Id>,
}

#[derive(Debug, Deserialize)]
pub struct SpecPutQuery {
    pub replace: Option<bool>,
    pub expected_version: Option<i64>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: CoreError) -> ApiError {
    let status = match &err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::DuplicateSpecSide { .. } => StatusCode::CONFLICT,
        CoreError::StaleWrite { .. } => StatusCode::CONFLICT,
        CoreError::DetectorFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("storage error: {}", err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code(),
        }),
    )
}

fn storage(err: anyhow::Error) -> ApiError {
    error_response(CoreError::Storage(err))
}

fn parse_side(side: &str) -> Result<Side, ApiError> {
    Side::parse(side).ok_or_else(|| {
        error_response(CoreError::Validation(format!(
            "side must be 'frontend' or 'backend', got '{}'",
            side
        )))
    })
}

fn parse_filter(query: &EndpointListQuery) -> Result<EndpointFilter, ApiError> {
    let mut statuses = Vec::new();
    if let Some(raw) = &query.status {
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let status = EndpointStatus::parse(token).ok_or_else(|| {
                error_response(CoreError::Validation(format!(
                    "unknown status filter '{}'",
                    token
                )))
            })?;
            statuses.push(status);
        }
    }

    let mut methods = Vec::new();
    if let Some(raw) = &query.method {
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let method = HttpMethod::parse(token).ok_or_else(|| {
                error_response(CoreError::Validation(format!(
                    "unknown method filter '{}'",
                    token
                )))
            })?;
            methods.push(method);
        }
    }

    Ok(EndpointFilter {
        statuses,
        methods,
        search: query.search.clone(),
    })
}

async fn load_endpoint<S: Store>(store: &S, id: &Id) -> Result<Endpoint, ApiError> {
    store
        .get_endpoint(id)
        .await
        .map_err(storage)?
        .ok_or_else(|| error_response(CoreError::not_found("endpoint", id.clone())))
}

/// Persist a mutated aggregate with the version the caller read, then hand
/// back the authoritative stored state.
async fn save_and_reload<S: Store>(store: &S, endpoint: &Endpoint) -> Result<Endpoint, ApiError> {
    let saved = store.save_endpoint(endpoint).await.map_err(storage)?;
    if !saved {
        return Err(error_response(CoreError::StaleWrite {
            expected: endpoint.version,
        }));
    }
    load_endpoint(store, &endpoint.id).await
}

// ---------------------------------------------------------------------------
// Project handlers

pub async fn init_project<S: Store>(
    State(store): State<AppState<S>>,
) -> Result<Json<InitResponse>, ApiError> {
    let existing = store
        .find_project_by_name(crate::model::DEFAULT_PROJECT_NAME)
        .await
        .map_err(storage)?;
    if let Some(project) = existing {
        return Ok(Json(InitResponse {
            message: "Project already exists".to_string(),
            project,
        }));
    }

    let project = resolve_or_create_default_project(store.as_ref())
        .await
        .map_err(storage)?;
    Ok(Json(InitResponse {
        message: "Project created successfully".to_string(),
        project,
    }))
}

pub async fn list_projects<S: Store>(
    State(store): State<AppState<S>>,
) -> Result<Json<ListResponse<Project>>, ApiError> {
    let projects = store.list_projects().await.map_err(storage)?;
    let total = projects.len();
    Ok(Json(ListResponse {
        items: projects,
        total,
    }))
}

pub async fn create_project<S: Store>(
    State(store): State<AppState<S>>,
    Json(payload): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(error_response(CoreError::Validation(
            "project name must not be empty".to_string(),
        )));
    }
    let project = payload.into_project();
    store
        .upsert_project(project.clone())
        .await
        .map_err(storage)?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project<S: Store>(
    State(store): State<AppState<S>>,
    Path(project_id): Path<Id>,
) -> Result<Json<Project>, ApiError> {
    let project = store
        .get_project(&project_id)
        .await
        .map_err(storage)?
        .ok_or_else(|| error_response(CoreError::not_found("project", project_id.clone())))?;
    Ok(Json(project))
}

pub async fn delete_project<S: Store>(
    State(store): State<AppState<S>>,
    Path(project_id): Path<Id>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = store.delete_project(&project_id).await.map_err(storage)?;
    if !deleted {
        return Err(error_response(CoreError::not_found(
            "project",
            project_id,
        )));
    }
    Ok(Json(MessageResponse {
        message: "Project deleted successfully".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Endpoint handlers

pub async fn list_endpoints<S: Store>(
    State(store): State<AppState<S>>,
    Query(query): Query<EndpointListQuery>,
) -> Result<Json<ListResponse<EndpointView>>, ApiError> {
    let filter = parse_filter(&query)?;
    let endpoints = store
        .list_endpoints(query.project.as_ref())
        .await
        .map_err(storage)?;

    let workspace = Workspace::new(endpoints);
    let items: Vec<EndpointView> = workspace
        .filtered(&filter)
        .cloned()
        .map(EndpointView::from)
        .collect();
    let total = items.len();
    Ok(Json(ListResponse { items, total }))
}

pub async fn endpoint_summary<S: Store>(
    State(store): State<AppState<S>>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let endpoints = store
        .list_endpoints(query.project.as_ref())
        .await
        .map_err(storage)?;
    let workspace = Workspace::new(endpoints);
    Ok(Json(SummaryResponse {
        total: workspace.len(),
        conflicts: workspace.conflicts_count(),
        synced: workspace.synced_count(),
        pending: workspace.count_with_status(EndpointStatus::Pending),
        undefined: workspace.count_with_status(EndpointStatus::Undefined),
    }))
}

pub async fn create_endpoint<S: Store>(
    State(store): State<AppState<S>>,
    Json(payload): Json<NewEndpoint>,
) -> Result<(StatusCode, Json<EndpointView>), ApiError> {
    validate_path(&payload.path).map_err(error_response)?;

    // Resolve the owning project: a supplied id must exist, a missing one
    // falls back to the auto-provisioned default project.
    let project_id = match payload.project_id {
        Some(project_id) => {
            store
                .get_project(&project_id)
                .await
                .map_err(storage)?
                .ok_or_else(|| {
                    error_response(CoreError::not_found("project", project_id.clone()))
                })?;
            project_id
        }
        None => resolve_or_create_default_project(store.as_ref())
            .await
            .map_err(storage)?
            .id,
    };

    let mut endpoint = Endpoint::new(
        project_id,
        payload.path,
        payload.method,
        payload.name,
        payload.description,
    );
    if let Some(spec) = payload.frontend_spec {
        Reconciler::attach_spec(&mut endpoint, Side::Frontend, spec.into_spec(), true)
            .map_err(error_response)?;
    }
    if let Some(spec) = payload.backend_spec {
        Reconciler::attach_spec(&mut endpoint, Side::Backend, spec.into_spec(), true)
            .map_err(error_response)?;
    }

    store.insert_endpoint(&endpoint).await.map_err(storage)?;
    log::info!(
        "created endpoint {} {} ({})",
        endpoint.method.as_str(),
        endpoint.path,
        endpoint.id
    );
    Ok((StatusCode::CREATED, Json(EndpointView::from(endpoint))))
}

pub async fn get_endpoint<S: Store>(
    State(store): State<AppState<S>>,
    Path(endpoint_id): Path<Id>,
) -> Result<Json<EndpointView>, ApiError> {
    let endpoint = load_endpoint(store.as_ref(), &endpoint_id).await?;
    Ok(Json(EndpointView::from(endpoint)))
}

pub async fn update_endpoint<S: Store>(
    State(store): State<AppState<S>>,
    Path(endpoint_id): Path<Id>,
    Json(payload): Json<EndpointUpdate>,
) -> Result<Json<EndpointView>, ApiError> {
    let mut endpoint = load_endpoint(store.as_ref(), &endpoint_id).await?;

    if let Some(expected) = payload.expected_version {
        if expected != endpoint.version {
            return Err(error_response(CoreError::StaleWrite { expected }));
        }
    }

    if let Some(path) = payload.path {
        validate_path(&path).map_err(error_response)?;
        endpoint.path = path;
    }
    if let Some(method) = payload.method {
        endpoint.method = method;
    }
    if let Some(name) = payload.name {
        endpoint.name = Some(name);
    }
    if let Some(description) = payload.description {
        endpoint.description = Some(description);
    }

    // Inline specs upsert their side; omitted sides are untouched. Any
    // client-supplied status never reaches the aggregate.
    if let Some(spec) = payload.frontend_spec {
        Reconciler::attach_spec(&mut endpoint, Side::Frontend, spec.into_spec(), true)
            .map_err(error_response)?;
    }
    if let Some(spec) = payload.backend_spec {
        Reconciler::attach_spec(&mut endpoint, Side::Backend, spec.into_spec(), true)
            .map_err(error_response)?;
    }
    endpoint.touch();

    let stored = save_and_reload(store.as_ref(), &endpoint).await?;
    Ok(Json(EndpointView::from(stored)))
}

pub async fn delete_endpoint<S: Store>(
    State(store): State<AppState<S>>,
    Path(endpoint_id): Path<Id>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = store.delete_endpoint(&endpoint_id).await.map_err(storage)?;
    if !deleted {
        return Err(error_response(CoreError::not_found(
            "endpoint",
            endpoint_id,
        )));
    }
    Ok(Json(MessageResponse {
        message: "Endpoint deleted successfully".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Spec and conflict handlers

pub async fn put_spec<S: Store>(
    State(store): State<AppState<S>>,
    Path((endpoint_id, side)): Path<(Id, String)>,
    Query(query): Query<SpecPutQuery>,
    Json(payload): Json<SpecInput>,
) -> Result<Json<EndpointView>, ApiError> {
    let side = parse_side(&side)?;
    let mut endpoint = load_endpoint(store.as_ref(), &endpoint_id).await?;

    if let Some(expected) = query.expected_version {
        if expected != endpoint.version {
            return Err(error_response(CoreError::StaleWrite { expected }));
        }
    }

    let replace = query.replace.unwrap_or(false);
    Reconciler::attach_spec(&mut endpoint, side, payload.into_spec(), replace)
        .map_err(error_response)?;

    let stored = save_and_reload(store.as_ref(), &endpoint).await?;
    Ok(Json(EndpointView::from(stored)))
}

pub async fn delete_spec<S: Store>(
    State(store): State<AppState<S>>,
    Path((endpoint_id, side)): Path<(Id, String)>,
) -> Result<Json<EndpointView>, ApiError> {
    let side = parse_side(&side)?;
    let mut endpoint = load_endpoint(store.as_ref(), &endpoint_id).await?;

    // Removing an absent spec is a no-op, not an error.
    if Reconciler::remove_spec(&mut endpoint, side).is_none() {
        return Ok(Json(EndpointView::from(endpoint)));
    }

    let stored = save_and_reload(store.as_ref(), &endpoint).await?;
    Ok(Json(EndpointView::from(stored)))
}

pub async fn resolve_conflict<S: Store>(
    State(store): State<AppState<S>>,
    Path((endpoint_id, conflict_id)): Path<(Id, Id)>,
) -> Result<Json<EndpointView>, ApiError> {
    let mut endpoint = load_endpoint(store.as_ref(), &endpoint_id).await?;
    Reconciler::resolve_conflict(&mut endpoint, &conflict_id).map_err(error_response)?;

    let stored = save_and_reload(store.as_ref(), &endpoint).await?;
    Ok(Json(EndpointView::from(stored)))
}

// ---------------------------------------------------------------------------
// Documentation

pub async fn get_api_docs() -> Html<&'static str> {
    Html(API_DOCS_HTML)
}

const API_DOCS_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>API Sync</title></head>
<body>
<h1>API Sync</h1>
<p>Endpoint specification reconciliation server.</p>
<ul>
  <li><code>GET /health</code> - liveness</li>
  <li><code>POST /init</code> - resolve-or-create the default project</li>
  <li><code>GET|POST /projects</code>, <code>GET|DELETE /projects/:id</code></li>
  <li><code>GET /endpoints?project=&amp;status=&amp;method=&amp;search=</code> - filtered list</li>
  <li><code>GET /endpoints/summary</code> - per-status counts</li>
  <li><code>POST /endpoints</code> - create (inline specs allowed; status is always derived)</li>
  <li><code>GET|PUT|DELETE /endpoints/:id</code></li>
  <li><code>PUT /endpoints/:id/specs/:side?replace=true</code> - attach or replace one side</li>
  <li><code>DELETE /endpoints/:id/specs/:side</code></li>
  <li><code>POST /endpoints/:id/conflicts/:conflict_id/resolve</code></li>
</ul>
</body>
</html>"#;
