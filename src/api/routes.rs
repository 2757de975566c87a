use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // API Documentation
        .route("/docs", get(handlers::get_api_docs))
        // Default-project bootstrap
        .route("/init", post(handlers::init_project::<S>))
        // Project management
        .route("/projects", get(handlers::list_projects::<S>))
        .route("/projects", post(handlers::create_project::<S>))
        .route("/projects/:project_id", get(handlers::get_project::<S>))
        .route(
            "/projects/:project_id",
            delete(handlers::delete_project::<S>),
        )
        // Endpoint listing and counts (filtered through the workspace)
        .route("/endpoints", get(handlers::list_endpoints::<S>))
        .route("/endpoints/summary", get(handlers::endpoint_summary::<S>))
        // Endpoint lifecycle
        .route("/endpoints", post(handlers::create_endpoint::<S>))
        .route("/endpoints/:endpoint_id", get(handlers::get_endpoint::<S>))
        .route(
            "/endpoints/:endpoint_id",
            put(handlers::update_endpoint::<S>),
        )
        .route(
            "/endpoints/:endpoint_id",
            delete(handlers::delete_endpoint::<S>),
        )
        // Per-side spec management
        .route(
            "/endpoints/:endpoint_id/specs/:side",
            put(handlers::put_spec::<S>),
        )
        .route(
            "/endpoints/:endpoint_id/specs/:side",
            delete(handlers::delete_spec::<S>),
        )
        // Conflict resolution (records are kept for audit)
        .route(
            "/endpoints/:endpoint_id/conflicts/:conflict_id/resolve",
            post(handlers::resolve_conflict::<S>),
        )
}
