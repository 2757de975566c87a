pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export error types
pub use error::{CoreError, CoreResult};

// Export logic types
pub use logic::{ConflictDetector, EndpointFilter, Reconciler, Workspace};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, Store};

// Function for integration testing against a live database
pub async fn run_server() -> anyhow::Result<()> {
    use axum::serve;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with INFO level only (suppress DEBUG logs)
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    // Load configuration
    let config = crate::config::AppConfig::load()?;

    // Connect to PostgreSQL
    let database_url = config.database_url()?;
    let postgres_store = crate::store::PostgresStore::new(&database_url).await?;

    // Run migrations
    postgres_store.migrate().await?;

    let store = Arc::new(postgres_store);

    // Create router with state
    let app = crate::api::routes::create_router().with_state(store);

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;

    serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::logic::Reconciler;
    use crate::model::{
        Endpoint, EndpointStatus, HttpMethod, ParamType, ParameterInput, Severity, Side, SpecInput,
    };

    #[tokio::test]
    async fn spec_round_trip_produces_the_expected_conflict() {
        // Frontend declares {name:"id", type:STRING, required:true}, backend
        // declares {name:"id", type:NUMBER, required:true}: exactly one
        // parameter conflict at parameters.id.type with MEDIUM severity.
        let mut endpoint = Endpoint::new(
            "project-1".to_string(),
            "/users/{id}".to_string(),
            HttpMethod::Get,
            None,
            None,
        );

        let frontend = SpecInput {
            parameters: vec![ParameterInput {
                name: "id".to_string(),
                param_type: ParamType::String,
                required: true,
                description: None,
                default_value: None,
                validation: None,
            }],
            ..Default::default()
        };
        let backend = SpecInput {
            parameters: vec![ParameterInput {
                name: "id".to_string(),
                param_type: ParamType::Number,
                required: true,
                description: None,
                default_value: None,
                validation: None,
            }],
            ..Default::default()
        };

        Reconciler::attach_spec(&mut endpoint, Side::Frontend, frontend.into_spec(), false)
            .unwrap();
        assert_eq!(endpoint.status, EndpointStatus::Pending);

        Reconciler::attach_spec(&mut endpoint, Side::Backend, backend.into_spec(), false)
            .unwrap();
        assert_eq!(endpoint.status, EndpointStatus::Conflict);
        assert_eq!(endpoint.conflicts.len(), 1);
        assert_eq!(endpoint.conflicts[0].field, "parameters.id.type");
        assert_eq!(endpoint.conflicts[0].severity, Severity::Medium);
    }

    #[test]
    fn endpoint_view_serialization_shape() {
        use crate::api::handlers::EndpointView;

        let endpoint = Endpoint::new(
            "project-1".to_string(),
            "/users".to_string(),
            HttpMethod::Post,
            None,
            None,
        );
        let view = EndpointView::from(endpoint);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["method"], "POST");
        assert_eq!(json["status"], "UNDEFINED");
        assert!(json["conflicts"].as_array().unwrap().is_empty());
        // Absent specs are omitted entirely, not serialized as null.
        assert!(json.get("frontend_spec").is_none());
        assert!(json.get("backend_spec").is_none());
    }
}
