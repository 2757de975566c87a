use anyhow::Result;

use crate::logic::{resolve_or_create_default_project, Reconciler};
use crate::model::{
    Endpoint, HttpMethod, ParamType, ParameterInput, Side, SpecInput, StatusCodeInput,
};
use crate::store::traits::Store;

/// Load a small demonstration data set: one endpoint per status so the UI
/// has something to show on a fresh database. Skips loading when endpoints
/// already exist.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    if !store.list_endpoints(None).await?.is_empty() {
        log::info!("seed data skipped, endpoints already present");
        return Ok(());
    }

    let project = resolve_or_create_default_project(store).await?;

    // SYNCED: both sides agree.
    let mut list_users = Endpoint::new(
        project.id.clone(),
        "/users".to_string(),
        HttpMethod::Get,
        Some("List users".to_string()),
        Some("Paginated user listing".to_string()),
    );
    let agreed = || SpecInput {
        parameters: vec![ParameterInput {
            name: "page".to_string(),
            param_type: ParamType::Number,
            required: false,
            description: Some("1-based page index".to_string()),
            default_value: Some("1".to_string()),
            validation: None,
        }],
        status_codes: vec![StatusCodeInput {
            code: 200,
            description: Some("OK".to_string()),
            response_body: None,
        }],
        ..Default::default()
    };
    Reconciler::attach_spec(&mut list_users, Side::Frontend, agreed().into_spec(), false)?;
    Reconciler::attach_spec(&mut list_users, Side::Backend, agreed().into_spec(), false)?;
    store.insert_endpoint(&list_users).await?;

    // CONFLICT: the sides disagree on a parameter type and an error code.
    let mut create_user = Endpoint::new(
        project.id.clone(),
        "/users".to_string(),
        HttpMethod::Post,
        Some("Create user".to_string()),
        None,
    );
    Reconciler::attach_spec(
        &mut create_user,
        Side::Frontend,
        SpecInput {
            parameters: vec![ParameterInput {
                name: "age".to_string(),
                param_type: ParamType::String,
                required: true,
                description: None,
                default_value: None,
                validation: None,
            }],
            status_codes: vec![StatusCodeInput {
                code: 201,
                description: None,
                response_body: None,
            }],
            ..Default::default()
        }
        .into_spec(),
        false,
    )?;
    Reconciler::attach_spec(
        &mut create_user,
        Side::Backend,
        SpecInput {
            parameters: vec![ParameterInput {
                name: "age".to_string(),
                param_type: ParamType::Number,
                required: true,
                description: None,
                default_value: None,
                validation: None,
            }],
            status_codes: vec![
                StatusCodeInput {
                    code: 201,
                    description: None,
                    response_body: None,
                },
                StatusCodeInput {
                    code: 422,
                    description: Some("Validation failed".to_string()),
                    response_body: None,
                },
            ],
            ..Default::default()
        }
        .into_spec(),
        false,
    )?;
    store.insert_endpoint(&create_user).await?;

    // PENDING: only the backend has declared its side.
    let mut delete_user = Endpoint::new(
        project.id.clone(),
        "/users/{id}".to_string(),
        HttpMethod::Delete,
        Some("Delete user".to_string()),
        None,
    );
    Reconciler::attach_spec(
        &mut delete_user,
        Side::Backend,
        SpecInput {
            status_codes: vec![StatusCodeInput {
                code: 204,
                description: None,
                response_body: None,
            }],
            ..Default::default()
        }
        .into_spec(),
        false,
    )?;
    store.insert_endpoint(&delete_user).await?;

    // UNDEFINED: tracked but not yet specified by either side.
    let placeholder = Endpoint::new(
        project.id,
        "/reports/usage".to_string(),
        HttpMethod::Get,
        Some("Usage report".to_string()),
        None,
    );
    store.insert_endpoint(&placeholder).await?;

    log::info!("seed data loaded: 4 endpoints in '{}'", project.name);
    Ok(())
}
