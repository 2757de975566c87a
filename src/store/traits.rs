use crate::model::{Endpoint, Id, Project};
use anyhow::Result;

#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get_project(&self, id: &Id) -> Result<Option<Project>>;
    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>>;
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn upsert_project(&self, project: Project) -> Result<()>;
    async fn delete_project(&self, id: &Id) -> Result<bool>;
}

/// The endpoint aggregate is persisted whole: one save rewrites the endpoint
/// row, its specs with their children, and its conflicts inside a single
/// transaction, so a derived status is never visible alongside specs it was
/// not computed from.
#[async_trait::async_trait]
pub trait EndpointStore: Send + Sync {
    async fn get_endpoint(&self, id: &Id) -> Result<Option<Endpoint>>;
    /// List aggregates, optionally scoped to one project.
    async fn list_endpoints(&self, project_id: Option<&Id>) -> Result<Vec<Endpoint>>;
    async fn insert_endpoint(&self, endpoint: &Endpoint) -> Result<()>;
    /// Compare-and-swap save: `endpoint.version` is the version the caller
    /// read. Persists with the version bumped and returns true, or returns
    /// false when the stored version no longer matches (stale write).
    async fn save_endpoint(&self, endpoint: &Endpoint) -> Result<bool>;
    /// Deletes the endpoint and cascades to specs, parameters, headers,
    /// status codes, and conflicts.
    async fn delete_endpoint(&self, id: &Id) -> Result<bool>;
}

pub trait Store: ProjectStore + EndpointStore + Send + Sync {}
impl<T: ProjectStore + EndpointStore + Send + Sync> Store for T {}
