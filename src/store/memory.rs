use std::collections::HashMap;

use anyhow::Result;
use parking_lot::RwLock;

use crate::model::{Endpoint, Id, Project};
use crate::store::traits::{EndpointStore, ProjectStore};

/// In-memory store keyed by id. Backs the test suite and local runs without
/// PostgreSQL; the version compare-and-swap happens under the write lock so
/// it carries the same stale-write semantics as the transactional store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: RwLock<HashMap<Id, Project>>,
    endpoints: RwLock<HashMap<Id, Endpoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProjectStore for MemoryStore {
    async fn get_project(&self, id: &Id) -> Result<Option<Project>> {
        Ok(self.projects.read().get(id).cloned())
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        Ok(self
            .projects
            .read()
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self.projects.read().values().cloned().collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(projects)
    }

    async fn upsert_project(&self, project: Project) -> Result<()> {
        self.projects.write().insert(project.id.clone(), project);
        Ok(())
    }

    async fn delete_project(&self, id: &Id) -> Result<bool> {
        let removed = self.projects.write().remove(id).is_some();
        if removed {
            // Projects own their endpoints; the cascade mirrors the
            // relational schema.
            self.endpoints.write().retain(|_, ep| &ep.project_id != id);
        }
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl EndpointStore for MemoryStore {
    async fn get_endpoint(&self, id: &Id) -> Result<Option<Endpoint>> {
        Ok(self.endpoints.read().get(id).cloned())
    }

    async fn list_endpoints(&self, project_id: Option<&Id>) -> Result<Vec<Endpoint>> {
        let mut endpoints: Vec<Endpoint> = self
            .endpoints
            .read()
            .values()
            .filter(|ep| project_id.map(|pid| &ep.project_id == pid).unwrap_or(true))
            .cloned()
            .collect();
        endpoints.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(endpoints)
    }

    async fn insert_endpoint(&self, endpoint: &Endpoint) -> Result<()> {
        self.endpoints
            .write()
            .insert(endpoint.id.clone(), endpoint.clone());
        Ok(())
    }

    async fn save_endpoint(&self, endpoint: &Endpoint) -> Result<bool> {
        let mut endpoints = self.endpoints.write();
        match endpoints.get(&endpoint.id) {
            Some(stored) if stored.version == endpoint.version => {
                let mut updated = endpoint.clone();
                updated.version += 1;
                endpoints.insert(updated.id.clone(), updated);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_endpoint(&self, id: &Id) -> Result<bool> {
        // Specs, parameters, headers, status codes, and conflicts live inside
        // the aggregate, so removing it removes the whole ownership tree.
        Ok(self.endpoints.write().remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::Reconciler;
    use crate::model::{HttpMethod, ParamType, ParameterInput, Side, SpecInput};

    fn endpoint(project_id: &str, path: &str) -> Endpoint {
        Endpoint::new(
            project_id.to_string(),
            path.to_string(),
            HttpMethod::Get,
            None,
            None,
        )
    }

    #[tokio::test]
    async fn project_crud_round_trip() {
        let store = MemoryStore::new();
        let project = Project::new("Payments".to_string(), None, false);
        store.upsert_project(project.clone()).await.unwrap();

        assert_eq!(
            store.get_project(&project.id).await.unwrap().unwrap().name,
            "Payments"
        );
        assert!(store
            .find_project_by_name("Payments")
            .await
            .unwrap()
            .is_some());
        assert!(store.delete_project(&project.id).await.unwrap());
        assert!(store.get_project(&project.id).await.unwrap().is_none());
        assert!(!store.delete_project(&project.id).await.unwrap());
    }

    #[tokio::test]
    async fn endpoint_listing_scopes_by_project() {
        let store = MemoryStore::new();
        store.insert_endpoint(&endpoint("p1", "/a")).await.unwrap();
        store.insert_endpoint(&endpoint("p1", "/b")).await.unwrap();
        store.insert_endpoint(&endpoint("p2", "/c")).await.unwrap();

        assert_eq!(store.list_endpoints(None).await.unwrap().len(), 3);
        assert_eq!(
            store
                .list_endpoints(Some(&"p1".to_string()))
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn save_bumps_version_and_rejects_stale_writers() {
        let store = MemoryStore::new();
        let mut ep = endpoint("p1", "/users");
        store.insert_endpoint(&ep).await.unwrap();

        // First writer saves against the version it read.
        Reconciler::attach_spec(
            &mut ep,
            Side::Frontend,
            SpecInput {
                parameters: vec![ParameterInput {
                    name: "id".to_string(),
                    param_type: ParamType::String,
                    required: true,
                    description: None,
                    default_value: None,
                    validation: None,
                }],
                ..Default::default()
            }
            .into_spec(),
            false,
        )
        .unwrap();
        assert!(store.save_endpoint(&ep).await.unwrap());

        let stored = store.get_endpoint(&ep.id).await.unwrap().unwrap();
        assert_eq!(stored.version, ep.version + 1);

        // A second writer holding the old version loses the race.
        assert!(!store.save_endpoint(&ep).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_an_endpoint_removes_the_whole_tree() {
        let store = MemoryStore::new();
        let mut ep = endpoint("p1", "/users");
        Reconciler::attach_spec(
            &mut ep,
            Side::Frontend,
            SpecInput::default().into_spec(),
            false,
        )
        .unwrap();
        store.insert_endpoint(&ep).await.unwrap();

        assert!(store.delete_endpoint(&ep.id).await.unwrap());
        assert!(store.get_endpoint(&ep.id).await.unwrap().is_none());
        assert!(!store.delete_endpoint(&ep.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_project_cascades_to_its_endpoints() {
        let store = MemoryStore::new();
        let project = Project::new("Payments".to_string(), None, false);
        store.upsert_project(project.clone()).await.unwrap();
        let ep = endpoint(&project.id, "/pay");
        store.insert_endpoint(&ep).await.unwrap();

        store.delete_project(&project.id).await.unwrap();
        assert!(store.get_endpoint(&ep.id).await.unwrap().is_none());
    }
}
