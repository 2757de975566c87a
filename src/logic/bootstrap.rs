use anyhow::Result;

use crate::model::{Project, DEFAULT_PROJECT_NAME};
use crate::store::traits::Store;

/// Resolve the singleton default project, creating it on first use. Called
/// whenever an endpoint arrives without an explicit project reference.
pub async fn resolve_or_create_default_project<S: Store>(store: &S) -> Result<Project> {
    if let Some(project) = store.find_project_by_name(DEFAULT_PROJECT_NAME).await? {
        return Ok(project);
    }

    let project = Project::default_project();
    log::info!("creating default project '{}'", project.id);
    store.upsert_project(project.clone()).await?;
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::traits::ProjectStore;

    #[tokio::test]
    async fn creates_the_default_project_once() {
        let store = MemoryStore::new();

        let first = resolve_or_create_default_project(&store).await.unwrap();
        assert_eq!(first.name, DEFAULT_PROJECT_NAME);
        assert!(first.is_public);

        let second = resolve_or_create_default_project(&store).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list_projects().await.unwrap().len(), 1);
    }
}
