use crate::model::{generate_id, Id};
use serde::{Deserialize, Serialize};

/// Name used when an endpoint is created without an explicit project.
pub const DEFAULT_PROJECT_NAME: &str = "Default Project";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: String, // ISO 8601 timestamp
}

impl Project {
    pub fn new(name: String, description: Option<String>, is_public: bool) -> Self {
        Self {
            id: generate_id(),
            name,
            description,
            is_public,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// The auto-provisioned project that owns endpoints created without an
    /// explicit project reference.
    pub fn default_project() -> Self {
        Self::new(
            DEFAULT_PROJECT_NAME.to_string(),
            Some("Auto-provisioned project for endpoints without an explicit project".to_string()),
            true,
        )
    }
}

/// Input model for creating a new project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

impl NewProject {
    pub fn into_project(self) -> Project {
        Project::new(self.name, self.description, self.is_public)
    }
}
