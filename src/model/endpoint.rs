use crate::model::{
    generate_id, Conflict, EndpointSpec, EndpointStatus, HttpMethod, Id, Side, SpecInput,
};
use serde::{Deserialize, Serialize};

/// The endpoint aggregate: path + method identity, at most one spec per side,
/// the full conflict history, and a status derived from all of the above.
///
/// `project_id` is set once at creation and never reassigned. `version` backs
/// optimistic concurrency: the store only persists the aggregate when the
/// stored version still matches, and bumps it on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: Id,
    pub project_id: Id,
    pub path: String,
    pub method: HttpMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: EndpointStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_spec: Option<EndpointSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_spec: Option<EndpointSpec>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    pub version: i64,
    pub created_at: String, // ISO 8601 timestamp
    pub updated_at: String,
}

impl Endpoint {
    pub fn new(
        project_id: Id,
        path: String,
        method: HttpMethod,
        name: Option<String>,
        description: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: generate_id(),
            project_id,
            path,
            method,
            name,
            description,
            status: EndpointStatus::Undefined,
            frontend_spec: None,
            backend_spec: None,
            conflicts: Vec::new(),
            version: 1,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn spec(&self, side: Side) -> Option<&EndpointSpec> {
        match side {
            Side::Frontend => self.frontend_spec.as_ref(),
            Side::Backend => self.backend_spec.as_ref(),
        }
    }

    pub fn spec_slot(&mut self, side: Side) -> &mut Option<EndpointSpec> {
        match side {
            Side::Frontend => &mut self.frontend_spec,
            Side::Backend => &mut self.backend_spec,
        }
    }

    pub fn unresolved_conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(|c| !c.resolved)
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Input model for creating a new endpoint. A missing `project_id` triggers
/// default-project bootstrap; there is no `status` field because status is
/// always derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEndpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Id>,
    pub path: String,
    pub method: HttpMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_spec: Option<SpecInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_spec: Option<SpecInput>,
}

/// Input model for updating endpoint metadata and upserting specs in place.
/// Omitted fields are left unchanged; inline specs replace their side.
/// `name` and `description` can be set but not cleared: a JSON `null`
/// deserializes to `None` and is treated the same as an omitted field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_spec: Option<SpecInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_spec: Option<SpecInput>,
    /// Optimistic concurrency guard; defaults to the currently stored version
    /// when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_endpoint_starts_undefined() {
        let ep = Endpoint::new(
            "project-1".to_string(),
            "/users".to_string(),
            HttpMethod::Post,
            None,
            None,
        );
        assert_eq!(ep.status, EndpointStatus::Undefined);
        assert!(ep.frontend_spec.is_none());
        assert!(ep.backend_spec.is_none());
        assert!(ep.conflicts.is_empty());
        assert_eq!(ep.version, 1);
    }

    #[test]
    fn new_endpoint_payload_rejects_no_status_field() {
        // A client-supplied status must not round-trip into the aggregate.
        let payload: NewEndpoint = serde_json::from_str(
            r#"{"path": "/users", "method": "POST", "status": "SYNCED"}"#,
        )
        .unwrap();
        assert_eq!(payload.path, "/users");
        // NewEndpoint has no status field, so the stray value is dropped.
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("SYNCED"));
    }
}
