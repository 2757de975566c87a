use crate::model::{generate_id, Id, Severity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    /// Reserved: the method lives on the endpoint and is shared by both
    /// sides by construction, so there is nothing to compare yet.
    MethodMismatch,
    ParameterMismatch,
    ResponseMismatch,
    HeaderMismatch,
    StatusCodeMismatch,
    AuthenticationMismatch,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::MethodMismatch => "METHOD_MISMATCH",
            ConflictType::ParameterMismatch => "PARAMETER_MISMATCH",
            ConflictType::ResponseMismatch => "RESPONSE_MISMATCH",
            ConflictType::HeaderMismatch => "HEADER_MISMATCH",
            ConflictType::StatusCodeMismatch => "STATUS_CODE_MISMATCH",
            ConflictType::AuthenticationMismatch => "AUTHENTICATION_MISMATCH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "METHOD_MISMATCH" => Some(ConflictType::MethodMismatch),
            "PARAMETER_MISMATCH" => Some(ConflictType::ParameterMismatch),
            "RESPONSE_MISMATCH" => Some(ConflictType::ResponseMismatch),
            "HEADER_MISMATCH" => Some(ConflictType::HeaderMismatch),
            "STATUS_CODE_MISMATCH" => Some(ConflictType::StatusCodeMismatch),
            "AUTHENTICATION_MISMATCH" => Some(ConflictType::AuthenticationMismatch),
            _ => None,
        }
    }
}

/// A detected disagreement between the frontend and backend specs of one
/// endpoint. Produced only by the detector; resolved conflicts are kept for
/// audit history and excluded from status derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: Id,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_value: Option<String>,
    pub severity: Severity,
    #[serde(default)]
    pub resolved: bool,
}

impl Conflict {
    pub fn new(
        conflict_type: ConflictType,
        field: impl Into<String>,
        frontend_value: Option<String>,
        backend_value: Option<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id: generate_id(),
            conflict_type,
            field: field.into(),
            frontend_value,
            backend_value,
            severity,
            resolved: false,
        }
    }

    /// Content identity, ignoring the generated id and the resolved flag.
    /// Detector determinism is defined over these members.
    pub fn key(&self) -> (ConflictType, &str, Option<&str>, Option<&str>, Severity) {
        (
            self.conflict_type,
            self.field.as_str(),
            self.frontend_value.as_deref(),
            self.backend_value.as_deref(),
            self.severity,
        )
    }
}
