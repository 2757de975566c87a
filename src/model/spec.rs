use crate::model::{generate_id, Id, ParamType};
use serde::{Deserialize, Serialize};

/// One side's declared contract for an endpoint. The side (frontend or
/// backend) is carried by the aggregate slot that holds the spec, not by the
/// spec itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<serde_json::Value>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub status_codes: Vec<StatusCodeDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: Id,
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub id: Id,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCodeDef {
    pub id: Id,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<serde_json::Value>,
}

/// Input model for attaching or replacing a spec. Ids for the spec and its
/// children are generated server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<serde_json::Value>,
    #[serde(default)]
    pub parameters: Vec<ParameterInput>,
    #[serde(default)]
    pub headers: Vec<HeaderInput>,
    #[serde(default)]
    pub status_codes: Vec<StatusCodeInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInput {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCodeInput {
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<serde_json::Value>,
}

impl SpecInput {
    pub fn into_spec(self) -> EndpointSpec {
        EndpointSpec {
            id: generate_id(),
            request_body: self.request_body,
            response_body: self.response_body,
            parameters: self
                .parameters
                .into_iter()
                .map(|p| Parameter {
                    id: generate_id(),
                    name: p.name,
                    param_type: p.param_type,
                    required: p.required,
                    description: p.description,
                    default_value: p.default_value,
                    validation: p.validation,
                })
                .collect(),
            headers: self
                .headers
                .into_iter()
                .map(|h| Header {
                    id: generate_id(),
                    name: h.name,
                    value: h.value,
                    required: h.required,
                    description: h.description,
                })
                .collect(),
            status_codes: self
                .status_codes
                .into_iter()
                .map(|c| StatusCodeDef {
                    id: generate_id(),
                    code: c.code,
                    description: c.description,
                    response_body: c.response_body,
                })
                .collect(),
            content_type: self.content_type,
            authentication: self.authentication,
            rate_limit: self.rate_limit,
            notes: self.notes,
        }
    }
}
