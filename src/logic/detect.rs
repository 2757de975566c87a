use itertools::Itertools;
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::model::{Conflict, ConflictType, EndpointSpec, Header, Parameter, Severity, StatusCodeDef};

/// Response schemas nested deeper than this fail the comparison instead of
/// being silently truncated.
const MAX_SCHEMA_DEPTH: usize = 64;

/// Compares the two sides of an endpoint and produces the definitive set of
/// current conflicts. Pure: no persistence, no hidden state, and identical
/// inputs always yield the same members in the same order (comparison keys
/// are iterated sorted).
pub struct ConflictDetector;

impl ConflictDetector {
    /// If either side is absent there is nothing to compare against and the
    /// result is empty; the endpoint is PENDING, not CONFLICT.
    pub fn detect(
        frontend: Option<&EndpointSpec>,
        backend: Option<&EndpointSpec>,
    ) -> CoreResult<Vec<Conflict>> {
        let (Some(fe), Some(be)) = (frontend, backend) else {
            return Ok(Vec::new());
        };

        let mut conflicts = Vec::new();
        Self::compare_parameters(fe, be, &mut conflicts);
        Self::compare_headers(fe, be, &mut conflicts);
        Self::compare_status_codes(fe, be, &mut conflicts);
        Self::compare_response_bodies(fe, be, &mut conflicts)?;
        Self::compare_authentication(fe, be, &mut conflicts);
        Ok(conflicts)
    }

    fn compare_parameters(fe: &EndpointSpec, be: &EndpointSpec, out: &mut Vec<Conflict>) {
        let fe_params: HashMap<&str, &Parameter> =
            fe.parameters.iter().map(|p| (p.name.as_str(), p)).collect();
        let be_params: HashMap<&str, &Parameter> =
            be.parameters.iter().map(|p| (p.name.as_str(), p)).collect();

        let names = fe_params
            .keys()
            .chain(be_params.keys())
            .copied()
            .unique()
            .sorted();

        for name in names {
            match (fe_params.get(name), be_params.get(name)) {
                (Some(f), Some(b)) => {
                    if f.required != b.required {
                        out.push(Conflict::new(
                            ConflictType::ParameterMismatch,
                            format!("parameters.{}.required", name),
                            Some(f.required.to_string()),
                            Some(b.required.to_string()),
                            Severity::High,
                        ));
                    } else if f.param_type != b.param_type {
                        out.push(Conflict::new(
                            ConflictType::ParameterMismatch,
                            format!("parameters.{}.type", name),
                            Some(f.param_type.as_str().to_string()),
                            Some(b.param_type.as_str().to_string()),
                            Severity::Medium,
                        ));
                    } else if f.default_value != b.default_value {
                        out.push(Conflict::new(
                            ConflictType::ParameterMismatch,
                            format!("parameters.{}.default_value", name),
                            f.default_value.clone(),
                            b.default_value.clone(),
                            Severity::Low,
                        ));
                    } else if f.description != b.description {
                        out.push(Conflict::new(
                            ConflictType::ParameterMismatch,
                            format!("parameters.{}.description", name),
                            f.description.clone(),
                            b.description.clone(),
                            Severity::Low,
                        ));
                    }
                }
                (Some(f), None) => out.push(Self::one_sided_parameter(name, f, true)),
                (None, Some(b)) => out.push(Self::one_sided_parameter(name, b, false)),
                (None, None) => unreachable!("name came from one of the two maps"),
            }
        }
    }

    fn one_sided_parameter(name: &str, param: &Parameter, on_frontend: bool) -> Conflict {
        // A required parameter that only one side knows about is a harder
        // break than an optional one.
        let severity = if param.required {
            Severity::High
        } else {
            Severity::Medium
        };
        let snapshot = Some(render_parameter(param));
        let (frontend_value, backend_value) = if on_frontend {
            (snapshot, None)
        } else {
            (None, snapshot)
        };
        Conflict::new(
            ConflictType::ParameterMismatch,
            format!("parameters.{}", name),
            frontend_value,
            backend_value,
            severity,
        )
    }

    fn compare_headers(fe: &EndpointSpec, be: &EndpointSpec, out: &mut Vec<Conflict>) {
        // HTTP header names are case-insensitive; key by the lowercase form.
        let fe_headers: HashMap<String, &Header> = fe
            .headers
            .iter()
            .map(|h| (h.name.to_lowercase(), h))
            .collect();
        let be_headers: HashMap<String, &Header> = be
            .headers
            .iter()
            .map(|h| (h.name.to_lowercase(), h))
            .collect();

        let names = fe_headers
            .keys()
            .chain(be_headers.keys())
            .unique()
            .sorted();

        for name in names {
            match (fe_headers.get(name), be_headers.get(name)) {
                (Some(f), Some(b)) => {
                    if f.required != b.required {
                        out.push(Conflict::new(
                            ConflictType::HeaderMismatch,
                            format!("headers.{}.required", name),
                            Some(f.required.to_string()),
                            Some(b.required.to_string()),
                            Severity::High,
                        ));
                    } else if f.value != b.value {
                        out.push(Conflict::new(
                            ConflictType::HeaderMismatch,
                            format!("headers.{}.value", name),
                            f.value.clone(),
                            b.value.clone(),
                            Severity::Low,
                        ));
                    }
                }
                (Some(f), None) => out.push(Self::one_sided_header(name, f, true)),
                (None, Some(b)) => out.push(Self::one_sided_header(name, b, false)),
                (None, None) => unreachable!("name came from one of the two maps"),
            }
        }
    }

    fn one_sided_header(name: &str, header: &Header, on_frontend: bool) -> Conflict {
        let severity = if header.required {
            Severity::High
        } else {
            Severity::Low
        };
        let snapshot = Some(render_header(header));
        let (frontend_value, backend_value) = if on_frontend {
            (snapshot, None)
        } else {
            (None, snapshot)
        };
        Conflict::new(
            ConflictType::HeaderMismatch,
            format!("headers.{}", name),
            frontend_value,
            backend_value,
            severity,
        )
    }

    fn compare_status_codes(fe: &EndpointSpec, be: &EndpointSpec, out: &mut Vec<Conflict>) {
        let fe_codes: HashMap<u16, &StatusCodeDef> =
            fe.status_codes.iter().map(|c| (c.code, c)).collect();
        let be_codes: HashMap<u16, &StatusCodeDef> =
            be.status_codes.iter().map(|c| (c.code, c)).collect();

        let codes = fe_codes
            .keys()
            .chain(be_codes.keys())
            .copied()
            .unique()
            .sorted();

        for code in codes {
            match (fe_codes.get(&code), be_codes.get(&code)) {
                (Some(f), Some(b)) => {
                    if f.description != b.description || f.response_body != b.response_body {
                        out.push(Conflict::new(
                            ConflictType::StatusCodeMismatch,
                            format!("statusCodes.{}", code),
                            Some(render_status_code(f)),
                            Some(render_status_code(b)),
                            Severity::Low,
                        ));
                    }
                }
                (Some(_), None) => out.push(Self::one_sided_status_code(code, true)),
                (None, Some(_)) => out.push(Self::one_sided_status_code(code, false)),
                (None, None) => unreachable!("code came from one of the two maps"),
            }
        }
    }

    fn one_sided_status_code(code: u16, on_frontend: bool) -> Conflict {
        // A success or error code declared on only one side is a contract
        // gap; informational and redirect codes are merely noted.
        let severity = match code {
            200..=299 | 400..=599 => Severity::Critical,
            _ => Severity::Low,
        };
        let snapshot = Some(code.to_string());
        let (frontend_value, backend_value) = if on_frontend {
            (snapshot, None)
        } else {
            (None, snapshot)
        };
        Conflict::new(
            ConflictType::StatusCodeMismatch,
            format!("statusCodes.{}", code),
            frontend_value,
            backend_value,
            severity,
        )
    }

    fn compare_response_bodies(
        fe: &EndpointSpec,
        be: &EndpointSpec,
        out: &mut Vec<Conflict>,
    ) -> CoreResult<()> {
        match (&fe.response_body, &be.response_body) {
            (Some(f), Some(b)) => Self::walk_schema("responseBody", f, b, 0, out),
            (Some(f), None) => {
                out.push(Conflict::new(
                    ConflictType::ResponseMismatch,
                    "responseBody",
                    Some(json_kind(f).to_string()),
                    None,
                    Severity::Low,
                ));
                Ok(())
            }
            (None, Some(b)) => {
                out.push(Conflict::new(
                    ConflictType::ResponseMismatch,
                    "responseBody",
                    None,
                    Some(json_kind(b).to_string()),
                    Severity::Low,
                ));
                Ok(())
            }
            (None, None) => Ok(()),
        }
    }

    /// Recursive key-set and primitive-kind comparison, order-insensitive on
    /// object keys. Matched keys with different kinds are HIGH; keys present
    /// on one side only are LOW.
    fn walk_schema(
        path: &str,
        fe: &serde_json::Value,
        be: &serde_json::Value,
        depth: usize,
        out: &mut Vec<Conflict>,
    ) -> CoreResult<()> {
        if depth > MAX_SCHEMA_DEPTH {
            return Err(CoreError::DetectorFailure(format!(
                "response schema nesting exceeds {} levels at '{}'",
                MAX_SCHEMA_DEPTH, path
            )));
        }

        match (fe, be) {
            (serde_json::Value::Object(f), serde_json::Value::Object(b)) => {
                let keys = f.keys().chain(b.keys()).unique().sorted();
                for key in keys {
                    let child_path = format!("{}.{}", path, key);
                    match (f.get(key), b.get(key)) {
                        (Some(fv), Some(bv)) => {
                            Self::walk_schema(&child_path, fv, bv, depth + 1, out)?
                        }
                        (Some(fv), None) => out.push(Conflict::new(
                            ConflictType::ResponseMismatch,
                            child_path,
                            Some(json_kind(fv).to_string()),
                            None,
                            Severity::Low,
                        )),
                        (None, Some(bv)) => out.push(Conflict::new(
                            ConflictType::ResponseMismatch,
                            child_path,
                            None,
                            Some(json_kind(bv).to_string()),
                            Severity::Low,
                        )),
                        (None, None) => unreachable!("key came from one of the two maps"),
                    }
                }
                Ok(())
            }
            (serde_json::Value::Array(f), serde_json::Value::Array(b)) => {
                // Element schemas are represented by the first element.
                if let (Some(fv), Some(bv)) = (f.first(), b.first()) {
                    Self::walk_schema(&format!("{}[0]", path), fv, bv, depth + 1, out)?;
                }
                Ok(())
            }
            _ => {
                if json_kind(fe) != json_kind(be) {
                    out.push(Conflict::new(
                        ConflictType::ResponseMismatch,
                        path,
                        Some(json_kind(fe).to_string()),
                        Some(json_kind(be).to_string()),
                        Severity::High,
                    ));
                }
                Ok(())
            }
        }
    }

    fn compare_authentication(fe: &EndpointSpec, be: &EndpointSpec, out: &mut Vec<Conflict>) {
        let fe_auth = normalize_auth(fe.authentication.as_deref());
        let be_auth = normalize_auth(be.authentication.as_deref());
        if fe_auth == be_auth {
            return;
        }

        // One side requiring auth the other does not know about is the
        // worst case; two different schemes still interoperate partially.
        let severity = if (fe_auth == "none") != (be_auth == "none") {
            Severity::Critical
        } else {
            Severity::Medium
        };
        out.push(Conflict::new(
            ConflictType::AuthenticationMismatch,
            "authentication",
            Some(fe_auth.to_string()),
            Some(be_auth.to_string()),
            severity,
        ));
    }
}

/// Absent or blank authentication descriptors mean "none".
fn normalize_auth(auth: Option<&str>) -> &str {
    match auth.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => "none",
    }
}

fn render_parameter(param: &Parameter) -> String {
    if param.required {
        format!("{} (required)", param.param_type.as_str())
    } else {
        param.param_type.as_str().to_string()
    }
}

fn render_header(header: &Header) -> String {
    match (&header.value, header.required) {
        (Some(v), true) => format!("{} (required)", v),
        (Some(v), false) => v.clone(),
        (None, true) => "(required)".to_string(),
        (None, false) => "(declared)".to_string(),
    }
}

fn render_status_code(code: &StatusCodeDef) -> String {
    match (&code.description, &code.response_body) {
        (Some(desc), _) => desc.clone(),
        (None, Some(body)) => body.to_string(),
        (None, None) => code.code.to_string(),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
