use std::collections::HashSet;

use crate::error::{CoreError, CoreResult};
use crate::model::EndpointSpec;

/// Reject malformed endpoint metadata before anything touches persistence.
pub fn validate_path(path: &str) -> CoreResult<()> {
    if path.trim().is_empty() {
        return Err(CoreError::Validation("path must not be empty".to_string()));
    }
    Ok(())
}

/// Structural checks on a spec: non-empty unique parameter names, non-empty
/// case-insensitively unique header names, status codes in 100-599 declared
/// at most once. Never partially applied; the caller only persists on Ok.
pub fn validate_spec(spec: &EndpointSpec) -> CoreResult<()> {
    let mut issues = Vec::new();

    let mut param_names = HashSet::new();
    for param in &spec.parameters {
        if param.name.trim().is_empty() {
            issues.push("parameter name must not be empty".to_string());
        } else if !param_names.insert(param.name.as_str()) {
            issues.push(format!("duplicate parameter name '{}'", param.name));
        }
    }

    let mut header_names = HashSet::new();
    for header in &spec.headers {
        if header.name.trim().is_empty() {
            issues.push("header name must not be empty".to_string());
        } else if !header_names.insert(header.name.to_lowercase()) {
            issues.push(format!(
                "duplicate header name '{}' (header names are case-insensitive)",
                header.name
            ));
        }
    }

    let mut codes = HashSet::new();
    for status_code in &spec.status_codes {
        if !(100..=599).contains(&status_code.code) {
            issues.push(format!(
                "status code {} is outside 100-599",
                status_code.code
            ));
        } else if !codes.insert(status_code.code) {
            issues.push(format!("duplicate status code {}", status_code.code));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(issues.join("; ")))
    }
}
