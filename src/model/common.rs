use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Id = String;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// HTTP method of an endpoint. Closed set; anything else is rejected at
/// deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }
}

/// Which team declared a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Frontend,
    Backend,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Frontend => "frontend",
            Side::Backend => "backend",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "frontend" => Some(Side::Frontend),
            "backend" => Some(Side::Backend),
            _ => None,
        }
    }
}

/// Declared type of a request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    File,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "STRING",
            ParamType::Number => "NUMBER",
            ParamType::Boolean => "BOOLEAN",
            ParamType::Array => "ARRAY",
            ParamType::Object => "OBJECT",
            ParamType::File => "FILE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STRING" => Some(ParamType::String),
            "NUMBER" => Some(ParamType::Number),
            "BOOLEAN" => Some(ParamType::Boolean),
            "ARRAY" => Some(ParamType::Array),
            "OBJECT" => Some(ParamType::Object),
            "FILE" => Some(ParamType::File),
            _ => None,
        }
    }
}

/// Derived synchronization status of an endpoint. Never set by callers;
/// recomputed after every spec or conflict mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndpointStatus {
    Synced,
    Conflict,
    Pending,
    Undefined,
}

impl EndpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointStatus::Synced => "SYNCED",
            EndpointStatus::Conflict => "CONFLICT",
            EndpointStatus::Pending => "PENDING",
            EndpointStatus::Undefined => "UNDEFINED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SYNCED" => Some(EndpointStatus::Synced),
            "CONFLICT" => Some(EndpointStatus::Conflict),
            "PENDING" => Some(EndpointStatus::Pending),
            "UNDEFINED" => Some(EndpointStatus::Undefined),
            _ => None,
        }
    }
}

/// Conflict severity, ordered LOW < MEDIUM < HIGH < CRITICAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&HttpMethod::Get).unwrap(), "\"GET\"");
        assert_eq!(
            serde_json::from_str::<HttpMethod>("\"OPTIONS\"").unwrap(),
            HttpMethod::Options
        );
        assert!(serde_json::from_str::<HttpMethod>("\"get\"").is_err());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            EndpointStatus::Synced,
            EndpointStatus::Conflict,
            EndpointStatus::Pending,
            EndpointStatus::Undefined,
        ] {
            assert_eq!(EndpointStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }
}
