use thiserror::Error;

/// Typed errors for all core operations. Expected states ("spec absent") are
/// not errors; everything here maps 1:1 to a stable wire identifier.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("a {side} spec is already attached to this endpoint")]
    DuplicateSpecSide { side: &'static str },

    #[error("endpoint was modified concurrently (expected version {expected})")]
    StaleWrite { expected: i64 },

    #[error("conflict detection failed: {0}")]
    DetectorFailure(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Stable identifier surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "VALIDATION",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::DuplicateSpecSide { .. } => "DUPLICATE_SPEC_SIDE",
            CoreError::StaleWrite { .. } => "STALE_WRITE",
            CoreError::DetectorFailure(_) => "DETECTOR_FAILURE",
            CoreError::Storage(_) => "STORAGE",
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
