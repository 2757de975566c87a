use crate::error::{CoreError, CoreResult};
use crate::logic::detect::ConflictDetector;
use crate::logic::validate::validate_spec;
use crate::model::{Endpoint, EndpointSpec, EndpointStatus, Id, Side};

/// Mutations on the endpoint aggregate. Every operation reruns the detector
/// and recomputes the derived status before returning; the detector runs
/// against the candidate state first so a failure leaves the aggregate
/// exactly as it was.
pub struct Reconciler;

impl Reconciler {
    /// Attach a spec to one side. Fails with `DuplicateSpecSide` when the
    /// side is already occupied and `replace` was not requested.
    pub fn attach_spec(
        endpoint: &mut Endpoint,
        side: Side,
        spec: EndpointSpec,
        replace: bool,
    ) -> CoreResult<()> {
        validate_spec(&spec)?;

        if endpoint.spec(side).is_some() && !replace {
            return Err(CoreError::DuplicateSpecSide {
                side: side.as_str(),
            });
        }

        let fresh = match side {
            Side::Frontend => {
                ConflictDetector::detect(Some(&spec), endpoint.backend_spec.as_ref())?
            }
            Side::Backend => {
                ConflictDetector::detect(endpoint.frontend_spec.as_ref(), Some(&spec))?
            }
        };

        *endpoint.spec_slot(side) = Some(spec);
        Self::replace_unresolved(endpoint, fresh);
        Self::recompute_status(endpoint);
        endpoint.touch();
        Ok(())
    }

    /// Detach one side's spec, returning it. With at most one spec left the
    /// detector yields nothing, so only resolved conflicts survive.
    pub fn remove_spec(endpoint: &mut Endpoint, side: Side) -> Option<EndpointSpec> {
        let removed = endpoint.spec_slot(side).take();
        if removed.is_some() {
            Self::replace_unresolved(endpoint, Vec::new());
            Self::recompute_status(endpoint);
            endpoint.touch();
        }
        removed
    }

    /// Mark one conflict resolved. The record is retained for audit history
    /// but no longer counts toward status derivation.
    pub fn resolve_conflict(endpoint: &mut Endpoint, conflict_id: &Id) -> CoreResult<()> {
        let conflict = endpoint
            .conflicts
            .iter_mut()
            .find(|c| &c.id == conflict_id)
            .ok_or_else(|| CoreError::not_found("conflict", conflict_id.clone()))?;
        conflict.resolved = true;
        Self::recompute_status(endpoint);
        endpoint.touch();
        Ok(())
    }

    /// Pure function of (frontend present?, backend present?, unresolved
    /// conflict count). Re-invoked after every mutation to either spec or to
    /// the conflict set.
    pub fn recompute_status(endpoint: &mut Endpoint) {
        let unresolved = endpoint.unresolved_conflicts().count();
        endpoint.status = if unresolved > 0 {
            EndpointStatus::Conflict
        } else {
            match (&endpoint.frontend_spec, &endpoint.backend_spec) {
                (Some(_), Some(_)) => EndpointStatus::Synced,
                (None, None) => EndpointStatus::Undefined,
                _ => EndpointStatus::Pending,
            }
        };
    }

    /// Swap the unresolved conflict set for a fresh detector run, keeping
    /// resolved conflicts untouched.
    fn replace_unresolved(endpoint: &mut Endpoint, fresh: Vec<crate::model::Conflict>) {
        endpoint.conflicts.retain(|c| c.resolved);
        endpoint.conflicts.extend(fresh);
    }
}
