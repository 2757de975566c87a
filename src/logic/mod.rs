pub mod bootstrap;
pub mod detect;
pub mod reconcile;
pub mod validate;
pub mod workspace;

pub use bootstrap::resolve_or_create_default_project;
pub use detect::ConflictDetector;
pub use reconcile::Reconciler;
pub use validate::{validate_path, validate_spec};
pub use workspace::{EndpointFilter, Workspace};
