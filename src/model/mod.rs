pub mod common;
pub mod conflict;
pub mod endpoint;
pub mod project;
pub mod spec;

pub use common::{generate_id, EndpointStatus, HttpMethod, Id, ParamType, Severity, Side};
pub use conflict::{Conflict, ConflictType};
pub use endpoint::{Endpoint, EndpointUpdate, NewEndpoint};
pub use project::{NewProject, Project, DEFAULT_PROJECT_NAME};
pub use spec::{
    EndpointSpec, Header, HeaderInput, Parameter, ParameterInput, SpecInput, StatusCodeDef,
    StatusCodeInput,
};
