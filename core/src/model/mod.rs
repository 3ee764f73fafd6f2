//! Domain objects and request bodies for the objects and actions endpoints.

mod attrs;
mod host;
mod requests;
mod service;

pub use attrs::{CheckResult, CheckableAttrs, ConfigObjectAttrs, CustomVarAttrs, ObjectAttrs, SourceLocation};
pub use host::{Host, HostState};
pub use requests::{CreateObject, DeleteObject, HostAttrs, ProcessCheckResult, ServiceAttrs, UpdateObject};
pub use service::{service_name, Service, ServiceState};
