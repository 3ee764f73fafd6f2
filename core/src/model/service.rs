use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::bind::{state_code, Attributes, Coercion, FromAttr, Object, Schema};
use crate::error::CoercionError;
use crate::model::{CheckableAttrs, ConfigObjectAttrs};

/// Current state of a service, matching plugin exit codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceState {
    #[default]
    Ok = 0,
    Warning = 1,
    Critical = 2,
    Unknown = 3,
}

impl TryFrom<i64> for ServiceState {
    type Error = CoercionError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ServiceState::Ok),
            1 => Ok(ServiceState::Warning),
            2 => Ok(ServiceState::Critical),
            3 => Ok(ServiceState::Unknown),
            other => Err(CoercionError::OutOfRange {
                target: "service state",
                value: other.to_string(),
            }),
        }
    }
}

impl FromAttr for ServiceState {
    const COERCION: Coercion = Coercion::State;

    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        ServiceState::try_from(state_code(value)?)
    }
}

/// A service object as returned by `objects/services`.
///
/// The full name of a service is `host!service`; see [`service_name`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Service {
    pub checkable: CheckableAttrs,
    pub display_name: String,
    pub groups: Vec<String>,
    pub host_name: String,
    pub last_hard_state: i64,
    pub last_state: i64,
    pub last_state_critical: DateTime<Utc>,
    pub last_state_ok: DateTime<Utc>,
    pub last_state_unknown: DateTime<Utc>,
    pub last_state_warning: DateTime<Utc>,
    pub state: ServiceState,
}

impl Attributes for Service {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Service>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("Service")
                .embed("checkable", |s: &mut Service| &mut s.checkable)
                .field("display_name", |s: &mut Service| &mut s.display_name)
                .field("groups", |s: &mut Service| &mut s.groups)
                .field("host_name", |s: &mut Service| &mut s.host_name)
                .field("last_hard_state", |s: &mut Service| &mut s.last_hard_state)
                .field("last_state", |s: &mut Service| &mut s.last_state)
                .field("last_state_critical", |s: &mut Service| &mut s.last_state_critical)
                .field("last_state_ok", |s: &mut Service| &mut s.last_state_ok)
                .field("last_state_unknown", |s: &mut Service| &mut s.last_state_unknown)
                .field("last_state_warning", |s: &mut Service| &mut s.last_state_warning)
                .field("state", |s: &mut Service| &mut s.state)
                .build()
        })
    }
}

impl Object for Service {
    fn config(&self) -> &ConfigObjectAttrs {
        &self.checkable.custom_vars.config
    }

    fn config_mut(&mut self) -> &mut ConfigObjectAttrs {
        &mut self.checkable.custom_vars.config
    }
}

/// The full object name of a service: `host!service`.
pub fn service_name(host: &str, service: &str) -> String {
    format!("{host}!{service}")
}
