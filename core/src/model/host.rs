use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::bind::{state_code, Attributes, Coercion, FromAttr, Object, Schema};
use crate::error::CoercionError;
use crate::model::{CheckableAttrs, ConfigObjectAttrs};

/// Current state of a host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostState {
    #[default]
    Up = 0,
    Down = 1,
}

impl TryFrom<i64> for HostState {
    type Error = CoercionError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(HostState::Up),
            1 => Ok(HostState::Down),
            other => Err(CoercionError::OutOfRange {
                target: "host state",
                value: other.to_string(),
            }),
        }
    }
}

impl FromAttr for HostState {
    const COERCION: Coercion = Coercion::State;

    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        HostState::try_from(state_code(value)?)
    }
}

/// A host object as returned by `objects/hosts`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Host {
    pub checkable: CheckableAttrs,
    /// A short description shown by interfaces instead of the name.
    pub display_name: String,
    /// IPv4 address, available as the `$address$` runtime macro.
    pub address: String,
    /// IPv6 address, available as the `$address6$` runtime macro.
    pub address6: String,
    /// Host groups this host belongs to.
    pub groups: Vec<String>,
    pub last_hard_state: i64,
    pub last_state: i64,
    pub last_state_down: DateTime<Utc>,
    pub last_state_up: DateTime<Utc>,
    pub state: HostState,
}

impl Attributes for Host {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Host>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("Host")
                .embed("checkable", |h: &mut Host| &mut h.checkable)
                .field("display_name", |h: &mut Host| &mut h.display_name)
                .field("address", |h: &mut Host| &mut h.address)
                .field("address6", |h: &mut Host| &mut h.address6)
                .field("groups", |h: &mut Host| &mut h.groups)
                .field("last_hard_state", |h: &mut Host| &mut h.last_hard_state)
                .field("last_state", |h: &mut Host| &mut h.last_state)
                .field("last_state_down", |h: &mut Host| &mut h.last_state_down)
                .field("last_state_up", |h: &mut Host| &mut h.last_state_up)
                .field("state", |h: &mut Host| &mut h.state)
                .build()
        })
    }
}

impl Object for Host {
    fn config(&self) -> &ConfigObjectAttrs {
        &self.checkable.custom_vars.config
    }

    fn config_mut(&mut self) -> &mut ConfigObjectAttrs {
        &mut self.checkable.custom_vars.config
    }
}
