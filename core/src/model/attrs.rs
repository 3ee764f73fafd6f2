//! Attribute groups shared by hosts and services.
//!
//! The groups nest the way Icinga's object classes do: every config object
//! has a type, custom-var objects add `vars`, checkables add scheduling,
//! state and notification settings. Each group declares its own schema and
//! embeds the group below it first.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bind::{
    decode_record, deserialize_lenient_int, deserialize_timestamp, null_as_default, serialize_timestamp, Attributes,
    FromAttr, Schema,
};
use crate::error::CoercionError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectAttrs {
    pub type_: String,
}

impl Attributes for ObjectAttrs {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<ObjectAttrs>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("ObjectAttrs")
                .field("type", |o: &mut ObjectAttrs| &mut o.type_)
                .build()
        })
    }
}

/// Where an object was defined in the server's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLocation {
    pub path: String,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub first_line: i64,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub first_column: i64,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub last_line: i64,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub last_column: i64,
}

impl FromAttr for SourceLocation {
    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        decode_record(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigObjectAttrs {
    pub object: ObjectAttrs,
    pub name: String,
    pub active: bool,
    pub extensions: Value,
    pub ha_mode: i64,
    pub original_attributes: Value,
    pub package: String,
    pub pause_called: bool,
    pub paused: bool,
    pub resume_called: bool,
    pub source_location: SourceLocation,
    pub start_called: bool,
    pub state_loaded: bool,
    pub stop_called: bool,
    pub templates: Vec<String>,
    pub version: f64,
    pub zone: String,
}

impl Attributes for ConfigObjectAttrs {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<ConfigObjectAttrs>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("ConfigObjectAttrs")
                .embed("object", |c: &mut ConfigObjectAttrs| &mut c.object)
                .field("name", |c: &mut ConfigObjectAttrs| &mut c.name)
                .field("active", |c: &mut ConfigObjectAttrs| &mut c.active)
                .field("extensions", |c: &mut ConfigObjectAttrs| &mut c.extensions)
                .field("ha_mode", |c: &mut ConfigObjectAttrs| &mut c.ha_mode)
                .field("original_attributes", |c: &mut ConfigObjectAttrs| &mut c.original_attributes)
                .field("package", |c: &mut ConfigObjectAttrs| &mut c.package)
                .field("pause_called", |c: &mut ConfigObjectAttrs| &mut c.pause_called)
                .field("paused", |c: &mut ConfigObjectAttrs| &mut c.paused)
                .field("resume_called", |c: &mut ConfigObjectAttrs| &mut c.resume_called)
                .field("source_location", |c: &mut ConfigObjectAttrs| &mut c.source_location)
                .field("start_called", |c: &mut ConfigObjectAttrs| &mut c.start_called)
                .field("state_loaded", |c: &mut ConfigObjectAttrs| &mut c.state_loaded)
                .field("stop_called", |c: &mut ConfigObjectAttrs| &mut c.stop_called)
                .field("templates", |c: &mut ConfigObjectAttrs| &mut c.templates)
                .field("version", |c: &mut ConfigObjectAttrs| &mut c.version)
                .field("zone", |c: &mut ConfigObjectAttrs| &mut c.zone)
                .build()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomVarAttrs {
    pub config: ConfigObjectAttrs,
    pub vars: Map<String, Value>,
}

impl Attributes for CustomVarAttrs {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<CustomVarAttrs>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("CustomVarAttrs")
                .embed("config", |c: &mut CustomVarAttrs| &mut c.config)
                .field("vars", |c: &mut CustomVarAttrs| &mut c.vars)
                .build()
        })
    }
}

/// The outcome of one check execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckResult {
    pub active: bool,
    pub check_source: String,
    pub command: Value,
    #[serde(serialize_with = "serialize_timestamp", deserialize_with = "deserialize_timestamp")]
    pub execution_start: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp", deserialize_with = "deserialize_timestamp")]
    pub execution_end: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub exit_status: i64,
    pub output: String,
    #[serde(deserialize_with = "null_as_default")]
    pub performance_data: Vec<String>,
    #[serde(serialize_with = "serialize_timestamp", deserialize_with = "deserialize_timestamp")]
    pub schedule_start: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp", deserialize_with = "deserialize_timestamp")]
    pub schedule_end: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_lenient_int")]
    pub state: i64,
}

impl FromAttr for CheckResult {
    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        decode_record(value)
    }
}

/// Attributes common to hosts and services.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckableAttrs {
    pub custom_vars: CustomVarAttrs,
    pub acknowledgement: f64,
    pub acknowledgement_expiry: DateTime<Utc>,
    pub action_url: String,
    pub check_attempt: i64,
    pub check_command: String,
    pub check_interval: f64,
    pub check_period: String,
    pub check_timeout: f64,
    pub command_endpoint: String,
    pub downtime_depth: i64,
    pub enable_active_checks: bool,
    pub enable_event_handler: bool,
    pub enable_flapping: bool,
    pub enable_notifications: bool,
    pub enable_passive_checks: bool,
    pub enable_perfdata: bool,
    pub event_command: String,
    pub flapping: bool,
    pub flapping_current: f64,
    pub flapping_last_change: DateTime<Utc>,
    pub flapping_threshold_high: f64,
    pub flapping_threshold_low: f64,
    pub force_next_check: bool,
    pub force_next_notification: bool,
    pub handled: bool,
    pub icon_image: String,
    pub icon_image_alt: String,
    pub last_check: DateTime<Utc>,
    pub last_check_result: CheckResult,
    pub last_hard_state_change: DateTime<Utc>,
    pub last_reachable: bool,
    pub last_state_change: DateTime<Utc>,
    pub max_check_attempts: i64,
    pub next_check: DateTime<Utc>,
    pub notes: String,
    pub notes_url: String,
    pub problem: bool,
    pub retry_interval: f64,
    pub severity: i64,
    pub state_type: i64,
    pub volatile: bool,
}

impl Attributes for CheckableAttrs {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<CheckableAttrs>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("CheckableAttrs")
                .embed("custom_vars", |c: &mut CheckableAttrs| &mut c.custom_vars)
                .field("acknowledgement", |c: &mut CheckableAttrs| &mut c.acknowledgement)
                .field("acknowledgement_expiry", |c: &mut CheckableAttrs| &mut c.acknowledgement_expiry)
                .field("action_url", |c: &mut CheckableAttrs| &mut c.action_url)
                .field("check_attempt", |c: &mut CheckableAttrs| &mut c.check_attempt)
                .field("check_command", |c: &mut CheckableAttrs| &mut c.check_command)
                .field("check_interval", |c: &mut CheckableAttrs| &mut c.check_interval)
                .field("check_period", |c: &mut CheckableAttrs| &mut c.check_period)
                .field("check_timeout", |c: &mut CheckableAttrs| &mut c.check_timeout)
                .field("command_endpoint", |c: &mut CheckableAttrs| &mut c.command_endpoint)
                .field("downtime_depth", |c: &mut CheckableAttrs| &mut c.downtime_depth)
                .field("enable_active_checks", |c: &mut CheckableAttrs| &mut c.enable_active_checks)
                .field("enable_event_handler", |c: &mut CheckableAttrs| &mut c.enable_event_handler)
                .field("enable_flapping", |c: &mut CheckableAttrs| &mut c.enable_flapping)
                .field("enable_notifications", |c: &mut CheckableAttrs| &mut c.enable_notifications)
                .field("enable_passive_checks", |c: &mut CheckableAttrs| &mut c.enable_passive_checks)
                .field("enable_perfdata", |c: &mut CheckableAttrs| &mut c.enable_perfdata)
                .field("event_command", |c: &mut CheckableAttrs| &mut c.event_command)
                .field("flapping", |c: &mut CheckableAttrs| &mut c.flapping)
                .field("flapping_current", |c: &mut CheckableAttrs| &mut c.flapping_current)
                .field("flapping_last_change", |c: &mut CheckableAttrs| &mut c.flapping_last_change)
                .field("flapping_threshold_high", |c: &mut CheckableAttrs| &mut c.flapping_threshold_high)
                .field("flapping_threshold_low", |c: &mut CheckableAttrs| &mut c.flapping_threshold_low)
                .field("force_next_check", |c: &mut CheckableAttrs| &mut c.force_next_check)
                .field("force_next_notification", |c: &mut CheckableAttrs| &mut c.force_next_notification)
                .field("handled", |c: &mut CheckableAttrs| &mut c.handled)
                .field("icon_image", |c: &mut CheckableAttrs| &mut c.icon_image)
                .field("icon_image_alt", |c: &mut CheckableAttrs| &mut c.icon_image_alt)
                .field("last_check", |c: &mut CheckableAttrs| &mut c.last_check)
                .field("last_check_result", |c: &mut CheckableAttrs| &mut c.last_check_result)
                .field("last_hard_state_change", |c: &mut CheckableAttrs| &mut c.last_hard_state_change)
                .field("last_reachable", |c: &mut CheckableAttrs| &mut c.last_reachable)
                .field("last_state_change", |c: &mut CheckableAttrs| &mut c.last_state_change)
                .field("max_check_attempts", |c: &mut CheckableAttrs| &mut c.max_check_attempts)
                .field("next_check", |c: &mut CheckableAttrs| &mut c.next_check)
                .field("notes", |c: &mut CheckableAttrs| &mut c.notes)
                .field("notes_url", |c: &mut CheckableAttrs| &mut c.notes_url)
                .field("problem", |c: &mut CheckableAttrs| &mut c.problem)
                .field("retry_interval", |c: &mut CheckableAttrs| &mut c.retry_interval)
                .field("severity", |c: &mut CheckableAttrs| &mut c.severity)
                .field("state_type", |c: &mut CheckableAttrs| &mut c.state_type)
                .field("volatile", |c: &mut CheckableAttrs| &mut c.volatile)
                .build()
        })
    }
}
