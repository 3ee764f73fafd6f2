//! Request bodies for writes: create, update, delete and passive check results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::CheckResult;

fn is_false(v: &bool) -> bool {
    !*v
}

/// Body of `PUT objects/<type>/<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateObject<A> {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<String>,
    pub attrs: A,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ignore_on_error: bool,
}

impl<A> CreateObject<A> {
    pub fn new(attrs: A) -> Self {
        Self {
            templates: Vec::new(),
            attrs,
            ignore_on_error: false,
        }
    }

    pub fn with_templates<I, S>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates = templates.into_iter().map(Into::into).collect();
        self
    }

    /// Ask the server to skip the object instead of failing when its
    /// configuration does not validate.
    pub fn ignore_on_error(mut self) -> Self {
        self.ignore_on_error = true;
        self
    }
}

/// Body of `POST objects/<type>/<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateObject<A> {
    pub attrs: A,
}

/// Body of `DELETE objects/<type>/<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteObject {
    pub cascade: bool,
}

/// Writable host attributes. Unset fields are left out of the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostAttrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address6: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_check_attempts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_active_checks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_passive_checks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vars: Option<Map<String, Value>>,
}

/// Writable service attributes. Unset fields are left out of the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAttrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_check_attempts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_active_checks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_passive_checks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vars: Option<Map<String, Value>>,
}

/// Body of `POST actions/process-check-result`.
///
/// The target object is selected with a filter whose values travel in
/// `filter_vars`, so names never need escaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessCheckResult {
    #[serde(rename = "type")]
    pub type_: String,
    pub filter: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub filter_vars: Map<String, Value>,
    pub exit_status: i64,
    pub plugin_output: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performance_data: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_source: Option<String>,
}

impl ProcessCheckResult {
    pub fn for_service(host: &str, service: &str, result: &CheckResult) -> Self {
        let mut filter_vars = Map::new();
        filter_vars.insert("hostname".to_string(), Value::from(host));
        filter_vars.insert("servicename".to_string(), Value::from(service));
        Self::new("Service", "host.name==hostname && service.name==servicename", filter_vars, result)
    }

    pub fn for_host(host: &str, result: &CheckResult) -> Self {
        let mut filter_vars = Map::new();
        filter_vars.insert("hostname".to_string(), Value::from(host));
        Self::new("Host", "host.name==hostname", filter_vars, result)
    }

    fn new(type_: &str, filter: &str, filter_vars: Map<String, Value>, result: &CheckResult) -> Self {
        Self {
            type_: type_.to_string(),
            filter: filter.to_string(),
            filter_vars,
            exit_status: result.exit_status,
            plugin_output: result.output.clone(),
            performance_data: result.performance_data.clone(),
            check_source: (!result.check_source.is_empty()).then(|| result.check_source.clone()),
        }
    }
}
