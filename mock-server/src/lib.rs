//! In-memory stand-in for the Icinga 2 REST API.
//!
//! Serves the subset the client uses: object CRUD for hosts and services
//! under `/v1/objects/{kind}/{name}`, `/v1/actions/process-check-result`
//! and `/v1/status`. Every route requires HTTP Basic credentials. Error
//! bodies use both shapes the real server emits: `{"error", "status"}` for
//! request-level failures and a `results` array for per-object failures.

use std::{collections::BTreeMap, sync::Arc, time::SystemTime};

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};

pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_PASSWORD: &str = "icinga";

#[derive(Debug, Default)]
struct Store {
    hosts: BTreeMap<String, Map<String, Value>>,
    services: BTreeMap<String, Map<String, Value>>,
}

type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    authorization: Arc<str>,
}

#[derive(Debug, Deserialize)]
struct CreateBody {
    #[serde(default)]
    templates: Vec<String>,
    #[serde(default)]
    attrs: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct UpdateBody {
    #[serde(default)]
    attrs: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteBody {
    #[serde(default)]
    cascade: bool,
}

#[derive(Debug, Deserialize)]
struct CheckResultBody {
    #[serde(rename = "type")]
    type_: String,
    #[serde(default)]
    filter_vars: Map<String, Value>,
    exit_status: f64,
    plugin_output: String,
    #[serde(default)]
    performance_data: Vec<String>,
    #[serde(default)]
    check_source: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Host,
    Service,
}

impl Kind {
    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "hosts" => Some(Kind::Host),
            "services" => Some(Kind::Service),
            _ => None,
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            Kind::Host => "Host",
            Kind::Service => "Service",
        }
    }
}

type Reply = (StatusCode, Json<Value>);

/// Router with the default credentials.
pub fn app() -> Router {
    app_with_credentials(DEFAULT_USER, DEFAULT_PASSWORD)
}

fn app_with_credentials(user: &str, password: &str) -> Router {
    let state = AppState {
        db: Db::default(),
        authorization: format!("Basic {}", STANDARD.encode(format!("{user}:{password}"))).into(),
    };
    Router::new()
        .route("/v1/status", get(status))
        .route(
            "/v1/objects/{kind}/{name}",
            get(get_object).put(create_object).post(update_object).delete(delete_object),
        )
        .route("/v1/actions/process-check-result", post(process_check_result))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn simple_error(code: StatusCode, status: &str) -> Reply {
    (code, Json(json!({ "error": code.as_u16(), "status": status })))
}

fn object_reply(code: StatusCode, kind: Kind, name: &str, status: &str) -> Reply {
    (
        code,
        Json(json!({
            "results": [{
                "code": code.as_u16(),
                "name": name,
                "status": status,
                "type": kind.type_name(),
            }]
        })),
    )
}

fn not_found() -> Reply {
    simple_error(StatusCode::NOT_FOUND, "No objects found.")
}

fn now() -> f64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == &*state.authorization);
    if !authorized {
        warn!(uri = %request.uri(), "rejecting unauthenticated request");
        return simple_error(
            StatusCode::UNAUTHORIZED,
            "Unauthorized. Please check your user credentials.",
        )
        .into_response();
    }
    next.run(request).await
}

async fn status() -> Json<Value> {
    Json(json!({ "results": [{ "name": "IcingaApplication", "status": {} }] }))
}

async fn get_object(State(state): State<AppState>, Path((kind, name)): Path<(String, String)>) -> Reply {
    let Some(kind) = Kind::parse(&kind) else {
        return not_found();
    };
    let store = state.db.read().await;
    let objects = match kind {
        Kind::Host => &store.hosts,
        Kind::Service => &store.services,
    };
    let Some(attrs) = objects.get(&name) else {
        return not_found();
    };
    (
        StatusCode::OK,
        Json(json!({
            "results": [{
                "name": name,
                "type": kind.type_name(),
                "attrs": attrs,
                "joins": {},
                "meta": {},
            }]
        })),
    )
}

async fn create_object(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
    body: Bytes,
) -> Reply {
    let Some(kind) = Kind::parse(&kind) else {
        return not_found();
    };
    let body: CreateBody = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => return simple_error(StatusCode::BAD_REQUEST, &format!("Invalid request body: {e}")),
    };

    let mut store = state.db.write().await;
    let exists = match kind {
        Kind::Host => store.hosts.contains_key(&name),
        Kind::Service => store.services.contains_key(&name),
    };
    if exists {
        return object_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            kind,
            &name,
            "Object could not be created.",
        );
    }

    let mut attrs = Map::new();
    attrs.insert("__name".into(), json!(name));
    attrs.insert("active".into(), json!(true));
    attrs.insert("templates".into(), json!(body.templates));
    attrs.insert("type".into(), json!(kind.type_name()));
    attrs.insert("version".into(), json!(now()));
    attrs.insert("state".into(), json!(0.0));
    attrs.insert("last_check_result".into(), Value::Null);
    match kind {
        Kind::Host => {
            attrs.insert("name".into(), json!(name));
        }
        Kind::Service => {
            let Some((host, short)) = name.split_once('!') else {
                return object_reply(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    kind,
                    &name,
                    "Object could not be created.",
                );
            };
            if !store.hosts.contains_key(host) {
                return object_reply(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    kind,
                    &name,
                    "Object could not be created.",
                );
            }
            attrs.insert("name".into(), json!(short));
            attrs.insert("host_name".into(), json!(host));
        }
    }
    attrs.extend(body.attrs);

    match kind {
        Kind::Host => store.hosts.insert(name.clone(), attrs),
        Kind::Service => store.services.insert(name.clone(), attrs),
    };
    info!(kind = kind.type_name(), name = %name, "created object");
    object_reply(StatusCode::OK, kind, &name, "Object was created")
}

async fn update_object(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
    body: Bytes,
) -> Reply {
    let Some(kind) = Kind::parse(&kind) else {
        return not_found();
    };
    let body: UpdateBody = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => return simple_error(StatusCode::BAD_REQUEST, &format!("Invalid request body: {e}")),
    };

    let mut store = state.db.write().await;
    let objects = match kind {
        Kind::Host => &mut store.hosts,
        Kind::Service => &mut store.services,
    };
    let Some(attrs) = objects.get_mut(&name) else {
        return not_found();
    };
    attrs.extend(body.attrs);
    attrs.insert("version".into(), json!(now()));
    debug!(kind = kind.type_name(), name = %name, "updated object");
    object_reply(StatusCode::OK, kind, &name, "Attributes updated.")
}

async fn delete_object(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
    body: Bytes,
) -> Reply {
    let Some(kind) = Kind::parse(&kind) else {
        return not_found();
    };
    let body: DeleteBody = if body.is_empty() {
        DeleteBody::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(body) => body,
            Err(e) => return simple_error(StatusCode::BAD_REQUEST, &format!("Invalid request body: {e}")),
        }
    };

    let mut store = state.db.write().await;
    match kind {
        Kind::Host => {
            if !store.hosts.contains_key(&name) {
                return not_found();
            }
            let prefix = format!("{name}!");
            let dependents: Vec<String> = store
                .services
                .keys()
                .filter(|k| k.starts_with(&prefix))
                .cloned()
                .collect();
            if !dependents.is_empty() && !body.cascade {
                return object_reply(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    kind,
                    &name,
                    "Object could not be deleted.",
                );
            }
            for service in dependents {
                store.services.remove(&service);
            }
            store.hosts.remove(&name);
        }
        Kind::Service => {
            if store.services.remove(&name).is_none() {
                return not_found();
            }
        }
    }
    info!(kind = kind.type_name(), name = %name, cascade = body.cascade, "deleted object");
    object_reply(StatusCode::OK, kind, &name, "Object was deleted.")
}

async fn process_check_result(State(state): State<AppState>, body: Bytes) -> Reply {
    let body: CheckResultBody = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => return simple_error(StatusCode::BAD_REQUEST, &format!("Invalid request body: {e}")),
    };
    let var = |name: &str| body.filter_vars.get(name).and_then(Value::as_str).unwrap_or_default();
    let (kind, name) = match body.type_.as_str() {
        "Host" => (Kind::Host, var("hostname").to_string()),
        "Service" => (Kind::Service, format!("{}!{}", var("hostname"), var("servicename"))),
        _ => return simple_error(StatusCode::BAD_REQUEST, "Invalid 'type' specified."),
    };

    let mut store = state.db.write().await;
    let objects = match kind {
        Kind::Host => &mut store.hosts,
        Kind::Service => &mut store.services,
    };
    let Some(attrs) = objects.get_mut(&name) else {
        return not_found();
    };
    let at = now();
    attrs.insert(
        "last_check_result".into(),
        json!({
            "active": false,
            "check_source": body.check_source.unwrap_or_default(),
            "command": null,
            "execution_start": at,
            "execution_end": at,
            "exit_status": body.exit_status,
            "output": body.plugin_output,
            "performance_data": body.performance_data,
            "schedule_start": at,
            "schedule_end": at,
            "state": body.exit_status,
            "type": "CheckResult",
        }),
    );
    attrs.insert("state".into(), json!(body.exit_status));
    attrs.insert("last_check".into(), json!(at));
    debug!(kind = kind.type_name(), name = %name, exit_status = body.exit_status, "processed check result");
    (
        StatusCode::OK,
        Json(json!({
            "results": [{
                "code": 200,
                "status": format!("Successfully processed check result for object '{name}'."),
            }]
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_type_names() {
        assert_eq!(Kind::parse("hosts"), Some(Kind::Host));
        assert_eq!(Kind::parse("services").map(Kind::type_name), Some("Service"));
        assert_eq!(Kind::parse("users"), None);
    }

    #[test]
    fn create_body_defaults_templates() {
        let body: CreateBody = serde_json::from_str(r#"{"attrs":{"address":"10.0.0.1"}}"#).unwrap();
        assert!(body.templates.is_empty());
        assert_eq!(body.attrs["address"], "10.0.0.1");
    }

    #[test]
    fn check_result_body_requires_output() {
        let result: Result<CheckResultBody, _> = serde_json::from_str(r#"{"type":"Host","exit_status":0}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn custom_credentials_replace_the_defaults() {
        use tower::ServiceExt;

        let status = |auth: &str| {
            axum::http::Request::builder()
                .uri("/v1/status")
                .header(AUTHORIZATION, format!("Basic {}", STANDARD.encode(auth)))
                .body(axum::body::Body::empty())
                .unwrap()
        };
        let app = app_with_credentials("monitor", "s3cret");

        let ok = app.clone().oneshot(status("monitor:s3cret")).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let rejected = app.oneshot(status("root:icinga")).await.unwrap();
        assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn simple_error_has_both_fields() {
        let (code, Json(body)) = not_found();
        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": 404, "status": "No objects found."}));
    }
}
