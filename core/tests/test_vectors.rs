//! Run the request builder, error decoder and binder against the JSON test
//! vectors stored in `test-vectors/`.
//!
//! Each vector file lists named cases with inputs and expected outcomes.
//! Expected values are compared as parsed JSON or typed fields, never as
//! raw strings, so field ordering does not matter.

use icinga_core::{
    bind, decode_error, BindError, CallContext, Config, DecodeError, Error, Host, HttpMethod, HttpRequest,
    HttpResponse, Icinga, Object, ServerError, Service, Transport, ValidationError,
};
use serde_json::Value;

const BASE_URL: &str = "https://icinga.example.com:5665/v1";

struct NoNetwork;

impl Transport for NoNetwork {
    fn execute(&self, request: HttpRequest, _ctx: &CallContext) -> Result<HttpResponse, Error> {
        panic!("unexpected request to {}", request.url);
    }
}

fn client() -> Icinga {
    Icinga::with_transport(Config::new(BASE_URL, "root", "icinga"), NoNetwork)
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Request builder
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let ic = client();
    for case in load(include_str!("../../test-vectors/requests.json")) {
        let name = case["name"].as_str().unwrap();
        let mut req = ic.verb(parse_method(case["method"].as_str().unwrap()));
        if let Some(endpoint) = case["endpoint"].as_str() {
            req = req.endpoint(endpoint);
        }
        if let Some(type_) = case["type"].as_str() {
            req = req.object_type(type_);
        }
        if let Some(object) = case["object"].as_str() {
            req = req.object(object);
        }

        let expected = &case["expected"];
        if let Some(url) = expected["url"].as_str() {
            assert!(req.error().is_none(), "{name}: unexpected error {:?}", req.error());
            assert_eq!(req.url(), format!("{BASE_URL}{url}"), "{name}: url");
            continue;
        }

        let err = req.error().unwrap_or_else(|| panic!("{name}: expected an error"));
        let kind = match err {
            ValidationError::InvalidEndpoint(_) => "invalid_endpoint",
            ValidationError::InvalidType(_) => "invalid_type",
            ValidationError::TypeWithoutObjects { .. } => "type_without_objects",
            ValidationError::EmptyObject => "empty_object",
            other => panic!("{name}: unexpected error {other:?}"),
        };
        assert_eq!(kind, expected["error"].as_str().unwrap(), "{name}: error kind");

        // An invalid request never reaches the transport.
        let result = req.call(&CallContext::background());
        assert!(matches!(result.error(), Some(Error::Validation(_))), "{name}: call");
    }
}

// ---------------------------------------------------------------------------
// Error decoder
// ---------------------------------------------------------------------------

#[test]
fn error_test_vectors() {
    for case in load(include_str!("../../test-vectors/errors.json")) {
        let name = case["name"].as_str().unwrap();
        let body = case["body"].as_str().unwrap();
        let expected = &case["expected"];

        match (expected["kind"].as_str().unwrap(), decode_error(body.as_bytes())) {
            ("simple", Ok(ServerError::Simple(simple))) => {
                assert_eq!(u64::from(simple.code), expected["code"].as_u64().unwrap(), "{name}: code");
                assert_eq!(simple.status, expected["status"].as_str().unwrap(), "{name}: status");
            }
            ("object", Ok(ServerError::Object(object))) => {
                assert_eq!(u64::from(object.code), expected["code"].as_u64().unwrap(), "{name}: code");
                assert_eq!(object.status, expected["status"].as_str().unwrap(), "{name}: status");
                assert_eq!(object.name, expected["object"].as_str().unwrap(), "{name}: object");
                assert_eq!(object.type_, expected["type"].as_str().unwrap(), "{name}: type");
            }
            ("decode", Err(_)) => continue,
            (kind, got) => panic!("{name}: expected {kind}, got {got:?}"),
        }

        let not_found = Error::Server(decode_error(body.as_bytes()).unwrap()).is_not_found();
        assert_eq!(not_found, expected["not_found"].as_bool().unwrap(), "{name}: is_not_found");
    }
}

#[test]
fn results_count_is_reported() {
    let err = decode_error(br#"{"results":[]}"#).unwrap_err();
    assert!(matches!(err, DecodeError::ResultCount(0)));
}

// ---------------------------------------------------------------------------
// Binder
// ---------------------------------------------------------------------------

fn bind_error_kind(err: &BindError) -> &'static str {
    match err {
        BindError::Envelope(_) => "envelope",
        BindError::ResultCount(_) => "result_count",
        BindError::SchemaMismatch { .. } => "schema_mismatch",
        BindError::Coercion { .. } => "coercion",
    }
}

fn check_error(name: &str, err: BindError, expected: &Value) {
    assert_eq!(bind_error_kind(&err), expected["error"].as_str().unwrap(), "{name}: error kind");
    if let (BindError::Coercion { key, .. }, Some(want)) = (&err, expected["key"].as_str()) {
        assert_eq!(*key, want, "{name}: failing key");
    }
}

fn check_common(name: &str, object: &impl Object, expected: &Value) {
    assert_eq!(object.name(), expected["name"].as_str().unwrap(), "{name}: name");
    assert_eq!(object.type_name(), expected["type"].as_str().unwrap(), "{name}: type");
}

fn strings(value: &Value) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap()
}

fn check_host(name: &str, host: &Host, expected: &Value) {
    check_common(name, host, expected);
    if let Some(address) = expected["address"].as_str() {
        assert_eq!(host.address, address, "{name}: address");
    }
    if let Some(address6) = expected["address6"].as_str() {
        assert_eq!(host.address6, address6, "{name}: address6");
    }
    if let Some(display_name) = expected["display_name"].as_str() {
        assert_eq!(host.display_name, display_name, "{name}: display_name");
    }
    if !expected["groups"].is_null() {
        assert_eq!(host.groups, strings(&expected["groups"]), "{name}: groups");
    }
    if let Some(state) = expected["state"].as_i64() {
        assert_eq!(host.state as i64, state, "{name}: state");
    }
    if let Some(last_hard_state) = expected["last_hard_state"].as_i64() {
        assert_eq!(host.last_hard_state, last_hard_state, "{name}: last_hard_state");
    }
    if let Some(secs) = expected["last_state_up_secs"].as_i64() {
        assert_eq!(host.last_state_up.timestamp(), secs, "{name}: last_state_up secs");
    }
    if let Some(nanos) = expected["last_state_up_nanos"].as_u64() {
        assert_eq!(
            u64::from(host.last_state_up.timestamp_subsec_nanos()),
            nanos,
            "{name}: last_state_up nanos"
        );
    }
    if let Some(interval) = expected["check_interval"].as_f64() {
        assert_eq!(host.checkable.check_interval, interval, "{name}: check_interval");
    }
    if let Some(vars) = expected["vars"].as_object() {
        assert_eq!(&host.checkable.custom_vars.vars, vars, "{name}: vars");
    }
}

fn check_service(name: &str, service: &Service, expected: &Value) {
    check_common(name, service, expected);
    if let Some(host_name) = expected["host_name"].as_str() {
        assert_eq!(service.host_name, host_name, "{name}: host_name");
    }
    if let Some(state) = expected["state"].as_i64() {
        assert_eq!(service.state as i64, state, "{name}: state");
    }
    let last = &service.checkable.last_check_result;
    if let Some(exit_status) = expected["exit_status"].as_i64() {
        assert_eq!(last.exit_status, exit_status, "{name}: exit_status");
    }
    if let Some(output) = expected["output"].as_str() {
        assert_eq!(last.output, output, "{name}: output");
    }
    if !expected["performance_data"].is_null() {
        assert_eq!(last.performance_data, strings(&expected["performance_data"]), "{name}: perfdata");
    }
}

#[test]
fn bind_test_vectors() {
    for case in load(include_str!("../../test-vectors/bind.json")) {
        let name = case["name"].as_str().unwrap();
        let payload = serde_json::to_vec(&case["payload"]).unwrap();
        let expected = &case["expected"];
        let wants_error = expected.get("error").is_some();

        match case["kind"].as_str().unwrap() {
            "host" => match bind::<Host>(&payload) {
                Ok(host) if !wants_error => check_host(name, &host, expected),
                Err(err) if wants_error => check_error(name, err, expected),
                other => panic!("{name}: unexpected outcome {other:?}"),
            },
            "service" => match bind::<Service>(&payload) {
                Ok(service) if !wants_error => check_service(name, &service, expected),
                Err(err) if wants_error => check_error(name, err, expected),
                other => panic!("{name}: unexpected outcome {other:?}"),
            },
            other => panic!("{name}: unknown kind {other}"),
        }
    }
}
