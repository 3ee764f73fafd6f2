//! Validated request pipeline: build, execute, classify.
//!
//! # Design
//! A [`Request`] is configured through chained calls and consumed by
//! [`Request::call`]. The first validation failure is kept and every later
//! configuration call becomes a no-op, so a chain never needs intermediate
//! error checks; `call` then returns that error without touching the
//! network. Executed calls yield a [`CallResult`] that always keeps the
//! status and raw body, plus the typed error for non-success statuses.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, trace, warn};

use crate::bind::{bind, Object};
use crate::client::Icinga;
use crate::decode::decode_error;
use crate::error::{Error, ValidationError};
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::CallContext;

/// Top-level API endpoints.
pub const ENDPOINTS: [&str; 8] = [
    "objects",
    "actions",
    "events",
    "config",
    "types",
    "variables",
    "status",
    "templates",
];

/// Object types accepted under the `objects` endpoint.
pub const OBJECT_TYPES: [&str; 2] = ["hosts", "services"];

/// One API call under construction.
pub struct Request<'a> {
    client: &'a Icinga,
    method: HttpMethod,
    endpoint: String,
    type_: String,
    object: String,
    body: Option<Vec<u8>>,
    err: Option<ValidationError>,
}

impl<'a> Request<'a> {
    pub(crate) fn new(client: &'a Icinga, method: HttpMethod) -> Self {
        Self {
            client,
            method,
            endpoint: String::new(),
            type_: String::new(),
            object: String::new(),
            body: None,
            err: None,
        }
    }

    /// Select the endpoint, one of [`ENDPOINTS`].
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        if self.err.is_some() {
            return self;
        }
        if !ENDPOINTS.contains(&endpoint) {
            self.err = Some(ValidationError::InvalidEndpoint(endpoint.to_string()));
            return self;
        }
        self.endpoint = endpoint.to_string();
        self
    }

    /// Select the object type. Only valid after `endpoint("objects")`.
    pub fn object_type(mut self, type_: &str) -> Self {
        if self.err.is_some() {
            return self;
        }
        if self.endpoint != "objects" {
            self.err = Some(ValidationError::TypeWithoutObjects {
                endpoint: self.endpoint.clone(),
            });
            return self;
        }
        if !OBJECT_TYPES.contains(&type_) {
            self.err = Some(ValidationError::InvalidType(type_.to_string()));
            return self;
        }
        self.type_ = type_.to_string();
        self
    }

    /// Name the object, or the action for the `actions` endpoint.
    pub fn object(mut self, object: &str) -> Self {
        if self.err.is_some() {
            return self;
        }
        if object.is_empty() {
            self.err = Some(ValidationError::EmptyObject);
            return self;
        }
        self.object = object.to_string();
        self
    }

    /// Use already serialized bytes as the body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        if self.err.is_none() {
            self.body = Some(body.into());
        }
        self
    }

    /// Drain `reader` into the body.
    pub fn body_stream(mut self, mut reader: impl Read) -> Self {
        if self.err.is_some() {
            return self;
        }
        let mut buf = Vec::new();
        match reader.read_to_end(&mut buf) {
            Ok(_) => self.body = Some(buf),
            Err(e) => self.err = Some(ValidationError::BodyStream(e)),
        }
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        if self.err.is_some() {
            return self;
        }
        match serde_json::to_vec(value) {
            Ok(buf) => self.body = Some(buf),
            Err(e) => self.err = Some(ValidationError::Body(e)),
        }
        self
    }

    /// The first validation failure, if any.
    pub fn error(&self) -> Option<&ValidationError> {
        self.err.as_ref()
    }

    /// `{base}/{endpoint}/{type}/{object}`; unset segments are left out.
    pub fn url(&self) -> String {
        let mut url = self.client.config().base_url.clone();
        for segment in [&self.endpoint, &self.type_, &self.object] {
            if !segment.is_empty() {
                url.push('/');
                url.push_str(&urlencoding::encode(segment));
            }
        }
        url
    }

    fn headers(&self) -> Vec<(String, String)> {
        let config = self.client.config();
        let credentials = STANDARD.encode(format!("{}:{}", config.username, config.password));
        vec![
            ("Authorization".to_string(), format!("Basic {credentials}")),
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("X-HTTP-Method-Override".to_string(), self.method.to_string()),
        ]
    }

    /// Execute the request. Never performs I/O when validation failed.
    pub fn call(mut self, ctx: &CallContext) -> CallResult {
        if let Some(err) = self.err.take() {
            warn!(error = %err, method = %self.method, "refusing invalid icinga request");
            return CallResult::failed(Error::Validation(err));
        }

        let request = HttpRequest {
            method: self.method,
            url: self.url(),
            headers: self.headers(),
            body: self.body.take(),
        };
        debug!(
            endpoint = %self.endpoint,
            object = %self.object,
            method = %self.method,
            body_len = request.body.as_ref().map_or(0, Vec::len),
            "calling icinga api"
        );

        let response = match self.client.transport().execute(request, ctx) {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, endpoint = %self.endpoint, object = %self.object, "failed to call icinga api");
                return CallResult::failed(err);
            }
        };

        debug!(status = response.status, "response from icinga api");
        trace!(body = %String::from_utf8_lossy(&response.body), "response body");

        let error = if response.is_success() {
            None
        } else {
            let err = match decode_error(&response.body) {
                Ok(server) => Error::Server(server),
                Err(decode) => Error::Decode(decode),
            };
            warn!(status = response.status, error = %err, "icinga api returned an error");
            Some(err)
        };
        CallResult {
            status: Some(response.status),
            body: response.body,
            error,
        }
    }
}

impl std::fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("endpoint", &self.endpoint)
            .field("type", &self.type_)
            .field("object", &self.object)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("err", &self.err)
            .finish()
    }
}

/// Outcome of one executed call.
#[derive(Debug)]
pub struct CallResult {
    status: Option<u16>,
    body: Vec<u8>,
    error: Option<Error>,
}

impl CallResult {
    fn failed(error: Error) -> Self {
        Self {
            status: None,
            body: Vec::new(),
            error: Some(error),
        }
    }

    /// HTTP status, `None` when no response was received.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Drop the body and keep only the outcome.
    pub fn into_error(self) -> Result<(), Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Decode a success body into a plain serde type.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, Error> {
        if let Some(err) = self.error {
            return Err(err);
        }
        serde_json::from_slice(&self.body).map_err(Error::Deserialization)
    }

    /// Bind a success body into a domain object.
    pub fn bind<T: Object>(self) -> Result<T, Error> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(bind(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::decode::{ObjectError, ServerError, SimpleError};
    use crate::http::HttpResponse;
    use crate::model::{Host, HostState};
    use crate::transport::Transport;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Records requests and replies with a canned response.
    #[derive(Clone)]
    struct Recorder {
        requests: Arc<Mutex<Vec<HttpRequest>>>,
        status: u16,
        body: &'static str,
    }

    impl Recorder {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                requests: Arc::new(Mutex::new(Vec::new())),
                status,
                body,
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for Recorder {
        fn execute(&self, request: HttpRequest, _ctx: &CallContext) -> Result<HttpResponse, Error> {
            self.requests.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: self.status,
                headers: Vec::new(),
                body: self.body.as_bytes().to_vec(),
            })
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _request: HttpRequest, _ctx: &CallContext) -> Result<HttpResponse, Error> {
            Err(Error::Transport("connection refused".into()))
        }
    }

    fn client(transport: impl Transport + 'static) -> Icinga {
        Icinga::with_transport(Config::new("https://icinga:5665/v1", "root", "secret"), transport)
    }

    fn ctx() -> CallContext {
        CallContext::background()
    }

    #[test]
    fn builds_four_segment_url() {
        let ic = client(Recorder::new(200, "{}"));
        let req = ic.get().endpoint("objects").object_type("hosts").object("web-01");
        assert!(req.error().is_none());
        assert_eq!(req.url(), "https://icinga:5665/v1/objects/hosts/web-01");
    }

    #[test]
    fn empty_type_segment_is_omitted() {
        let ic = client(Recorder::new(200, "{}"));
        let req = ic.post().endpoint("actions").object("process-check-result");
        assert_eq!(req.url(), "https://icinga:5665/v1/actions/process-check-result");
    }

    #[test]
    fn object_names_are_percent_encoded() {
        let ic = client(Recorder::new(200, "{}"));
        let req = ic.get().endpoint("objects").object_type("services").object("web 01!http");
        assert_eq!(req.url(), "https://icinga:5665/v1/objects/services/web%2001%21http");
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let ic = client(Recorder::new(200, "{}"));
        let req = ic.get().endpoint("hosts");
        assert!(matches!(req.error(), Some(ValidationError::InvalidEndpoint(e)) if e == "hosts"));
    }

    #[test]
    fn type_requires_objects_endpoint() {
        let ic = client(Recorder::new(200, "{}"));
        for endpoint in ENDPOINTS.iter().filter(|e| **e != "objects") {
            let req = ic.get().endpoint(endpoint).object_type("hosts");
            assert!(
                matches!(req.error(), Some(ValidationError::TypeWithoutObjects { .. })),
                "{endpoint}"
            );
        }
    }

    #[test]
    fn type_must_be_known_and_non_empty() {
        let ic = client(Recorder::new(200, "{}"));
        let req = ic.get().endpoint("objects").object_type("users");
        assert!(matches!(req.error(), Some(ValidationError::InvalidType(_))));

        let req = ic.get().endpoint("objects").object_type("");
        assert!(matches!(req.error(), Some(ValidationError::InvalidType(t)) if t.is_empty()));
    }

    #[test]
    fn empty_object_is_rejected() {
        let ic = client(Recorder::new(200, "{}"));
        let req = ic.get().endpoint("objects").object_type("hosts").object("");
        assert!(matches!(req.error(), Some(ValidationError::EmptyObject)));
    }

    #[test]
    fn first_error_sticks() {
        let ic = client(Recorder::new(200, "{}"));
        let req = ic
            .get()
            .endpoint("bogus")
            .endpoint("objects")
            .object_type("nope")
            .object("")
            .json(&serde_json::json!({"cascade": true}));
        assert!(matches!(req.error(), Some(ValidationError::InvalidEndpoint(e)) if e == "bogus"));
    }

    #[test]
    fn invalid_request_never_reaches_transport() {
        let recorder = Recorder::new(200, "{}");
        let ic = client(recorder.clone());
        let result = ic.get().endpoint("objects").object_type("hosts").object("").call(&ctx());
        assert!(matches!(result.error(), Some(Error::Validation(ValidationError::EmptyObject))));
        assert_eq!(result.status(), None);
        assert!(recorder.requests().is_empty());
    }

    #[test]
    fn sets_auth_and_negotiation_headers() {
        let recorder = Recorder::new(200, "{}");
        let ic = client(recorder.clone());
        ic.delete()
            .endpoint("objects")
            .object_type("hosts")
            .object("web-01")
            .json(&serde_json::json!({"cascade": true}))
            .call(&ctx())
            .into_error()
            .unwrap();

        let sent = recorder.requests();
        assert_eq!(sent.len(), 1);
        let req = &sent[0];
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.header("authorization"), Some("Basic cm9vdDpzZWNyZXQ="));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("x-http-method-override"), Some("DELETE"));
        assert_eq!(req.body.as_deref(), Some(br#"{"cascade":true}"#.as_slice()));
    }

    #[test]
    fn body_accepts_bytes_and_streams() {
        let recorder = Recorder::new(200, "{}");
        let ic = client(recorder.clone());
        ic.post().endpoint("objects").object_type("hosts").object("a").body("raw").call(&ctx());
        ic.post()
            .endpoint("objects")
            .object_type("hosts")
            .object("b")
            .body_stream(std::io::Cursor::new(b"streamed".to_vec()))
            .call(&ctx());
        let sent = recorder.requests();
        assert_eq!(sent[0].body.as_deref(), Some(b"raw".as_slice()));
        assert_eq!(sent[1].body.as_deref(), Some(b"streamed".as_slice()));
    }

    #[test]
    fn unserializable_body_is_a_validation_error() {
        let ic = client(Recorder::new(200, "{}"));
        let mut bad = std::collections::HashMap::new();
        bad.insert(vec![1u8], "non-string keys cannot be JSON object keys");
        let req = ic.put().endpoint("objects").object_type("hosts").object("a").json(&bad);
        assert!(matches!(req.error(), Some(ValidationError::Body(_))));
    }

    #[test]
    fn error_status_is_decoded_and_body_kept() {
        let body = r#"{"error":404,"status":"No objects found."}"#;
        let ic = client(Recorder::new(404, body));
        let result = ic.get().endpoint("objects").object_type("hosts").object("gone").call(&ctx());
        assert_eq!(result.status(), Some(404));
        assert_eq!(result.body(), body.as_bytes());
        match result.error() {
            Some(Error::Server(ServerError::Simple(SimpleError { code, status }))) => {
                assert_eq!(*code, 404);
                assert_eq!(status, "No objects found.");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(result.error().unwrap().is_not_found());
    }

    #[test]
    fn results_error_is_decoded() {
        let body = r#"{"results":[{"code":500,"name":"icinga-master","status":"Attribute could not be set","type":"Host"}]}"#;
        let ic = client(Recorder::new(500, body));
        let err = ic
            .post()
            .endpoint("objects")
            .object_type("hosts")
            .object("icinga-master")
            .call(&ctx())
            .into_error()
            .unwrap_err();
        match err {
            Error::Server(ServerError::Object(ObjectError { code, name, type_, .. })) => {
                assert_eq!(code, 500);
                assert_eq!(name, "icinga-master");
                assert_eq!(type_, "Host");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn malformed_error_body_is_a_decode_failure() {
        let ic = client(Recorder::new(502, "<html>bad gateway</html>"));
        let err = ic.get().endpoint("status").call(&ctx()).into_error().unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn redirect_band_counts_as_success() {
        let ic = client(Recorder::new(302, ""));
        let result = ic.get().endpoint("status").call(&ctx());
        assert!(result.error().is_none());
        assert_eq!(result.status(), Some(302));
    }

    #[test]
    fn transport_errors_pass_through() {
        let ic = client(Unreachable);
        let result = ic.get().endpoint("status").call(&ctx());
        assert!(matches!(result.error(), Some(Error::Transport(_))));
        assert_eq!(result.status(), None);
    }

    #[test]
    fn bind_decodes_success_body() {
        let body = r#"{"results":[{"name":"web-01","type":"Host","attrs":{"address":"10.0.0.1","state":1.0},"joins":{},"meta":{}}]}"#;
        let ic = client(Recorder::new(200, body));
        let host: Host = ic
            .get()
            .endpoint("objects")
            .object_type("hosts")
            .object("web-01")
            .call(&ctx())
            .bind()
            .unwrap();
        assert_eq!(host.name(), "web-01");
        assert_eq!(host.address, "10.0.0.1");
        assert_eq!(host.state, HostState::Down);
    }

    #[test]
    fn decode_reports_bad_success_body() {
        let ic = client(Recorder::new(200, "not json"));
        let err = ic
            .get()
            .endpoint("status")
            .call(&ctx())
            .decode::<serde_json::Value>()
            .unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }
}
