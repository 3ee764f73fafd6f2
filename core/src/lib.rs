//! Synchronous client for the Icinga 2 REST API.
//!
//! # Overview
//! Reads, creates, updates and deletes monitored objects (hosts, services)
//! and submits passive check results. Two pieces carry the weight:
//! - the attribute binder (`bind`), which maps the server's untyped
//!   attribute bag onto typed objects declared as nested attribute groups;
//! - the request pipeline (`request`), which validates a call, executes it
//!   through a `Transport` and decodes either error shape the server uses.
//!
//! # Design
//! - `Icinga` is a cheap, cloneable handle over an `Arc<Config>` and an
//!   `Arc<dyn Transport>`. Requests are built fresh per call and consumed
//!   by `call`, so no state is shared between calls.
//! - The default transport is a pooled `ureq::Agent`. Tests swap in
//!   recording transports or run against `mock-server` over real HTTP.
//! - Errors form one `Error` enum; `is_not_found` answers the common
//!   "does it exist" question without matching on codes.

pub mod actions;
pub mod bind;
pub mod client;
pub mod clientset;
pub mod config;
pub mod decode;
pub mod error;
pub mod hosts;
pub mod http;
pub mod model;
pub mod request;
pub mod services;
pub mod transport;

pub use actions::Actions;
pub use bind::{bind, bind_into, AttributeBag, Attributes, Coercion, FieldDescriptor, FromAttr, Object, Schema};
pub use client::Icinga;
pub use clientset::ClientSet;
pub use config::{Config, ConfigError};
pub use decode::{decode_error, DecodeError, ObjectError, ServerError, SimpleError};
pub use error::{BindError, CoercionError, Error, Result, ValidationError};
pub use hosts::Hosts;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use model::{service_name, CheckResult, CreateObject, DeleteObject, Host, HostAttrs, HostState, ProcessCheckResult, Service, ServiceAttrs, ServiceState, UpdateObject};
pub use request::{CallResult, Request};
pub use services::Services;
pub use transport::{CallContext, CancelToken, Transport, UreqTransport};
