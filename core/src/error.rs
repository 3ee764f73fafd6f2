//! Error types for the Icinga API client.
//!
//! # Design
//! Every failure surfaces as one `Error` value whose variant names the
//! failure class. Callers branch with `match` (or `is_not_found`) instead of
//! probing concrete types. Local failures (`Validation`, `NoIdentifier`)
//! never touch the network; `Server` and `Decode` are only produced from a
//! non-success HTTP response; `Bind` and `Deserialization` come from reading
//! a success body.

use thiserror::Error;

use crate::decode::{DecodeError, ServerError};

/// Result type for client operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by requests and resource clients.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("call cancelled: {0}")]
    Cancelled(String),

    #[error("icinga api error: {0}")]
    Server(#[from] ServerError),

    #[error("malformed error response: {0}")]
    Decode(#[from] DecodeError),

    #[error("binding response failed: {0}")]
    Bind(#[from] BindError),

    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("{kind} name must not be empty")]
    NoIdentifier { kind: &'static str },
}

impl Error {
    /// True for a decoded server error carrying code 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Server(e) if e.code() == 404)
    }

    /// The server's error code, if this is a decoded server error.
    pub fn server_code(&self) -> Option<u16> {
        match self {
            Error::Server(e) => Some(e.code()),
            _ => None,
        }
    }
}

/// Rejected request configuration. Raised while building, before any I/O.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid endpoint {0:?}")]
    InvalidEndpoint(String),

    #[error("invalid type {0:?}")]
    InvalidType(String),

    #[error("type is only valid for endpoint objects, not {endpoint:?}")]
    TypeWithoutObjects { endpoint: String },

    #[error("object must not be empty")]
    EmptyObject,

    #[error("serializing body failed: {0}")]
    Body(#[source] serde_json::Error),

    #[error("reading body stream failed: {0}")]
    BodyStream(#[source] std::io::Error),
}

/// Failure to turn an object envelope into a domain type.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("invalid object envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("expected exactly one object in results, got {0}")]
    ResultCount(usize),

    #[error("no known fields of {type_name} found in attrs")]
    SchemaMismatch { type_name: &'static str },

    #[error("attribute {key:?}: {source}")]
    Coercion {
        key: &'static str,
        source: CoercionError,
    },
}

/// A single attribute value could not be converted to its field type.
#[derive(Debug, Error)]
pub enum CoercionError {
    #[error("expected {expected}, found {found}")]
    Kind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{value} is not a valid {target}")]
    OutOfRange { target: &'static str, value: String },

    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}
