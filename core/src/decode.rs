//! Decoder for the two error body shapes the Icinga API returns.
//!
//! A plain failure looks like `{"error": 404, "status": "No objects found."}`.
//! A failure that concerns a specific object is wrapped in a `results` array
//! with one entry per affected object:
//! `{"results": [{"code": 500, "name": "...", "status": "...", "type": "Host"}]}`.
//!
//! Anything that fits neither shape is a `DecodeError`, never a guessed
//! `ServerError`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// The plain error shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleError {
    #[serde(rename = "error", deserialize_with = "deserialize_code")]
    pub code: u16,
    pub status: String,
}

/// The per-object error shape found inside `results`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectError {
    #[serde(deserialize_with = "deserialize_code")]
    pub code: u16,
    pub name: String,
    pub status: String,
    #[serde(rename = "type")]
    pub type_: String,
}

/// An error reported by the server and decoded successfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    #[error("error code: {}, error msg: {}", .0.code, .0.status)]
    Simple(SimpleError),

    #[error("error code: {}, {} {:?}: {}", .0.code, .0.type_, .0.name, .0.status)]
    Object(ObjectError),
}

impl ServerError {
    pub fn code(&self) -> u16 {
        match self {
            ServerError::Simple(e) => e.code,
            ServerError::Object(e) => e.code,
        }
    }

    pub fn status(&self) -> &str {
        match self {
            ServerError::Simple(e) => &e.status,
            ServerError::Object(e) => &e.status,
        }
    }
}

/// The error body itself was malformed.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("error body is not a JSON object: {0}")]
    Json(#[source] serde_json::Error),

    #[error("results is not an array")]
    ResultsNotArray,

    #[error("expected exactly one entry in results, got {0}")]
    ResultCount(usize),

    #[error("results entry is missing field {0:?}")]
    MissingField(&'static str),

    #[error("unexpected error shape: {0}")]
    Shape(#[source] serde_json::Error),
}

const OBJECT_ERROR_FIELDS: [&str; 4] = ["code", "name", "status", "type"];

/// Classify and parse a non-success response body.
pub fn decode_error(body: &[u8]) -> Result<ServerError, DecodeError> {
    let mut map: Map<String, Value> = serde_json::from_slice(body).map_err(DecodeError::Json)?;

    let Some(results) = map.remove("results") else {
        return serde_json::from_value(Value::Object(map))
            .map(ServerError::Simple)
            .map_err(DecodeError::Shape);
    };

    let Value::Array(mut results) = results else {
        return Err(DecodeError::ResultsNotArray);
    };
    if results.len() != 1 {
        return Err(DecodeError::ResultCount(results.len()));
    }
    let entry = results.remove(0);
    if let Some(field) = OBJECT_ERROR_FIELDS.iter().find(|f| entry.get(**f).is_none()) {
        return Err(DecodeError::MissingField(*field));
    }
    serde_json::from_value(entry)
        .map(ServerError::Object)
        .map_err(DecodeError::Shape)
}

/// Icinga renders codes as floats (`404.0`); accept any integral number.
fn deserialize_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    let n = serde_json::Number::deserialize(deserializer)?;
    n.as_u64()
        .or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        })
        .and_then(|c| u16::try_from(c).ok())
        .ok_or_else(|| D::Error::custom(format!("invalid error code {n}")))
}
