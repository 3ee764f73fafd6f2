//! Attribute binder: turns the server's object envelope into typed objects.
//!
//! # Overview
//! Every object read returns an envelope
//! `{"name": ..., "type": ..., "attrs": {...}, "joins": {...}, "meta": {...}}`
//! whose `attrs` map is untyped. Domain types declare which attribute keys
//! they understand through a [`Schema`], built once per type from an explicit
//! table of fields and embedded attribute groups.
//!
//! # Design
//! - An embedded group (`embed`) contributes its own flattened fields, in
//!   declaration order, at the position it is declared. The result is the
//!   depth-first flattening of the group hierarchy.
//! - Each field carries its coercion kind through [`FromAttr`]: scalars are
//!   converted strictly, states from numbers, timestamps from float epochs,
//!   sequences element by element.
//! - Attributes missing from the bag leave the field at its `Default` value.
//!   A JSON `null` resets the field to that value.
//! - Binding fails with `SchemaMismatch` when no declared key is present,
//!   which catches a bag of the wrong object kind.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{BindError, CoercionError};
use crate::model::ConfigObjectAttrs;

/// The generic per-object envelope returned by the objects endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeBag {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub type_: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attrs: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub joins: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: Map<String, Value>,
}

/// How a raw attribute value is converted into its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Strict conversion between matching JSON and Rust kinds.
    Scalar,
    /// A numeric state code mapped onto a state enum.
    State,
    /// A float Unix timestamp turned into a UTC instant.
    Timestamp,
    /// An array converted element by element.
    Sequence,
}

/// Conversion from a raw attribute value into a field type.
pub trait FromAttr: Default + Sized {
    const COERCION: Coercion = Coercion::Scalar;

    fn from_attr(value: &Value) -> Result<Self, CoercionError>;
}

/// A type that can be bound from an attribute map.
pub trait Attributes: Default + Sized + 'static {
    fn schema() -> &'static Schema<Self>;
}

/// A config object whose envelope `name` and `type` identify it.
pub trait Object: Attributes {
    fn config(&self) -> &ConfigObjectAttrs;
    fn config_mut(&mut self) -> &mut ConfigObjectAttrs;

    fn name(&self) -> &str {
        &self.config().name
    }

    fn type_name(&self) -> &str {
        &self.config().object.type_
    }
}

type Apply<T> = Box<dyn Fn(&mut T, &Value) -> Result<(), CoercionError> + Send + Sync>;

/// Flattened metadata for one bindable field.
pub struct FieldDescriptor<T> {
    key: &'static str,
    coercion: Coercion,
    path: Vec<&'static str>,
    apply: Apply<T>,
}

impl<T> FieldDescriptor<T> {
    /// The attribute key this field binds from.
    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn coercion(&self) -> Coercion {
        self.coercion
    }

    /// Group labels from the outermost type down to the field's key.
    pub fn path(&self) -> &[&'static str] {
        &self.path
    }
}

impl<T> std::fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("key", &self.key)
            .field("coercion", &self.coercion)
            .field("path", &self.path)
            .finish()
    }
}

/// The flattened field table of a bindable type.
#[derive(Debug)]
pub struct Schema<T> {
    type_name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: 'static> Schema<T> {
    pub fn builder(type_name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            type_name,
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.key)
    }

    /// First descriptor with `key` in flattening order.
    pub fn descriptor(&self, key: &str) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Apply every present attribute to `target` and return how many
    /// descriptors matched.
    pub fn apply(&self, attrs: &Map<String, Value>, target: &mut T) -> Result<usize, BindError> {
        let mut found = 0;
        for field in &self.fields {
            let Some(value) = attrs.get(field.key) else {
                continue;
            };
            (field.apply)(target, value).map_err(|source| BindError::Coercion {
                key: field.key,
                source,
            })?;
            found += 1;
        }
        Ok(found)
    }
}

/// Builder for a [`Schema`]. Fields and groups are flattened in call order.
pub struct SchemaBuilder<T> {
    type_name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    /// Declare a field bound from the attribute `key`.
    pub fn field<V: FromAttr + 'static>(mut self, key: &'static str, access: fn(&mut T) -> &mut V) -> Self {
        debug_assert!(
            !self.fields.iter().any(|f| f.path.len() == 1 && f.key == key),
            "attribute {key:?} declared twice on {}",
            self.type_name
        );
        self.fields.push(FieldDescriptor {
            key,
            coercion: V::COERCION,
            path: vec![key],
            apply: Box::new(move |target: &mut T, value: &Value| {
                *access(target) = if value.is_null() {
                    V::default()
                } else {
                    V::from_attr(value)?
                };
                Ok(())
            }),
        });
        self
    }

    /// Declare an embedded attribute group whose fields bind as if they were
    /// declared here.
    pub fn embed<G: Attributes>(mut self, label: &'static str, access: fn(&mut T) -> &mut G) -> Self {
        for inner in G::schema().fields() {
            let mut path = Vec::with_capacity(inner.path.len() + 1);
            path.push(label);
            path.extend_from_slice(&inner.path);
            self.fields.push(FieldDescriptor {
                key: inner.key,
                coercion: inner.coercion,
                path,
                apply: Box::new(move |target: &mut T, value: &Value| (inner.apply)(access(target), value)),
            });
        }
        self
    }

    pub fn build(self) -> Schema<T> {
        Schema {
            type_name: self.type_name,
            fields: self.fields,
        }
    }
}

/// Bind an object from a raw response body.
///
/// Accepts a bare envelope or the `{"results": [envelope]}` wrapper the
/// objects endpoint returns; the wrapper must hold exactly one object.
pub fn bind<T: Object>(payload: &[u8]) -> Result<T, BindError> {
    let value: Value = serde_json::from_slice(payload).map_err(BindError::Envelope)?;
    let envelope = match value {
        Value::Object(mut map) if map.contains_key("results") => match map.remove("results") {
            Some(Value::Array(mut results)) if results.len() == 1 => results.remove(0),
            Some(Value::Array(results)) => return Err(BindError::ResultCount(results.len())),
            _ => return Err(BindError::ResultCount(0)),
        },
        other => other,
    };
    let bag: AttributeBag = serde_json::from_value(envelope).map_err(BindError::Envelope)?;
    let mut target = T::default();
    bind_into(&bag, &mut target)?;
    Ok(target)
}

/// Bind `bag` into `target`.
///
/// Attributes are applied first; the envelope's own `name` and `type` then
/// take precedence over any attribute with the same key.
pub fn bind_into<T: Object>(bag: &AttributeBag, target: &mut T) -> Result<(), BindError> {
    let schema = T::schema();
    let found = schema.apply(&bag.attrs, target)?;
    if found == 0 {
        return Err(BindError::SchemaMismatch {
            type_name: schema.type_name(),
        });
    }

    let config = target.config_mut();
    if !bag.name.is_empty() {
        config.name.clone_from(&bag.name);
    }
    if !bag.type_.is_empty() {
        config.object.type_.clone_from(&bag.type_);
    }
    Ok(())
}

/// Convert a float Unix timestamp into a UTC instant.
///
/// The integer part is whole seconds; the fraction is scaled to nanoseconds
/// and truncated.
pub fn timestamp_from_float(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let whole = value.trunc();
    let mut secs = whole as i64;
    let mut nanos = ((value - whole) * 1e9) as i64;
    if nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    DateTime::from_timestamp(secs, nanos as u32)
}

pub(crate) fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(DateTime::default()),
        Some(v) => timestamp_from_float(v)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp {v} out of range"))),
    }
}

/// Writes the float epoch form read by [`deserialize_timestamp`].
pub(crate) fn serialize_timestamp<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    let secs = value.timestamp() as f64 + f64::from(value.timestamp_subsec_nanos()) / 1e9;
    serializer.serialize_f64(secs)
}

/// Integers rendered as JSON floats (`2.0`) are truncated.
pub(crate) fn deserialize_lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Option::<serde_json::Number>::deserialize(deserializer)? {
        None => Ok(0),
        Some(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| serde::de::Error::custom(format!("{n} is not an integer"))),
    }
}

pub(crate) fn null_as_default<'de, D, V>(deserializer: D) -> Result<V, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de> + Default,
{
    Ok(Option::<V>::deserialize(deserializer)?.unwrap_or_default())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(expected: &'static str, value: &Value) -> CoercionError {
    CoercionError::Kind {
        expected,
        found: kind(value),
    }
}

/// Decode a nested record through serde.
pub fn decode_record<R: DeserializeOwned>(value: &Value) -> Result<R, CoercionError> {
    Ok(R::deserialize(value)?)
}

/// Read a numeric state code. Integral floats are accepted.
pub fn state_code(value: &Value) -> Result<i64, CoercionError> {
    let n = value.as_number().ok_or_else(|| mismatch("number", value))?;
    if let Some(code) = n.as_i64() {
        return Ok(code);
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0)
        .map(|f| f as i64)
        .ok_or_else(|| CoercionError::OutOfRange {
            target: "state",
            value: n.to_string(),
        })
}

impl FromAttr for String {
    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl FromAttr for bool {
    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromAttr for i64 {
    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        let n = value.as_number().ok_or_else(|| mismatch("number", value))?;
        match n.as_i64() {
            Some(i) => Ok(i),
            None => n.as_f64().map(|f| f as i64).ok_or_else(|| CoercionError::OutOfRange {
                target: "i64",
                value: n.to_string(),
            }),
        }
    }
}

impl FromAttr for f64 {
    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        value.as_f64().ok_or_else(|| mismatch("number", value))
    }
}

impl FromAttr for Value {
    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        Ok(value.clone())
    }
}

impl FromAttr for Map<String, Value> {
    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        value
            .as_object()
            .cloned()
            .ok_or_else(|| mismatch("object", value))
    }
}

impl FromAttr for DateTime<Utc> {
    const COERCION: Coercion = Coercion::Timestamp;

    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        let v = value.as_f64().ok_or_else(|| mismatch("number", value))?;
        timestamp_from_float(v).ok_or_else(|| CoercionError::OutOfRange {
            target: "timestamp",
            value: v.to_string(),
        })
    }
}

impl<V: FromAttr> FromAttr for Vec<V> {
    const COERCION: Coercion = Coercion::Sequence;

    fn from_attr(value: &Value) -> Result<Self, CoercionError> {
        let items = value.as_array().ok_or_else(|| mismatch("array", value))?;
        items
            .iter()
            .map(|item| if item.is_null() { Ok(V::default()) } else { V::from_attr(item) })
            .collect()
    }
}
