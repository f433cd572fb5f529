//! Runtime values populated by the binding engine.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, json};

use crate::shape::{Shape, StructShape};
use crate::tag::{SKIP_TAG, parse_tag};

/// Seconds between the Unix epoch and `0001-01-01T00:00:00Z`.
const ZERO_INSTANT_UNIX: i64 = -62_135_596_800;

/// The zero instant, `0001-01-01T00:00:00Z`.
pub fn zero_instant() -> DateTime<FixedOffset> {
    DateTime::<Utc>::from_timestamp(ZERO_INSTANT_UNIX, 0)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .fixed_offset()
}

/// Metadata of an uploaded multipart file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    pub filename: String,
    pub size: u64,
    #[serde(default)]
    pub content_type: String,
}

/// A destination value. Its variant always mirrors the [`Shape`] it was built
/// from; struct children are positional and line up with the shape's fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Duration(TimeDelta),
    Time(DateTime<FixedOffset>),
    File(FileHeader),
    Any(serde_json::Value),
    Pointer(Option<Box<Value>>),
    Struct(Vec<Value>),
    Slice(Vec<Value>),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Unsupported,
}

impl Value {
    /// Short kind name used when a value does not line up with its shape.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Duration(_) => "duration",
            Self::Time(_) => "time",
            Self::File(_) => "file",
            Self::Any(_) => "any",
            Self::Pointer(_) => "pointer",
            Self::Struct(_) => "struct",
            Self::Slice(_) => "slice",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for the zero value of the value's kind.
    ///
    /// Structs never count as zero; arrays are zero when every element is.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Bool(b) => !b,
            Self::Int(v) => *v == 0,
            Self::Uint(v) => *v == 0,
            Self::Float(v) => *v == 0.0,
            Self::String(s) => s.is_empty(),
            Self::Duration(d) => d.is_zero(),
            Self::Time(t) => *t == zero_instant(),
            Self::File(file) => file.filename.is_empty(),
            Self::Any(json) => json.is_null(),
            Self::Pointer(inner) => inner.is_none(),
            Self::Struct(_) => false,
            Self::Slice(items) => items.is_empty(),
            Self::Array(items) => items.iter().all(Value::is_zero),
            Self::Map(entries) => entries.is_empty(),
            Self::Unsupported => true,
        }
    }
}

impl Shape {
    /// Encodes a bound value as JSON.
    ///
    /// Embedded struct fields flatten into their parent object, nil pointers
    /// encode as `null`, durations as integer nanoseconds and instants as
    /// RFC 3339 strings. Field names follow the `json` tag family when set.
    pub fn encode(&self, value: &Value) -> serde_json::Value {
        match (self, value) {
            (Self::Pointer(elem), Value::Pointer(Some(inner))) => elem.encode(inner),
            (Self::Struct(def), Value::Struct(children)) => {
                serde_json::Value::Object(encode_struct(def, children))
            }
            (Self::Slice(elem) | Self::Array(elem, _), Value::Slice(items) | Value::Array(items)) => {
                serde_json::Value::Array(items.iter().map(|item| elem.encode(item)).collect())
            }
            (Self::Map { value: elem, .. }, Value::Map(entries)) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), elem.encode(item)))
                    .collect(),
            ),
            (_, scalar) => encode_scalar(scalar),
        }
    }
}

fn encode_struct(def: &StructShape, children: &[Value]) -> Map<String, serde_json::Value> {
    let mut object = Map::new();
    let mut promoted = Vec::new();
    for (field, child) in def.fields.iter().zip(children) {
        if !field.exported && !field.anonymous {
            continue;
        }
        let (name, _) = parse_tag(field.tag.get("json"));
        if name == SKIP_TAG {
            continue;
        }
        if field.anonymous
            && name.is_empty()
            && let serde_json::Value::Object(inner) = field.shape.encode(child)
        {
            promoted.push(inner);
            continue;
        }
        if !field.exported {
            continue;
        }
        let key = if name.is_empty() { field.name.clone() } else { name.to_string() };
        object.insert(key, field.shape.encode(child));
    }
    for inner in promoted {
        for (key, item) in inner {
            object.entry(key).or_insert(item);
        }
    }
    object
}

fn encode_scalar(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => json!(b),
        Value::Int(v) => json!(v),
        Value::Uint(v) => json!(v),
        Value::Float(v) => Number::from_f64(*v).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(s) => json!(s),
        Value::Duration(d) => d.num_nanoseconds().map_or(serde_json::Value::Null, |n| json!(n)),
        Value::Time(t) => json!(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::File(file) => json!({
            "filename": file.filename,
            "size": file.size,
            "content_type": file.content_type,
        }),
        Value::Any(json) => json.clone(),
        _ => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Field, IntWidth};

    #[test]
    fn zero_instant_is_year_one() {
        assert_eq!(
            zero_instant().to_rfc3339_opts(SecondsFormat::Secs, true),
            "0001-01-01T00:00:00Z"
        );
        assert!(Value::Time(zero_instant()).is_zero());
    }

    #[test]
    fn encode_flattens_embedded_and_honours_json_names() {
        let base = StructShape::new("Base").field(Field::new("Id", Shape::Int(IntWidth::W64)));
        let shape: Shape = StructShape::new("User")
            .field(Field::embedded(base))
            .field(Field::new("Name", Shape::String).tag(r#"json:"name""#))
            .field(Field::new("Hidden", Shape::String).tag(r#"json:"-""#))
            .field(Field::new("Next", Shape::pointer(Shape::Bool)))
            .into();
        let value = Value::Struct(vec![
            Value::Struct(vec![Value::Int(7)]),
            Value::String("ann".to_string()),
            Value::String("x".to_string()),
            Value::Pointer(None),
        ]);

        assert_eq!(
            shape.encode(&value),
            json!({"Id": 7, "name": "ann", "Next": null})
        );
    }

    #[test]
    fn encode_duration_as_nanoseconds() {
        let value = Value::Duration(TimeDelta::milliseconds(1500));
        assert_eq!(Shape::Duration.encode(&value), json!(1_500_000_000i64));
    }
}
