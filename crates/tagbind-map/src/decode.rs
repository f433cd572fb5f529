//! Shape-guided decoding of structured (JSON) text.
//!
//! Used for JSON request bodies and as the leaf fallback for struct and map
//! fields bound from a single string. Decoding merges into the existing
//! value: struct fields missing from the input keep their current value.

use chrono::{DateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tagbind_model::{Field, FloatWidth, IntWidth, SKIP_TAG, Shape, StructShape, Value, parse_tag};

use crate::coerce::{parse_int, parse_uint};
use crate::error::{MapError, Result};

/// Per-call switches for structured decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Keep the exact integer form of numbers decoded into [`Shape::Any`]
    /// instead of widening them to 64-bit floats.
    pub use_number: bool,
    /// Reject object keys that match no field of the destination struct.
    pub disallow_unknown_fields: bool,
}

/// Decodes a JSON document into `value`.
pub fn decode_json(body: &[u8], value: &mut Value, shape: &Shape, options: &DecodeOptions) -> Result<()> {
    let json: Json = serde_json::from_slice(body)?;
    decode_in_place(&json, value, shape, options)
}

/// Decodes an already parsed JSON document into `value`.
pub fn decode_in_place(json: &Json, value: &mut Value, shape: &Shape, options: &DecodeOptions) -> Result<()> {
    Decoder { options }.decode(json, value, shape, "$")
}

struct Decoder<'a> {
    options: &'a DecodeOptions,
}

impl Decoder<'_> {
    fn decode(&self, json: &Json, value: &mut Value, shape: &Shape, path: &str) -> Result<()> {
        if json.is_null() {
            match shape {
                Shape::Pointer(_) => *value = Value::Pointer(None),
                Shape::Slice(_) => *value = Value::Slice(Vec::new()),
                Shape::Map { .. } => *value = Value::Map(Default::default()),
                Shape::Any => *value = Value::Any(Json::Null),
                _ => {}
            }
            return Ok(());
        }

        match shape {
            Shape::Bool => match json {
                Json::Bool(b) => *value = Value::Bool(*b),
                other => return Err(type_error(other, shape, path)),
            },
            Shape::Int(width) => *value = Value::Int(decode_int(json, *width, shape, path)?),
            Shape::Uint(width) => *value = Value::Uint(decode_uint(json, *width, shape, path)?),
            Shape::Float(width) => *value = Value::Float(decode_float(json, *width, shape, path)?),
            Shape::String => match json {
                Json::String(s) => *value = Value::String(s.clone()),
                other => return Err(type_error(other, shape, path)),
            },
            Shape::Duration => {
                let nanos = json.as_i64().ok_or_else(|| type_error(json, shape, path))?;
                *value = Value::Duration(TimeDelta::nanoseconds(nanos));
            }
            Shape::Time => {
                let Json::String(s) = json else {
                    return Err(type_error(json, shape, path));
                };
                let instant = DateTime::parse_from_rfc3339(s).map_err(|e| MapError::Decode {
                    path: path.to_string(),
                    message: format!("parsing time {s:?}: {e}"),
                })?;
                *value = Value::Time(instant);
            }
            Shape::Any => *value = Value::Any(self.any(json)),
            Shape::Pointer(elem) => {
                let Value::Pointer(slot) = value else {
                    return Err(MapError::mismatch(shape, value));
                };
                let inner = slot.get_or_insert_with(|| Box::new(elem.zero_value()));
                self.decode(json, inner, elem, path)?;
            }
            Shape::Struct(def) => self.decode_struct(json, value, def, shape, path)?,
            Shape::Slice(elem) => {
                let Json::Array(items) = json else {
                    return Err(type_error(json, shape, path));
                };
                let mut decoded = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let mut slot = elem.zero_value();
                    self.decode(item, &mut slot, elem, &format!("{path}[{idx}]"))?;
                    decoded.push(slot);
                }
                *value = Value::Slice(decoded);
            }
            Shape::Array(elem, _) => {
                let Json::Array(items) = json else {
                    return Err(type_error(json, shape, path));
                };
                let Value::Array(slots) = value else {
                    return Err(MapError::mismatch(shape, value));
                };
                // Extra input elements are dropped; missing ones reset to zero.
                for (idx, slot) in slots.iter_mut().enumerate() {
                    match items.get(idx) {
                        Some(item) => self.decode(item, slot, elem, &format!("{path}[{idx}]"))?,
                        None => *slot = elem.zero_value(),
                    }
                }
            }
            Shape::Map { key, value: elem } => {
                let Json::Object(entries) = json else {
                    return Err(type_error(json, shape, path));
                };
                let Value::Map(map) = value else {
                    return Err(MapError::mismatch(shape, value));
                };
                for (name, item) in entries {
                    check_map_key(name, key, path)?;
                    let mut slot = elem.zero_value();
                    self.decode(item, &mut slot, elem, &format!("{path}.{name}"))?;
                    map.insert(name.clone(), slot);
                }
            }
            Shape::File | Shape::Unsupported(_) => {
                return Err(MapError::Decode {
                    path: path.to_string(),
                    message: format!("cannot decode into {}", shape.type_name()),
                });
            }
        }
        Ok(())
    }

    fn decode_struct(
        &self,
        json: &Json,
        value: &mut Value,
        def: &StructShape,
        shape: &Shape,
        path: &str,
    ) -> Result<()> {
        let Json::Object(entries) = json else {
            return Err(type_error(json, shape, path));
        };
        let Value::Struct(children) = value else {
            return Err(MapError::mismatch(shape, value));
        };
        if children.len() != def.fields.len() {
            return Err(MapError::mismatch(shape, value));
        }
        for (name, item) in entries {
            match locate_field(def, name) {
                Some(route) => self.decode_route(item, children, def, &route, path)?,
                None if self.options.disallow_unknown_fields => {
                    return Err(MapError::Decode {
                        path: path.to_string(),
                        message: format!("unknown field {name:?}"),
                    });
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Decodes into the field reached by `route`, allocating embedded
    /// pointers on the way down.
    fn decode_route(
        &self,
        json: &Json,
        children: &mut [Value],
        def: &StructShape,
        route: &[usize],
        path: &str,
    ) -> Result<()> {
        let Some((&idx, rest)) = route.split_first() else {
            return Ok(());
        };
        let field = &def.fields[idx];
        let slot = &mut children[idx];
        let path = format!("{path}.{}", field.name);
        if rest.is_empty() {
            return self.decode(json, slot, &field.shape, &path);
        }

        let (inner_def, inner) = match (&field.shape, slot) {
            (Shape::Struct(inner_def), inner) => (inner_def, inner),
            (Shape::Pointer(elem), Value::Pointer(ptr)) => match elem.as_ref() {
                Shape::Struct(inner_def) => (
                    inner_def,
                    ptr.get_or_insert_with(|| Box::new(elem.zero_value())).as_mut(),
                ),
                other => return Err(MapError::mismatch(other, &Value::Unsupported)),
            },
            (other, found) => return Err(MapError::mismatch(other, found)),
        };
        let found = inner.kind();
        let grandchildren = match inner {
            Value::Struct(grandchildren) if grandchildren.len() == inner_def.fields.len() => {
                grandchildren
            }
            _ => {
                return Err(MapError::ShapeMismatch {
                    expected: inner_def.name.clone(),
                    found,
                });
            }
        };
        self.decode_route(json, grandchildren, inner_def, rest, &path)
    }

    fn any(&self, json: &Json) -> Json {
        if self.options.use_number {
            return json.clone();
        }
        match json {
            Json::Number(n) => n
                .as_f64()
                .and_then(serde_json::Number::from_f64)
                .map_or(Json::Null, Json::Number),
            Json::Array(items) => Json::Array(items.iter().map(|item| self.any(item)).collect()),
            Json::Object(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), self.any(item)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Resolves an object key to a field route: exact names first, then a
/// case-insensitive match. Direct fields shadow promoted ones.
fn locate_field(def: &StructShape, key: &str) -> Option<Vec<usize>> {
    find_field(def, &|name: &str| name == key)
        .or_else(|| find_field(def, &|name: &str| name.eq_ignore_ascii_case(key)))
}

fn find_field(def: &StructShape, matches: &dyn Fn(&str) -> bool) -> Option<Vec<usize>> {
    let direct = def
        .fields
        .iter()
        .position(|field| json_name(field).is_some_and(matches));
    if let Some(idx) = direct {
        return Some(vec![idx]);
    }
    def.fields.iter().enumerate().find_map(|(idx, field)| {
        if !is_promoting(field) {
            return None;
        }
        let inner = embedded_struct(&field.shape)?;
        let mut route = find_field(inner, matches)?;
        route.insert(0, idx);
        Some(route)
    })
}

/// The object key a field answers to, or `None` when the field is skipped
/// or only contributes promoted children.
fn json_name(field: &Field) -> Option<&str> {
    let (name, _) = parse_tag(field.tag.get("json"));
    if name == SKIP_TAG || is_promoting(field) || !field.exported {
        return None;
    }
    Some(if name.is_empty() { field.name.as_str() } else { name })
}

fn is_promoting(field: &Field) -> bool {
    let (name, _) = parse_tag(field.tag.get("json"));
    field.anonymous && name.is_empty() && embedded_struct(&field.shape).is_some()
}

fn embedded_struct(shape: &Shape) -> Option<&StructShape> {
    match shape {
        Shape::Struct(def) => Some(def),
        Shape::Pointer(elem) => match elem.as_ref() {
            Shape::Struct(def) => Some(def),
            _ => None,
        },
        _ => None,
    }
}

fn check_map_key(name: &str, key: &Shape, path: &str) -> Result<()> {
    let bad_key = |message: String| MapError::Decode {
        path: path.to_string(),
        message,
    };
    match key {
        Shape::String => Ok(()),
        Shape::Int(width) => parse_int(name, *width)
            .map(|_| ())
            .map_err(|e| bad_key(format!("map key: {e}"))),
        Shape::Uint(width) => parse_uint(name, *width)
            .map(|_| ())
            .map_err(|e| bad_key(format!("map key: {e}"))),
        other => Err(bad_key(format!("unsupported map key type {}", other.type_name()))),
    }
}

fn decode_int(json: &Json, width: IntWidth, shape: &Shape, path: &str) -> Result<i64> {
    let v = json.as_i64().ok_or_else(|| type_error(json, shape, path))?;
    let fits = match width {
        IntWidth::W8 => i8::try_from(v).is_ok(),
        IntWidth::W16 => i16::try_from(v).is_ok(),
        IntWidth::W32 => i32::try_from(v).is_ok(),
        IntWidth::Size | IntWidth::W64 => true,
    };
    if fits { Ok(v) } else { Err(type_error(json, shape, path)) }
}

fn decode_uint(json: &Json, width: IntWidth, shape: &Shape, path: &str) -> Result<u64> {
    let v = json.as_u64().ok_or_else(|| type_error(json, shape, path))?;
    let fits = match width {
        IntWidth::W8 => u8::try_from(v).is_ok(),
        IntWidth::W16 => u16::try_from(v).is_ok(),
        IntWidth::W32 => u32::try_from(v).is_ok(),
        IntWidth::Size | IntWidth::W64 => true,
    };
    if fits { Ok(v) } else { Err(type_error(json, shape, path)) }
}

fn decode_float(json: &Json, width: FloatWidth, shape: &Shape, path: &str) -> Result<f64> {
    let Json::Number(n) = json else {
        return Err(type_error(json, shape, path));
    };
    let v = n.as_f64().ok_or_else(|| type_error(json, shape, path))?;
    if width == FloatWidth::W32 && v.is_finite() && (v as f32).is_infinite() {
        return Err(type_error(json, shape, path));
    }
    Ok(v)
}

fn type_error(json: &Json, shape: &Shape, path: &str) -> MapError {
    let found = match json {
        Json::Null => "null".to_string(),
        Json::Bool(_) => "bool".to_string(),
        Json::Number(n) => format!("number {n}"),
        Json::String(_) => "string".to_string(),
        Json::Array(_) => "array".to_string(),
        Json::Object(_) => "object".to_string(),
    };
    MapError::Decode {
        path: path.to_string(),
        message: format!("cannot decode {found} into {}", shape.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tagbind_model::Field;

    use super::*;

    fn user_shape() -> Shape {
        let audit = StructShape::new("Audit").field(Field::new("CreatedBy", Shape::String));
        StructShape::new("User")
            .field(Field::embedded(audit))
            .field(Field::new("Name", Shape::String).tag(r#"json:"name""#))
            .field(Field::new("Age", Shape::Uint(IntWidth::W8)))
            .field(Field::new("Extra", Shape::Any))
            .into()
    }

    #[test]
    fn decodes_nested_and_promoted_fields() {
        let shape = user_shape();
        let mut value = shape.zero_value();
        let body = br#"{"name":"ann","age":30,"createdBy":"root","Extra":{"n":1}}"#;
        decode_json(body, &mut value, &shape, &DecodeOptions::default()).expect("decode");

        assert_eq!(
            shape.encode(&value),
            json!({"CreatedBy": "root", "name": "ann", "Age": 30, "Extra": {"n": 1.0}})
        );
    }

    #[test]
    fn use_number_keeps_integers() {
        let shape = user_shape();
        let mut value = shape.zero_value();
        let options = DecodeOptions {
            use_number: true,
            ..DecodeOptions::default()
        };
        decode_json(br#"{"Extra":{"n":1}}"#, &mut value, &shape, &options).expect("decode");
        let Value::Struct(fields) = &value else {
            panic!("expected struct");
        };
        assert_eq!(fields[3], Value::Any(json!({"n": 1})));
    }

    #[test]
    fn unknown_fields_are_rejected_on_request() {
        let shape = user_shape();
        let mut value = shape.zero_value();
        let options = DecodeOptions {
            disallow_unknown_fields: true,
            ..DecodeOptions::default()
        };
        let err = decode_json(br#"{"nickname":"x"}"#, &mut value, &shape, &options)
            .expect_err("unknown field");
        assert_eq!(err.to_string(), r#"json: unknown field "nickname" (at $)"#);

        decode_json(br#"{"nickname":"x"}"#, &mut value, &shape, &DecodeOptions::default())
            .expect("ignored by default");
    }

    #[test]
    fn malformed_embedded_value_is_a_shape_mismatch() {
        let shape = user_shape();
        let mut value = Value::Struct(vec![
            Value::Struct(Vec::new()),
            Value::String(String::new()),
            Value::Uint(0),
            Value::Any(Json::Null),
        ]);
        let err = decode_json(
            br#"{"CreatedBy":"root"}"#,
            &mut value,
            &shape,
            &DecodeOptions::default(),
        )
        .expect_err("embedded arity");
        assert_eq!(err.to_string(), "value of kind struct does not match shape Audit");

        let mut value = Value::Struct(vec![
            Value::Bool(true),
            Value::String(String::new()),
            Value::Uint(0),
            Value::Any(Json::Null),
        ]);
        let err = decode_json(
            br#"{"CreatedBy":"root"}"#,
            &mut value,
            &shape,
            &DecodeOptions::default(),
        )
        .expect_err("embedded kind");
        assert!(matches!(err, MapError::ShapeMismatch { found: "bool", .. }));
    }

    #[test]
    fn out_of_range_number_is_a_type_error() {
        let shape = user_shape();
        let mut value = shape.zero_value();
        let err = decode_json(br#"{"Age":300}"#, &mut value, &shape, &DecodeOptions::default())
            .expect_err("u8 overflow");
        assert_eq!(err.to_string(), "json: cannot decode number 300 into u8 (at $.Age)");
    }

    #[test]
    fn map_merges_and_checks_keys() {
        let shape = Shape::map(Shape::Int(IntWidth::W32), Shape::String);
        let mut value = shape.zero_value();
        decode_json(br#"{"1":"a","2":"b"}"#, &mut value, &shape, &DecodeOptions::default())
            .expect("decode map");
        decode_json(br#"{"3":"c"}"#, &mut value, &shape, &DecodeOptions::default())
            .expect("merge map");
        let Value::Map(entries) = &value else {
            panic!("expected map");
        };
        assert_eq!(entries.len(), 3);

        assert!(
            decode_json(br#"{"x":"c"}"#, &mut value, &shape, &DecodeOptions::default()).is_err()
        );
    }
}
