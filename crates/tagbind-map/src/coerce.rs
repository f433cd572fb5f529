//! Leaf bind: coercion of source strings into destination values.

use tagbind_model::{Field, FloatWidth, IntWidth, SetOptions, Shape, Value};

use crate::decode::{DecodeOptions, decode_in_place};
use crate::duration::parse_duration;
use crate::error::{MapError, Result};
use crate::time::set_time_field;

/// Everything a setter needs to write one field.
pub struct SetTarget<'a> {
    pub value: &'a mut Value,
    pub shape: &'a Shape,
    pub field: &'a Field,
    pub decode: &'a DecodeOptions,
}

/// Binds `values` (the source's entry for the field's key, if any) into the
/// target.
///
/// Returns `Ok(false)` without touching the target when the key is absent
/// and no default is configured. Slices and arrays receive every value;
/// other kinds receive the first value, the default when the key is absent,
/// or the empty string.
pub fn set_by_form(
    target: SetTarget<'_>,
    values: Option<&[String]>,
    options: &SetOptions<'_>,
) -> Result<bool> {
    if values.is_none() && !options.has_default() {
        return Ok(false);
    }

    let fallback;
    let list: &[String] = match values {
        Some(values) => values,
        None => {
            fallback = [options.default_value.unwrap_or_default().to_string()];
            &fallback
        }
    };

    match target.shape {
        Shape::Slice(elem) => {
            let mut items = Vec::with_capacity(list.len());
            for raw in list {
                let mut item = elem.zero_value();
                set_with_proper_type(raw, &mut item, elem, target.field, target.decode)?;
                items.push(item);
            }
            *target.value = Value::Slice(items);
            Ok(true)
        }
        Shape::Array(elem, len) => {
            if list.len() != *len {
                return Err(MapError::InvalidArrayLength {
                    values: list.to_vec(),
                    type_name: target.shape.type_name(),
                });
            }
            let Value::Array(items) = target.value else {
                return Err(MapError::mismatch(target.shape, target.value));
            };
            if items.len() != *len {
                return Err(MapError::ShapeMismatch {
                    expected: target.shape.type_name(),
                    found: "array",
                });
            }
            for (raw, item) in list.iter().zip(items.iter_mut()) {
                set_with_proper_type(raw, item, elem, target.field, target.decode)?;
            }
            Ok(true)
        }
        _ => {
            let raw = match values {
                Some(values) => values.first().map_or("", String::as_str),
                None => options.default_value.unwrap_or_default(),
            };
            set_with_proper_type(raw, target.value, target.shape, target.field, target.decode)?;
            Ok(true)
        }
    }
}

/// Coerces a single string into `value` according to `shape`.
pub fn set_with_proper_type(
    raw: &str,
    value: &mut Value,
    shape: &Shape,
    field: &Field,
    decode: &DecodeOptions,
) -> Result<()> {
    let coerced = match shape {
        Shape::Int(width) => Value::Int(parse_int(raw, *width)?),
        Shape::Duration => Value::Duration(parse_duration(raw)?),
        Shape::Uint(width) => Value::Uint(parse_uint(raw, *width)?),
        Shape::Bool => {
            let raw = if raw.is_empty() { "false" } else { raw };
            Value::Bool(parse_bool(raw).ok_or_else(|| MapError::ParseBool {
                value: raw.to_string(),
            })?)
        }
        Shape::Float(width) => Value::Float(parse_float(raw, *width)?),
        Shape::String => Value::String(raw.to_string()),
        Shape::Time => set_time_field(raw, field)?,
        Shape::Struct(_) | Shape::Map { .. } => {
            let json: serde_json::Value = serde_json::from_str(raw)?;
            decode_in_place(&json, value, shape, decode)?;
            return Ok(());
        }
        _ => return Err(MapError::UnknownType),
    };
    *value = coerced;
    Ok(())
}

/// Parses a base-10 signed integer at the given width; empty means zero.
pub fn parse_int(raw: &str, width: IntWidth) -> Result<i64> {
    let raw = if raw.is_empty() { "0" } else { raw };
    let parsed = match width {
        IntWidth::W8 => raw.parse::<i8>().map(i64::from),
        IntWidth::W16 => raw.parse::<i16>().map(i64::from),
        IntWidth::W32 => raw.parse::<i32>().map(i64::from),
        IntWidth::Size | IntWidth::W64 => raw.parse::<i64>(),
    };
    parsed.map_err(|source| MapError::parse_int(raw, source))
}

/// Parses a base-10 unsigned integer at the given width; empty means zero.
///
/// Signs are rejected, including a leading `+`.
pub fn parse_uint(raw: &str, width: IntWidth) -> Result<u64> {
    let raw = if raw.is_empty() { "0" } else { raw };
    // A lone "+" fails with the same invalid-digit error as "-5".
    let digits = if raw.starts_with('+') { "+" } else { raw };
    let parsed = match width {
        IntWidth::W8 => digits.parse::<u8>().map(u64::from),
        IntWidth::W16 => digits.parse::<u16>().map(u64::from),
        IntWidth::W32 => digits.parse::<u32>().map(u64::from),
        IntWidth::Size | IntWidth::W64 => digits.parse::<u64>(),
    };
    parsed.map_err(|source| MapError::parse_int(raw, source))
}

/// Parses a float at the given width; empty means zero.
///
/// Finite input that overflows the width is a range error.
pub fn parse_float(raw: &str, width: FloatWidth) -> Result<f64> {
    let raw = if raw.is_empty() { "0.0" } else { raw };
    let parsed = match width {
        FloatWidth::W32 => raw.parse::<f32>().map(f64::from),
        FloatWidth::W64 => raw.parse::<f64>(),
    }
    .map_err(|source| MapError::parse_float(raw, &source))?;
    if parsed.is_infinite() && !raw.to_ascii_lowercase().contains("inf") {
        return Err(MapError::ParseFloat {
            value: raw.to_string(),
            reason: "value out of range".to_string(),
        });
    }
    Ok(parsed)
}

/// Boolean literals: `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
