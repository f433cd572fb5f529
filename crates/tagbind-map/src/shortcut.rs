//! Direct copy of a multi-map into a string-keyed map destination.

use tagbind_model::{Shape, Value, Values};

use crate::error::{MapError, Result};

/// True for a map keyed by strings, looking through one pointer.
pub fn is_string_map(shape: &Shape) -> bool {
    match shape {
        Shape::Map { key, .. } => **key == Shape::String,
        Shape::Pointer(elem) => matches!(elem.as_ref(), Shape::Map { key, .. } if **key == Shape::String),
        _ => false,
    }
}

/// Copies `form` into a `map<String, Vec<String>>` or `map<String, String>`
/// destination. The latter keeps the last value of each key.
pub fn set_form_map(value: &mut Value, shape: &Shape, form: &Values) -> Result<()> {
    if let Shape::Pointer(elem) = shape {
        let Value::Pointer(slot) = value else {
            return Err(MapError::mismatch(shape, value));
        };
        let target = slot.get_or_insert_with(|| Box::new(elem.zero_value()));
        return set_form_map(target, elem, form);
    }

    let Shape::Map { value: elem, .. } = shape else {
        return Err(MapError::mismatch(shape, value));
    };
    let Value::Map(entries) = value else {
        return Err(MapError::mismatch(shape, value));
    };

    match elem.as_ref() {
        Shape::Slice(item) => {
            if **item != Shape::String {
                return Err(MapError::ConvertMapStringSlice);
            }
            for (key, values) in form {
                let list = values.iter().cloned().map(Value::String).collect();
                entries.insert(key.clone(), Value::Slice(list));
            }
        }
        Shape::String => {
            for (key, values) in form {
                if let Some(last) = values.last() {
                    entries.insert(key.clone(), Value::String(last.clone()));
                }
            }
        }
        _ => return Err(MapError::ConvertToMapString),
    }
    Ok(())
}
