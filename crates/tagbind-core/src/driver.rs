//! Batch driver and validation gate.
//!
//! Dispatch on the destination:
//!
//! - nil pointer: nothing to do
//! - pointer: follow it
//! - struct: map, then validate
//! - slice or array: drive every element, collecting failures by index
//! - string-keyed map: map only
//! - anything else: nothing to do

use tagbind_map::{MapError, is_string_map};
use tagbind_model::{Shape, Value};
use tagbind_validate::StructValidator;
use tracing::debug;

use crate::error::{AggregateError, BindError};

/// Maps one struct (or map) destination from a source.
pub type MapFn<'a> = dyn Fn(&mut Value, &Shape) -> Result<(), MapError> + 'a;

/// Maps and validates `value`.
pub fn bind_value(
    value: &mut Value,
    shape: &Shape,
    map: &MapFn<'_>,
    validator: &dyn StructValidator,
) -> Result<(), BindError> {
    match shape {
        Shape::Pointer(elem) => match value {
            Value::Pointer(None) => Ok(()),
            Value::Pointer(Some(inner)) => bind_value(inner, elem, map, validator),
            other => Err(MapError::mismatch(shape, other).into()),
        },
        Shape::Struct(_) => {
            map(value, shape)?;
            validator.validate_struct(value, shape)?;
            Ok(())
        }
        Shape::Slice(elem) | Shape::Array(elem, _) => {
            let items = match value {
                Value::Slice(items) | Value::Array(items) => items,
                other => return Err(MapError::mismatch(shape, other).into()),
            };
            let mut failures = Vec::with_capacity(items.len());
            for (index, item) in items.iter_mut().enumerate() {
                let result = bind_value(item, elem, map, validator).err();
                if let Some(err) = &result {
                    debug!(index, error = %err, "batch element failed");
                }
                failures.push(result);
            }
            AggregateError(failures).into_result()
        }
        _ if is_string_map(shape) => Ok(map(value, shape)?),
        _ => Ok(()),
    }
}

/// Runs the validation gate alone, for destinations filled by a decoder.
pub fn validate(
    value: &mut Value,
    shape: &Shape,
    validator: &dyn StructValidator,
) -> Result<(), BindError> {
    bind_value(value, shape, &|_, _| Ok(()), validator)
}
