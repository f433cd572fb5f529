//! Recursive field walker.

use tagbind_model::{Field, SKIP_TAG, Shape, Value, parse_tag};
use tracing::trace;

use crate::coerce::SetTarget;
use crate::decode::DecodeOptions;
use crate::error::{MapError, Result};
use crate::source::Setter;

/// Walks a destination and binds every reachable field through one setter,
/// resolving keys from one tag family.
pub struct Mapper<'a> {
    setter: &'a dyn Setter,
    tag: &'a str,
    decode: &'a DecodeOptions,
}

impl<'a> Mapper<'a> {
    pub fn new(setter: &'a dyn Setter, tag: &'a str, decode: &'a DecodeOptions) -> Self {
        Self { setter, tag, decode }
    }

    /// Binds `value` (declared as `field`) and reports whether anything in it
    /// was set.
    ///
    /// A nil pointer is only replaced with an allocated target when some
    /// descendant was set. Anonymous struct fields contribute their children
    /// as if they were declared on the parent.
    pub fn map(&self, value: &mut Value, shape: &Shape, field: &Field) -> Result<bool> {
        if field.tag.get(self.tag) == SKIP_TAG {
            return Ok(false);
        }

        if let Shape::Pointer(elem) = shape {
            let Value::Pointer(slot) = value else {
                return Err(MapError::mismatch(shape, value));
            };
            if let Some(target) = slot.as_deref_mut() {
                return self.map(target, elem, field);
            }
            let mut target = elem.zero_value();
            let set = self.map(&mut target, elem, field)?;
            if set {
                trace!(field = %field.name, "allocated pointer target");
                *slot = Some(Box::new(target));
            }
            return Ok(set);
        }

        if (!shape.is_struct() || !field.anonymous) && self.try_to_set_value(value, shape, field)? {
            return Ok(true);
        }

        let Shape::Struct(def) = shape else {
            return Ok(false);
        };
        let Value::Struct(children) = value else {
            return Err(MapError::mismatch(shape, value));
        };
        if children.len() != def.fields.len() {
            return Err(MapError::mismatch(shape, value));
        }

        let mut set = false;
        for (child, slot) in def.fields.iter().zip(children.iter_mut()) {
            if !child.exported && !child.anonymous {
                continue;
            }
            set |= self.map(slot, &child.shape, child)?;
        }
        Ok(set)
    }

    fn try_to_set_value(&self, value: &mut Value, shape: &Shape, field: &Field) -> Result<bool> {
        let (key, options) = parse_tag(field.tag.get(self.tag));
        let key = if key.is_empty() { field.name.as_str() } else { key };
        if key.is_empty() {
            return Ok(false);
        }

        let target = SetTarget {
            value,
            shape,
            field,
            decode: self.decode,
        };
        let set = self.setter.try_set(target, key, &options)?;
        if set {
            trace!(key, has_default = options.has_default(), "field bound");
        }
        Ok(set)
    }
}
