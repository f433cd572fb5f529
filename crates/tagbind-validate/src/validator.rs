//! The default struct validator.
//!
//! Rules are read from one tag family (`binding` unless configured
//! otherwise) as a comma-separated list, e.g. `binding:"required"`. Nested
//! struct and non-nil pointer-to-struct fields are validated recursively.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use tagbind_model::{Field, SKIP_TAG, Shape, StructShape, Value};
use tracing::debug;

use crate::error::{FieldError, ValidationErrors};

/// Tag family the default validator reads rules from.
pub const DEFAULT_TAG: &str = "binding";

/// Validates a populated destination.
///
/// Implementations are shared across concurrent binding calls.
pub trait StructValidator: Send + Sync {
    /// Validates `value`. Nil pointers and non-struct values pass.
    fn validate_struct(&self, value: &Value, shape: &Shape) -> Result<(), ValidationErrors>;
}

type Rule = fn(&Value) -> bool;

/// Validator understanding the `required` rule.
#[derive(Debug)]
pub struct DefaultValidator {
    tag: String,
    rules: OnceLock<BTreeMap<&'static str, Rule>>,
}

impl Default for DefaultValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultValidator {
    pub fn new() -> Self {
        Self::with_tag(DEFAULT_TAG)
    }

    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            rules: OnceLock::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn rules(&self) -> &BTreeMap<&'static str, Rule> {
        self.rules.get_or_init(|| {
            debug!(tag = %self.tag, "initialising validation rules");
            let mut rules: BTreeMap<&'static str, Rule> = BTreeMap::new();
            rules.insert("required", has_value);
            rules
        })
    }

    fn check_struct(
        &self,
        def: &StructShape,
        children: &[Value],
        namespace: &str,
        errors: &mut Vec<FieldError>,
    ) {
        for (field, child) in def.fields.iter().zip(children) {
            if !field.exported && !field.anonymous {
                continue;
            }
            let rules = field.tag.get(&self.tag);
            if rules == SKIP_TAG {
                continue;
            }
            let path = format!("{namespace}.{}", field.name);
            self.check_field(field, child, rules, &path, errors);

            if let Some((inner_def, inner)) = nested_struct(&field.shape, child) {
                self.check_struct(inner_def, inner, &path, errors);
            }
        }
    }

    fn check_field(
        &self,
        field: &Field,
        value: &Value,
        rules: &str,
        path: &str,
        errors: &mut Vec<FieldError>,
    ) {
        for rule in rules.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            if rule == "omitempty" && value.is_zero() {
                return;
            }
            match self.rules().get(rule) {
                Some(check) if !check(value) => errors.push(FieldError {
                    namespace: path.to_string(),
                    field: field.name.clone(),
                    tag: rule.to_string(),
                }),
                Some(_) => {}
                None if rule == "omitempty" => {}
                None => debug!(rule, field = %field.name, "skipping unknown validation rule"),
            }
        }
    }
}

impl StructValidator for DefaultValidator {
    fn validate_struct(&self, value: &Value, shape: &Shape) -> Result<(), ValidationErrors> {
        match (shape, value) {
            (Shape::Pointer(elem), Value::Pointer(Some(inner))) => self.validate_struct(inner, elem),
            (Shape::Struct(def), Value::Struct(children)) => {
                let mut errors = Vec::new();
                self.check_struct(def, children, &def.name, &mut errors);
                ValidationErrors(errors).into_result()
            }
            _ => Ok(()),
        }
    }
}

/// A validator that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl StructValidator for NoopValidator {
    fn validate_struct(&self, _value: &Value, _shape: &Shape) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

fn has_value(value: &Value) -> bool {
    !value.is_zero()
}

fn nested_struct<'a>(shape: &'a Shape, value: &'a Value) -> Option<(&'a StructShape, &'a [Value])> {
    match (shape, value) {
        (Shape::Struct(def), Value::Struct(children)) => Some((def, children)),
        (Shape::Pointer(elem), Value::Pointer(Some(inner))) => nested_struct(elem, inner),
        _ => None,
    }
}
