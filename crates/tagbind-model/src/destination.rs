//! A destination value paired with the shape that describes it.

use serde::de::DeserializeOwned;

use crate::shape::Shape;
use crate::value::Value;

/// The value being populated by a binding, together with its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    shape: Shape,
    value: Value,
}

impl Destination {
    /// Creates a destination holding the shape's zero value.
    pub fn new(shape: Shape) -> Self {
        let value = shape.zero_value();
        Self { shape, value }
    }

    /// Creates a destination from an existing value.
    ///
    /// The value is expected to mirror the shape; the binding engine reports
    /// a shape mismatch where it does not.
    pub fn with_value(shape: Shape, value: Value) -> Self {
        Self { shape, value }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Splits the destination into borrowed shape and mutable value.
    pub fn parts_mut(&mut self) -> (&Shape, &mut Value) {
        (&self.shape, &mut self.value)
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// The bound value encoded as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        self.shape.encode(&self.value)
    }

    /// Converts the bound value into a typed struct through its JSON form.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}
