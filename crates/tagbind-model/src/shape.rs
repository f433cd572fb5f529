//! Destination shapes.
//!
//! A [`Shape`] describes the structure of a destination value the way a
//! runtime type descriptor would: its kind, and for structs the ordered list
//! of fields with their declared shape, tag, embedding and visibility flags.
//! Shapes can be built in code or loaded from a JSON descriptor.

use serde::{Deserialize, Serialize};

use crate::tag::StructTag;
use crate::value::{Value, zero_instant};

/// Bit width of an integer shape. `Size` is the platform word (64 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntWidth {
    Size,
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub const fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::Size | Self::W64 => 64,
        }
    }
}

/// Bit width of a floating point shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatWidth {
    W32,
    W64,
}

/// The structure of a destination value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum Shape {
    Bool,
    Int(IntWidth),
    Uint(IntWidth),
    Float(FloatWidth),
    String,
    /// Signed nanosecond duration, bound from literals such as `1h30m`.
    Duration,
    /// An instant with a UTC offset.
    Time,
    /// An uploaded multipart file header.
    File,
    /// Arbitrary structured data; only reachable through structured decoding.
    Any,
    /// Nullable indirection to another shape.
    Pointer(Box<Shape>),
    Struct(StructShape),
    Slice(Box<Shape>),
    Array(Box<Shape>, usize),
    Map { key: Box<Shape>, value: Box<Shape> },
    /// A kind the binding engine has no rule for, named for error messages.
    Unsupported(String),
}

impl Shape {
    pub fn pointer(elem: Shape) -> Self {
        Self::Pointer(Box::new(elem))
    }

    pub fn slice(elem: Shape) -> Self {
        Self::Slice(Box::new(elem))
    }

    pub fn array(elem: Shape, len: usize) -> Self {
        Self::Array(Box::new(elem), len)
    }

    pub fn map(key: Shape, value: Shape) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct(_))
    }

    /// Builds the zero value of this shape.
    ///
    /// Pointers start nil, slices and maps empty, arrays hold zero elements
    /// and instants sit at `0001-01-01T00:00:00Z`.
    pub fn zero_value(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int(_) => Value::Int(0),
            Self::Uint(_) => Value::Uint(0),
            Self::Float(_) => Value::Float(0.0),
            Self::String => Value::String(String::new()),
            Self::Duration => Value::Duration(chrono::TimeDelta::zero()),
            Self::Time => Value::Time(zero_instant()),
            Self::File => Value::File(Default::default()),
            Self::Any => Value::Any(serde_json::Value::Null),
            Self::Pointer(_) => Value::Pointer(None),
            Self::Struct(def) => Value::Struct(
                def.fields
                    .iter()
                    .map(|field| field.shape.zero_value())
                    .collect(),
            ),
            Self::Slice(_) => Value::Slice(Vec::new()),
            Self::Array(elem, len) => Value::Array((0..*len).map(|_| elem.zero_value()).collect()),
            Self::Map { .. } => Value::Map(Default::default()),
            Self::Unsupported(_) => Value::Unsupported,
        }
    }

    /// Human-readable type name used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::Int(width) => match width {
                IntWidth::Size => "isize".to_string(),
                other => format!("i{}", other.bits()),
            },
            Self::Uint(width) => match width {
                IntWidth::Size => "usize".to_string(),
                other => format!("u{}", other.bits()),
            },
            Self::Float(FloatWidth::W32) => "f32".to_string(),
            Self::Float(FloatWidth::W64) => "f64".to_string(),
            Self::String => "String".to_string(),
            Self::Duration => "Duration".to_string(),
            Self::Time => "DateTime".to_string(),
            Self::File => "FileHeader".to_string(),
            Self::Any => "Value".to_string(),
            Self::Pointer(elem) => format!("Option<Box<{}>>", elem.type_name()),
            Self::Struct(def) => def.name.clone(),
            Self::Slice(elem) => format!("Vec<{}>", elem.type_name()),
            Self::Array(elem, len) => format!("[{}; {len}]", elem.type_name()),
            Self::Map { key, value } => {
                format!("HashMap<{}, {}>", key.type_name(), value.type_name())
            }
            Self::Unsupported(name) => name.clone(),
        }
    }
}

/// The field list of a struct shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructShape {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl StructShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Position of a field by its declared name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

impl From<StructShape> for Shape {
    fn from(def: StructShape) -> Self {
        Self::Struct(def)
    }
}

/// One struct field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
    #[serde(default)]
    pub tag: StructTag,
    /// Embedded field whose children bind as if declared on the parent.
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default = "default_exported")]
    pub exported: bool,
}

fn default_exported() -> bool {
    true
}

impl Field {
    pub fn new(name: impl Into<String>, shape: impl Into<Shape>) -> Self {
        Self {
            name: name.into(),
            shape: shape.into(),
            tag: StructTag::new(),
            anonymous: false,
            exported: true,
        }
    }

    /// An embedded struct field, named after its type.
    pub fn embedded(def: StructShape) -> Self {
        Self {
            name: def.name.clone(),
            shape: Shape::Struct(def),
            tag: StructTag::new(),
            anonymous: true,
            exported: true,
        }
    }

    /// The descriptor used for a root value: no name, no tag, not embedded.
    pub fn placeholder() -> Self {
        Self::new("", Shape::Any)
    }

    /// Sets the tag from a literal such as `form:"name" binding:"required"`.
    #[must_use]
    pub fn tag(mut self, literal: &str) -> Self {
        self.tag = StructTag::parse(literal);
        self
    }

    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    #[must_use]
    pub fn unexported(mut self) -> Self {
        self.exported = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_value_follows_shape() {
        let shape: Shape = StructShape::new("Query")
            .field(Field::new("Page", Shape::Int(IntWidth::Size)))
            .field(Field::new("Ids", Shape::array(Shape::Uint(IntWidth::W8), 2)))
            .field(Field::new("Next", Shape::pointer(Shape::String)))
            .into();

        assert_eq!(
            shape.zero_value(),
            Value::Struct(vec![
                Value::Int(0),
                Value::Array(vec![Value::Uint(0), Value::Uint(0)]),
                Value::Pointer(None),
            ])
        );
    }

    #[test]
    fn type_names_are_readable() {
        assert_eq!(Shape::array(Shape::Int(IntWidth::W64), 3).type_name(), "[i64; 3]");
        assert_eq!(
            Shape::map(Shape::String, Shape::slice(Shape::String)).type_name(),
            "HashMap<String, Vec<String>>"
        );
        assert_eq!(Shape::pointer(Shape::Uint(IntWidth::Size)).type_name(), "Option<Box<usize>>");
    }

    #[test]
    fn shape_descriptor_loads_from_json() {
        let json = r#"{
            "kind": "struct",
            "of": {
                "name": "Login",
                "fields": [
                    {"name": "User", "shape": {"kind": "string"}, "tag": "form:\"user\" binding:\"required\""},
                    {"name": "Tries", "shape": {"kind": "array", "of": [{"kind": "int", "of": "w32"}, 2]}},
                    {"name": "secret", "shape": {"kind": "string"}, "exported": false}
                ]
            }
        }"#;
        let shape: Shape = serde_json::from_str(json).expect("parse descriptor");
        let Shape::Struct(def) = shape else {
            panic!("expected struct shape");
        };
        assert_eq!(def.fields.len(), 3);
        assert_eq!(def.fields[0].tag.get("form"), "user");
        assert_eq!(def.fields[0].tag.get("binding"), "required");
        assert_eq!(def.fields[1].shape, Shape::array(Shape::Int(IntWidth::W32), 2));
        assert!(def.fields[1].exported);
        assert!(!def.fields[2].exported);
    }
}
