//! Data model for tag-driven binding: destination shapes, runtime values,
//! struct tags and multi-valued sources.

#![deny(unsafe_code)]

pub mod destination;
pub mod shape;
pub mod tag;
pub mod value;
pub mod values;

pub use destination::Destination;
pub use shape::{Field, FloatWidth, IntWidth, Shape, StructShape};
pub use tag::{SKIP_TAG, SetOptions, StructTag, head, parse_tag};
pub use value::{FileHeader, Value, zero_instant};
pub use values::{MultipartForm, Values};
