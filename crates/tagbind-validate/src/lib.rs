//! Structural validation of bound destinations.

#![deny(unsafe_code)]

mod error;
mod validator;

pub use error::{FieldError, ValidationErrors};
pub use validator::{DEFAULT_TAG, DefaultValidator, NoopValidator, StructValidator};
