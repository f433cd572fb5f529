//! Request binding: per-transport bindings, the batch driver and the
//! validation gate.

#![deny(unsafe_code)]

pub mod binder;
pub mod binding;
pub mod config;
pub mod driver;
pub mod error;

pub use binder::Binder;
pub use binding::{
    BindContext, Binding, FormBinding, FormMultipartBinding, FormPostBinding, HeaderBinding,
    JsonBinding, QueryBinding, RequestParts, UriBinding, by_name, for_content_type,
};
pub use config::{BindConfig, DEFAULT_MAX_MEMORY};
pub use driver::{MapFn, bind_value, validate};
pub use error::{AggregateError, BindError};
