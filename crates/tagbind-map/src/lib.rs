//! Tag-driven mapping of multi-valued string sources onto destination
//! values.
//!
//! The entry points pick a source adapter and a tag family, then hand the
//! destination to the recursive [`Mapper`]. Form-like entry points first
//! check for a string-keyed map destination, which is filled directly.

#![deny(unsafe_code)]

pub mod coerce;
pub mod decode;
pub mod duration;
pub mod error;
pub mod layout;
pub mod shortcut;
pub mod source;
pub mod time;
pub mod walker;

use tagbind_model::{Field, MultipartForm, Shape, Value, Values};

pub use coerce::{SetTarget, parse_bool, set_by_form, set_with_proper_type};
pub use decode::{DecodeOptions, decode_in_place, decode_json};
pub use duration::{DurationError, parse_duration};
pub use error::{MapError, Result};
pub use layout::RFC3339;
pub use shortcut::{is_string_map, set_form_map};
pub use source::{
    FormSource, HeaderSource, MultipartSource, Setter, Source, UriSource, canonical_header_key,
};
pub use time::{Location, parse_in_location};
pub use walker::Mapper;

/// Binds query or form values using the `form` tag family.
pub fn map_form(value: &mut Value, shape: &Shape, form: &Values, decode: &DecodeOptions) -> Result<()> {
    map_form_by_tag(value, shape, form, "form", decode)
}

/// Binds URI path captures using the `uri` tag family.
pub fn map_uri(value: &mut Value, shape: &Shape, params: &Values, decode: &DecodeOptions) -> Result<()> {
    map_form_by_tag(value, shape, params, "uri", decode)
}

/// Binds form-like values using an arbitrary tag family.
pub fn map_form_with_tag(
    value: &mut Value,
    shape: &Shape,
    form: &Values,
    tag: &str,
    decode: &DecodeOptions,
) -> Result<()> {
    map_form_by_tag(value, shape, form, tag, decode)
}

fn map_form_by_tag(
    value: &mut Value,
    shape: &Shape,
    form: &Values,
    tag: &str,
    decode: &DecodeOptions,
) -> Result<()> {
    if is_string_map(shape) {
        return set_form_map(value, shape, form);
    }
    mapping_by_setter(value, shape, &FormSource::new(form), tag, decode)
}

/// Binds headers using the `header` tag family. Header keys in `headers`
/// are expected in canonical form.
pub fn map_header(value: &mut Value, shape: &Shape, headers: &Values, decode: &DecodeOptions) -> Result<()> {
    mapping_by_setter(value, shape, &HeaderSource::new(headers), "header", decode)
}

/// Binds a multipart form using the `form` tag family. File fields take
/// uploaded file headers; everything else binds from the plain values.
pub fn map_multipart(
    value: &mut Value,
    shape: &Shape,
    form: &MultipartForm,
    decode: &DecodeOptions,
) -> Result<()> {
    mapping_by_setter(value, shape, &MultipartSource::new(form), "form", decode)
}

/// Walks `value` with an arbitrary setter.
pub fn mapping_by_setter(
    value: &mut Value,
    shape: &Shape,
    setter: &dyn Setter,
    tag: &str,
    decode: &DecodeOptions,
) -> Result<()> {
    Mapper::new(setter, tag, decode).map(value, shape, &Field::placeholder())?;
    Ok(())
}
