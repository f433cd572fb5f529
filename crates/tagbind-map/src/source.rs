//! Source adapters.
//!
//! A [`Source`] answers `lookup(key)` with every value recorded for that key.
//! A [`Setter`] wraps a source and binds one field given its resolved key and
//! options; each transport (form, header, uri, multipart) is one setter.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use tagbind_model::{FileHeader, MultipartForm, SetOptions, Shape, Value, Values};

use crate::coerce::{SetTarget, set_by_form};
use crate::error::{MapError, Result};

/// Read-only multi-valued lookup.
pub trait Source {
    fn lookup(&self, key: &str) -> Option<&[String]>;
}

impl Source for Values {
    fn lookup(&self, key: &str) -> Option<&[String]> {
        self.get_all(key)
    }
}

impl Source for BTreeMap<String, Vec<String>> {
    fn lookup(&self, key: &str) -> Option<&[String]> {
        self.get(key).map(Vec::as_slice)
    }
}

impl Source for HashMap<String, Vec<String>> {
    fn lookup(&self, key: &str) -> Option<&[String]> {
        self.get(key).map(Vec::as_slice)
    }
}

/// Binds a single field from a source.
pub trait Setter {
    /// Attempts to bind `target` from the entry stored under `key`.
    ///
    /// Returns `Ok(false)` when the source has nothing for the field.
    fn try_set(&self, target: SetTarget<'_>, key: &str, options: &SetOptions<'_>) -> Result<bool>;
}

/// Query strings and url-encoded forms. Keys are matched verbatim.
pub struct FormSource<'a> {
    source: &'a dyn Source,
}

impl<'a> FormSource<'a> {
    pub fn new(source: &'a dyn Source) -> Self {
        Self { source }
    }
}

impl Setter for FormSource<'_> {
    fn try_set(&self, target: SetTarget<'_>, key: &str, options: &SetOptions<'_>) -> Result<bool> {
        set_by_form(target, self.source.lookup(key), options)
    }
}

/// URI path captures. Keys are matched verbatim.
pub struct UriSource<'a> {
    source: &'a dyn Source,
}

impl<'a> UriSource<'a> {
    pub fn new(source: &'a dyn Source) -> Self {
        Self { source }
    }
}

impl Setter for UriSource<'_> {
    fn try_set(&self, target: SetTarget<'_>, key: &str, options: &SetOptions<'_>) -> Result<bool> {
        set_by_form(target, self.source.lookup(key), options)
    }
}

/// Request headers, stored under canonical keys. The field key is
/// canonicalized before lookup.
pub struct HeaderSource<'a> {
    source: &'a dyn Source,
}

impl<'a> HeaderSource<'a> {
    pub fn new(source: &'a dyn Source) -> Self {
        Self { source }
    }
}

impl Setter for HeaderSource<'_> {
    fn try_set(&self, target: SetTarget<'_>, key: &str, options: &SetOptions<'_>) -> Result<bool> {
        let key = canonical_header_key(key);
        set_by_form(target, self.source.lookup(&key), options)
    }
}

/// Multipart forms: uploaded files first, then plain values.
pub struct MultipartSource<'a> {
    form: &'a MultipartForm,
}

impl<'a> MultipartSource<'a> {
    pub fn new(form: &'a MultipartForm) -> Self {
        Self { form }
    }
}

impl Setter for MultipartSource<'_> {
    fn try_set(&self, target: SetTarget<'_>, key: &str, options: &SetOptions<'_>) -> Result<bool> {
        match self.form.files.get(key) {
            Some(files) if !files.is_empty() => set_files(target.value, target.shape, files),
            _ => set_by_form(target, self.form.values.lookup(key), options),
        }
    }
}

fn set_files(value: &mut Value, shape: &Shape, files: &[FileHeader]) -> Result<bool> {
    match shape {
        Shape::File => match files.first() {
            Some(file) => {
                *value = Value::File(file.clone());
                Ok(true)
            }
            None => Ok(false),
        },
        Shape::Pointer(elem) => {
            let mut inner = elem.zero_value();
            let set = set_files(&mut inner, elem, files)?;
            if set {
                *value = Value::Pointer(Some(Box::new(inner)));
            }
            Ok(set)
        }
        Shape::Slice(elem) => {
            let mut items = Vec::with_capacity(files.len());
            for file in files {
                let mut item = elem.zero_value();
                if !set_files(&mut item, elem, std::slice::from_ref(file))? {
                    return Ok(false);
                }
                items.push(item);
            }
            *value = Value::Slice(items);
            Ok(true)
        }
        Shape::Array(elem, len) => {
            if *len != files.len() {
                return Err(MapError::FileArrayLength {
                    type_name: shape.type_name(),
                    len: files.len(),
                });
            }
            let Value::Array(items) = value else {
                return Err(MapError::mismatch(shape, value));
            };
            for (item, file) in items.iter_mut().zip(files) {
                if !set_files(item, elem, std::slice::from_ref(file))? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Err(MapError::UnsupportedFileField),
    }
}

/// Canonical MIME header form: `x-trace-id` becomes `X-Trace-Id`.
///
/// Keys holding a space or a byte outside the header token set come back
/// unchanged.
pub fn canonical_header_key(key: &str) -> Cow<'_, str> {
    if !key.bytes().all(is_token_byte) {
        return Cow::Borrowed(key);
    }
    let mut upper = true;
    let mut changed = false;
    let canonical: String = key
        .chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            changed |= mapped != c;
            upper = c == '-';
            mapped
        })
        .collect();
    if changed {
        Cow::Owned(canonical)
    } else {
        Cow::Borrowed(key)
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_keys() {
        assert_eq!(canonical_header_key("x-trace-id"), "X-Trace-Id");
        assert_eq!(canonical_header_key("CONTENT-TYPE"), "Content-Type");
        assert_eq!(canonical_header_key("etag"), "Etag");
        assert!(matches!(canonical_header_key("Accept"), Cow::Borrowed("Accept")));
    }

    #[test]
    fn invalid_keys_are_untouched() {
        assert_eq!(canonical_header_key("bad key"), "bad key");
        assert_eq!(canonical_header_key("naïve-header"), "naïve-header");
        assert_eq!(canonical_header_key(""), "");
    }

    #[test]
    fn files_bind_into_slices_and_arrays() {
        let files = vec![
            FileHeader {
                filename: "a.txt".to_string(),
                ..FileHeader::default()
            },
            FileHeader {
                filename: "b.txt".to_string(),
                ..FileHeader::default()
            },
        ];

        let shape = Shape::slice(Shape::pointer(Shape::File));
        let mut value = shape.zero_value();
        assert!(set_files(&mut value, &shape, &files).expect("slice of files"));
        let Value::Slice(items) = &value else {
            panic!("expected slice");
        };
        assert_eq!(items.len(), 2);

        let shape = Shape::array(Shape::File, 3);
        let mut value = shape.zero_value();
        let err = set_files(&mut value, &shape, &files).expect_err("length mismatch");
        assert_eq!(
            err.to_string(),
            "unsupported len of array for [FileHeader; 3]: got 2 files"
        );

        let mut value = Value::String(String::new());
        assert!(matches!(
            set_files(&mut value, &Shape::String, &files),
            Err(MapError::UnsupportedFileField)
        ));
    }
}
