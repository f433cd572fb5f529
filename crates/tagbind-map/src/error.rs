//! Error types for mapping operations.

use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::duration::DurationError;

/// Errors raised while mapping source values into a destination.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MapError {
    /// A string-keyed map destination whose values are not `Vec<String>`.
    #[error("can not convert to map slices of strings")]
    ConvertMapStringSlice,

    /// A string-keyed map destination whose values are not `String`.
    #[error("can not convert to map of strings")]
    ConvertToMapString,

    /// A fixed-size array received a different number of values.
    #[error("{values:?} is not valid value for {type_name}")]
    InvalidArrayLength {
        values: Vec<String>,
        type_name: String,
    },

    /// The destination kind has no coercion rule.
    #[error("unknown type")]
    UnknownType,

    #[error("invalid integer {value:?}: {source}")]
    ParseInt {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid boolean {value:?}")]
    ParseBool { value: String },

    #[error("invalid float {value:?}: {reason}")]
    ParseFloat { value: String, reason: String },

    #[error(transparent)]
    Duration(#[from] DurationError),

    #[error("parsing time {value:?} as {layout:?}: {reason}")]
    Time {
        value: String,
        layout: String,
        reason: String,
    },

    #[error("unknown time zone {0}")]
    UnknownTimeZone(String),

    /// Malformed structured (JSON) text.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed structured text that does not fit the destination.
    #[error("json: {message} (at {path})")]
    Decode { path: String, message: String },

    #[error("unsupported field type for multipart file header")]
    UnsupportedFileField,

    #[error("unsupported len of array for {type_name}: got {len} files")]
    FileArrayLength { type_name: String, len: usize },

    /// A value that does not line up with its shape.
    #[error("value of kind {found} does not match shape {expected}")]
    ShapeMismatch {
        expected: String,
        found: &'static str,
    },
}

impl MapError {
    /// A value that does not line up with `expected`.
    pub fn mismatch(expected: &tagbind_model::Shape, found: &tagbind_model::Value) -> Self {
        Self::ShapeMismatch {
            expected: expected.type_name(),
            found: found.kind(),
        }
    }

    pub(crate) fn parse_int(value: &str, source: ParseIntError) -> Self {
        Self::ParseInt {
            value: value.to_string(),
            source,
        }
    }

    pub(crate) fn parse_float(value: &str, source: &ParseFloatError) -> Self {
        Self::ParseFloat {
            value: value.to_string(),
            reason: source.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
