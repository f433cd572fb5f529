//! Struct tags and the per-field binding options carried inside them.
//!
//! A field's tag holds one raw string per tag family (`form`, `header`,
//! `uri`, `binding`, `time_format`, ...). The binding families use the
//! `name,opt1,opt2=value` syntax understood by [`parse_tag`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw tag value that excludes a field from binding.
pub const SKIP_TAG: &str = "-";

/// The tag families attached to one struct field.
///
/// Families keep their declaration order; when a family is declared twice the
/// first declaration wins, matching the usual struct-tag lookup rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StructTag {
    entries: Vec<(String, String)>,
}

impl StructTag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a family to the tag.
    #[must_use]
    pub fn with(mut self, family: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((family.into(), value.into()));
        self
    }

    /// Parses a tag literal such as `form:"name,default=1" binding:"required"`.
    ///
    /// Parsing stops at the first malformed pair; everything read up to that
    /// point is kept.
    pub fn parse(literal: &str) -> Self {
        let mut entries = Vec::new();
        let mut rest = literal;
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            let name_len = rest
                .bytes()
                .take_while(|&b| b > b' ' && b != b':' && b != b'"' && b != 0x7f)
                .count();
            if name_len == 0 {
                break;
            }
            let (name, after) = rest.split_at(name_len);
            let Some(quoted) = after.strip_prefix(":\"") else {
                break;
            };
            let Some((value, remaining)) = scan_quoted(quoted) else {
                break;
            };
            entries.push((name.to_string(), value));
            rest = remaining;
        }
        Self { entries }
    }

    /// Returns the raw value of a tag family, or `""` when it is absent.
    pub fn get(&self, family: &str) -> &str {
        self.lookup(family).unwrap_or("")
    }

    /// Returns the raw value of a tag family if it was declared.
    pub fn lookup(&self, family: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == family)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads a double-quoted value whose opening quote was already consumed.
fn scan_quoted(input: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '"' => return Some((value, &input[idx + 1..])),
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    other => value.push(other),
                }
            }
            other => value.push(other),
        }
    }
    None
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (name, value)) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}:\"")?;
            for ch in value.chars() {
                match ch {
                    '"' => f.write_str("\\\"")?,
                    '\\' => f.write_str("\\\\")?,
                    other => write!(f, "{other}")?,
                }
            }
            f.write_str("\"")?;
        }
        Ok(())
    }
}

impl From<String> for StructTag {
    fn from(literal: String) -> Self {
        Self::parse(&literal)
    }
}

impl From<&str> for StructTag {
    fn from(literal: &str) -> Self {
        Self::parse(literal)
    }
}

impl From<StructTag> for String {
    fn from(tag: StructTag) -> Self {
        tag.to_string()
    }
}

/// Options parsed from the trailing segments of a binding tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions<'a> {
    /// Value used when the source has no entry for the key.
    pub default_value: Option<&'a str>,
}

impl SetOptions<'_> {
    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }
}

/// Splits `s` at the first `sep`; the tail is empty when `sep` is missing.
pub fn head(s: &str, sep: char) -> (&str, &str) {
    s.split_once(sep).unwrap_or((s, ""))
}

/// Splits a binding tag into its key and options.
///
/// The key is everything before the first comma. Each following segment is
/// split at its first `=`; a `default` segment records the default value and
/// anything else is ignored. A default cannot contain a comma.
pub fn parse_tag(raw: &str) -> (&str, SetOptions<'_>) {
    let (key, mut rest) = head(raw, ',');
    let mut options = SetOptions::default();
    while !rest.is_empty() {
        let (segment, tail) = head(rest, ',');
        rest = tail;
        let (name, value) = head(segment, '=');
        if name == "default" {
            options.default_value = Some(value);
        }
    }
    (key, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_and_default() {
        let (key, options) = parse_tag("page,default=1");
        assert_eq!(key, "page");
        assert_eq!(options.default_value, Some("1"));
    }

    #[test]
    fn empty_key_keeps_options() {
        let (key, options) = parse_tag(",default=x");
        assert_eq!(key, "");
        assert_eq!(options.default_value, Some("x"));
    }

    #[test]
    fn default_is_truncated_at_first_delimiter() {
        let (_, options) = parse_tag("ids,default=1,2,3");
        assert_eq!(options.default_value, Some("1"));

        let (_, options) = parse_tag("q,default=a=b");
        assert_eq!(options.default_value, Some("a"));
    }

    #[test]
    fn unknown_options_are_ignored() {
        let (key, options) = parse_tag("name,omitempty,,strict=true");
        assert_eq!(key, "name");
        assert!(!options.has_default());
    }

    #[test]
    fn empty_default_still_counts() {
        let (_, options) = parse_tag("name,default=");
        assert_eq!(options.default_value, Some(""));
    }

    #[test]
    fn struct_tag_literal_lookup() {
        let tag = StructTag::parse(r#"form:"name,default=x" binding:"required" time_utc:"1""#);
        assert_eq!(tag.get("form"), "name,default=x");
        assert_eq!(tag.get("binding"), "required");
        assert_eq!(tag.get("time_utc"), "1");
        assert_eq!(tag.get("header"), "");
        assert_eq!(tag.lookup("header"), None);
    }

    #[test]
    fn struct_tag_stops_at_malformed_pair() {
        let tag = StructTag::parse(r#"form:"a" broken header:"b""#);
        assert_eq!(tag.get("form"), "a");
        assert_eq!(tag.get("header"), "");
    }

    #[test]
    fn struct_tag_display_round_trips_escapes() {
        let tag = StructTag::new().with("form", r#"q,default="x""#);
        let reparsed = StructTag::parse(&tag.to_string());
        assert_eq!(reparsed, tag);
    }
}
