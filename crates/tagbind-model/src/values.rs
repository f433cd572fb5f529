//! Multi-valued string maps used as binding sources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::FileHeader;

/// A string-keyed multi-map, the in-memory form of query strings, form
/// fields, headers and uri captures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(BTreeMap<String, Vec<String>>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to the key's list.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Replaces the key's list with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), vec![value.into()]);
    }

    /// First value for the key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|vs| vs.first()).map(String::as_str)
    }

    /// All values for the key, `None` when the key is absent.
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends every value of `other` after this map's own values.
    pub fn extend_from(&mut self, other: &Values) {
        for (key, values) in &other.0 {
            self.0
                .entry(key.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Values
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.add(key, value);
        }
        values
    }
}

impl From<BTreeMap<String, Vec<String>>> for Values {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A parsed multipart body: plain fields plus uploaded file headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartForm {
    #[serde(default)]
    pub values: Values,
    #[serde(default)]
    pub files: BTreeMap<String, Vec<FileHeader>>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, key: impl Into<String>, file: FileHeader) {
        self.files.entry(key.into()).or_default().push(file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_order_per_key() {
        let values: Values = [("a", "x"), ("b", "1"), ("a", "y")].into_iter().collect();
        assert_eq!(values.get_all("a"), Some(&["x".to_string(), "y".to_string()][..]));
        assert_eq!(values.get("b"), Some("1"));
        assert_eq!(values.get_all("c"), None);
    }

    #[test]
    fn extend_appends_after_existing() {
        let mut post: Values = [("q", "post")].into_iter().collect();
        let query: Values = [("q", "query"), ("page", "2")].into_iter().collect();
        post.extend_from(&query);
        assert_eq!(
            post.get_all("q"),
            Some(&["post".to_string(), "query".to_string()][..])
        );
        assert_eq!(post.get("page"), Some("2"));
    }
}
