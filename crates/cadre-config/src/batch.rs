#![forbid(unsafe_code)]

//! Ordered key/value batches.
//!
//! A [`ConfigBatch`] is what callers hand to
//! [`ConfigStore::apply_config`](crate::ConfigStore::apply_config). Entries
//! keep insertion order (document order when parsed from JSON), keys are
//! lowercased, and writing an existing key replaces its value in place.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ConfigError;

/// Ordered set of configuration writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigBatch {
    entries: Vec<(String, Value)>,
}

impl ConfigBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        let key = key.to_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        let key = key.to_lowercase();
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for ConfigBatch {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut batch = Self::new();
        for (key, value) in iter {
            batch.insert(key.as_ref(), value);
        }
        batch
    }
}

impl Serialize for ConfigBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct BatchVisitor;

impl<'de> Visitor<'de> for BatchVisitor {
    type Value = ConfigBatch;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of configuration properties")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<ConfigBatch, M::Error> {
        let mut batch = ConfigBatch::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            batch.insert(&key, value);
        }
        Ok(batch)
    }
}

impl<'de> Deserialize<'de> for ConfigBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(BatchVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_preserves_document_order() {
        let batch = ConfigBatch::from_json_str(r#"{"zeta": 1, "Effect": "fade", "alpha": true}"#)
            .expect("valid json");
        assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["zeta", "effect", "alpha"]);
        assert_eq!(batch.get("EFFECT"), Some(&json!("fade")));
    }

    #[test]
    fn duplicate_keys_replace_in_place() {
        let batch = ConfigBatch::new()
            .with("visible", true)
            .with("width", 10)
            .with("Visible", false);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.iter().next(), Some(("visible", &json!(false))));
    }

    #[test]
    fn non_object_is_a_parse_error() {
        let err = ConfigBatch::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(ConfigBatch::from_json_str("{").is_err());
    }

    #[test]
    fn serializes_as_object_in_order() {
        let batch: ConfigBatch = [("b", json!(1)), ("a", json!(2))].into_iter().collect();
        assert_eq!(serde_json::to_string(&batch).unwrap(), r#"{"b":1,"a":2}"#);
        assert!(!batch.is_empty());
    }
}
