#![forbid(unsafe_code)]

//! Configuration errors.

use std::fmt;

use serde_json::Value;

/// Errors from configuration operations.
///
/// Every variant is recoverable: the store is left exactly as it was before
/// the failing call.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The key was never registered.
    UnknownProperty(String),
    /// The property's validator rejected the value.
    ValidationFailed { key: String, value: Value },
    /// `add_property` was called twice for the same key.
    DuplicateProperty(String),
    /// Registering the property would close a supersedes cycle.
    SupersedesCycle { key: String, cycle: Vec<String> },
    /// One or more entries of a batch failed; nothing was applied.
    Batch(Vec<ConfigError>),
    /// A configuration document could not be parsed.
    Parse(String),
}

impl ConfigError {
    /// Key the error refers to, when it refers to exactly one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::UnknownProperty(key)
            | Self::DuplicateProperty(key)
            | Self::ValidationFailed { key, .. }
            | Self::SupersedesCycle { key, .. } => Some(key),
            Self::Batch(_) | Self::Parse(_) => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProperty(key) => write!(f, "unknown property '{key}'"),
            Self::ValidationFailed { key, value } => {
                write!(f, "value {value} rejected by validator of '{key}'")
            }
            Self::DuplicateProperty(key) => write!(f, "property '{key}' already registered"),
            Self::SupersedesCycle { key, cycle } => {
                write!(f, "supersedes of '{key}' closes a cycle: {}", cycle.join(" -> "))
            }
            Self::Batch(errors) => {
                write!(f, "configuration batch rejected ({} errors)", errors.len())?;
                for err in errors {
                    write!(f, "; {err}")?;
                }
                Ok(())
            }
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
