#![forbid(unsafe_code)]

//! Property declarations.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Predicate deciding whether a value may be stored.
pub type Validator = Rc<dyn Fn(&Value) -> bool>;

/// Change handler. Receives the store owner's context and the new value.
pub type Handler<C> = Rc<dyn Fn(&mut C, &PropertyChange)>;

/// Payload delivered to handlers and property listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    /// Lowercased property key.
    pub key: String,
    /// Value after the change.
    pub value: Value,
}

impl PropertyChange {
    /// The value as a boolean, when it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }
}

/// Declaration passed to [`ConfigStore::add_property`](crate::ConfigStore::add_property).
///
/// # Example
///
/// ```
/// use cadre_config::{PropertySpec, validators};
///
/// struct Panel { visible: bool }
///
/// let spec: PropertySpec<Panel> = PropertySpec::new()
///     .value(true)
///     .validator(validators::is_boolean)
///     .handler(|panel: &mut Panel, change| panel.visible = change.as_bool().unwrap_or(false));
/// assert!(!spec.is_suppressed());
/// ```
pub struct PropertySpec<C> {
    pub(crate) value: Value,
    pub(crate) validator: Option<Validator>,
    pub(crate) handler: Option<Handler<C>>,
    pub(crate) suppress_event: bool,
    pub(crate) supersedes: Vec<String>,
}

impl<C> Default for PropertySpec<C> {
    fn default() -> Self {
        Self {
            value: Value::Null,
            validator: None,
            handler: None,
            suppress_event: false,
            supersedes: Vec::new(),
        }
    }
}

impl<C> fmt::Debug for PropertySpec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySpec")
            .field("value", &self.value)
            .field("validator", &self.validator.is_some())
            .field("handler", &self.handler.is_some())
            .field("suppress_event", &self.suppress_event)
            .field("supersedes", &self.supersedes)
            .finish()
    }
}

impl<C> PropertySpec<C> {
    /// Unset value, no validator, no handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default value.
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn validator(mut self, validator: impl Fn(&Value) -> bool + 'static) -> Self {
        self.validator = Some(Rc::new(validator));
        self
    }

    #[must_use]
    pub fn handler(mut self, handler: impl Fn(&mut C, &PropertyChange) + 'static) -> Self {
        self.handler = Some(Rc::new(handler));
        self
    }

    /// Store values without running the handler or notifying listeners.
    #[must_use]
    pub fn suppress_event(mut self, suppress: bool) -> Self {
        self.suppress_event = suppress;
        self
    }

    /// Keys whose handlers must run before this one within a batch.
    #[must_use]
    pub fn supersedes<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.supersedes = keys
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .collect();
        self
    }

    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.suppress_event
    }

    #[must_use]
    pub fn default_value(&self) -> &Value {
        &self.value
    }
}
