#![forbid(unsafe_code)]

//! Keyed, validated property store with ordered change dispatch.
//!
//! # Design
//!
//! A [`ConfigStore<C>`] belongs to one owner whose mutable state is type `C`.
//! The store never holds the owner: every operation that may run handlers
//! takes `ctx: &mut C` and passes it through. This keeps handlers free to
//! mutate their component while the store itself stays borrowed.
//!
//! Writes either fire immediately ([`set_property`](ConfigStore::set_property))
//! or land in a queue ([`queue_property`](ConfigStore::queue_property),
//! [`apply_config`](ConfigStore::apply_config), and every write while the store
//! is deferred). [`fire_queue`](ConfigStore::fire_queue) drains the queue in
//! supersedes order.
//!
//! # Invariants
//!
//! 1. A value only changes after its validator accepted it; a rejected write
//!    leaves the store untouched.
//! 2. Keys are lowercased on every entry point.
//! 3. The queue holds each key at most once; requeuing moves it to the end.
//! 4. Within one flush, a superseded key's handler runs before the handler of
//!    any key superseding it, and every handler runs at most once.
//! 5. `apply_config` is all-or-nothing with respect to validation.
//!
//! # Failure Modes
//!
//! | Mode | Condition | Behavior |
//! |------|-----------|----------|
//! | Unknown key | Key never registered | `Err(UnknownProperty)`, no change |
//! | Rejected value | Validator returns false | `Err(ValidationFailed)`, no change |
//! | Cycle | New supersedes edges close a loop | `Err(SupersedesCycle)`, property not added |

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde_json::Value;

use cadre_core::event::{Event, Fired, Listener, ScopeId, SubscriptionId};

use crate::batch::ConfigBatch;
use crate::error::ConfigError;
use crate::graph::SupersedesGraph;
use crate::property::{Handler, PropertyChange, PropertySpec, Validator};

/// Name of the store-wide change event.
pub const CONFIG_CHANGED_EVENT: &str = "configChanged";

struct Property<C> {
    value: Value,
    validator: Option<Validator>,
    handler: Option<Handler<C>>,
    suppress_event: bool,
    event: Event<PropertyChange>,
}

/// Property registry for one owner of type `C`.
pub struct ConfigStore<C> {
    owner: Option<ScopeId>,
    properties: HashMap<String, Property<C>>,
    order: Vec<String>,
    graph: SupersedesGraph,
    queue: Vec<String>,
    deferred: bool,
    initial: BTreeMap<String, Value>,
    changed: Event<PropertyChange>,
}

impl<C> fmt::Debug for ConfigStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("owner", &self.owner)
            .field("keys", &self.order)
            .field("queue", &self.queue)
            .field("deferred", &self.deferred)
            .finish()
    }
}

impl<C: 'static> Default for ConfigStore<C> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<C: 'static> ConfigStore<C> {
    /// Create an empty store. Property events report `owner` as their scope.
    #[must_use]
    pub fn new(owner: Option<ScopeId>) -> Self {
        Self {
            owner,
            properties: HashMap::new(),
            order: Vec::new(),
            graph: SupersedesGraph::new(),
            queue: Vec::new(),
            deferred: false,
            initial: BTreeMap::new(),
            changed: Self::make_event(owner, CONFIG_CHANGED_EVENT),
        }
    }

    fn make_event(owner: Option<ScopeId>, name: &str) -> Event<PropertyChange> {
        match owner {
            Some(owner) => Event::with_owner(name, owner),
            None => Event::new(name),
        }
    }

    #[must_use]
    pub fn owner(&self) -> Option<ScopeId> {
        self.owner
    }

    /// Register a property.
    ///
    /// The default is stored without running the handler. Unless the property
    /// suppresses events or the default is `null`, the key is queued so the
    /// next [`fire_queue`](Self::fire_queue) applies it.
    pub fn add_property(&mut self, key: &str, spec: PropertySpec<C>) -> Result<(), ConfigError> {
        let key = key.to_lowercase();
        if self.properties.contains_key(&key) {
            return Err(ConfigError::DuplicateProperty(key));
        }
        if let Err(cycle) = self.graph.check(&key, &spec.supersedes) {
            tracing::warn!(key = %key, cycle = ?cycle, "supersedes cycle rejected");
            return Err(ConfigError::SupersedesCycle { key, cycle });
        }

        let PropertySpec {
            value,
            validator,
            handler,
            suppress_event,
            supersedes,
        } = spec;
        self.graph.insert(&key, supersedes);
        let queue_default = !suppress_event && !value.is_null();
        self.initial.insert(key.clone(), value.clone());
        self.properties.insert(
            key.clone(),
            Property {
                value,
                validator,
                handler,
                suppress_event,
                event: Self::make_event(self.owner, &key),
            },
        );
        self.order.push(key.clone());
        if queue_default {
            self.enqueue(key);
        }
        Ok(())
    }

    #[must_use]
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(&key.to_lowercase())
    }

    /// Current value, `None` for an unregistered key.
    #[must_use]
    pub fn get_property(&self, key: &str) -> Option<&Value> {
        self.properties.get(&key.to_lowercase()).map(|p| &p.value)
    }

    /// Current value when it is a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_property(key).and_then(Value::as_bool)
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Validate and store `value`, then run the handler and notify listeners.
    ///
    /// While the store is deferred the write is queued instead.
    pub fn set_property(
        &mut self,
        ctx: &mut C,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), ConfigError> {
        if self.deferred {
            return self.queue_property(key, value);
        }
        let key = self.store(key, value.into())?;
        self.fire_change(ctx, &key);
        Ok(())
    }

    /// Validate and store `value` without running anything.
    pub fn set_property_silent(
        &mut self,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), ConfigError> {
        self.store(key, value.into()).map(|_| ())
    }

    /// Validate and store `value`, and schedule its handler for the next flush.
    pub fn queue_property(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        let key = self.store(key, value.into())?;
        self.enqueue(key);
        Ok(())
    }

    /// Queue a batch of writes.
    ///
    /// Every entry is validated before anything is stored; on any failure the
    /// store is unchanged and all failures are returned together. With `init`
    /// the entries also become the initial configuration used by
    /// [`reset`](Self::reset).
    pub fn apply_config(&mut self, batch: &ConfigBatch, init: bool) -> Result<(), ConfigError> {
        let errors: Vec<ConfigError> = batch
            .iter()
            .filter_map(|(key, value)| self.check(key, value).err())
            .collect();
        if !errors.is_empty() {
            tracing::warn!(rejected = errors.len(), "configuration batch rejected");
            return Err(ConfigError::Batch(errors));
        }
        for (key, value) in batch.iter() {
            if init {
                self.initial.insert(key.to_owned(), value.clone());
            }
            self.queue_property(key, value.clone())?;
        }
        Ok(())
    }

    /// Run the handlers of every queued key in supersedes order.
    ///
    /// Returns the number of keys drained.
    pub fn fire_queue(&mut self, ctx: &mut C) -> usize {
        let pending = std::mem::take(&mut self.queue);
        if pending.is_empty() {
            return 0;
        }
        let ordered = self.graph.order(&pending);
        tracing::debug!(keys = ?ordered, "flushing configuration queue");
        for key in &ordered {
            self.fire_change(ctx, key);
        }
        ordered.len()
    }

    /// Queue writes instead of firing them.
    pub fn set_deferred(&mut self, deferred: bool) {
        self.deferred = deferred;
    }

    #[must_use]
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Keys waiting for the next flush, in queue order.
    #[must_use]
    pub fn pending(&self) -> &[String] {
        &self.queue
    }

    /// Run the handler of `key` again with its current value.
    pub fn refire(&mut self, ctx: &mut C, key: &str) -> Result<(), ConfigError> {
        let key = key.to_lowercase();
        if !self.properties.contains_key(&key) {
            return Err(ConfigError::UnknownProperty(key));
        }
        self.fire_change(ctx, &key);
        Ok(())
    }

    /// Run every handler with its current value, in supersedes order.
    pub fn refresh(&mut self, ctx: &mut C) -> usize {
        let ordered = self.graph.order(&self.order);
        ordered
            .iter()
            .filter(|key| self.fire_change(ctx, key))
            .count()
    }

    /// Restore `key` to its initial value through [`set_property`](Self::set_property).
    pub fn reset_property(&mut self, ctx: &mut C, key: &str) -> Result<(), ConfigError> {
        let key = key.to_lowercase();
        let value = self
            .initial
            .get(&key)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProperty(key.clone()))?;
        self.set_property(ctx, &key, value)
    }

    /// Restore every property to its initial value and flush.
    pub fn reset(&mut self, ctx: &mut C) -> usize {
        let keys = self.order.clone();
        for key in keys {
            if let Some(value) = self.initial.get(&key).cloned() {
                if let Some(prop) = self.properties.get_mut(&key) {
                    prop.value = value;
                }
                self.enqueue(key);
            }
        }
        self.fire_queue(ctx)
    }

    /// Snapshot of every current value.
    #[must_use]
    pub fn get_config(&self) -> BTreeMap<String, Value> {
        self.properties
            .iter()
            .map(|(k, p)| (k.clone(), p.value.clone()))
            .collect()
    }

    /// Registration defaults overlaid with every `init` batch.
    #[must_use]
    pub fn initial_config(&self) -> &BTreeMap<String, Value> {
        &self.initial
    }

    /// Listen for changes of one property.
    pub fn subscribe_to_property(
        &self,
        key: &str,
        listener: Listener,
        callback: impl Fn(&Fired<'_, PropertyChange>) + 'static,
    ) -> Option<SubscriptionId> {
        self.properties
            .get(&key.to_lowercase())
            .map(|p| p.event.subscribe_with(listener, callback))
    }

    pub fn unsubscribe_from_property(&self, key: &str, id: SubscriptionId) -> bool {
        self.properties
            .get(&key.to_lowercase())
            .is_some_and(|p| p.event.unsubscribe(id))
    }

    /// Store-wide change event, fired after each property's own event.
    #[must_use]
    pub fn changed_event(&self) -> Event<PropertyChange> {
        self.changed.clone()
    }

    /// Drop every property, listener and pending write.
    pub fn destroy(&mut self) {
        for prop in self.properties.values() {
            prop.event.unsubscribe_all();
        }
        self.changed.unsubscribe_all();
        self.properties.clear();
        self.order.clear();
        self.graph.clear();
        self.queue.clear();
        self.initial.clear();
        self.deferred = false;
    }

    fn check(&self, key: &str, value: &Value) -> Result<String, ConfigError> {
        let key = key.to_lowercase();
        let Some(prop) = self.properties.get(&key) else {
            return Err(ConfigError::UnknownProperty(key));
        };
        if let Some(validator) = &prop.validator {
            if !validator(value) {
                return Err(ConfigError::ValidationFailed {
                    key,
                    value: value.clone(),
                });
            }
        }
        Ok(key)
    }

    fn store(&mut self, key: &str, value: Value) -> Result<String, ConfigError> {
        let key = match self.check(key, &value) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(error = %err, "configuration write rejected");
                return Err(err);
            }
        };
        if let Some(prop) = self.properties.get_mut(&key) {
            prop.value = value;
        }
        Ok(key)
    }

    fn enqueue(&mut self, key: String) {
        self.queue.retain(|queued| *queued != key);
        self.queue.push(key);
    }

    /// Returns whether the handler ran (false for suppressed properties).
    fn fire_change(&self, ctx: &mut C, key: &str) -> bool {
        let Some(prop) = self.properties.get(key) else {
            return false;
        };
        if prop.suppress_event {
            return false;
        }
        let change = PropertyChange {
            key: key.to_owned(),
            value: prop.value.clone(),
        };
        let handler = prop.handler.clone();
        let event = prop.event.clone();
        if let Some(handler) = handler {
            handler(ctx, &change);
        }
        event.fire(&change);
        self.changed.fire(&change);
        true
    }
}
