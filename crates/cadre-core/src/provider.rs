#![forbid(unsafe_code)]

//! Named registry of events sharing one payload type.
//!
//! A component owns one [`EventProvider`] and creates its events up front;
//! outside code can then subscribe by name without knowing the fields that
//! hold the handles.
//!
//! # Invariants
//!
//! 1. `create_event` is idempotent per name: a second call returns the event
//!    created first, subscribers included.
//! 2. `names()` iterates in creation order.
//! 3. Subscribing to or firing an unknown name is a no-op reported as `None`.

use std::collections::HashMap;

use crate::event::{Event, Fired, Listener, ScopeId, SubscriptionId};

/// Event registry keyed by name.
#[derive(Debug)]
pub struct EventProvider<A> {
    owner: Option<ScopeId>,
    events: HashMap<String, Event<A>>,
    order: Vec<String>,
}

impl<A: 'static> Default for EventProvider<A> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<A: 'static> EventProvider<A> {
    /// Create an empty provider whose events report `owner` as their scope.
    #[must_use]
    pub fn new(owner: Option<ScopeId>) -> Self {
        Self {
            owner,
            events: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Create (or fetch) the event called `name`.
    pub fn create_event(&mut self, name: &str) -> Event<A> {
        if let Some(existing) = self.events.get(name) {
            return existing.clone();
        }
        let event = match self.owner {
            Some(owner) => Event::with_owner(name, owner),
            None => Event::new(name),
        };
        self.events.insert(name.to_owned(), event.clone());
        self.order.push(name.to_owned());
        event
    }

    /// Handle to an existing event.
    #[must_use]
    pub fn event(&self, name: &str) -> Option<Event<A>> {
        self.events.get(name).cloned()
    }

    /// Whether an event called `name` exists.
    #[must_use]
    pub fn has_event(&self, name: &str) -> bool {
        self.events.contains_key(name)
    }

    /// Event names in creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Subscribe to the event called `name`.
    pub fn subscribe(
        &self,
        name: &str,
        listener: Listener,
        callback: impl Fn(&Fired<'_, A>) + 'static,
    ) -> Option<SubscriptionId> {
        self.events
            .get(name)
            .map(|event| event.subscribe_with(listener, callback))
    }

    /// Remove a subscription from the event called `name`.
    pub fn unsubscribe(&self, name: &str, id: SubscriptionId) -> bool {
        self.events
            .get(name)
            .is_some_and(|event| event.unsubscribe(id))
    }

    /// Fire the event called `name`; returns the number of subscribers
    /// invoked, or `None` for an unknown name.
    pub fn fire_event(&self, name: &str, args: &A) -> Option<usize> {
        self.events.get(name).map(|event| event.fire(args))
    }

    /// Clear the subscriber list of every event. Returns the total removed.
    pub fn unsubscribe_all(&self) -> usize {
        self.events.values().map(Event::unsubscribe_all).sum()
    }

    /// Clear every event except those named in `keep`.
    pub fn unsubscribe_all_except(&self, keep: &[&str]) -> usize {
        self.events
            .iter()
            .filter(|(name, _)| !keep.contains(&name.as_str()))
            .map(|(_, event)| event.unsubscribe_all())
            .sum()
    }

    /// Total subscriptions across all events.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.values().map(Event::subscriber_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn create_event_is_idempotent() {
        let mut provider: EventProvider<()> = EventProvider::new(None);
        let first = provider.create_event("show");
        first.subscribe(|_| {});
        let again = provider.create_event("show");
        assert_eq!(again.subscriber_count(), 1);
        assert_eq!(provider.names().count(), 1);
    }

    #[test]
    fn unknown_names_are_reported_not_fatal() {
        let provider: EventProvider<()> = EventProvider::new(None);
        assert!(provider.subscribe("nope", Listener::new(), |_| {}).is_none());
        assert_eq!(provider.fire_event("nope", &()), None);
        assert!(!provider.has_event("nope"));
    }

    #[test]
    fn fire_by_name_reaches_subscribers() {
        let owner = ScopeId::next();
        let mut provider: EventProvider<u8> = EventProvider::new(Some(owner));
        provider.create_event("render");
        let hits = Rc::new(Cell::new(0u8));
        let seen_scope = Rc::new(Cell::new(None));
        {
            let hits = Rc::clone(&hits);
            let seen_scope = Rc::clone(&seen_scope);
            provider.subscribe("render", Listener::new(), move |fired| {
                hits.set(hits.get() + *fired.args);
                seen_scope.set(fired.scope);
            });
        }
        assert_eq!(provider.fire_event("render", &3), Some(1));
        assert_eq!(hits.get(), 3);
        assert_eq!(seen_scope.get(), Some(owner));
    }

    #[test]
    fn unsubscribe_all_except_keeps_named_events() {
        let mut provider: EventProvider<()> = EventProvider::new(None);
        for name in ["init", "render", "destroy"] {
            provider.create_event(name).subscribe(|_| {});
        }
        assert_eq!(provider.unsubscribe_all_except(&["destroy"]), 2);
        assert_eq!(provider.subscriber_count(), 1);
        assert_eq!(
            provider.names().collect::<Vec<_>>(),
            vec!["init", "render", "destroy"]
        );
        assert_eq!(provider.unsubscribe_all(), 1);
    }
}
