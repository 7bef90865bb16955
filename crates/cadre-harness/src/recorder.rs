#![forbid(unsafe_code)]

//! Event recorder for ordering assertions.

use std::cell::RefCell;
use std::rc::Rc;

use cadre_core::event::{Event, SubscriptionId};

/// Collects the names of fired events, in firing order.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the event's own name on every fire.
    pub fn record<A: 'static>(&self, event: &Event<A>) -> SubscriptionId {
        let log = Rc::clone(&self.log);
        event.subscribe(move |fired| log.borrow_mut().push(fired.event.to_owned()))
    }

    /// Log `label` on every fire.
    pub fn record_as<A: 'static>(&self, event: &Event<A>, label: &str) -> SubscriptionId {
        let log = Rc::clone(&self.log);
        let label = label.to_owned();
        event.subscribe(move |_| log.borrow_mut().push(label.clone()))
    }

    /// Push an arbitrary entry, for interleaving with recorded events.
    pub fn push(&self, entry: impl Into<String>) {
        self.log.borrow_mut().push(entry.into());
    }

    /// Snapshot of the log.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    /// Number of times `name` was logged.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.log.borrow().iter().filter(|e| *e == name).count()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}
