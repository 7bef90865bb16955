#![forbid(unsafe_code)]

//! Named, ordered, synchronous events.
//!
//! # Design
//!
//! [`Event<A>`] is a cheaply clonable handle over one subscriber list stored
//! in `Rc<RefCell<..>>`. Every clone shares the same subscribers, so a module
//! can hand out its events while keeping the right to tear them down.
//!
//! Closures have no identity in Rust. A subscription is therefore identified
//! by the [`SubscriptionId`] returned from `subscribe`, and may additionally
//! carry a [`HandlerKey`] and a bound [`ScopeId`] so that callers can remove
//! "this handler for this scope" without keeping the id around.
//!
//! # Invariants
//!
//! 1. Subscribers run in subscription order.
//! 2. Subscribing the same handler twice yields two independent invocations.
//! 3. A subscriber removed during a fire, before its turn, is not invoked.
//!    Unaffected subscribers are neither skipped nor invoked twice.
//! 4. A subscriber added during a fire runs from the next fire on.
//! 5. Firing with no subscribers and unsubscribing an unknown id are no-ops.
//!
//! # Failure Modes
//!
//! | Mode | Condition | Behavior |
//! |------|-----------|----------|
//! | Re-entrant fire | A callback fires the same event | Nested fire runs to completion first |
//! | Signature mismatch | Subscriber assumes another argument shape | Not detected; [`Signature`] is metadata |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Static name identifying the role of a handler (e.g. `"config.flush"`).
pub type HandlerKey = &'static str;

/// Identity of a subscribing scope (typically one component instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Allocate a fresh, process-unique scope id.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw id.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Handle to one subscription on one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Calling convention documented for an event's subscribers.
///
/// Only diagnostics consult it; `fire` never checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Signature {
    /// Subscribers receive the whole argument payload.
    #[default]
    List,
    /// Subscribers are expected to read a single argument.
    Flat,
}

/// Subscription options: handler key, bound scope, and scope override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Listener {
    /// Role of the handler, used by `unsubscribe_matching` / `is_subscribed`.
    pub key: Option<HandlerKey>,
    /// Scope the handler is bound to.
    pub scope: Option<ScopeId>,
    /// Report the bound scope to the callback instead of the event owner.
    pub override_scope: bool,
}

impl Listener {
    /// Anonymous listener (no key, no scope).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            key: None,
            scope: None,
            override_scope: false,
        }
    }

    /// Builder: set the handler key.
    #[must_use]
    pub const fn key(mut self, key: HandlerKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Builder: bind to a scope.
    #[must_use]
    pub const fn scope(mut self, scope: ScopeId) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Builder: report the bound scope to the callback.
    #[must_use]
    pub const fn override_scope(mut self, value: bool) -> Self {
        self.override_scope = value;
        self
    }

    fn matches(&self, key: HandlerKey, scope: Option<ScopeId>) -> bool {
        self.key == Some(key) && (scope.is_none() || self.scope == scope)
    }
}

/// View handed to a subscriber for one delivery.
#[derive(Debug)]
pub struct Fired<'a, A> {
    /// Name of the firing event.
    pub event: &'a str,
    /// Payload.
    pub args: &'a A,
    /// Bound scope when the listener overrides scope, else the event owner.
    pub scope: Option<ScopeId>,
}

type Callback<A> = Rc<dyn Fn(&Fired<'_, A>)>;

struct Subscriber<A> {
    id: SubscriptionId,
    listener: Listener,
    callback: Callback<A>,
    live: Rc<Cell<bool>>,
}

struct EventInner<A> {
    name: String,
    owner: Option<ScopeId>,
    signature: Signature,
    subscribers: Vec<Subscriber<A>>,
    next_id: u64,
    fire_count: u64,
}

impl<A> EventInner<A> {
    fn remove_where(&mut self, mut pred: impl FnMut(&Subscriber<A>) -> bool) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|sub| {
            if pred(sub) {
                sub.live.set(false);
                false
            } else {
                true
            }
        });
        before - self.subscribers.len()
    }
}

/// A named event with an ordered subscriber list.
///
/// Cloning creates another handle to the **same** subscriber list.
pub struct Event<A> {
    inner: Rc<RefCell<EventInner<A>>>,
}

impl<A> Clone for Event<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Event")
            .field("name", &inner.name)
            .field("owner", &inner.owner)
            .field("signature", &inner.signature)
            .field("subscriber_count", &inner.subscribers.len())
            .field("fire_count", &inner.fire_count)
            .finish()
    }
}

impl<A: 'static> Event<A> {
    /// Create an event without an owner scope.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(name.into(), None)
    }

    /// Create an event owned by `owner`; subscribers that do not override
    /// scope see `owner` as their scope.
    #[must_use]
    pub fn with_owner(name: impl Into<String>, owner: ScopeId) -> Self {
        Self::build(name.into(), Some(owner))
    }

    fn build(name: String, owner: Option<ScopeId>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EventInner {
                name,
                owner,
                signature: Signature::default(),
                subscribers: Vec::new(),
                next_id: 0,
                fire_count: 0,
            })),
        }
    }

    /// Event name.
    #[must_use]
    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// Owner scope, if any.
    #[must_use]
    pub fn owner(&self) -> Option<ScopeId> {
        self.inner.borrow().owner
    }

    /// Documented calling convention.
    #[must_use]
    pub fn signature(&self) -> Signature {
        self.inner.borrow().signature
    }

    /// Change the documented calling convention.
    pub fn set_signature(&self, signature: Signature) {
        self.inner.borrow_mut().signature = signature;
    }

    /// Subscribe an anonymous callback.
    pub fn subscribe(&self, callback: impl Fn(&Fired<'_, A>) + 'static) -> SubscriptionId {
        self.subscribe_with(Listener::new(), callback)
    }

    /// Subscribe a callback with explicit listener options.
    pub fn subscribe_with(
        &self,
        listener: Listener,
        callback: impl Fn(&Fired<'_, A>) + 'static,
    ) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push(Subscriber {
            id,
            listener,
            callback: Rc::new(callback),
            live: Rc::new(Cell::new(true)),
        });
        id
    }

    /// Remove one subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.borrow_mut().remove_where(|sub| sub.id == id) > 0
    }

    /// Remove every subscription with handler `key`, restricted to `scope`
    /// when one is given. Returns the number removed.
    pub fn unsubscribe_matching(&self, key: HandlerKey, scope: Option<ScopeId>) -> usize {
        self.inner
            .borrow_mut()
            .remove_where(|sub| sub.listener.matches(key, scope))
    }

    /// Remove every subscription bound to `scope`.
    pub fn unsubscribe_scope(&self, scope: ScopeId) -> usize {
        self.inner
            .borrow_mut()
            .remove_where(|sub| sub.listener.scope == Some(scope))
    }

    /// Remove all subscriptions.
    pub fn unsubscribe_all(&self) -> usize {
        self.inner.borrow_mut().remove_where(|_| true)
    }

    /// Whether a handler with `key` is subscribed (for `scope`, if given).
    #[must_use]
    pub fn is_subscribed(&self, key: HandlerKey, scope: Option<ScopeId>) -> bool {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .any(|sub| sub.listener.matches(key, scope))
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// How many times the event has been fired.
    #[must_use]
    pub fn fire_count(&self) -> u64 {
        self.inner.borrow().fire_count
    }

    /// Deliver `args` to every subscriber, in subscription order.
    ///
    /// Returns the number of subscribers invoked.
    pub fn fire(&self, args: &A) -> usize {
        // Snapshot so callbacks may (un)subscribe without a borrow conflict.
        let (name, owner, snapshot) = {
            let mut inner = self.inner.borrow_mut();
            inner.fire_count += 1;
            let snapshot: Vec<(Callback<A>, Rc<Cell<bool>>, Listener)> = inner
                .subscribers
                .iter()
                .map(|sub| (Rc::clone(&sub.callback), Rc::clone(&sub.live), sub.listener))
                .collect();
            (inner.name.clone(), inner.owner, snapshot)
        };

        let mut invoked = 0;
        for (callback, live, listener) in snapshot {
            if !live.get() {
                continue;
            }
            let scope = if listener.override_scope {
                listener.scope
            } else {
                owner
            };
            tracing::trace!(event = %name, handler = listener.key.unwrap_or("-"), "dispatch");
            callback(&Fired {
                event: &name,
                args,
                scope,
            });
            invoked += 1;
        }
        invoked
    }
}
