#![forbid(unsafe_code)]

//! Process-wide text/zoom resize monitor.
//!
//! # Design
//!
//! One [`ResizeMonitor`] is shared (`Rc`) by every module of a document. The
//! first successful registration installs a single detector and a single
//! low-level listener on the platform; every later registration only adds a
//! subscriber to the monitor's shared event. A detector signal becomes one
//! fire of that event, so each registered `(instance, key)` pair hears about
//! each resize exactly once, in registration order.
//!
//! The signal callback holds a `Weak` reference to the monitor. Dropping the
//! last `Rc` silences the detector without tearing it down.
//!
//! # Invariants
//!
//! 1. The detector and its listener are installed at most once per monitor.
//! 2. `(instance, key)` pairs are unique; registering twice is a no-op.
//! 3. Unregistering removes only the named pair and never uninstalls.
//! 4. Without [`PlatformCaps::ZOOM_DETECTION`] nothing is installed and every
//!    registration reports [`RegisterOutcome::Unavailable`].
//! 5. Notice sequence numbers increase by one per signal.
//!
//! # Failure Modes
//!
//! | Mode | Condition | Behavior |
//! |------|-----------|----------|
//! | Capability missing | Platform or env override lacks zoom detection | Monitoring disabled, `Unavailable` |
//! | Platform busy | Platform already borrowed at install time | Install deferred to next registration, `Unavailable` |
//! | Platform busy | Platform borrowed during a signal | Realignment skipped, notice still fired |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use cadre_core::event::{Event, HandlerKey, Listener, ScopeId};

use crate::platform::{DetectorHandle, PlatformCaps, ResizePlatform};

/// Name of the shared resize event.
pub const TEXT_RESIZE_EVENT: &str = "textResize";

/// Payload of one resize notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeNotice {
    /// 1-based count of signals handled by the monitor.
    pub sequence: u64,
}

/// Callback registered with a monitor.
pub type ResizeHandler = Rc<dyn Fn(&ResizeNotice)>;

/// Result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The pair is now registered.
    Registered,
    /// The pair was already registered; nothing changed.
    AlreadyRegistered,
    /// Monitoring is disabled on this platform.
    Unavailable,
}

impl RegisterOutcome {
    /// Whether the pair is registered after the call.
    #[must_use]
    pub const fn is_registered(self) -> bool {
        matches!(self, Self::Registered | Self::AlreadyRegistered)
    }
}

/// Registration surface of a resize monitor, independent of its platform.
pub trait ResizeRegistry {
    /// Register `handler` for `(instance, key)`.
    fn register(&self, instance: ScopeId, key: HandlerKey, handler: ResizeHandler) -> RegisterOutcome;

    /// Remove `(instance, key)`. Returns whether it was registered.
    fn unregister(&self, instance: ScopeId, key: HandlerKey) -> bool;

    /// Remove every pair of `instance`. Returns the number removed.
    fn unregister_instance(&self, instance: ScopeId) -> usize;

    /// Whether `(instance, key)` is registered.
    fn is_registered(&self, instance: ScopeId, key: HandlerKey) -> bool;
}

/// Shared resize monitor over platform `P`.
pub struct ResizeMonitor<P> {
    me: Weak<Self>,
    platform: Rc<RefCell<P>>,
    caps: PlatformCaps,
    detector: Cell<Option<DetectorHandle>>,
    sequence: Cell<u64>,
    event: Event<ResizeNotice>,
}

impl<P> fmt::Debug for ResizeMonitor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeMonitor")
            .field("caps", &self.caps)
            .field("detector", &self.detector.get())
            .field("sequence", &self.sequence.get())
            .field("event", &self.event)
            .finish()
    }
}

impl<P: ResizePlatform + 'static> ResizeMonitor<P> {
    /// Create a monitor using the platform's capabilities with process
    /// environment overrides applied.
    #[must_use]
    pub fn new(platform: Rc<RefCell<P>>) -> Rc<Self> {
        let caps = platform.borrow().capabilities().with_process_env();
        Self::with_capabilities(platform, caps)
    }

    /// Create a monitor with explicit capabilities.
    #[must_use]
    pub fn with_capabilities(platform: Rc<RefCell<P>>, caps: PlatformCaps) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            platform,
            caps,
            detector: Cell::new(None),
            sequence: Cell::new(0),
            event: Event::new(TEXT_RESIZE_EVENT),
        })
    }

    /// Capabilities in effect.
    #[must_use]
    pub fn capabilities(&self) -> PlatformCaps {
        self.caps
    }

    /// Whether the detector has been installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.detector.get().is_some()
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.event.subscriber_count()
    }

    /// Number of signals handled so far.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence.get()
    }

    /// Handle a resize signal: realign the detector, then notify every pair.
    ///
    /// Hosts may call this directly. Returns the number of handlers invoked.
    pub fn notify(&self) -> usize {
        if let Some(detector) = self.detector.get() {
            match self.platform.try_borrow_mut() {
                Ok(mut platform) => platform.realign_detector(detector),
                Err(_) => tracing::trace!(%detector, "platform busy, realignment skipped"),
            }
        }
        let sequence = self.sequence.get() + 1;
        self.sequence.set(sequence);
        tracing::debug!(sequence, "text resize");
        self.event.fire(&ResizeNotice { sequence })
    }

    fn ensure_installed(&self) -> bool {
        if self.detector.get().is_some() {
            return true;
        }
        let Ok(mut platform) = self.platform.try_borrow_mut() else {
            tracing::warn!("platform busy, resize detector not installed");
            return false;
        };
        let detector = platform.install_detector();
        let me = self.me.clone();
        platform.on_detector_signal(
            detector,
            Rc::new(move || {
                if let Some(monitor) = me.upgrade() {
                    monitor.notify();
                }
            }),
        );
        self.detector.set(Some(detector));
        tracing::debug!(%detector, "resize detector installed");
        true
    }
}

impl<P: ResizePlatform + 'static> ResizeRegistry for ResizeMonitor<P> {
    fn register(&self, instance: ScopeId, key: HandlerKey, handler: ResizeHandler) -> RegisterOutcome {
        if !self.caps.monitoring_available() {
            tracing::debug!(%instance, key, "resize monitoring unavailable");
            return RegisterOutcome::Unavailable;
        }
        if self.event.is_subscribed(key, Some(instance)) {
            return RegisterOutcome::AlreadyRegistered;
        }
        if !self.ensure_installed() {
            return RegisterOutcome::Unavailable;
        }
        self.event
            .subscribe_with(Listener::new().key(key).scope(instance), move |fired| {
                handler(fired.args);
            });
        RegisterOutcome::Registered
    }

    fn unregister(&self, instance: ScopeId, key: HandlerKey) -> bool {
        self.event.unsubscribe_matching(key, Some(instance)) > 0
    }

    fn unregister_instance(&self, instance: ScopeId) -> usize {
        self.event.unsubscribe_scope(instance)
    }

    fn is_registered(&self, instance: ScopeId, key: HandlerKey) -> bool {
        self.event.is_subscribed(key, Some(instance))
    }
}
