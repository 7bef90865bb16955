#![forbid(unsafe_code)]

//! Core: event bus, host-tree boundary, and slot markers.
//!
//! # Role in cadre
//! `cadre-core` holds the leaf primitives every other crate builds on. It has
//! no notion of configuration or lifecycle; it only knows how to dispatch
//! notifications in order and how to talk to a host document.
//!
//! # Primary responsibilities
//! - **Event / EventProvider**: ordered, synchronous publish/subscribe.
//! - **HostTree**: the structural operations a host must provide.
//! - **Slots**: header/body/footer markers and first-match discovery.
//!
//! # How it fits in the system
//! `cadre-config` fires its change notifications through [`event::Event`],
//! `cadre-runtime` rebroadcasts resize signals through it, and
//! `cadre-widgets` drives a [`host::HostTree`] from the module lifecycle.

pub mod event;
pub mod host;
pub mod logging;
pub mod provider;
pub mod slot;

pub use event::{Event, Fired, HandlerKey, Listener, ScopeId, Signature, SubscriptionId};
pub use host::{HostTree, NodeId, Target};
pub use provider::EventProvider;
pub use slot::{SlotContent, SlotKind, Slots};
