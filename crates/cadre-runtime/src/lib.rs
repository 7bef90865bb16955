#![forbid(unsafe_code)]

//! Runtime services shared across cadre modules.
//!
//! # Role in cadre
//! `cadre-runtime` owns the one resource that outlives any single module: the
//! text/zoom resize monitor. It also defines the platform boundary the
//! monitor needs ([`platform::ResizePlatform`]) and the capability flags a
//! host reports ([`platform::PlatformCaps`]).
//!
//! # How it fits in the system
//! Modules receive an `Rc<dyn ResizeRegistry>` and register one handler each;
//! hosts implement [`platform::ResizePlatform`] and deliver detector signals.

pub mod platform;
pub mod resize_monitor;

pub use platform::{DetectorHandle, PlatformCaps, RESIZE_MONITOR_ENV, ResizePlatform, SignalCallback};
pub use resize_monitor::{
    RegisterOutcome, ResizeHandler, ResizeMonitor, ResizeNotice, ResizeRegistry, TEXT_RESIZE_EVENT,
};
