#![forbid(unsafe_code)]

//! Test harness for cadre.
//!
//! # Role in cadre
//! Provides a host for tests and demos: [`MemoryDocument`] stands in for a
//! live document (tree operations and resize detection), [`Recorder`]
//! captures event order, and [`init_test_logging`] routes `tracing` output to
//! the test writer.

pub mod document;
pub mod recorder;

pub use document::{DETECTOR_CLASS, MemoryDocument, fire_resize};
pub use recorder::Recorder;

/// Route `tracing` output to the test writer.
///
/// Honours `RUST_LOG`; defaults to `debug` for the cadre crates. Safe to call
/// from every test; only the first call installs a subscriber.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("cadre_core=debug,cadre_config=debug,cadre_runtime=debug,cadre_widgets=debug")
    });
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}
