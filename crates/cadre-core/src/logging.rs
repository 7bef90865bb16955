#![forbid(unsafe_code)]

//! Logging facade.
//!
//! Re-exports the `tracing` macros the cadre crates use so downstream code
//! can write `cadre_core::debug!` without a direct dependency, and offers a
//! JSON subscriber for production hosts behind the `tracing-json` feature.

pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Install a global JSON subscriber filtered by `filter`
/// (an `EnvFilter` directive such as `"cadre_widgets=debug"`).
///
/// `RUST_LOG`, when set, takes precedence over `filter`. Returns `false`
/// when a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging(filter: &str) -> bool {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_current_span(false)
        .try_init()
        .is_ok()
}
