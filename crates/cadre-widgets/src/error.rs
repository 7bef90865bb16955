#![forbid(unsafe_code)]

//! Module errors.

use std::fmt;

use cadre_config::ConfigError;

/// Errors from module operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleError {
    /// `render` without a target while the container is detached.
    RenderPrecondition { module: String },
    /// A render target identifier matched no node.
    TargetNotFound(String),
    /// The module was destroyed.
    Destroyed { module: String },
    /// A configuration operation failed.
    Config(ConfigError),
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RenderPrecondition { module } => write!(
                f,
                "render failed for {module}: no target given and container is not in the document"
            ),
            Self::TargetNotFound(id) => write!(f, "render target '#{id}' not found"),
            Self::Destroyed { module } => write!(f, "{module} has been destroyed"),
            Self::Config(err) => write!(f, "configuration error: {err}"),
        }
    }
}

impl std::error::Error for ModuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for ModuleError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
