#![forbid(unsafe_code)]

//! Construction options for [`Module`](crate::Module).

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use cadre_config::{ConfigBatch, ConfigError};
use cadre_core::event::Fired;
use cadre_runtime::ResizeRegistry;

use crate::lifecycle::{LifecycleEvent, Notice};

/// Callback subscribed to a module event before init runs.
pub type NoticeCallback = Rc<dyn Fn(&Fired<'_, Notice>)>;

/// Builder for module construction.
///
/// # Example
///
/// ```
/// use cadre_widgets::{LifecycleEvent, ModuleOptions};
///
/// let options = ModuleOptions::new()
///     .set("visible", false)
///     .on(LifecycleEvent::BeforeInit, |_| {});
/// assert_eq!(options.config().len(), 1);
/// ```
#[derive(Default)]
pub struct ModuleOptions {
    pub(crate) config: ConfigBatch,
    pub(crate) resize: Option<Rc<dyn ResizeRegistry>>,
    pub(crate) listeners: Vec<(LifecycleEvent, NoticeCallback)>,
}

impl fmt::Debug for ModuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleOptions")
            .field("config", &self.config)
            .field("resize", &self.resize.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ModuleOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caller-supplied configuration, applied as the initial batch.
    #[must_use]
    pub fn config(&self) -> &ConfigBatch {
        &self.config
    }

    /// Replace the initial configuration batch.
    #[must_use]
    pub fn with_config(mut self, batch: ConfigBatch) -> Self {
        self.config = batch;
        self
    }

    /// Parse the initial configuration from a JSON object.
    pub fn with_config_json(self, text: &str) -> Result<Self, ConfigError> {
        Ok(self.with_config(ConfigBatch::from_json_str(text)?))
    }

    /// Add one entry to the initial configuration.
    #[must_use]
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.insert(key, value);
        self
    }

    /// Share a resize monitor with the module.
    #[must_use]
    pub fn resize_monitor(mut self, registry: Rc<dyn ResizeRegistry>) -> Self {
        self.resize = Some(registry);
        self
    }

    /// Subscribe to `event` before init, so `beforeInit` and `init` are
    /// observable.
    #[must_use]
    pub fn on(mut self, event: LifecycleEvent, callback: impl Fn(&Fired<'_, Notice>) + 'static) -> Self {
        self.listeners.push((event, Rc::new(callback)));
        self
    }
}
