#![forbid(unsafe_code)]

//! Host platform boundary for resize detection.
//!
//! The monitor never talks to a native event loop. A host implements
//! [`ResizePlatform`]: it creates an invisible detector region, reports when
//! the detector signals a font or zoom change, and moves the detector back
//! just outside the visible area on request.

use std::fmt;
use std::rc::Rc;

/// Environment variable that can force resize monitoring off.
pub const RESIZE_MONITOR_ENV: &str = "CADRE_RESIZE_MONITOR";

bitflags::bitflags! {
    /// Capabilities a host platform reports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PlatformCaps: u8 {
        /// The detector reliably signals font/zoom changes.
        const ZOOM_DETECTION = 0b01;
    }
}

#[inline]
fn env_flag_off(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "off" | "false" | "no"
    )
}

impl PlatformCaps {
    /// Apply environment overrides using a custom lookup.
    ///
    /// `CADRE_RESIZE_MONITOR=0|off|false|no` clears [`Self::ZOOM_DETECTION`].
    /// An override can only remove a capability, never grant one.
    #[must_use]
    pub fn with_env_overrides<F>(self, get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut caps = self;
        if get_env(RESIZE_MONITOR_ENV).is_some_and(|value| env_flag_off(&value)) {
            caps.remove(Self::ZOOM_DETECTION);
        }
        caps
    }

    /// Apply overrides from the process environment.
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Whether resize monitoring can run.
    #[must_use]
    pub const fn monitoring_available(self) -> bool {
        self.contains(Self::ZOOM_DETECTION)
    }
}

/// Opaque handle to a detector created by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DetectorHandle(u64);

impl DetectorHandle {
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DetectorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "detector#{}", self.0)
    }
}

/// Callback a platform invokes when its detector signals.
pub type SignalCallback = Rc<dyn Fn()>;

/// Resize detection primitives a host provides.
pub trait ResizePlatform {
    /// Capabilities of this host.
    fn capabilities(&self) -> PlatformCaps;

    /// Whether zoom detection is reliable here.
    fn capability_available(&self) -> bool {
        self.capabilities().monitoring_available()
    }

    /// Create the invisible detector region and attach it to the document.
    fn install_detector(&mut self) -> DetectorHandle;

    /// Install the single low-level listener on `detector`.
    ///
    /// Implementations must not hold any borrow of themselves while invoking
    /// `callback`: the monitor calls back into the platform from it.
    fn on_detector_signal(&mut self, detector: DetectorHandle, callback: SignalCallback);

    /// Move the detector back just outside the visible area.
    fn realign_detector(&mut self, detector: DetectorHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(value: Option<&'static str>) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            if key == RESIZE_MONITOR_ENV {
                value.map(str::to_owned)
            } else {
                None
            }
        }
    }

    #[test]
    fn env_override_only_removes() {
        let full = PlatformCaps::all();
        assert_eq!(full, PlatformCaps::ZOOM_DETECTION);
        for off in ["0", "off", "FALSE", " no "] {
            let caps = full.with_env_overrides(env(Some(off)));
            assert!(!caps.monitoring_available(), "{off:?} should disable");
            assert_eq!(caps, PlatformCaps::empty());
        }

        let on = PlatformCaps::empty().with_env_overrides(env(Some("1")));
        assert_eq!(on, PlatformCaps::empty());
        assert_eq!(full.with_env_overrides(env(None)), full);
        assert_eq!(full.with_env_overrides(env(Some("yes"))), full);
    }

    #[test]
    fn detector_handle_display() {
        assert_eq!(DetectorHandle::from_raw(3).to_string(), "detector#3");
        assert_eq!(DetectorHandle::from_raw(3).get(), 3);
    }
}
