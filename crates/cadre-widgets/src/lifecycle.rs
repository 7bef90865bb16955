#![forbid(unsafe_code)]

//! Lifecycle events and the module state machine.
//!
//! # State machine
//!
//! ```text
//! Unattached --init--> Initialized --render--> Rendered --show--> Shown
//!                                                  |                ^ |
//!                                                  +-----hide----> Hidden
//! (any) --destroy--> Destroyed
//! ```
//!
//! # Invariants
//!
//! 1. `Destroyed` is terminal: every transition out of it is rejected.
//! 2. Visibility (`Shown`/`Hidden`) is only reported after rendering; show
//!    and hide before that leave `Initialized` unchanged.
//! 3. Re-rendering keeps the current visibility sub-state.

use std::fmt;

use cadre_core::host::NodeId;
use cadre_core::slot::{SlotContent, SlotKind};

/// Every notification a module fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    BeforeInit,
    Init,
    Append,
    BeforeRender,
    Render,
    ChangeHeader,
    ChangeBody,
    ChangeFooter,
    ChangeContent,
    Destroy,
    BeforeShow,
    Show,
    BeforeHide,
    Hide,
}

impl LifecycleEvent {
    /// All events, in creation order.
    pub const ALL: [LifecycleEvent; 14] = [
        Self::BeforeInit,
        Self::Init,
        Self::Append,
        Self::BeforeRender,
        Self::Render,
        Self::ChangeHeader,
        Self::ChangeBody,
        Self::ChangeFooter,
        Self::ChangeContent,
        Self::Destroy,
        Self::BeforeShow,
        Self::Show,
        Self::BeforeHide,
        Self::Hide,
    ];

    /// Event name as seen by subscribers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeInit => "beforeInit",
            Self::Init => "init",
            Self::Append => "append",
            Self::BeforeRender => "beforeRender",
            Self::Render => "render",
            Self::ChangeHeader => "changeHeader",
            Self::ChangeBody => "changeBody",
            Self::ChangeFooter => "changeFooter",
            Self::ChangeContent => "changeContent",
            Self::Destroy => "destroy",
            Self::BeforeShow => "beforeShow",
            Self::Show => "show",
            Self::BeforeHide => "beforeHide",
            Self::Hide => "hide",
        }
    }

    /// Change event of one slot.
    #[must_use]
    pub const fn for_slot(kind: SlotKind) -> Self {
        match kind {
            SlotKind::Header => Self::ChangeHeader,
            SlotKind::Body => Self::ChangeBody,
            SlotKind::Footer => Self::ChangeFooter,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of every module event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub event: LifecycleEvent,
    /// Content written, for slot change events.
    pub content: Option<SlotContent>,
    /// Parent the container was attached to, for `append`.
    pub target: Option<NodeId>,
}

impl Notice {
    #[must_use]
    pub const fn new(event: LifecycleEvent) -> Self {
        Self {
            event,
            content: None,
            target: None,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: SlotContent) -> Self {
        self.content = Some(content);
        self
    }

    #[must_use]
    pub const fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }
}

/// Where a module is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Unattached,
    Initialized,
    Rendered,
    Shown,
    Hidden,
    Destroyed,
}

/// Inputs to [`LifecycleState::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Init,
    Render,
    Show,
    Hide,
    Destroy,
}

impl LifecycleState {
    /// Next state, or `None` when `transition` is not allowed here.
    #[must_use]
    pub const fn apply(self, transition: Transition) -> Option<Self> {
        use LifecycleState as S;
        use Transition as T;
        match (self, transition) {
            (S::Destroyed, _) => None,
            (_, T::Destroy) => Some(S::Destroyed),
            (S::Unattached, T::Init) => Some(S::Initialized),
            (S::Unattached, _) | (_, T::Init) => None,
            (S::Initialized, T::Render) => Some(S::Rendered),
            (S::Initialized, T::Show | T::Hide) => Some(S::Initialized),
            (state, T::Render) => Some(state),
            (_, T::Show) => Some(S::Shown),
            (_, T::Hide) => Some(S::Hidden),
        }
    }

    /// Whether the module has rendered at least once and is not destroyed.
    #[must_use]
    pub const fn is_rendered(self) -> bool {
        matches!(self, Self::Rendered | Self::Shown | Self::Hidden)
    }

    #[must_use]
    pub const fn is_destroyed(self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let s = LifecycleState::Unattached;
        let s = s.apply(Transition::Init).unwrap();
        assert_eq!(s, LifecycleState::Initialized);
        let s = s.apply(Transition::Render).unwrap();
        assert_eq!(s, LifecycleState::Rendered);
        let s = s.apply(Transition::Hide).unwrap();
        assert_eq!(s, LifecycleState::Hidden);
        assert_eq!(s.apply(Transition::Render), Some(LifecycleState::Hidden));
        let s = s.apply(Transition::Show).unwrap();
        assert_eq!(s, LifecycleState::Shown);
        assert_eq!(s.apply(Transition::Destroy), Some(LifecycleState::Destroyed));
    }

    #[test]
    fn destroyed_is_terminal() {
        let d = LifecycleState::Destroyed;
        for t in [Transition::Init, Transition::Render, Transition::Show, Transition::Hide, Transition::Destroy] {
            assert_eq!(d.apply(t), None);
        }
    }

    #[test]
    fn visibility_waits_for_render() {
        let s = LifecycleState::Initialized;
        assert_eq!(s.apply(Transition::Show), Some(LifecycleState::Initialized));
        assert!(!s.is_rendered());
        assert_eq!(LifecycleState::Unattached.apply(Transition::Render), None);
        assert_eq!(LifecycleState::Rendered.apply(Transition::Init), None);
    }

    #[test]
    fn event_names() {
        let names: Vec<_> = LifecycleEvent::ALL.iter().map(|e| e.as_str()).collect();
        assert_eq!(names.len(), 14);
        assert_eq!(LifecycleEvent::for_slot(SlotKind::Body).to_string(), "changeBody");
        assert_eq!(LifecycleEvent::BeforeInit.as_str(), "beforeInit");
    }
}
