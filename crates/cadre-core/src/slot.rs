#![forbid(unsafe_code)]

//! Header/body/footer slots and their structural markers.
//!
//! The markers are the only wire format the core exposes: hand-authored
//! markup marks its regions with `hd`, `bd` and `ft`, and the module scans
//! for them by exact equality against each child's classification tag.
//!
//! # Invariants
//!
//! 1. [`Slots`] holds at most one node per [`SlotKind`].
//! 2. [`Slots::discover`] keeps the first child matching each marker; later
//!    matches for an assigned slot are ignored.
//! 3. [`SlotKind::RENDER_ORDER`] is header, body, footer.

use std::fmt;

use crate::host::NodeId;

/// Classification tag of header regions.
pub const HEADER_MARKER: &str = "hd";
/// Classification tag of body regions.
pub const BODY_MARKER: &str = "bd";
/// Classification tag of footer regions.
pub const FOOTER_MARKER: &str = "ft";
/// Class added to every module container.
pub const CONTAINER_MARKER: &str = "module";

/// One of the three content regions of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKind {
    Header,
    Body,
    Footer,
}

impl SlotKind {
    /// Order in which slots are reconciled into the container.
    pub const RENDER_ORDER: [SlotKind; 3] = [SlotKind::Header, SlotKind::Body, SlotKind::Footer];

    /// Structural marker for this slot.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Header => HEADER_MARKER,
            Self::Body => BODY_MARKER,
            Self::Footer => FOOTER_MARKER,
        }
    }

    /// Map a classification tag to a slot kind.
    #[must_use]
    pub fn classify(tag: &str) -> Option<Self> {
        match tag {
            HEADER_MARKER => Some(Self::Header),
            BODY_MARKER => Some(Self::Body),
            FOOTER_MARKER => Some(Self::Footer),
            _ => None,
        }
    }

    /// Lowercase name, used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Body => "body",
            Self::Footer => "footer",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content written into a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotContent {
    /// Markup text replacing the slot's content.
    Markup(String),
    /// A host node placed inside the slot.
    Node(NodeId),
}

impl From<&str> for SlotContent {
    fn from(markup: &str) -> Self {
        Self::Markup(markup.to_owned())
    }
}

impl From<String> for SlotContent {
    fn from(markup: String) -> Self {
        Self::Markup(markup)
    }
}

impl From<NodeId> for SlotContent {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

/// The slot nodes tracked by one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slots {
    header: Option<NodeId>,
    body: Option<NodeId>,
    footer: Option<NodeId>,
}

impl Slots {
    /// No slots assigned.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            header: None,
            body: None,
            footer: None,
        }
    }

    /// Scan children (in document order) once, first match wins.
    pub fn discover<'a, I>(children: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, Option<&'a str>)>,
    {
        let mut slots = Self::new();
        for (node, tag) in children {
            let Some(kind) = tag.and_then(SlotKind::classify) else {
                continue;
            };
            if slots.get(kind).is_none() {
                slots.set(kind, node);
            }
        }
        slots
    }

    /// Node assigned to `kind`.
    #[must_use]
    pub const fn get(&self, kind: SlotKind) -> Option<NodeId> {
        match kind {
            SlotKind::Header => self.header,
            SlotKind::Body => self.body,
            SlotKind::Footer => self.footer,
        }
    }

    /// Assign `node` to `kind`.
    pub fn set(&mut self, kind: SlotKind, node: NodeId) {
        *self.slot_mut(kind) = Some(node);
    }

    /// Release every slot reference.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Assigned slots in render order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotKind, NodeId)> + '_ {
        SlotKind::RENDER_ORDER
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|node| (kind, node)))
    }

    /// Whether no slot is assigned.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.header.is_none() && self.body.is_none() && self.footer.is_none()
    }

    fn slot_mut(&mut self, kind: SlotKind) -> &mut Option<NodeId> {
        match kind {
            SlotKind::Header => &mut self.header,
            SlotKind::Body => &mut self.body,
            SlotKind::Footer => &mut self.footer,
        }
    }
}
