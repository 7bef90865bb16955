#![forbid(unsafe_code)]

//! In-memory host document.
//!
//! [`MemoryDocument`] is a small retained tree with one live root. It
//! implements [`HostTree`] and [`ResizePlatform`], counts every structural
//! mutation, and renders an outline of any subtree so tests can compare tree
//! shapes as text.
//!
//! # Invariants
//!
//! 1. Every node has at most one parent and appears once in that parent's
//!    children.
//! 2. A node is attached iff its ancestor chain reaches [`MemoryDocument::root`].
//! 3. Inserting a node under itself or one of its descendants is ignored.
//! 4. `find_by_identifier` only sees attached nodes, like a live document.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

use cadre_core::host::{HostTree, NodeId};
use cadre_runtime::platform::{DetectorHandle, PlatformCaps, ResizePlatform, SignalCallback};

/// Class given to resize detector regions.
pub const DETECTOR_CLASS: &str = "cadre-resize-detector";

#[derive(Debug, Default)]
struct NodeData {
    identifier: Option<String>,
    class_name: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    markup: String,
    visible: bool,
    listeners: usize,
}

struct Detector {
    handle: DetectorHandle,
    node: NodeId,
    listeners: Vec<SignalCallback>,
    realigned: u32,
}

/// A retained in-memory document.
pub struct MemoryDocument {
    nodes: HashMap<NodeId, NodeData>,
    next_node: u64,
    root: NodeId,
    caps: PlatformCaps,
    detectors: Vec<Detector>,
    mutations: u64,
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("caps", &self.caps)
            .field("detectors", &self.detectors.len())
            .field("mutations", &self.mutations)
            .finish()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Empty document whose platform supports zoom detection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capabilities(PlatformCaps::ZOOM_DETECTION)
    }

    /// Empty document reporting `caps`.
    #[must_use]
    pub fn with_capabilities(caps: PlatformCaps) -> Self {
        let root = NodeId::from_raw(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeData {
                identifier: Some("body".to_owned()),
                visible: true,
                ..NodeData::default()
            },
        );
        Self {
            nodes,
            next_node: 2,
            root,
            caps,
            detectors: Vec::new(),
            mutations: 0,
        }
    }

    /// Wrap in the shared handle modules and monitors expect.
    #[must_use]
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    /// The live root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create an element and append it to `parent`.
    pub fn append_new(
        &mut self,
        parent: NodeId,
        identifier: Option<&str>,
        class_name: Option<&str>,
    ) -> NodeId {
        let node = self.create_element(identifier, class_name);
        self.append_child(parent, node);
        node
    }

    /// Bind a host-level listener to `node`.
    pub fn add_listener(&mut self, node: NodeId) {
        if let Some(data) = self.nodes.get_mut(&node) {
            data.listeners += 1;
        }
    }

    /// Host-level listeners currently bound to `node`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.nodes.get(&node).map_or(0, |d| d.listeners)
    }

    /// Markup text of `node`.
    #[must_use]
    pub fn markup(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|d| d.markup.as_str())
    }

    /// Presentation visibility of `node`.
    #[must_use]
    pub fn is_presentation_visible(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|d| d.visible)
    }

    /// Number of structural mutations applied so far.
    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    /// Number of detectors installed through [`ResizePlatform`].
    #[must_use]
    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Low-level listeners installed across all detectors.
    #[must_use]
    pub fn detector_listener_count(&self) -> usize {
        self.detectors.iter().map(|d| d.listeners.len()).sum()
    }

    /// Times any detector was realigned.
    #[must_use]
    pub fn realign_count(&self) -> u32 {
        self.detectors.iter().map(|d| d.realigned).sum()
    }

    /// Node of the detector with `handle`.
    #[must_use]
    pub fn detector_node(&self, handle: DetectorHandle) -> Option<NodeId> {
        self.detectors
            .iter()
            .find(|d| d.handle == handle)
            .map(|d| d.node)
    }

    /// Text outline of the subtree under `node`, one line per node.
    ///
    /// Lines look like `#panel.module`, `.hd "Title" [hidden]`, indented two
    /// spaces per level.
    #[must_use]
    pub fn outline(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.outline_into(node, 0, &mut out);
        out
    }

    fn outline_into(&self, node: NodeId, depth: usize, out: &mut String) {
        let Some(data) = self.nodes.get(&node) else {
            return;
        };
        let mut line = String::new();
        if let Some(id) = &data.identifier {
            let _ = write!(line, "#{id}");
        }
        if let Some(class) = &data.class_name {
            let _ = write!(line, ".{}", class.replace(' ', "."));
        }
        if line.is_empty() {
            line.push_str("(node)");
        }
        if !data.markup.is_empty() {
            let _ = write!(line, " {:?}", data.markup);
        }
        if !data.visible {
            line.push_str(" [hidden]");
        }
        let _ = writeln!(out, "{}{line}", "  ".repeat(depth));
        for child in &data.children {
            self.outline_into(*child, depth + 1, out);
        }
    }

    fn touch(&mut self) {
        self.mutations += 1;
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.nodes.get(&node).and_then(|d| d.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != node);
            }
            if let Some(n) = self.nodes.get_mut(&node) {
                n.parent = None;
            }
        }
    }

    fn drop_children(&mut self, node: NodeId) {
        let children = self
            .nodes
            .get_mut(&node)
            .map(|d| std::mem::take(&mut d.children))
            .unwrap_or_default();
        for child in children {
            if let Some(c) = self.nodes.get_mut(&child) {
                c.parent = None;
            }
        }
    }
}

impl HostTree for MemoryDocument {
    fn find_by_identifier(&self, identifier: &str) -> Option<NodeId> {
        let mut matches: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, d)| d.identifier.as_deref() == Some(identifier))
            .map(|(id, _)| *id)
            .filter(|id| self.is_attached(*id))
            .collect();
        matches.sort();
        matches.first().copied()
    }

    fn create_element(&mut self, identifier: Option<&str>, class_name: Option<&str>) -> NodeId {
        let node = NodeId::from_raw(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            node,
            NodeData {
                identifier: identifier.map(str::to_owned),
                class_name: class_name.map(str::to_owned),
                visible: true,
                ..NodeData::default()
            },
        );
        node
    }

    fn identifier_of(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).and_then(|d| d.identifier.clone())
    }

    fn class_name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).and_then(|d| d.class_name.clone())
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        let Some(data) = self.nodes.get_mut(&node) else {
            return;
        };
        match &mut data.class_name {
            Some(existing) if existing.split_whitespace().any(|c| c == class) => return,
            Some(existing) => {
                existing.push(' ');
                existing.push_str(class);
            }
            None => data.class_name = Some(class.to_owned()),
        }
        self.touch();
    }

    fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|d| d.children.clone())
            .unwrap_or_default()
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|d| d.parent)
    }

    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        if !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&node) {
            return;
        }
        if node == parent || self.is_ancestor(node, parent) {
            tracing::warn!(%parent, %node, "refusing to insert a node under itself");
            return;
        }
        // Inserting a child before itself leaves it where it is.
        if reference == Some(node) && self.parent_of(node) == Some(parent) {
            return;
        }
        self.detach(node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            let index = reference
                .and_then(|r| p.children.iter().position(|c| *c == r))
                .unwrap_or(p.children.len());
            p.children.insert(index, node);
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = Some(parent);
        }
        self.touch();
    }

    fn remove_child(&mut self, parent: NodeId, node: NodeId) {
        if self.parent_of(node) == Some(parent) {
            self.detach(node);
            self.touch();
        }
    }

    fn is_attached(&self, node: NodeId) -> bool {
        node == self.root || self.is_ancestor(self.root, node)
    }

    fn set_presentation_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(data) = self.nodes.get_mut(&node) {
            data.visible = visible;
            self.touch();
        }
    }

    fn set_markup(&mut self, node: NodeId, markup: &str) {
        if !self.nodes.contains_key(&node) {
            return;
        }
        self.drop_children(node);
        if let Some(data) = self.nodes.get_mut(&node) {
            data.markup = markup.to_owned();
        }
        self.touch();
    }

    fn clear_children(&mut self, node: NodeId) {
        if !self.nodes.contains_key(&node) {
            return;
        }
        self.drop_children(node);
        if let Some(data) = self.nodes.get_mut(&node) {
            data.markup.clear();
        }
        self.touch();
    }

    fn purge_listeners(&mut self, node: NodeId, recursive: bool) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(data) = self.nodes.get_mut(&current) else {
                continue;
            };
            data.listeners = 0;
            if recursive {
                stack.extend(data.children.iter().copied());
            }
        }
    }
}

impl ResizePlatform for MemoryDocument {
    fn capabilities(&self) -> PlatformCaps {
        self.caps
    }

    fn install_detector(&mut self) -> DetectorHandle {
        let root = self.root;
        let node = self.append_new(root, None, Some(DETECTOR_CLASS));
        let handle = DetectorHandle::from_raw(node.get());
        self.detectors.push(Detector {
            handle,
            node,
            listeners: Vec::new(),
            realigned: 0,
        });
        tracing::debug!(%handle, %node, "detector region attached");
        handle
    }

    fn on_detector_signal(&mut self, detector: DetectorHandle, callback: SignalCallback) {
        if let Some(d) = self.detectors.iter_mut().find(|d| d.handle == detector) {
            d.listeners.push(callback);
        }
    }

    fn realign_detector(&mut self, detector: DetectorHandle) {
        if let Some(d) = self.detectors.iter_mut().find(|d| d.handle == detector) {
            d.realigned += 1;
        }
    }
}

/// Simulate a font/zoom change: invoke every detector listener.
///
/// The document borrow is released before any listener runs, so listeners
/// may borrow the document again. Returns the number of listeners invoked.
pub fn fire_resize(doc: &Rc<RefCell<MemoryDocument>>) -> usize {
    let listeners: Vec<SignalCallback> = doc
        .borrow()
        .detectors
        .iter()
        .flat_map(|d| d.listeners.iter().cloned())
        .collect();
    for listener in &listeners {
        listener();
    }
    listeners.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_before_reference_and_move() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let parent = doc.append_new(root, Some("panel"), None);
        let a = doc.append_new(parent, None, Some("a"));
        let b = doc.create_element(None, Some("b"));
        doc.insert_before(parent, b, Some(a));
        assert_eq!(doc.children_of(parent), vec![b, a]);

        let other = doc.append_new(root, None, Some("other"));
        doc.append_child(other, b);
        assert_eq!(doc.children_of(parent), vec![a]);
        assert_eq!(doc.parent_of(b), Some(other));
    }

    #[test]
    fn insert_before_itself_keeps_position() {
        let mut doc = MemoryDocument::new();
        let parent = doc.create_element(Some("offscreen"), None);
        let a = doc.append_new(parent, None, Some("a"));
        let b = doc.append_new(parent, None, Some("b"));
        let mutations = doc.mutation_count();
        doc.insert_before(parent, a, Some(a));
        assert_eq!(doc.children_of(parent), vec![a, b]);
        assert_eq!(doc.mutation_count(), mutations);
    }

    #[test]
    fn attachment_follows_ancestry() {
        let mut doc = MemoryDocument::new();
        let loose = doc.create_element(Some("x"), None);
        let child = doc.create_element(None, None);
        doc.append_child(loose, child);
        assert!(!doc.is_attached(child));
        assert_eq!(doc.find_by_identifier("x"), None);
        let root = doc.root();
        doc.append_child(root, loose);
        assert!(doc.is_attached(child));
        assert_eq!(doc.find_by_identifier("x"), Some(loose));
    }

    #[test]
    fn cycles_are_refused() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let a = doc.append_new(root, None, None);
        let b = doc.append_new(a, None, None);
        let before = doc.mutation_count();
        doc.append_child(b, a);
        doc.append_child(a, a);
        assert_eq!(doc.mutation_count(), before);
        assert_eq!(doc.parent_of(a), Some(root));
    }

    #[test]
    fn outline_shows_shape() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let panel = doc.append_new(root, Some("panel"), Some("module"));
        let hd = doc.append_new(panel, None, Some("hd"));
        doc.set_markup(hd, "Title");
        let bd = doc.append_new(panel, None, Some("bd"));
        doc.set_presentation_visible(bd, false);
        doc.add_class(panel, "wide");
        doc.add_class(panel, "wide");
        assert_eq!(
            doc.outline(panel),
            "#panel.module.wide\n  .hd \"Title\"\n  .bd [hidden]\n"
        );
    }

    #[test]
    fn purge_listeners_recurses_on_request() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let a = doc.append_new(root, None, None);
        let b = doc.append_new(a, None, None);
        doc.add_listener(a);
        doc.add_listener(b);
        doc.purge_listeners(a, false);
        assert_eq!((doc.listener_count(a), doc.listener_count(b)), (0, 1));
        doc.purge_listeners(a, true);
        assert_eq!(doc.listener_count(b), 0);
    }

    #[test]
    fn fire_resize_releases_borrow_before_callbacks() {
        let doc = MemoryDocument::new().shared();
        let handle = doc.borrow_mut().install_detector();
        let inner = Rc::clone(&doc);
        doc.borrow_mut().on_detector_signal(
            handle,
            Rc::new(move || inner.borrow_mut().realign_detector(handle)),
        );
        assert_eq!(fire_resize(&doc), 1);
        assert_eq!(doc.borrow().realign_count(), 1);
        let node = doc.borrow().detector_node(handle).unwrap();
        assert!(doc.borrow().is_attached(node));
    }
}
