#![forbid(unsafe_code)]

//! The container module: lifecycle, configuration wiring and slot
//! reconciliation.
//!
//! # Design
//!
//! A [`Module`] is split in two so configuration handlers can mutate the
//! component while the store that dispatches them is borrowed:
//!
//! - [`ModuleCore`] holds everything handlers touch (host, container, slots,
//!   events, lifecycle state, resize registration).
//! - The module owns a `ConfigStore<ModuleCore<H>>` beside the core and passes
//!   `&mut core` into every store call.
//!
//! The host tree is shared (`Rc<RefCell<H>>`). The core never holds a host
//! borrow while firing an event, so subscribers may inspect the document.
//!
//! # Invariants
//!
//! 1. The container identity never changes after init.
//! 2. At most one header, body and footer are tracked; once assigned a slot
//!    is only replaced by `destroy`.
//! 3. Slot setters never attach anything to the live document; only
//!    `render` does.
//! 4. `render` only touches slots that are neither attached nor already
//!    children of the render container, so rendering twice leaves the tree
//!    unchanged.
//! 5. The store is deferred from init until the first render. Writes made in
//!    between coalesce and are flushed by that render, after reconciliation
//!    and before `render` fires; later renders flush nothing.
//! 6. After `destroy` no event of the module has subscribers except those
//!    added later, and every operation is a logged no-op.
//!
//! # Failure Modes
//!
//! | Mode | Condition | Behavior |
//! |------|-----------|----------|
//! | Detached render | No target, container outside the document | `Err(RenderPrecondition)`, `render` not fired, tree untouched |
//! | Missing target | Identifier matches nothing | `Err(TargetNotFound)`, tree untouched |
//! | Bad configuration | Validator or unknown key | `Err(Config(..))`, values unchanged |
//! | Use after destroy | Any operation | Warned and ignored, `render` returns `Err(Destroyed)` |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use cadre_config::{ConfigBatch, ConfigStore, PropertyChange, PropertySpec, validators};
use cadre_core::event::{Event, Fired, Listener, ScopeId, SubscriptionId};
use cadre_core::host::{HostTree, NodeId, Target};
use cadre_core::provider::EventProvider;
use cadre_core::slot::{CONTAINER_MARKER, SlotContent, SlotKind, Slots};
use cadre_runtime::{RegisterOutcome, ResizeNotice, ResizeRegistry, TEXT_RESIZE_EVENT};

use crate::error::ModuleError;
use crate::lifecycle::{LifecycleEvent, LifecycleState, Notice, Transition};
use crate::options::ModuleOptions;

/// Key of the `visible` property.
pub const VISIBLE: &str = "visible";
/// Key of the `effect` property.
pub const EFFECT: &str = "effect";
/// Key of the `monitorresize` property.
pub const MONITOR_RESIZE: &str = "monitorresize";

/// Handler key modules register with the resize monitor.
pub const RESIZE_HANDLER_KEY: &str = "module.textResize";

/// State shared between a module and its configuration handlers.
pub struct ModuleCore<H> {
    id: String,
    scope: ScopeId,
    host: Rc<RefCell<H>>,
    container: NodeId,
    slots: Slots,
    events: EventProvider<Notice>,
    state: LifecycleState,
    resize: Option<Rc<dyn ResizeRegistry>>,
    text_resize: Event<ResizeNotice>,
}

impl<H> fmt::Debug for ModuleCore<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCore")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("container", &self.container)
            .field("slots", &self.slots)
            .field("state", &self.state)
            .field("resize", &self.resize.is_some())
            .finish()
    }
}

impl<H: HostTree + 'static> ModuleCore<H> {
    /// Container identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[must_use]
    pub fn slot(&self, kind: SlotKind) -> Option<NodeId> {
        self.slots.get(kind)
    }

    #[must_use]
    pub fn host(&self) -> &Rc<RefCell<H>> {
        &self.host
    }

    /// Fire `event` with `notice`. Returns the number of subscribers invoked.
    pub fn fire(&self, notice: Notice) -> usize {
        self.events
            .fire_event(notice.event.as_str(), &notice)
            .unwrap_or(0)
    }

    /// Fire `before`, run `mutate`, fire `after`.
    pub fn transition(
        &mut self,
        before: LifecycleEvent,
        after: LifecycleEvent,
        mutate: impl FnOnce(&mut Self),
    ) {
        self.fire(Notice::new(before));
        mutate(self);
        self.fire(Notice::new(after));
    }

    /// Move the state machine; invalid transitions are logged and ignored.
    pub fn advance(&mut self, transition: Transition) {
        match self.state.apply(transition) {
            Some(next) => {
                if next != self.state {
                    tracing::debug!(module = %self.id, from = ?self.state, to = ?next, "lifecycle");
                }
                self.state = next;
            }
            None => {
                tracing::warn!(module = %self.id, state = ?self.state, ?transition, "transition rejected");
            }
        }
    }

    /// Handler of `visible`: toggle presentation, bracketed by
    /// `beforeShow`/`show` or `beforeHide`/`hide` once rendered.
    pub fn config_visible(core: &mut Self, change: &PropertyChange) {
        let visible = change.as_bool().unwrap_or(true);
        let container = core.container;
        if !core.state.is_rendered() {
            core.host.borrow_mut().set_presentation_visible(container, visible);
            return;
        }
        let (before, after, transition) = if visible {
            (LifecycleEvent::BeforeShow, LifecycleEvent::Show, Transition::Show)
        } else {
            (LifecycleEvent::BeforeHide, LifecycleEvent::Hide, Transition::Hide)
        };
        core.transition(before, after, |core| {
            core.host.borrow_mut().set_presentation_visible(container, visible);
            core.advance(transition);
        });
    }

    /// Handler of `monitorresize`: join or leave the shared resize monitor.
    pub fn config_monitor_resize(core: &mut Self, change: &PropertyChange) {
        let Some(registry) = core.resize.clone() else {
            tracing::trace!(module = %core.id, "no resize monitor");
            return;
        };
        if change.as_bool().unwrap_or(false) {
            let text_resize = core.text_resize.clone();
            let outcome = registry.register(
                core.scope,
                RESIZE_HANDLER_KEY,
                Rc::new(move |notice: &ResizeNotice| {
                    text_resize.fire(notice);
                }),
            );
            if outcome == RegisterOutcome::Unavailable {
                tracing::debug!(module = %core.id, "resize monitoring unavailable");
            }
        } else {
            registry.unregister(core.scope, RESIZE_HANDLER_KEY);
        }
    }

    fn ensure_slot(&mut self, kind: SlotKind) -> NodeId {
        if let Some(node) = self.slots.get(kind) {
            return node;
        }
        let node = self
            .host
            .borrow_mut()
            .create_element(None, Some(kind.marker()));
        self.slots.set(kind, node);
        node
    }

    fn notify_slot_change(&self, kind: SlotKind, content: SlotContent) {
        self.fire(Notice::new(LifecycleEvent::for_slot(kind)).with_content(content.clone()));
        self.fire(Notice::new(LifecycleEvent::ChangeContent).with_content(content));
    }

    /// Slots already in the live document or already under `into` are
    /// left where they are.
    fn reconcile(&self, into: NodeId) {
        let mut host = self.host.borrow_mut();
        let placed = |host: &H, slot: NodeId| {
            host.parent_of(slot) == Some(into) || host.is_attached(slot)
        };
        if let Some(header) = self.slots.get(SlotKind::Header) {
            if !placed(&*host, header) {
                let first = host.first_child(into);
                host.insert_before(into, header, first);
            }
        }
        if let Some(body) = self.slots.get(SlotKind::Body) {
            if !placed(&*host, body) {
                let footer = self
                    .slots
                    .get(SlotKind::Footer)
                    .filter(|footer| host.is_ancestor(into, *footer));
                host.insert_before(into, body, footer);
            }
        }
        if let Some(footer) = self.slots.get(SlotKind::Footer) {
            if !placed(&*host, footer) {
                host.append_child(into, footer);
            }
        }
    }
}

/// A container component with header/body/footer slots.
///
/// # Example
///
/// ```
/// use cadre_harness::MemoryDocument;
/// use cadre_widgets::{Module, ModuleOptions};
///
/// let doc = MemoryDocument::new().shared();
/// let mut module = Module::new(doc.clone(), "panel", ModuleOptions::new()).unwrap();
/// module.set_header("Title");
/// module.set_body("Hello");
/// let root = doc.borrow().root();
/// module.render(Some(root.into())).unwrap();
/// assert_eq!(
///     doc.borrow().outline(module.container()),
///     "#panel.module\n  .hd \"Title\"\n  .bd \"Hello\"\n"
/// );
/// ```
pub struct Module<H: HostTree + 'static> {
    core: ModuleCore<H>,
    cfg: ConfigStore<ModuleCore<H>>,
}

impl<H: HostTree + 'static> fmt::Debug for Module<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("core", &self.core)
            .field("cfg", &self.cfg)
            .finish()
    }
}

impl<H: HostTree + 'static> fmt::Display for Module<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module {}", self.core.id)
    }
}

impl<H: HostTree + 'static> Module<H> {
    /// Build and initialize a module around `target`.
    ///
    /// An identifier that matches no node creates a detached container with
    /// that identifier. Fails only when the initial configuration is rejected.
    pub fn new(
        host: Rc<RefCell<H>>,
        target: impl Into<Target>,
        options: ModuleOptions,
    ) -> Result<Self, ModuleError> {
        let ModuleOptions {
            config,
            resize,
            listeners,
        } = options;
        let scope = ScopeId::next();

        let mut events = EventProvider::new(Some(scope));
        for event in LifecycleEvent::ALL {
            events.create_event(event.as_str());
        }
        for (event, callback) in listeners {
            events.subscribe(event.as_str(), Listener::new(), move |fired| callback(fired));
        }
        events.fire_event(
            LifecycleEvent::BeforeInit.as_str(),
            &Notice::new(LifecycleEvent::BeforeInit),
        );

        let mut cfg = ConfigStore::new(Some(scope));
        cfg.set_deferred(true);

        let (container, id, slots) = {
            let mut tree = host.borrow_mut();
            let container = match target.into() {
                Target::Node(node) => node,
                Target::Identifier(identifier) => tree.resolve_or_create(&identifier),
            };
            let id = tree
                .identifier_of(container)
                .unwrap_or_else(|| format!("cadre-{}", scope.get()));
            tree.add_class(container, CONTAINER_MARKER);
            let children: Vec<(NodeId, Option<String>)> = tree
                .children_of(container)
                .into_iter()
                .map(|child| (child, tree.class_name(child)))
                .collect();
            let slots = Slots::discover(children.iter().map(|(n, c)| (*n, c.as_deref())));
            (container, id, slots)
        };

        let mut module = Self {
            core: ModuleCore {
                id,
                scope,
                host,
                container,
                slots,
                events,
                state: LifecycleState::Unattached,
                resize,
                text_resize: Event::with_owner(TEXT_RESIZE_EVENT, scope),
            },
            cfg,
        };
        module.init_default_config()?;
        module.cfg.apply_config(&config, true)?;
        module.core.advance(Transition::Init);
        tracing::debug!(module = %module.core.id, container = %container, "initialized");
        module.core.fire(Notice::new(LifecycleEvent::Init));
        Ok(module)
    }

    fn init_default_config(&mut self) -> Result<(), ModuleError> {
        self.cfg.add_property(
            VISIBLE,
            PropertySpec::new()
                .value(true)
                .validator(validators::is_boolean)
                .handler(ModuleCore::<H>::config_visible),
        )?;
        self.cfg.add_property(
            EFFECT,
            PropertySpec::new()
                .suppress_event(true)
                .supersedes([VISIBLE]),
        )?;
        self.cfg.add_property(
            MONITOR_RESIZE,
            PropertySpec::new()
                .value(true)
                .validator(validators::is_boolean)
                .handler(ModuleCore::<H>::config_monitor_resize),
        )?;
        Ok(())
    }

    /// Container identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.core.id
    }

    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.core.scope
    }

    #[must_use]
    pub fn container(&self) -> NodeId {
        self.core.container
    }

    #[must_use]
    pub fn header(&self) -> Option<NodeId> {
        self.core.slots.get(SlotKind::Header)
    }

    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.core.slots.get(SlotKind::Body)
    }

    #[must_use]
    pub fn footer(&self) -> Option<NodeId> {
        self.core.slots.get(SlotKind::Footer)
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.core.state
    }

    #[must_use]
    pub fn core(&self) -> &ModuleCore<H> {
        &self.core
    }

    /// Read access to the configuration store.
    #[must_use]
    pub fn config(&self) -> &ConfigStore<ModuleCore<H>> {
        &self.cfg
    }

    /// Whether configuration writes are still queued for the first render.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        self.cfg.is_deferred()
    }

    /// Current value of `visible`.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.cfg.get_bool(VISIBLE).unwrap_or(false)
    }

    fn guard(&self, operation: &str) -> bool {
        if self.core.state.is_destroyed() {
            tracing::warn!(module = %self.core.id, operation, "ignored on destroyed module");
            return false;
        }
        true
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Handle to one of the module's events.
    #[must_use]
    pub fn event(&self, event: LifecycleEvent) -> Option<Event<Notice>> {
        self.core.events.event(event.as_str())
    }

    pub fn subscribe(
        &self,
        event: LifecycleEvent,
        callback: impl Fn(&Fired<'_, Notice>) + 'static,
    ) -> Option<SubscriptionId> {
        self.subscribe_with(event, Listener::new(), callback)
    }

    pub fn subscribe_with(
        &self,
        event: LifecycleEvent,
        listener: Listener,
        callback: impl Fn(&Fired<'_, Notice>) + 'static,
    ) -> Option<SubscriptionId> {
        if !self.guard("subscribe") {
            return None;
        }
        self.core.events.subscribe(event.as_str(), listener, callback)
    }

    pub fn unsubscribe(&self, event: LifecycleEvent, id: SubscriptionId) -> bool {
        self.core.events.unsubscribe(event.as_str(), id)
    }

    /// Per-instance rebroadcast of the shared resize monitor.
    #[must_use]
    pub fn text_resize_event(&self) -> Event<ResizeNotice> {
        self.core.text_resize.clone()
    }

    // ── Configuration ───────────────────────────────────────────────────

    /// Register an additional property (for components built on a module).
    pub fn add_property(
        &mut self,
        key: &str,
        spec: PropertySpec<ModuleCore<H>>,
    ) -> Result<(), ModuleError> {
        self.cfg.add_property(key, spec).map_err(ModuleError::from)
    }

    /// Write one property. Before the first render the write is queued.
    pub fn set_property(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ModuleError> {
        if !self.guard("set_property") {
            return Ok(());
        }
        self.cfg
            .set_property(&mut self.core, key, value)
            .map_err(ModuleError::from)
    }

    #[must_use]
    pub fn get_property(&self, key: &str) -> Option<Value> {
        self.cfg.get_property(key).cloned()
    }

    /// Apply a batch of writes in supersedes order.
    ///
    /// Before the first render the batch is queued; afterwards it is flushed
    /// immediately.
    pub fn configure(&mut self, batch: &ConfigBatch) -> Result<(), ModuleError> {
        if !self.guard("configure") {
            return Ok(());
        }
        self.cfg.apply_config(batch, false)?;
        if !self.cfg.is_deferred() {
            self.cfg.fire_queue(&mut self.core);
        }
        Ok(())
    }

    pub fn show(&mut self) -> Result<(), ModuleError> {
        self.set_property(VISIBLE, true)
    }

    pub fn hide(&mut self) -> Result<(), ModuleError> {
        self.set_property(VISIBLE, false)
    }

    // ── Slots ───────────────────────────────────────────────────────────

    /// Replace the content of a slot, creating the slot on first use.
    pub fn set_slot(&mut self, kind: SlotKind, content: impl Into<SlotContent>) {
        if !self.guard("set_slot") {
            return;
        }
        let content = content.into();
        let slot = self.core.ensure_slot(kind);
        {
            let mut host = self.core.host.borrow_mut();
            match &content {
                SlotContent::Markup(markup) => host.set_markup(slot, markup),
                SlotContent::Node(node) => {
                    host.clear_children(slot);
                    host.append_child(slot, *node);
                }
            }
        }
        self.core.notify_slot_change(kind, content);
    }

    /// Append a node to a slot, creating the slot on first use.
    pub fn append_to_slot(&mut self, kind: SlotKind, node: NodeId) {
        if !self.guard("append_to_slot") {
            return;
        }
        let slot = self.core.ensure_slot(kind);
        self.core.host.borrow_mut().append_child(slot, node);
        self.core.notify_slot_change(kind, SlotContent::Node(node));
    }

    pub fn set_header(&mut self, content: impl Into<SlotContent>) {
        self.set_slot(SlotKind::Header, content);
    }

    pub fn append_to_header(&mut self, node: NodeId) {
        self.append_to_slot(SlotKind::Header, node);
    }

    pub fn set_body(&mut self, content: impl Into<SlotContent>) {
        self.set_slot(SlotKind::Body, content);
    }

    pub fn append_to_body(&mut self, node: NodeId) {
        self.append_to_slot(SlotKind::Body, node);
    }

    pub fn set_footer(&mut self, content: impl Into<SlotContent>) {
        self.set_slot(SlotKind::Footer, content);
    }

    pub fn append_to_footer(&mut self, node: NodeId) {
        self.append_to_slot(SlotKind::Footer, node);
    }

    // ── Render / destroy ────────────────────────────────────────────────

    /// Render into the container, attaching it under `target` first when one
    /// is given.
    pub fn render(&mut self, target: Option<Target>) -> Result<(), ModuleError> {
        self.render_into(target, None)
    }

    /// Like [`render`](Self::render), reconciling slots into
    /// `container_override` instead of the module container.
    pub fn render_into(
        &mut self,
        target: Option<Target>,
        container_override: Option<NodeId>,
    ) -> Result<(), ModuleError> {
        if !self.guard("render") {
            return Err(ModuleError::Destroyed {
                module: self.to_string(),
            });
        }
        self.core.fire(Notice::new(LifecycleEvent::BeforeRender));

        let container = self.core.container;
        match target {
            Some(target) => {
                let parent = self.core.host.borrow().resolve(&target);
                let Some(parent) = parent else {
                    tracing::warn!(module = %self.core.id, %target, "render target not found");
                    return Err(ModuleError::TargetNotFound(match target {
                        Target::Identifier(id) => id,
                        Target::Node(node) => node.to_string(),
                    }));
                };
                self.core.host.borrow_mut().append_child(parent, container);
                self.core
                    .fire(Notice::new(LifecycleEvent::Append).with_target(parent));
            }
            None => {
                if !self.core.host.borrow().is_attached(container) {
                    tracing::warn!(module = %self.core.id, "render failed: container not in document");
                    return Err(ModuleError::RenderPrecondition {
                        module: self.to_string(),
                    });
                }
            }
        }

        self.core.reconcile(container_override.unwrap_or(container));
        self.core.advance(Transition::Render);
        if self.cfg.is_deferred() {
            self.cfg.set_deferred(false);
            let flushed = self.cfg.fire_queue(&mut self.core);
            tracing::debug!(module = %self.core.id, flushed, "initial configuration applied");
        }
        self.core.fire(Notice::new(LifecycleEvent::Render));
        Ok(())
    }

    /// Tear the module down and fire `destroy`.
    pub fn destroy(&mut self) {
        if !self.guard("destroy") {
            return;
        }
        let container = self.core.container;
        {
            let mut host = self.core.host.borrow_mut();
            host.purge_listeners(container, true);
            if let Some(parent) = host.parent_of(container) {
                host.remove_child(parent, container);
            }
        }
        self.core.slots.clear();
        self.core
            .events
            .unsubscribe_all_except(&[LifecycleEvent::Destroy.as_str()]);
        if let Some(registry) = self.core.resize.take() {
            registry.unregister_instance(self.core.scope);
        }
        self.core.text_resize.unsubscribe_all();
        self.cfg.destroy();
        self.core.advance(Transition::Destroy);
        tracing::debug!(module = %self.core.id, "destroyed");
        self.core.fire(Notice::new(LifecycleEvent::Destroy));
        if let Some(event) = self.core.events.event(LifecycleEvent::Destroy.as_str()) {
            event.unsubscribe_all();
        }
    }
}
