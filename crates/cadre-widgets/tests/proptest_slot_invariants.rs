//! Property-based invariant tests for slot discovery and reconciliation.
//!
//! 1. Discovery tracks the first child carrying each marker.
//! 2. After render every tracked slot is a child of the container.
//! 3. A header created by the module is the container's first child.
//! 4. When the module created the body or the footer, body precedes footer.
//! 5. Rendering a second time changes nothing.
//! 6. Slot writes before render never attach anything.

use std::cell::RefCell;
use std::rc::Rc;

use cadre_core::{HostTree, NodeId, SlotKind};
use cadre_harness::MemoryDocument;
use cadre_widgets::{Module, ModuleOptions};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const TAGS: [Option<&str>; 4] = [Some("hd"), Some("bd"), Some("ft"), None];

struct Fixture {
    doc: Rc<RefCell<MemoryDocument>>,
    panel: NodeId,
    children: Vec<(NodeId, Option<&'static str>)>,
}

fn fixture(tags: &[usize]) -> Fixture {
    let doc = MemoryDocument::new().shared();
    let (panel, children) = {
        let mut d = doc.borrow_mut();
        let root = d.root();
        let panel = d.append_new(root, Some("panel"), None);
        let children = tags
            .iter()
            .map(|t| {
                let tag = TAGS[*t];
                (d.append_new(panel, None, tag), tag)
            })
            .collect();
        (panel, children)
    };
    Fixture {
        doc,
        panel,
        children,
    }
}

fn first_marked(children: &[(NodeId, Option<&str>)], kind: SlotKind) -> Option<NodeId> {
    children
        .iter()
        .find(|(_, tag)| *tag == Some(kind.marker()))
        .map(|(node, _)| *node)
}

fn position(children: &[NodeId], node: NodeId) -> Option<usize> {
    children.iter().position(|c| *c == node)
}

fn layout_strategy() -> impl Strategy<Value = (Vec<usize>, [bool; 3])> {
    (
        proptest::collection::vec(0..TAGS.len(), 0..7),
        any::<[bool; 3]>(),
    )
}

// ═══════════════════════════════════════════════════════════════════════
// Discovery
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn discovery_keeps_first_match((tags, _) in layout_strategy()) {
        let fx = fixture(&tags);
        let module = Module::new(Rc::clone(&fx.doc), fx.panel, ModuleOptions::new()).unwrap();
        for kind in SlotKind::RENDER_ORDER {
            prop_assert_eq!(module.core().slot(kind), first_marked(&fx.children, kind));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Reconciliation
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn render_places_slots_and_is_idempotent((tags, writes) in layout_strategy()) {
        let fx = fixture(&tags);
        let mut module = Module::new(Rc::clone(&fx.doc), fx.panel, ModuleOptions::new()).unwrap();

        let mut created = [false; 3];
        for (i, kind) in SlotKind::RENDER_ORDER.into_iter().enumerate() {
            if writes[i] {
                created[i] = module.core().slot(kind).is_none();
                module.set_slot(kind, kind.as_str());
            }
        }
        {
            let d = fx.doc.borrow();
            for (i, kind) in SlotKind::RENDER_ORDER.into_iter().enumerate() {
                if created[i] {
                    let slot = module.core().slot(kind).unwrap();
                    prop_assert!(!d.is_attached(slot));
                }
            }
        }

        module.render(None).unwrap();
        let children = fx.doc.borrow().children_of(fx.panel);
        let header = module.header();
        let body = module.body();
        let footer = module.footer();

        for slot in [header, body, footer].into_iter().flatten() {
            prop_assert!(position(&children, slot).is_some());
        }
        if created[0] {
            prop_assert_eq!(children.first().copied(), header);
        }
        if let (Some(b), Some(f)) = (body, footer) {
            if created[1] || created[2] {
                prop_assert!(position(&children, b) < position(&children, f));
            }
        }

        let outline = fx.doc.borrow().outline(fx.panel);
        let mutations = fx.doc.borrow().mutation_count();
        module.render(None).unwrap();
        prop_assert_eq!(fx.doc.borrow().outline(fx.panel), outline);
        prop_assert_eq!(fx.doc.borrow().mutation_count(), mutations);
    }
}
