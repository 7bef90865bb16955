//! The resize monitor driven by the in-memory document.

use std::cell::RefCell;
use std::rc::Rc;

use cadre_core::{HostTree, ScopeId};
use cadre_harness::{DETECTOR_CLASS, MemoryDocument, fire_resize, init_test_logging};
use cadre_runtime::{PlatformCaps, RegisterOutcome, ResizeMonitor, ResizeNotice, ResizeRegistry};
use pretty_assertions::assert_eq;

fn push(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> Rc<dyn Fn(&ResizeNotice)> {
    let log = Rc::clone(log);
    Rc::new(move |notice: &ResizeNotice| log.borrow_mut().push(format!("{tag}@{}", notice.sequence)))
}

#[test]
fn two_instances_each_hear_every_resize_once() {
    init_test_logging();
    let doc = MemoryDocument::new().shared();
    let monitor = ResizeMonitor::with_capabilities(Rc::clone(&doc), PlatformCaps::ZOOM_DETECTION);
    let log = Rc::new(RefCell::new(Vec::new()));
    let (first, second) = (ScopeId::next(), ScopeId::next());

    assert_eq!(monitor.register(first, "textResize", push(&log, "first")), RegisterOutcome::Registered);
    assert_eq!(monitor.register(second, "textResize", push(&log, "second")), RegisterOutcome::Registered);
    assert_eq!(doc.borrow().detector_count(), 1);
    assert_eq!(doc.borrow().detector_listener_count(), 1);

    assert_eq!(fire_resize(&doc), 1);
    assert_eq!(*log.borrow(), vec!["first@1", "second@1"]);
    assert_eq!(doc.borrow().realign_count(), 1);

    monitor.unregister(first, "textResize");
    fire_resize(&doc);
    assert_eq!(*log.borrow(), vec!["first@1", "second@1", "second@2"]);
    assert_eq!(doc.borrow().detector_count(), 1);
}

#[test]
fn detector_region_lives_in_the_document() {
    let doc = MemoryDocument::new().shared();
    let monitor = ResizeMonitor::with_capabilities(Rc::clone(&doc), PlatformCaps::ZOOM_DETECTION);
    monitor.register(ScopeId::next(), "textResize", Rc::new(|_: &ResizeNotice| {}));
    let doc = doc.borrow();
    let root = doc.root();
    let detectors: Vec<_> = doc
        .children_of(root)
        .into_iter()
        .filter(|n| doc.class_name(*n).as_deref() == Some(DETECTOR_CLASS))
        .collect();
    assert_eq!(detectors.len(), 1);
}

#[test]
fn platform_without_zoom_detection_installs_nothing() {
    let doc = MemoryDocument::with_capabilities(PlatformCaps::empty()).shared();
    let monitor = ResizeMonitor::new(Rc::clone(&doc));
    let log = Rc::new(RefCell::new(Vec::new()));
    assert_eq!(
        monitor.register(ScopeId::next(), "textResize", push(&log, "x")),
        RegisterOutcome::Unavailable
    );
    assert_eq!(doc.borrow().detector_count(), 0);
    assert_eq!(fire_resize(&doc), 0);
    assert!(log.borrow().is_empty());
}
