//! Property-based invariant tests for the configuration store.
//!
//! 1. A flush runs every queued handler exactly once.
//! 2. A superseded key's handler runs before every key that supersedes it,
//!    directly or transitively.
//! 3. The last queued value of a key is the one its handler sees.
//! 4. Rejected writes never change the stored value.
//! 5. Supersedes ordering is a permutation of the batch.

use std::collections::{HashMap, HashSet};

use cadre_config::{ConfigStore, PropertySpec, SupersedesGraph, validators};
use proptest::prelude::*;
use serde_json::{Value, json};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct Log {
    calls: Vec<(String, Value)>,
}

fn key(i: usize) -> String {
    format!("k{i}")
}

/// For each key `i`, a set of lower-numbered keys it supersedes (always acyclic).
fn dag_strategy(max: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max).prop_flat_map(|n| {
        (0..n)
            .map(|i| proptest::collection::vec(0..i.max(1), 0..=i.min(3)))
            .collect::<Vec<_>>()
            .prop_map(|edges| {
                edges
                    .into_iter()
                    .enumerate()
                    .map(|(i, targets)| targets.into_iter().filter(|t| *t < i).collect())
                    .collect()
            })
    })
}

fn build_store(edges: &[Vec<usize>]) -> ConfigStore<Log> {
    let mut store = ConfigStore::new(None);
    for (i, targets) in edges.iter().enumerate() {
        let spec = PropertySpec::new()
            .supersedes(targets.iter().map(|t| key(*t)))
            .handler(|log: &mut Log, change| {
                log.calls.push((change.key.clone(), change.value.clone()));
            });
        store.add_property(&key(i), spec).expect("acyclic by construction");
    }
    store
}

fn reaches(edges: &[Vec<usize>], from: usize, to: usize) -> bool {
    let mut stack = vec![from];
    let mut seen = HashSet::new();
    while let Some(cur) = stack.pop() {
        for &next in &edges[cur] {
            if next == to {
                return true;
            }
            if seen.insert(next) {
                stack.push(next);
            }
        }
    }
    false
}

// ═════════════════════════════════════════════════════════════════════════
// 1–3. Flush ordering, coalescing, last write wins
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn flush_respects_supersedes_and_coalesces(
        edges in dag_strategy(8),
        writes in proptest::collection::vec((0usize..8, 0i64..100), 1..24),
    ) {
        let n = edges.len();
        let mut store = build_store(&edges);
        let mut log = Log::default();
        let mut last: HashMap<String, Value> = HashMap::new();
        for (i, v) in writes {
            let i = i % n;
            store.queue_property(&key(i), v).unwrap();
            last.insert(key(i), json!(v));
        }
        store.fire_queue(&mut log);

        // exactly once each, with the final value
        prop_assert_eq!(log.calls.len(), last.len());
        for (k, v) in &log.calls {
            prop_assert_eq!(last.get(k), Some(v));
        }

        let position: HashMap<&str, usize> = log
            .calls
            .iter()
            .enumerate()
            .map(|(pos, (k, _))| (k.as_str(), pos))
            .collect();
        for p in 0..n {
            for q in 0..n {
                let (Some(pp), Some(pq)) = (position.get(key(p).as_str()), position.get(key(q).as_str())) else {
                    continue;
                };
                if reaches(&edges, p, q) {
                    prop_assert!(pq < pp, "k{q} must run before k{p}");
                }
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Rejected writes never change the stored value
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rejected_writes_leave_value(initial in any::<bool>(), bad in any::<i64>(), text in "[a-z]{0,8}") {
        let mut store: ConfigStore<Log> = ConfigStore::new(None);
        let mut log = Log::default();
        store
            .add_property("visible", PropertySpec::new().value(initial).validator(validators::is_boolean))
            .unwrap();
        prop_assert!(store.set_property(&mut log, "visible", bad).is_err());
        prop_assert!(store.set_property(&mut log, "visible", text).is_err());
        prop_assert_eq!(store.get_bool("visible"), Some(initial));
        prop_assert!(log.calls.is_empty());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Ordering is a permutation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn order_is_a_permutation(edges in dag_strategy(10), picks in proptest::collection::hash_set(0usize..10, 0..10)) {
        let mut graph = SupersedesGraph::new();
        for (i, targets) in edges.iter().enumerate() {
            graph.insert(&key(i), targets.iter().map(|t| key(*t)).collect());
        }
        let batch: Vec<String> = picks.into_iter().map(key).collect();
        let mut ordered = graph.order(&batch);
        let mut expected = batch.clone();
        ordered.sort();
        expected.sort();
        prop_assert_eq!(ordered, expected);
    }
}
