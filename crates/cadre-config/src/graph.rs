#![forbid(unsafe_code)]

//! Supersedes dependency graph.
//!
//! An edge `P -> Q` means "P supersedes Q": when both are applied in one
//! batch, Q's handler runs before P's. Edges may point at keys that are not
//! registered yet.
//!
//! # Invariants
//!
//! 1. The graph is acyclic: [`SupersedesGraph::check`] rejects any insertion
//!    that would close a cycle, including a key superseding itself.
//! 2. [`SupersedesGraph::order`] is a permutation of its input.
//! 3. Ordering follows edges transitively, also through keys that are not in
//!    the batch.
//! 4. Keys with no ordering relation keep their batch order.
//!
//! # Complexity
//!
//! | Operation | Time |
//! |-----------|------|
//! | check | O(V+E) |
//! | order | O(n·(V+E)) for a batch of n keys |

use std::collections::{HashMap, HashSet};

/// Directed "supersedes" edges between property keys.
#[derive(Debug, Clone, Default)]
pub struct SupersedesGraph {
    edges: HashMap<String, Vec<String>>,
}

impl SupersedesGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys directly superseded by `key`.
    #[must_use]
    pub fn supersedes(&self, key: &str) -> &[String] {
        self.edges.get(key).map_or(&[], Vec::as_slice)
    }

    /// Verify that giving `key` the edges `targets` keeps the graph acyclic.
    ///
    /// On failure returns the cycle as a path starting and ending at `key`.
    pub fn check(&self, key: &str, targets: &[String]) -> Result<(), Vec<String>> {
        for target in targets {
            if target == key {
                return Err(vec![key.to_owned(), key.to_owned()]);
            }
            let mut path = vec![key.to_owned()];
            let mut visited = HashSet::new();
            if self.path_to(target, key, &mut visited, &mut path) {
                return Err(path);
            }
        }
        Ok(())
    }

    /// Record the edges of `key`, replacing earlier ones.
    pub fn insert(&mut self, key: &str, targets: Vec<String>) {
        self.edges.insert(key.to_owned(), targets);
    }

    /// Remove every edge.
    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// Order `batch` so that superseded keys come before the keys that
    /// supersede them. Ties keep batch order.
    #[must_use]
    pub fn order(&self, batch: &[String]) -> Vec<String> {
        let members: HashSet<&str> = batch.iter().map(String::as_str).collect();
        // For each key, the batch members that must run before it.
        let before: Vec<HashSet<&str>> = batch
            .iter()
            .map(|key| {
                let mut found = HashSet::new();
                let mut seen = HashSet::new();
                self.collect_reachable(key, &members, &mut seen, &mut found);
                found.remove(key.as_str());
                found
            })
            .collect();

        let mut emitted: HashSet<&str> = HashSet::with_capacity(batch.len());
        let mut done = vec![false; batch.len()];
        let mut ordered = Vec::with_capacity(batch.len());

        while ordered.len() < batch.len() {
            let ready = (0..batch.len()).find(|&i| {
                !done[i] && before[i].iter().all(|dep| emitted.contains(dep))
            });
            // The graph is acyclic, so some key is always ready; fall back to
            // batch order rather than loop forever if that is ever violated.
            let next = ready.unwrap_or_else(|| done.iter().position(|d| !d).unwrap_or(0));
            done[next] = true;
            emitted.insert(batch[next].as_str());
            ordered.push(batch[next].clone());
        }
        ordered
    }

    fn path_to(
        &self,
        from: &str,
        goal: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> bool {
        path.push(from.to_owned());
        if from == goal {
            return true;
        }
        if visited.insert(from.to_owned()) {
            for next in self.supersedes(from) {
                if self.path_to(next, goal, visited, path) {
                    return true;
                }
            }
        }
        path.pop();
        false
    }

    fn collect_reachable<'a>(
        &'a self,
        from: &'a str,
        members: &HashSet<&'a str>,
        seen: &mut HashSet<&'a str>,
        found: &mut HashSet<&'a str>,
    ) {
        for next in self.supersedes(from) {
            let next = next.as_str();
            if !seen.insert(next) {
                continue;
            }
            if let Some(member) = members.get(next) {
                found.insert(*member);
            }
            self.collect_reachable(next, members, seen, found);
        }
    }
}
