//! Module dependency graph resolution
//!
//! Kahn-style iterative topological sort over insertion-ordered working
//! maps: every round takes the set of nodes with no remaining dependencies,
//! in their original relative order, then subtracts it from everyone else.
//! An empty round with nodes left over means the graph has a cycle; the
//! resolver returns the unresolved remainder marked cyclic and a memoized
//! depth-first walk renders the offending chains.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// A module and the qualified names it depends on.
#[derive(Debug, Clone)]
pub struct DepGraphNode {
    pub name: String,
    pub deps: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DepGraph {
    pub acyclic: bool,
    nodes: Vec<DepGraphNode>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self {
            acyclic: true,
            nodes: Vec::new(),
        }
    }

    pub fn add(&mut self, name: impl Into<String>, deps: Vec<String>) {
        self.nodes.push(DepGraphNode { name: name.into(), deps });
    }

    pub fn nodes(&self) -> &[DepGraphNode] {
        &self.nodes
    }

    /// Compute a total order consistent with the dependencies.
    ///
    /// The returned graph lists every node after all of its dependencies,
    /// keeping the original dependency lists for display. If no progress
    /// can be made the remaining nodes come back with `acyclic == false`
    /// instead of an order.
    pub fn resolve(&self) -> DepGraph {
        let mut node_names: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut node_deps: IndexMap<String, Vec<String>> = IndexMap::new();
        for node in &self.nodes {
            merge_deps(&mut node_names, &node.name, &node.deps);
            merge_deps(&mut node_deps, &node.name, &node.deps);
        }

        let mut resolved = DepGraph::new();
        while !node_deps.is_empty() {
            // Ready set: nodes with no remaining dependencies, in their
            // original relative order.
            let ready: Vec<String> = node_deps
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(name, _)| name.clone())
                .collect();
            if ready.is_empty() {
                let mut cyclic = DepGraph::new();
                cyclic.acyclic = false;
                for name in node_deps.keys() {
                    cyclic.add(name.clone(), node_names.get(name).cloned().unwrap_or_default());
                }
                return cyclic;
            }
            for name in &ready {
                node_deps.shift_remove(name);
                resolved.add(name.clone(), node_names.get(name).cloned().unwrap_or_default());
            }
            for deps in node_deps.values_mut() {
                deps.retain(|dep| !ready.contains(dep));
            }
        }
        resolved
    }

    /// Render the edge list, one ` > name -> dep` line per edge.
    pub fn display(&self) -> String {
        let mut out = Vec::new();
        for node in &self.nodes {
            for dep in &node.deps {
                out.push(format!(" > {} -> {}", node.name, dep));
            }
        }
        out.join("\n")
    }

    /// Render every discovered cycle as a ` > a -> b -> a` chain.
    pub fn display_cycles(&self) -> String {
        let mut finder = CycleFinder {
            names: self
                .nodes
                .iter()
                .map(|node| (node.name.as_str(), node.deps.as_slice()))
                .collect(),
            is_cycle: FxHashMap::default(),
        };
        let mut out = Vec::new();
        for node in &self.nodes {
            if finder.is_cycle.contains_key(&node.name) {
                continue;
            }
            let (seen, chain) = finder.is_part_of_cycle(&node.name, Vec::new());
            if seen {
                out.push(format!(" > {}", chain.join(" -> ")));
            }
        }
        out.join("\n")
    }
}

impl Default for DepGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_deps(map: &mut IndexMap<String, Vec<String>>, name: &str, deps: &[String]) {
    let entry = map.entry(name.to_string()).or_default();
    for dep in deps {
        if !entry.contains(dep) {
            entry.push(dep.clone());
        }
    }
}

/// Memoized cycle membership, so the overall traversal stays linear.
struct CycleFinder<'a> {
    names: FxHashMap<&'a str, &'a [String]>,
    is_cycle: FxHashMap<String, bool>,
}

impl CycleFinder<'_> {
    fn is_part_of_cycle(&mut self, name: &str, already_seen: Vec<String>) -> (bool, Vec<String>) {
        if let Some(&cached) = self.is_cycle.get(name) {
            return (cached, already_seen);
        }

        let mut path = already_seen;
        if path.iter().any(|seen| seen == name) {
            path.push(name.to_string());
            self.is_cycle.insert(name.to_string(), true);
            return (true, path);
        }

        path.push(name.to_string());
        let deps: Vec<String> = self
            .names
            .get(name)
            .map(|deps| deps.to_vec())
            .unwrap_or_default();
        if deps.is_empty() {
            self.is_cycle.insert(name.to_string(), false);
            return (false, path);
        }

        for dep in &deps {
            let (seen, dep_path) = self.is_part_of_cycle(dep, path.clone());
            if seen {
                self.is_cycle.insert(name.to_string(), true);
                return (true, dep_path);
            }
        }
        self.is_cycle.insert(name.to_string(), false);
        (false, path)
    }
}
