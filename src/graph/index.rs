//! Arena-backed graph index.
//!
//! Nodes live in a vector (tombstoned on removal) and edges are index
//! pairs, so cycle walks are bounded by a visited set instead of reference
//! identity. Four graphs are maintained side by side: inheritance,
//! dependency, calls (weighted), and mixins (typed).

use crate::error::{NormalizeError, NormalizeResult};
use crate::pipeline::NormalizedResult;
use crate::symbol::Symbol;
use crate::types::MixinKind;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphKind {
    Inheritance,
    Dependency,
    Calls,
    Mixins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    BreadthFirst,
    DepthFirst,
}

/// Derived per-node metrics, persisted with the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub fan_in: usize,
    pub fan_out: usize,
    /// Total inbound call frequency; the churn proxy for hotspot detection.
    pub inbound_call_weight: u32,
}

/// Lazy per-query caches; rebuilt on demand after load or mutation.
#[derive(Debug, Default)]
pub(crate) struct DepCache {
    pub(crate) dependencies: DashMap<String, Vec<String>>,
    pub(crate) dependents: DashMap<String, Vec<String>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GraphIndex {
    pub(crate) nodes: Vec<Option<Symbol>>,
    pub(crate) by_fqname: HashMap<String, usize>,
    pub(crate) by_name: HashMap<String, Vec<usize>>,

    pub(crate) inherits: Vec<Vec<usize>>,
    pub(crate) inherited_by: Vec<Vec<usize>>,
    pub(crate) depends: Vec<Vec<usize>>,
    pub(crate) depended_by: Vec<Vec<usize>>,
    pub(crate) calls: Vec<Vec<(usize, u32)>>,
    pub(crate) called_by: Vec<Vec<(usize, u32)>>,
    pub(crate) mixes: Vec<Vec<(usize, MixinKind)>>,
    pub(crate) mixed_by: Vec<Vec<(usize, MixinKind)>>,

    /// Residual inheritance cycles found at build time; findable, flagged,
    /// never a crash.
    pub(crate) flagged_cycles: Vec<Vec<String>>,
    pub(crate) metrics: HashMap<String, NodeMetrics>,

    #[serde(skip, default)]
    pub(crate) cache: DepCache,
}

impl GraphIndex {
    /// Build the full index from a finished normalization run.
    pub fn build(result: &NormalizedResult) -> Self {
        let mut index = Self::default();
        for symbol in &result.symbols {
            index.insert_node(symbol.clone());
        }
        for idx in 0..index.nodes.len() {
            index.wire_structural_edges(idx);
        }
        // wire edges directly; cycle checks and metrics run once at the end
        for edge in &result.method_calls {
            if let (Some(from), Some(to)) = (index.node_of(&edge.from), index.node_of(&edge.to)) {
                index.wire_call_edge(from, to, edge.frequency);
            }
        }
        index.flagged_cycles = index.find_inheritance_cycles();
        index.recompute_all_metrics();
        index
    }

    pub fn symbol_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn iter_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.nodes.iter().filter_map(Option::as_ref)
    }

    pub fn flagged_cycles(&self) -> &[Vec<String>] {
        &self.flagged_cycles
    }

    pub fn metrics_of(&self, key: &str) -> Option<NodeMetrics> {
        let idx = self.node_of(key)?;
        let fqname = &self.nodes[idx].as_ref()?.fqname;
        self.metrics.get(fqname).copied()
    }

    /// Resolve a name or fqname to its arena position.
    pub(crate) fn node_of(&self, key: &str) -> Option<usize> {
        if let Some(&idx) = self.by_fqname.get(key) {
            return Some(idx);
        }
        self.by_name.get(key)?.first().copied()
    }

    pub(crate) fn fqname_of(&self, idx: usize) -> &str {
        self.nodes[idx]
            .as_ref()
            .map(|s| s.fqname.as_str())
            .unwrap_or_default()
    }

    fn insert_node(&mut self, symbol: Symbol) -> usize {
        let idx = self.nodes.len();
        self.by_fqname.insert(symbol.fqname.clone(), idx);
        if symbol.name != symbol.fqname {
            self.by_name.entry(symbol.name.clone()).or_default().push(idx);
        }
        self.nodes.push(Some(symbol));
        self.grow_adjacency();
        idx
    }

    fn grow_adjacency(&mut self) {
        let len = self.nodes.len();
        self.inherits.resize_with(len, Vec::new);
        self.inherited_by.resize_with(len, Vec::new);
        self.depends.resize_with(len, Vec::new);
        self.depended_by.resize_with(len, Vec::new);
        self.calls.resize_with(len, Vec::new);
        self.called_by.resize_with(len, Vec::new);
        self.mixes.resize_with(len, Vec::new);
        self.mixed_by.resize_with(len, Vec::new);
    }

    /// Wire inheritance, mixin, and derived dependency edges out of one
    /// node's own fields. Unresolved targets are simply not edges; the
    /// resolution stage already reported them.
    fn wire_structural_edges(&mut self, idx: usize) {
        let Some(symbol) = self.nodes[idx].clone() else {
            return;
        };
        if let Some(superclass) = &symbol.superclass {
            if let Some(parent) = self.node_of(superclass) {
                push_unique(&mut self.inherits[idx], parent);
                push_unique(&mut self.inherited_by[parent], idx);
                self.add_dependency(idx, parent);
            }
        }
        for mixin in &symbol.mixins {
            if let Some(module) = self.node_of(&mixin.module_name) {
                let edge = (module, mixin.kind);
                if !self.mixes[idx].contains(&edge) {
                    self.mixes[idx].push(edge);
                    self.mixed_by[module].push((idx, mixin.kind));
                }
                self.add_dependency(idx, module);
            }
        }
    }

    fn add_dependency(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        push_unique(&mut self.depends[from], to);
        push_unique(&mut self.depended_by[to], from);
    }

    /// Add (or accumulate) a weighted call edge between two resolvable
    /// endpoints. Call edges also count as dependencies.
    pub fn add_call_edge(&mut self, from: &str, to: &str, frequency: u32) -> bool {
        let (Some(from_idx), Some(to_idx)) = (self.node_of(from), self.node_of(to)) else {
            return false;
        };
        self.wire_call_edge(from_idx, to_idx, frequency);
        self.after_mutation();
        true
    }

    fn wire_call_edge(&mut self, from_idx: usize, to_idx: usize, frequency: u32) {
        match self.calls[from_idx].iter_mut().find(|(t, _)| *t == to_idx) {
            Some((_, weight)) => *weight += frequency,
            None => self.calls[from_idx].push((to_idx, frequency)),
        }
        match self.called_by[to_idx].iter_mut().find(|(f, _)| *f == from_idx) {
            Some((_, weight)) => *weight += frequency,
            None => self.called_by[to_idx].push((from_idx, frequency)),
        }
        self.add_dependency(from_idx, to_idx);
    }

    /// Insert a new symbol and wire its structural edges without a rebuild.
    pub fn add_symbol(&mut self, symbol: Symbol) {
        let idx = self.insert_node(symbol);
        self.wire_structural_edges(idx);
        // Existing nodes may reference the newcomer by name.
        for other in 0..self.nodes.len() {
            if other != idx {
                self.wire_structural_edges(other);
            }
        }
        self.after_mutation();
    }

    /// Replace the symbol stored under the same `(kind, fqname)` identity,
    /// rewiring its outgoing edges.
    pub fn update_symbol(&mut self, symbol: Symbol) -> NormalizeResult<()> {
        let Some(&idx) = self.by_fqname.get(&symbol.fqname) else {
            return Err(NormalizeError::SymbolNotFound {
                name: symbol.fqname,
            });
        };
        self.drop_outgoing_edges(idx);
        if let Some(old) = &self.nodes[idx] {
            if old.name != symbol.name {
                self.unindex_name(&old.name.clone(), idx);
                if symbol.name != symbol.fqname {
                    self.by_name.entry(symbol.name.clone()).or_default().push(idx);
                }
            }
        }
        self.nodes[idx] = Some(symbol);
        self.wire_structural_edges(idx);
        // call edges survive an update; restore their dependency edges too
        let callees: Vec<usize> = self.calls[idx].iter().map(|&(callee, _)| callee).collect();
        for callee in callees {
            self.add_dependency(idx, callee);
        }
        self.after_mutation();
        Ok(())
    }

    /// Tombstone a symbol and prune it from every adjacency list and cached
    /// metric.
    pub fn remove_symbol(&mut self, key: &str) -> Option<Symbol> {
        let idx = self.node_of(key)?;
        let symbol = self.nodes[idx].take()?;

        self.by_fqname.remove(&symbol.fqname);
        self.unindex_name(&symbol.name, idx);

        for list in self
            .inherits
            .iter_mut()
            .chain(self.inherited_by.iter_mut())
            .chain(self.depends.iter_mut())
            .chain(self.depended_by.iter_mut())
        {
            list.retain(|&target| target != idx);
        }
        for list in self.calls.iter_mut().chain(self.called_by.iter_mut()) {
            list.retain(|&(target, _)| target != idx);
        }
        for list in self.mixes.iter_mut().chain(self.mixed_by.iter_mut()) {
            list.retain(|&(target, _)| target != idx);
        }
        self.inherits[idx].clear();
        self.inherited_by[idx].clear();
        self.depends[idx].clear();
        self.depended_by[idx].clear();
        self.calls[idx].clear();
        self.called_by[idx].clear();
        self.mixes[idx].clear();
        self.mixed_by[idx].clear();

        self.metrics.remove(&symbol.fqname);
        self.after_mutation();
        Some(symbol)
    }

    fn unindex_name(&mut self, name: &str, idx: usize) {
        if let Some(indices) = self.by_name.get_mut(name) {
            indices.retain(|&i| i != idx);
            if indices.is_empty() {
                self.by_name.remove(name);
            }
        }
    }

    fn drop_outgoing_edges(&mut self, idx: usize) {
        for parent in std::mem::take(&mut self.inherits[idx]) {
            self.inherited_by[parent].retain(|&i| i != idx);
        }
        for target in std::mem::take(&mut self.depends[idx]) {
            self.depended_by[target].retain(|&i| i != idx);
        }
        for (target, _) in std::mem::take(&mut self.mixes[idx]) {
            self.mixed_by[target].retain(|&(i, _)| i != idx);
        }
    }

    fn after_mutation(&mut self) {
        self.cache.dependencies.clear();
        self.cache.dependents.clear();
        self.flagged_cycles = self.find_inheritance_cycles();
        self.recompute_all_metrics();
    }

    pub(crate) fn recompute_all_metrics(&mut self) {
        self.metrics.clear();
        for idx in 0..self.nodes.len() {
            let Some(symbol) = &self.nodes[idx] else {
                continue;
            };
            let inbound_call_weight = self.called_by[idx].iter().map(|&(_, w)| w).sum();
            self.metrics.insert(
                symbol.fqname.clone(),
                NodeMetrics {
                    fan_in: self.depended_by[idx].len(),
                    fan_out: self.depends[idx].len(),
                    inbound_call_weight,
                },
            );
        }
    }

    /// Enumerate residual cycles in the inheritance graph with an iterative
    /// colored DFS. Bad data never crashes the build; the cycles are kept
    /// findable on the index.
    pub(crate) fn find_inheritance_cycles(&self) -> Vec<Vec<String>> {
        cycles_in(&self.inherits, &self.nodes)
    }

    /// Enumerate cycles in the dependency graph.
    pub fn dependency_cycles(&self) -> Vec<Vec<String>> {
        cycles_in(&self.depends, &self.nodes)
    }
}

fn push_unique(list: &mut Vec<usize>, value: usize) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Cycle enumeration over an adjacency list: iterative DFS with
/// white/grey/black coloring; a back edge into the grey stack yields the
/// cycle slice.
fn cycles_in(adjacency: &[Vec<usize>], nodes: &[Option<Symbol>]) -> Vec<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Grey,
        Black,
    }

    let mut color = vec![Color::White; adjacency.len()];
    let mut cycles: Vec<Vec<usize>> = Vec::new();
    let mut seen_cycles: Vec<Vec<usize>> = Vec::new();

    for start in 0..adjacency.len() {
        if nodes[start].is_none() || color[start] != Color::White {
            continue;
        }
        // stack of (node, next-child cursor)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        color[start] = Color::Grey;

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            if frame.1 < adjacency[node].len() {
                let child = adjacency[node][frame.1];
                frame.1 += 1;
                if nodes[child].is_none() {
                    continue;
                }
                match color[child] {
                    Color::White => {
                        color[child] = Color::Grey;
                        stack.push((child, 0));
                    }
                    Color::Grey => {
                        let pos = stack.iter().position(|&(n, _)| n == child).unwrap_or(0);
                        let mut cycle: Vec<usize> =
                            stack[pos..].iter().map(|&(n, _)| n).collect();
                        let mut canonical = cycle.clone();
                        canonical.sort_unstable();
                        if !seen_cycles.contains(&canonical) {
                            seen_cycles.push(canonical);
                            // rotate so the smallest index leads, for
                            // deterministic output
                            if let Some(min_pos) =
                                cycle.iter().enumerate().min_by_key(|&(_, &n)| n).map(|(p, _)| p)
                            {
                                cycle.rotate_left(min_pos);
                            }
                            cycles.push(cycle);
                        }
                    }
                    Color::Black => {}
                }
            } else {
                color[node] = Color::Black;
                stack.pop();
            }
        }
    }

    cycles
        .into_iter()
        .map(|cycle| {
            cycle
                .into_iter()
                .map(|idx| {
                    nodes[idx]
                        .as_ref()
                        .map(|s| s.fqname.clone())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}
