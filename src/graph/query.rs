//! Query operations over the graph index.
//!
//! All lookups accept either a short name or a fully qualified name; the
//! fqname wins when both keys exist. Traversals carry a visited set so a
//! flagged cycle in the data can never hang a query.

use crate::config::HotspotConfig;
use crate::error::{NormalizeError, NormalizeResult};
use crate::symbol::Symbol;
use crate::types::SymbolKind;
use nucleo_matcher::{
    Config, Matcher, Utf32Str,
    pattern::{CaseMatching, Normalization, Pattern},
};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

use super::index::{Direction, GraphIndex, GraphKind, TraversalOrder};

/// One ranked fuzzy-search result. `score` is normalized to 0.0..=1.0
/// against a perfect self-match of the query.
#[derive(Debug, Clone, Serialize)]
pub struct FuzzyMatch {
    pub name: String,
    pub fqname: String,
    pub kind: SymbolKind,
    pub score: f32,
}

/// Filters applied on top of the substring pattern in `search_symbols`.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub kind: Option<SymbolKind>,
    /// Keep only symbols whose fqname starts with this namespace prefix.
    pub namespace: Option<String>,
    /// Keep only symbols whose file path contains this fragment.
    pub file_pattern: Option<String>,
    pub case_sensitive: bool,
}

/// A symbol flagged by the threshold rules, with the rules that fired.
#[derive(Debug, Clone, Serialize)]
pub struct Hotspot {
    pub fqname: String,
    pub fan_in: usize,
    pub fan_out: usize,
    pub inbound_call_weight: u32,
    pub reasons: Vec<String>,
}

impl GraphIndex {
    /// Exact lookup by short name or fqname. Fqname matches take priority;
    /// for an ambiguous short name the earliest-indexed symbol wins.
    pub fn find_symbol(&self, key: &str) -> Option<&Symbol> {
        let idx = self.node_of(key)?;
        self.nodes[idx].as_ref()
    }

    /// Walk the inheritance chain upward, nearest ancestor first. Stops on
    /// the first repeated node, so a residual cycle terminates cleanly.
    pub fn ancestors_of(&self, key: &str) -> Vec<String> {
        let Some(start) = self.node_of(key) else {
            return Vec::new();
        };
        let mut visited = HashSet::from([start]);
        let mut chain = Vec::new();
        let mut current = start;
        while let Some(&parent) = self.inherits[current].first() {
            if !visited.insert(parent) {
                break;
            }
            chain.push(self.fqname_of(parent).to_string());
            current = parent;
        }
        chain
    }

    /// All transitive subclasses, in breadth-first order.
    pub fn descendants_of(&self, key: &str) -> Vec<String> {
        self.traverse(key, GraphKind::Inheritance, Direction::Incoming, TraversalOrder::BreadthFirst)
    }

    /// Direct dependencies (superclass, mixed-in modules, call targets).
    /// Results are cached until the next mutation.
    pub fn dependencies_of(&self, key: &str) -> Vec<String> {
        self.cached_neighbors(key, Direction::Outgoing)
    }

    /// Direct dependents. Results are cached until the next mutation.
    pub fn dependents_of(&self, key: &str) -> Vec<String> {
        self.cached_neighbors(key, Direction::Incoming)
    }

    fn cached_neighbors(&self, key: &str, direction: Direction) -> Vec<String> {
        let Some(idx) = self.node_of(key) else {
            return Vec::new();
        };
        let fqname = self.fqname_of(idx).to_string();
        let map = match direction {
            Direction::Outgoing => &self.cache.dependencies,
            Direction::Incoming => &self.cache.dependents,
        };
        if let Some(hit) = map.get(&fqname) {
            return hit.clone();
        }
        let adjacency = match direction {
            Direction::Outgoing => &self.depends[idx],
            Direction::Incoming => &self.depended_by[idx],
        };
        let result: Vec<String> = adjacency
            .iter()
            .map(|&target| self.fqname_of(target).to_string())
            .collect();
        map.insert(fqname, result.clone());
        result
    }

    /// Direct callers with their accumulated call frequency, heaviest first.
    pub fn callers_of(&self, key: &str) -> Vec<(String, u32)> {
        let Some(idx) = self.node_of(key) else {
            return Vec::new();
        };
        let mut callers: Vec<(String, u32)> = self.called_by[idx]
            .iter()
            .map(|&(caller, weight)| (self.fqname_of(caller).to_string(), weight))
            .collect();
        callers.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        callers
    }

    /// Enumerate outgoing call chains up to `max_depth` hops. Each chain
    /// starts at the queried symbol; a chain ends at a leaf, at the depth
    /// limit, or where it would revisit one of its own nodes.
    pub fn trace_calls_from(&self, key: &str, max_depth: usize) -> Vec<Vec<String>> {
        let Some(start) = self.node_of(key) else {
            return Vec::new();
        };
        let mut chains = Vec::new();
        let mut stack: Vec<Vec<usize>> = vec![vec![start]];
        while let Some(path) = stack.pop() {
            let tip = *path.last().unwrap_or(&start);
            let depth = path.len() - 1;
            let next: Vec<usize> = if depth >= max_depth {
                Vec::new()
            } else {
                self.calls[tip]
                    .iter()
                    .map(|&(callee, _)| callee)
                    .filter(|callee| !path.contains(callee))
                    .collect()
            };
            if next.is_empty() {
                if path.len() > 1 {
                    chains.push(
                        path.iter()
                            .map(|&idx| self.fqname_of(idx).to_string())
                            .collect(),
                    );
                }
                continue;
            }
            for callee in next.into_iter().rev() {
                let mut extended = path.clone();
                extended.push(callee);
                stack.push(extended);
            }
        }
        chains.sort();
        chains
    }

    /// Substring search over names and fqnames, case-insensitive unless the
    /// filter says otherwise, narrowed by the filter's kind, namespace
    /// prefix, and file fragment.
    pub fn search_symbols(&self, pattern: &str, filter: &SearchFilter) -> Vec<&Symbol> {
        let needle = if filter.case_sensitive {
            pattern.to_string()
        } else {
            pattern.to_lowercase()
        };
        let mut results: Vec<&Symbol> = self
            .iter_symbols()
            .filter(|symbol| {
                let hit = if filter.case_sensitive {
                    symbol.name.contains(&needle) || symbol.fqname.contains(&needle)
                } else {
                    symbol.name.to_lowercase().contains(&needle)
                        || symbol.fqname.to_lowercase().contains(&needle)
                };
                if !hit {
                    return false;
                }
                if let Some(kind) = filter.kind {
                    if symbol.kind != kind {
                        return false;
                    }
                }
                if let Some(namespace) = &filter.namespace {
                    if !symbol.fqname.starts_with(namespace.as_str()) {
                        return false;
                    }
                }
                if let Some(fragment) = &filter.file_pattern {
                    match &symbol.file_path {
                        Some(path) if path.contains(fragment.as_str()) => {}
                        _ => return false,
                    }
                }
                true
            })
            .collect();
        results.sort_by(|a, b| a.fqname.cmp(&b.fqname));
        results
    }

    /// Fuzzy search over symbol names, ranked by similarity. Scores are
    /// normalized against the query matching itself, so `threshold` is a
    /// 0.0..=1.0 fraction. Ties break toward the shorter name, then
    /// lexicographic fqname.
    pub fn fuzzy_search(&self, query: &str, threshold: f32) -> NormalizeResult<Vec<FuzzyMatch>> {
        if query.trim().is_empty() {
            return Err(NormalizeError::InvalidQuery {
                reason: "fuzzy query must not be empty".to_string(),
            });
        }
        let mut matcher = Matcher::new(Config::DEFAULT);
        let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);

        let mut buf = Vec::new();
        let self_score = pattern
            .score(Utf32Str::new(query, &mut buf), &mut matcher)
            .unwrap_or(1)
            .max(1) as f32;

        let mut matches: Vec<FuzzyMatch> = self
            .iter_symbols()
            .filter_map(|symbol| {
                let mut buf = Vec::new();
                let raw = pattern.score(Utf32Str::new(&symbol.name, &mut buf), &mut matcher)?;
                let score = (raw as f32 / self_score).min(1.0);
                (score >= threshold).then(|| FuzzyMatch {
                    name: symbol.name.clone(),
                    fqname: symbol.fqname.clone(),
                    kind: symbol.kind,
                    score,
                })
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.name.len().cmp(&b.name.len()))
                .then_with(|| a.fqname.cmp(&b.fqname))
        });
        Ok(matches)
    }

    /// Generic traversal from a node over one of the four graphs. The start
    /// node itself is not included in the output.
    pub fn traverse(
        &self,
        key: &str,
        graph: GraphKind,
        direction: Direction,
        order: TraversalOrder,
    ) -> Vec<String> {
        let Some(start) = self.node_of(key) else {
            return Vec::new();
        };
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut output = Vec::new();
        while let Some(node) = match order {
            TraversalOrder::BreadthFirst => queue.pop_front(),
            TraversalOrder::DepthFirst => queue.pop_back(),
        } {
            if node != start {
                output.push(self.fqname_of(node).to_string());
            }
            let neighbors = self.neighbors(node, graph, direction);
            match order {
                TraversalOrder::BreadthFirst => {
                    for next in neighbors {
                        if visited.insert(next) {
                            queue.push_back(next);
                        }
                    }
                }
                // reverse so the first-listed neighbor is explored first
                TraversalOrder::DepthFirst => {
                    for next in neighbors.into_iter().rev() {
                        if visited.insert(next) {
                            queue.push_back(next);
                        }
                    }
                }
            }
        }
        output
    }

    /// Shortest path between two symbols over one of the four graphs,
    /// following outgoing edges. Returns the full node sequence including
    /// both endpoints, or None when unreachable.
    pub fn shortest_path(&self, from: &str, to: &str, graph: GraphKind) -> Option<Vec<String>> {
        let start = self.node_of(from)?;
        let goal = self.node_of(to)?;
        if start == goal {
            return Some(vec![self.fqname_of(start).to_string()]);
        }
        let mut previous: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for next in self.neighbors(node, graph, Direction::Outgoing) {
                if next == start || previous.contains_key(&next) {
                    continue;
                }
                previous.insert(next, node);
                if next == goal {
                    let mut path = vec![goal];
                    let mut cursor = goal;
                    while let Some(&back) = previous.get(&cursor) {
                        path.push(back);
                        cursor = back;
                    }
                    path.reverse();
                    return Some(
                        path.into_iter()
                            .map(|idx| self.fqname_of(idx).to_string())
                            .collect(),
                    );
                }
                queue.push_back(next);
            }
        }
        None
    }

    pub fn fan_in(&self, key: &str) -> usize {
        self.metrics_of(key).map(|m| m.fan_in).unwrap_or(0)
    }

    pub fn fan_out(&self, key: &str) -> usize {
        self.metrics_of(key).map(|m| m.fan_out).unwrap_or(0)
    }

    /// Flag symbols whose fan-in, fan-out, or inbound call weight meets the
    /// configured thresholds, highest inbound weight first.
    pub fn hotspots(&self, config: &HotspotConfig) -> Vec<Hotspot> {
        let mut flagged: Vec<Hotspot> = self
            .iter_symbols()
            .filter_map(|symbol| {
                let metrics = self.metrics.get(&symbol.fqname)?;
                let mut reasons = Vec::new();
                if metrics.fan_in >= config.fan_in_threshold {
                    reasons.push(format!("fan_in {} >= {}", metrics.fan_in, config.fan_in_threshold));
                }
                if metrics.fan_out >= config.fan_out_threshold {
                    reasons.push(format!(
                        "fan_out {} >= {}",
                        metrics.fan_out, config.fan_out_threshold
                    ));
                }
                if metrics.inbound_call_weight >= config.call_weight_threshold {
                    reasons.push(format!(
                        "call_weight {} >= {}",
                        metrics.inbound_call_weight, config.call_weight_threshold
                    ));
                }
                if reasons.is_empty() {
                    return None;
                }
                Some(Hotspot {
                    fqname: symbol.fqname.clone(),
                    fan_in: metrics.fan_in,
                    fan_out: metrics.fan_out,
                    inbound_call_weight: metrics.inbound_call_weight,
                    reasons,
                })
            })
            .collect();
        flagged.sort_by(|a, b| {
            b.inbound_call_weight
                .cmp(&a.inbound_call_weight)
                .then_with(|| b.fan_in.cmp(&a.fan_in))
                .then_with(|| a.fqname.cmp(&b.fqname))
        });
        flagged
    }

    fn neighbors(&self, idx: usize, graph: GraphKind, direction: Direction) -> Vec<usize> {
        match (graph, direction) {
            (GraphKind::Inheritance, Direction::Outgoing) => self.inherits[idx].clone(),
            (GraphKind::Inheritance, Direction::Incoming) => self.inherited_by[idx].clone(),
            (GraphKind::Dependency, Direction::Outgoing) => self.depends[idx].clone(),
            (GraphKind::Dependency, Direction::Incoming) => self.depended_by[idx].clone(),
            (GraphKind::Calls, Direction::Outgoing) => {
                self.calls[idx].iter().map(|&(n, _)| n).collect()
            }
            (GraphKind::Calls, Direction::Incoming) => {
                self.called_by[idx].iter().map(|&(n, _)| n).collect()
            }
            (GraphKind::Mixins, Direction::Outgoing) => {
                self.mixes[idx].iter().map(|&(n, _)| n).collect()
            }
            (GraphKind::Mixins, Direction::Incoming) => {
                self.mixed_by[idx].iter().map(|&(n, _)| n).collect()
            }
        }
    }
}
