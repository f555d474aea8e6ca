//! Deduplication and multi-source fusion.
//!
//! Symbols are grouped by identity key; duplicates are fused field by field
//! using source precedence, with confidence and first-seen position breaking
//! ties. Deduplicating an already-deduplicated set returns it unchanged.

use crate::symbol::{Provenance, Symbol};
use crate::types::{SymbolId, SymbolKind};
use chrono::Utc;
use std::collections::HashMap;

/// Identity under which duplicates are grouped: the deterministic id,
/// falling back to `(kind, fqname)` when an id is absent (id zero).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum IdentityKey {
    Id(SymbolId),
    KindFqname(SymbolKind, String),
}

fn identity_key(symbol: &Symbol) -> IdentityKey {
    if symbol.id.value() != 0 {
        IdentityKey::Id(symbol.id)
    } else {
        IdentityKey::KindFqname(symbol.kind, symbol.fqname.clone())
    }
}

/// Group symbols by identity and fuse each group of duplicates.
///
/// Output preserves first-seen group order, so the operation is
/// deterministic and idempotent.
pub fn deduplicate(symbols: Vec<Symbol>) -> Vec<Symbol> {
    let mut groups: Vec<Vec<Symbol>> = Vec::new();
    let mut positions: HashMap<IdentityKey, usize> = HashMap::new();

    for symbol in symbols {
        let key = identity_key(&symbol);
        match positions.get(&key) {
            Some(&idx) => groups[idx].push(symbol),
            None => {
                positions.insert(key, groups.len());
                groups.push(vec![symbol]);
            }
        }
    }

    groups
        .into_iter()
        .map(|group| {
            if group.len() == 1 {
                group.into_iter().next().expect("non-empty group")
            } else {
                merge_group(group)
            }
        })
        .collect()
}

/// Rank members best-first: precedence, then confidence, then first-seen.
fn ranked(members: &[Symbol]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..members.len()).collect();
    order.sort_by(|&a, &b| {
        let pa = members[a].provenance.best_origin();
        let pb = members[b].provenance.best_origin();
        pb.cmp(&pa)
            .then(
                members[b]
                    .provenance
                    .confidence
                    .total_cmp(&members[a].provenance.confidence),
            )
            .then(a.cmp(&b))
    });
    order
}

fn union_into(target: &mut Vec<String>, source: &[String]) {
    for item in source {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

fn merge_group(members: Vec<Symbol>) -> Symbol {
    let order = ranked(&members);
    let mut merged = members[order[0]].clone();

    // Scalar fields: a present value is never overridden by an absent one,
    // regardless of precedence.
    for &idx in &order[1..] {
        let other = &members[idx];
        if merged.superclass.is_none() {
            merged.superclass = other.superclass.clone();
        }
        if merged.file_path.is_none() {
            merged.file_path = other.file_path.clone();
        }
        if merged.method.is_none() {
            merged.method = other.method.clone();
        }
        if merged.namespace_path.is_empty() {
            merged.namespace_path = other.namespace_path.clone();
        }
    }

    // List fields: union in first-seen member order, dropping exact dups.
    merged.mixins = {
        let mut mixins = Vec::new();
        for member in &members {
            for mixin in &member.mixins {
                if !mixins.contains(mixin) {
                    mixins.push(mixin.clone());
                }
            }
        }
        mixins
    };
    let mut instance_methods = Vec::new();
    let mut class_methods = Vec::new();
    let mut available_instance = Vec::new();
    let mut available_class = Vec::new();
    let mut inheritance_chain = Vec::new();
    let mut children = Vec::new();
    for member in &members {
        union_into(&mut instance_methods, &member.instance_methods);
        union_into(&mut class_methods, &member.class_methods);
        union_into(&mut available_instance, &member.available_instance_methods);
        union_into(&mut available_class, &member.available_class_methods);
        union_into(&mut inheritance_chain, &member.inheritance_chain);
        union_into(&mut children, &member.children);
    }
    merged.instance_methods = instance_methods;
    merged.class_methods = class_methods;
    merged.available_instance_methods = available_instance;
    merged.available_class_methods = available_class;
    merged.inheritance_chain = inheritance_chain;
    merged.children = children;

    // Provenance: union of sources, max confidence, merge-time timestamp.
    let mut provenance = Provenance {
        sources: Default::default(),
        confidence: 0.0,
        timestamp: Utc::now(),
    };
    for member in &members {
        provenance
            .sources
            .extend(member.provenance.sources.iter().copied());
        if member.provenance.confidence > provenance.confidence {
            provenance.confidence = member.provenance.confidence;
        }
    }
    merged.provenance = provenance;

    merged
}
