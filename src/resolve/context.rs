//! Explicit per-run context owning the symbol arena and its lookup index.
//!
//! Symbols live in a vector; the index maps simple names and fully-qualified
//! names to arena positions. Passing this context to each stage replaces the
//! ambient shared table the data model would otherwise tempt you into.

use crate::pipeline::MethodCallEdge;
use crate::symbol::Symbol;
use crate::types::SymbolKind;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ResolutionContext {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
    pub method_calls: Vec<MethodCallEdge>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol to the arena and index it under its simple name and,
    /// only if different, its fully-qualified name. A colliding key is
    /// overwritten: last write wins at this layer. Merge semantics belong
    /// to the deduplicator, not here.
    pub fn add(&mut self, symbol: Symbol) -> usize {
        let idx = self.symbols.len();
        let name = symbol.name.clone();
        let fqname = symbol.fqname.clone();
        self.symbols.push(symbol);

        self.index.insert(name.clone(), idx);
        if fqname != name {
            self.index.insert(fqname, idx);
        }
        idx
    }

    pub fn find(&self, key: &str) -> Option<&Symbol> {
        self.index.get(key).map(|&idx| &self.symbols[idx])
    }

    pub fn find_idx(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Superclass of the class symbol indexed at `key`, if any.
    pub fn find_parent_class(&self, key: &str) -> Option<&str> {
        let symbol = self.find(key)?;
        if symbol.kind != SymbolKind::Class {
            return None;
        }
        symbol.superclass.as_deref()
    }

    pub fn get(&self, idx: usize) -> &Symbol {
        &self.symbols[idx]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut Symbol {
        &mut self.symbols[idx]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Number of distinct index keys; exposed for the dual-key tests.
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
        self.index.clear();
        self.method_calls.clear();
    }

    /// Hand the arena over to the next stage.
    pub fn into_parts(self) -> (Vec<Symbol>, Vec<MethodCallEdge>) {
        (self.symbols, self.method_calls)
    }
}
