//! Graph index and query engine over the normalized symbol set.

mod index;
mod persistence;
mod query;

pub use index::{Direction, GraphIndex, GraphKind, NodeMetrics, TraversalOrder};
pub use persistence::IndexPersistence;
pub use query::{FuzzyMatch, Hotspot, SearchFilter};

use parking_lot::RwLock;
use std::sync::Arc;

/// Single-writer/multiple-reader wrapper for concurrent query access.
///
/// Queries clone out their results under a read lock; mutation and rebuild
/// take the write lock.
#[derive(Clone)]
pub struct SharedGraphIndex {
    inner: Arc<RwLock<GraphIndex>>,
}

impl SharedGraphIndex {
    pub fn new(index: GraphIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&GraphIndex) -> R) -> R {
        f(&self.inner.read())
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut GraphIndex) -> R) -> R {
        f(&mut self.inner.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;
    use crate::types::SymbolKind;

    #[test]
    fn test_shared_index_read_write() {
        let shared = SharedGraphIndex::new(GraphIndex::default());
        shared.write(|index| {
            index.add_symbol(Symbol::new(SymbolKind::Class, "User", "App::User"));
        });

        let found = shared.read(|index| index.find_symbol("User").cloned());
        assert_eq!(found.unwrap().fqname, "App::User");
    }

    #[test]
    fn test_shared_index_concurrent_reads() {
        let shared = SharedGraphIndex::new(GraphIndex::default());
        shared.write(|index| {
            index.add_symbol(Symbol::new(SymbolKind::Class, "User", "User"));
        });

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared.read(|index| index.find_symbol("User").is_some())
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
