/// The main library module for symgraph
pub mod adapter;
pub mod config;
pub mod error;
pub mod graph;
pub mod merge;
pub mod pipeline;
pub mod processing;
pub mod resolve;
pub mod symbol;
pub mod types;

// Explicit exports for better API clarity
pub use adapter::{ExtractionInput, FactSource, RawFacts, adapt};
pub use config::Settings;
pub use error::{DiagnosticKind, NormalizeDiagnostic, NormalizeError, NormalizeResult};
pub use graph::{
    Direction, FuzzyMatch, GraphIndex, GraphKind, Hotspot, IndexPersistence, NodeMetrics,
    SearchFilter, SharedGraphIndex, TraversalOrder,
};
pub use pipeline::{CancelToken, MethodCallEdge, NormalizedResult, Normalizer, SCHEMA_VERSION};
pub use symbol::{Mixin, Parameter, Provenance, Symbol, symbol_id};
pub use types::{MethodScope, MixinKind, ParamKind, SourceOrigin, SymbolId, SymbolKind, Visibility};
