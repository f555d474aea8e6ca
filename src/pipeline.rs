//! The normalization pipeline.
//!
//! One logical sequential job per batch: Adapter → Processors → Resolvers →
//! Deduplicate → Finalize, each stage feeding the next through a mutable
//! `PipelineContext`. Stages are an ordered list of `Stage` objects so the
//! sequence is data, not implicit code order.

use crate::adapter::{ExtractionInput, RawFacts, adapt};
use crate::config::Settings;
use crate::error::{NormalizeDiagnostic, NormalizeError, NormalizeResult};
use crate::merge::deduplicate;
use crate::processing::{RECORD_ORDER, RecordKind, processor_for};
use crate::resolve::{ResolutionContext, default_resolvers};
use crate::symbol::Symbol;
use crate::types::SymbolKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Version of the normalized output schema.
pub const SCHEMA_VERSION: u32 = 1;

/// Cooperative cancellation checked between record-processing units.
///
/// On cancellation the batch returns `NormalizeError::Cancelled` and all
/// partial state is discarded, never partially committed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> NormalizeResult<()> {
        if self.is_cancelled() {
            Err(NormalizeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A resolved call relationship between two method contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCallEdge {
    pub from: String,
    pub to: String,
    pub frequency: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
}

/// Output of one normalization run.
///
/// Immutable once handed to the graph index builder. Collections are
/// ordered case-insensitively by name then fqname; two runs over identical
/// input produce byte-identical ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub symbols: Vec<Symbol>,
    pub method_calls: Vec<MethodCallEdge>,
    pub errors: Vec<NormalizeDiagnostic>,
    pub schema_version: u32,
    pub normalizer_version: String,
    pub normalized_at: DateTime<Utc>,
}

impl NormalizedResult {
    pub fn classes(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.kind == SymbolKind::Class)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.kind == SymbolKind::Module)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.kind == SymbolKind::Method)
    }

    pub fn find(&self, key: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|s| s.fqname == key || s.name == key)
    }
}

/// Mutable state threaded through the stage list.
pub struct PipelineContext {
    pub facts: RawFacts,
    pub resolution: ResolutionContext,
    pub symbols: Vec<Symbol>,
    pub method_calls: Vec<MethodCallEdge>,
    pub errors: Vec<NormalizeDiagnostic>,
    pub cancel: CancelToken,
    pub settings: Arc<Settings>,
}

pub trait Stage {
    fn name(&self) -> &'static str;

    fn run(&self, cx: &mut PipelineContext) -> NormalizeResult<()>;
}

/// Runs one record processor per kind, in `RECORD_ORDER`, populating the
/// symbol index as a side effect.
pub struct ProcessStage;

impl Stage for ProcessStage {
    fn name(&self) -> &'static str {
        "process"
    }

    fn run(&self, cx: &mut PipelineContext) -> NormalizeResult<()> {
        let threshold = cx.settings.normalize.parallel_threshold;
        // scoped pool so the configured thread count actually applies
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cx.settings.normalize.parallel_threads)
            .build()
            .map_err(|e| NormalizeError::Config {
                reason: format!("invalid parallel_threads: {e}"),
            })?;
        pool.install(|| {
            for kind in RECORD_ORDER {
                let records = match kind {
                    RecordKind::Class => std::mem::take(&mut cx.facts.classes),
                    RecordKind::Module => std::mem::take(&mut cx.facts.modules),
                    RecordKind::Method => std::mem::take(&mut cx.facts.methods),
                    RecordKind::MethodCall => std::mem::take(&mut cx.facts.method_calls),
                    RecordKind::Mixin => std::mem::take(&mut cx.facts.mixins),
                };
                if records.is_empty() {
                    continue;
                }
                debug!(kind = kind.as_str(), count = records.len(), "processing records");
                processor_for(kind, threshold).process(
                    &records,
                    &mut cx.resolution,
                    &mut cx.errors,
                    &cx.cancel,
                )?;
            }
            Ok(())
        })
    }
}

/// Runs the four relationship resolvers in their fixed order.
pub struct ResolveStage;

impl Stage for ResolveStage {
    fn name(&self) -> &'static str {
        "resolve"
    }

    fn run(&self, cx: &mut PipelineContext) -> NormalizeResult<()> {
        for resolver in default_resolvers() {
            cx.cancel.check()?;
            debug!(resolver = resolver.name(), "resolving relationships");
            resolver.resolve(&mut cx.resolution, &mut cx.errors);
        }
        Ok(())
    }
}

/// Hands the resolved arena to the deduplicator.
pub struct DedupStage;

impl Stage for DedupStage {
    fn name(&self) -> &'static str {
        "deduplicate"
    }

    fn run(&self, cx: &mut PipelineContext) -> NormalizeResult<()> {
        cx.cancel.check()?;
        let resolution = std::mem::take(&mut cx.resolution);
        let (symbols, method_calls) = resolution.into_parts();
        let before = symbols.len();
        cx.symbols = deduplicate(symbols);
        cx.method_calls = method_calls;
        debug!(before, after = cx.symbols.len(), "deduplicated symbols");
        Ok(())
    }
}

/// Sorts every collection into its deterministic output order.
pub struct FinalizeStage;

impl Stage for FinalizeStage {
    fn name(&self) -> &'static str {
        "finalize"
    }

    fn run(&self, cx: &mut PipelineContext) -> NormalizeResult<()> {
        cx.cancel.check()?;
        cx.symbols.sort_by(|a, b| {
            let key_a = (a.name.to_lowercase(), a.fqname.to_lowercase());
            let key_b = (b.name.to_lowercase(), b.fqname.to_lowercase());
            key_a
                .cmp(&key_b)
                // exact comparison keeps ordering byte-identical when
                // names differ only by case
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.fqname.cmp(&b.fqname))
        });
        cx.method_calls.sort_by(|a, b| {
            a.from
                .cmp(&b.from)
                .then_with(|| a.to.cmp(&b.to))
                .then_with(|| a.call_type.cmp(&b.call_type))
        });
        Ok(())
    }
}

fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(ProcessStage),
        Box::new(ResolveStage),
        Box::new(DedupStage),
        Box::new(FinalizeStage),
    ]
}

/// Front door of the engine: adapt the input, run the stage list, emit a
/// `NormalizedResult`. A run always returns a usable result plus the
/// complete diagnostic list; only cancellation aborts.
pub struct Normalizer {
    settings: Arc<Settings>,
    stages: Vec<Box<dyn Stage>>,
}

impl Normalizer {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            stages: default_stages(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn normalize(
        &self,
        input: impl Into<ExtractionInput>,
    ) -> NormalizeResult<NormalizedResult> {
        self.normalize_with_cancel(input, CancelToken::new())
    }

    pub fn normalize_with_cancel(
        &self,
        input: impl Into<ExtractionInput>,
        cancel: CancelToken,
    ) -> NormalizeResult<NormalizedResult> {
        let facts = adapt(input.into());
        debug!(records = facts.record_count(), "adapted extraction input");

        let mut cx = PipelineContext {
            facts,
            resolution: ResolutionContext::new(),
            symbols: Vec::new(),
            method_calls: Vec::new(),
            errors: Vec::new(),
            cancel,
            settings: Arc::clone(&self.settings),
        };

        for stage in &self.stages {
            let _span = tracing::debug_span!("stage", name = stage.name()).entered();
            stage.run(&mut cx)?;
        }

        let now = Utc::now();
        let normalized_at = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);

        Ok(NormalizedResult {
            symbols: cx.symbols,
            method_calls: cx.method_calls,
            errors: cx.errors,
            schema_version: SCHEMA_VERSION,
            normalizer_version: env!("CARGO_PKG_VERSION").to_string(),
            normalized_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer() -> Normalizer {
        Normalizer::new(Arc::new(Settings::default()))
    }

    fn sample_input() -> serde_json::Value {
        json!({
            "classes": [
                {"name": "User", "namespace": "MyApp", "superclass": "ApplicationRecord"},
                {"name": "ApplicationRecord"},
            ],
            "modules": [
                {"name": "MyApp"},
                {"name": "Validatable"},
            ],
            "methods": [
                {"name": "validate", "owner": "Validatable"},
                {"name": "valid?", "owner": "Validatable"},
                {"name": "save", "owner": "MyApp::User"},
            ],
            "method_calls": [
                {"from": "MyApp::User#save", "to": "Validatable#validate", "frequency": 3},
            ],
            "mixins": [
                {"owner": "MyApp::User", "module": "Validatable", "kind": "include"},
            ],
        })
    }

    #[test]
    fn test_full_pipeline() {
        let result = normalizer().normalize(sample_input()).unwrap();
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        assert_eq!(result.classes().count(), 2);
        assert_eq!(result.modules().count(), 2);
        assert_eq!(result.methods().count(), 3);
        assert_eq!(result.method_calls.len(), 1);

        let user = result.find("MyApp::User").unwrap();
        assert_eq!(user.inheritance_chain, vec!["ApplicationRecord"]);
        assert!(user.available_instance_methods.contains(&"validate".to_string()));

        let app = result.find("MyApp").unwrap();
        assert!(app.children.contains(&"MyApp::User".to_string()));
    }

    #[test]
    fn test_determinism_across_runs() {
        let n = normalizer();
        let a = n.normalize(sample_input()).unwrap();
        let b = n.normalize(sample_input()).unwrap();

        let ids_a: Vec<_> = a.symbols.iter().map(|s| (s.id, s.fqname.clone())).collect();
        let ids_b: Vec<_> = b.symbols.iter().map(|s| (s.id, s.fqname.clone())).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(a.method_calls, b.method_calls);
        assert_eq!(a.errors, b.errors);
    }

    #[test]
    fn test_configured_thread_count_matches_default_pool() {
        let mut settings = Settings::default();
        settings.normalize.parallel_threads = 2;
        // force the parallel path for every batch
        settings.normalize.parallel_threshold = 1;
        let configured = Normalizer::new(Arc::new(settings));

        let a = configured.normalize(sample_input()).unwrap();
        let b = normalizer().normalize(sample_input()).unwrap();
        let keys = |r: &NormalizedResult| -> Vec<String> {
            r.symbols.iter().map(|s| s.fqname.clone()).collect()
        };
        assert_eq!(keys(&a), keys(&b));
        assert_eq!(a.errors, b.errors);
    }

    #[test]
    fn test_garbage_input_yields_empty_result() {
        let result = normalizer().normalize(json!(42)).unwrap();
        assert!(result.symbols.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(result.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_invalid_records_collected_not_fatal() {
        let result = normalizer()
            .normalize(json!({
                "classes": [{"name": ""}, {"name": "Kept"}],
                "methods": [{"name": "orphan"}],
            }))
            .unwrap();
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.classes().count(), 1);
    }

    #[test]
    fn test_cancellation_aborts() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = normalizer()
            .normalize_with_cancel(sample_input(), cancel)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::Cancelled));
    }

    #[test]
    fn test_output_sorted_case_insensitively() {
        let result = normalizer()
            .normalize(json!({
                "classes": [{"name": "zebra"}, {"name": "Alpha"}, {"name": "beta"}],
            }))
            .unwrap();
        let names: Vec<_> = result.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "zebra"]);
    }
}
