//! Record processors: one per raw record kind.
//!
//! Each processor validates a single record, assigns deterministic identity,
//! normalizes fields, and emits a canonical symbol or edge into the
//! resolution context. Invalid records are skipped and reported through
//! diagnostics; a bad sibling never aborts the batch.

mod class;
mod method;
mod method_call;
mod mixin;
mod module;

pub use class::ClassProcessor;
pub use method::MethodProcessor;
pub use method_call::MethodCallProcessor;
pub use mixin::MixinProcessor;
pub use module::ModuleProcessor;

use crate::error::{NormalizeDiagnostic, NormalizeResult};
use crate::pipeline::CancelToken;
use crate::resolve::ResolutionContext;
use crate::symbol::Provenance;
use crate::types::SourceOrigin;
use serde_json::Value;

/// Tagged record kind; the adapter's five lists map onto these exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Class,
    Module,
    Method,
    MethodCall,
    Mixin,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Class => "class",
            RecordKind::Module => "module",
            RecordKind::Method => "method",
            RecordKind::MethodCall => "method_call",
            RecordKind::Mixin => "mixin",
        }
    }
}

/// Fixed processing order: namespaces before methods, attachments last.
pub const RECORD_ORDER: [RecordKind; 5] = [
    RecordKind::Class,
    RecordKind::Module,
    RecordKind::Method,
    RecordKind::MethodCall,
    RecordKind::Mixin,
];

/// Capability interface implemented once per record kind.
pub trait RecordProcessor: Sync {
    fn kind(&self) -> RecordKind;

    /// Check a single record, appending a validation diagnostic on failure.
    /// Returns whether the record may be processed.
    fn validate(&self, record: &Value, errors: &mut Vec<NormalizeDiagnostic>) -> bool;

    /// Process a batch of records into the context. Per-record failures
    /// become diagnostics; only cancellation aborts.
    fn process(
        &self,
        records: &[Value],
        ctx: &mut ResolutionContext,
        errors: &mut Vec<NormalizeDiagnostic>,
        cancel: &CancelToken,
    ) -> NormalizeResult<()>;
}

/// One processor per variant, matched exhaustively.
pub fn processor_for(kind: RecordKind, parallel_threshold: usize) -> Box<dyn RecordProcessor> {
    match kind {
        RecordKind::Class => Box::new(ClassProcessor),
        RecordKind::Module => Box::new(ModuleProcessor),
        RecordKind::Method => Box::new(MethodProcessor { parallel_threshold }),
        RecordKind::MethodCall => Box::new(MethodCallProcessor),
        RecordKind::Mixin => Box::new(MixinProcessor),
    }
}

// ---- shared field extraction helpers ----

/// Non-empty trimmed string at the first of the given keys.
pub(crate) fn str_field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a str> {
    for key in keys {
        if let Some(s) = record.get(*key).and_then(Value::as_str) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
    }
    None
}

/// Namespace path from a `namespace` field that is either a list of segment
/// strings or a single `A::B` string.
pub(crate) fn namespace_field(record: &Value) -> Vec<String> {
    match record.get("namespace") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split("::")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Provenance from the record's `source` tag and optional `confidence`.
pub(crate) fn provenance_field(record: &Value) -> Provenance {
    let origin = str_field(record, &["source"])
        .map(SourceOrigin::from_str_with_default)
        .unwrap_or(SourceOrigin::Inferred);
    let confidence = record
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0) as f32);
    Provenance::from_origin(origin, confidence)
}

/// Render a method identifier in lower snake_case, preserving a leading
/// underscore and the trailing `?`/`!` Ruby allows.
pub(crate) fn snake_case_method(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;
    for ch in raw.trim().chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

/// Build a class/module symbol from a validated record.
///
/// A qualified `name` like `App::User` contributes its own namespace
/// segments; an explicit `namespace` field supplies the enclosing path.
pub(crate) fn container_symbol(kind: crate::types::SymbolKind, record: &Value) -> crate::symbol::Symbol {
    use crate::symbol::{Symbol, join_fqname};

    let raw_name = str_field(record, &["name"]).unwrap_or_default();
    let mut namespace = namespace_field(record);
    let mut name = raw_name.to_string();
    if raw_name.contains("::") {
        let mut segments: Vec<String> = raw_name.split("::").map(str::to_string).collect();
        name = segments.pop().unwrap_or_default();
        namespace.extend(segments);
    }
    let fqname = str_field(record, &["fqname"])
        .map(str::to_string)
        .unwrap_or_else(|| join_fqname(&namespace, &name));

    let mut symbol = Symbol::new(kind, name, fqname).with_namespace(namespace);
    symbol.superclass = str_field(record, &["superclass"]).map(str::to_string);
    symbol.file_path = str_field(record, &["file", "file_path"]).map(str::to_string);
    symbol.provenance = provenance_field(record);
    symbol
}

/// Diagnostic for a record missing a required field, carrying the record.
pub(crate) fn missing_field(kind: RecordKind, field: &str, record: &Value) -> NormalizeDiagnostic {
    NormalizeDiagnostic::validation(format!(
        "{} record missing required field '{field}'",
        kind.as_str()
    ))
    .with_data(record.clone())
}
