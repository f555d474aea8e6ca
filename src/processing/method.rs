use super::{
    RecordKind, RecordProcessor, missing_field, provenance_field, snake_case_method, str_field,
};
use crate::error::{NormalizeDiagnostic, NormalizeResult};
use crate::pipeline::CancelToken;
use crate::resolve::ResolutionContext;
use crate::symbol::{MethodInfo, Parameter, Symbol, compute_arity, method_fqname};
use crate::types::{MethodScope, ParamKind, SymbolKind, Visibility};
use rayon::prelude::*;
use serde_json::Value;

/// Normalizes raw method records into method symbols.
///
/// Method names are rendered in lower snake_case; visibility defaults to
/// public with a private-naming convention (leading underscore) surfacing in
/// `inferred_visibility`; arity is computed from the parameter list.
pub struct MethodProcessor {
    /// Batches at or above this size are normalized on the rayon pool.
    /// Insertion into the index always stays single-writer.
    pub parallel_threshold: usize,
}

impl RecordProcessor for MethodProcessor {
    fn kind(&self) -> RecordKind {
        RecordKind::Method
    }

    fn validate(&self, record: &Value, errors: &mut Vec<NormalizeDiagnostic>) -> bool {
        let mut ok = true;
        if str_field(record, &["name"]).is_none() {
            errors.push(missing_field(self.kind(), "name", record));
            ok = false;
        }
        if str_field(record, &["owner"]).is_none() {
            errors.push(missing_field(self.kind(), "owner", record));
            ok = false;
        }
        ok
    }

    fn process(
        &self,
        records: &[Value],
        ctx: &mut ResolutionContext,
        errors: &mut Vec<NormalizeDiagnostic>,
        cancel: &CancelToken,
    ) -> NormalizeResult<()> {
        let normalized: Vec<Result<Symbol, NormalizeDiagnostic>> =
            if records.len() >= self.parallel_threshold {
                records.par_iter().map(normalize_method).collect()
            } else {
                records.iter().map(normalize_method).collect()
            };

        for outcome in normalized {
            cancel.check()?;
            match outcome {
                Ok(symbol) => {
                    ctx.add(symbol);
                }
                Err(diag) => errors.push(diag),
            }
        }
        Ok(())
    }
}

fn normalize_method(record: &Value) -> Result<Symbol, NormalizeDiagnostic> {
    let raw_name = str_field(record, &["name"])
        .ok_or_else(|| missing_field(RecordKind::Method, "name", record))?;
    let owner = str_field(record, &["owner"])
        .ok_or_else(|| missing_field(RecordKind::Method, "owner", record))?;

    let name = snake_case_method(raw_name);
    let scope = str_field(record, &["scope"])
        .and_then(|s| s.parse::<MethodScope>().ok())
        .unwrap_or(MethodScope::Instance);
    let visibility = str_field(record, &["visibility"])
        .and_then(|s| s.parse::<Visibility>().ok())
        .unwrap_or(Visibility::Public);
    let inferred_visibility = if name.starts_with('_') {
        Visibility::Private
    } else {
        visibility
    };

    let parameters = parse_parameters(record)
        .map_err(|msg| NormalizeDiagnostic::processing(msg).with_data(record.clone()))?;
    let arity = compute_arity(&parameters);

    let fqname = method_fqname(owner, &name, scope);
    let mut symbol = Symbol::new(SymbolKind::Method, name, fqname);
    symbol.namespace_path = owner.split("::").map(str::to_string).collect();
    symbol.file_path = str_field(record, &["file", "file_path"]).map(str::to_string);
    symbol.provenance = provenance_field(record);
    symbol.method = Some(MethodInfo {
        owner: owner.to_string(),
        scope,
        visibility,
        inferred_visibility,
        arity,
        parameters,
    });
    Ok(symbol)
}

fn parse_parameters(record: &Value) -> Result<Vec<Parameter>, String> {
    let Some(items) = record.get("parameters").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let mut params = Vec::with_capacity(items.len());
    for item in items {
        let Some(obj) = item.as_object() else {
            return Err(format!("parameter entry is not a map: {item}"));
        };
        let kind = obj
            .get("kind")
            .and_then(Value::as_str)
            .map(|s| s.parse::<ParamKind>())
            .transpose()
            .map_err(|e| format!("bad parameter kind: {e}"))?
            .unwrap_or(ParamKind::Required);
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let default = obj
            .get("default")
            .and_then(Value::as_str)
            .map(str::to_string);
        params.push(Parameter {
            kind,
            name,
            default,
        });
    }
    Ok(params)
}
