use super::{RecordKind, RecordProcessor, container_symbol, missing_field, str_field};
use crate::error::{NormalizeDiagnostic, NormalizeResult};
use crate::pipeline::CancelToken;
use crate::resolve::ResolutionContext;
use crate::types::SymbolKind;
use serde_json::Value;

/// Normalizes raw module records into module symbols.
pub struct ModuleProcessor;

impl RecordProcessor for ModuleProcessor {
    fn kind(&self) -> RecordKind {
        RecordKind::Module
    }

    fn validate(&self, record: &Value, errors: &mut Vec<NormalizeDiagnostic>) -> bool {
        if str_field(record, &["name"]).is_none() {
            errors.push(missing_field(self.kind(), "name", record));
            return false;
        }
        true
    }

    fn process(
        &self,
        records: &[Value],
        ctx: &mut ResolutionContext,
        errors: &mut Vec<NormalizeDiagnostic>,
        cancel: &CancelToken,
    ) -> NormalizeResult<()> {
        for record in records {
            cancel.check()?;
            if !self.validate(record, errors) {
                continue;
            }
            let mut symbol = container_symbol(SymbolKind::Module, record);
            // Modules never carry a superclass, whatever the record claims.
            symbol.superclass = None;
            ctx.add(symbol);
        }
        Ok(())
    }
}
