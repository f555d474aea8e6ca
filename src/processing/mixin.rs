use super::{RecordKind, RecordProcessor, missing_field, str_field};
use crate::error::{NormalizeDiagnostic, NormalizeResult};
use crate::pipeline::CancelToken;
use crate::resolve::ResolutionContext;
use crate::symbol::Mixin;
use crate::types::MixinKind;
use serde_json::Value;

/// Attaches mixin relations (include/extend/prepend) to their host symbols.
///
/// Runs after class and module processing so hosts are already indexed; a
/// relation naming an unknown host is recorded informationally and skipped.
pub struct MixinProcessor;

impl RecordProcessor for MixinProcessor {
    fn kind(&self) -> RecordKind {
        RecordKind::Mixin
    }

    fn validate(&self, record: &Value, errors: &mut Vec<NormalizeDiagnostic>) -> bool {
        let mut ok = true;
        if str_field(record, &["owner", "target", "host"]).is_none() {
            errors.push(missing_field(self.kind(), "owner", record));
            ok = false;
        }
        if str_field(record, &["module", "module_name"]).is_none() {
            errors.push(missing_field(self.kind(), "module", record));
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
        for record in records {
            cancel.check()?;
            if !self.validate(record, errors) {
                continue;
            }
            let owner = str_field(record, &["owner", "target", "host"]).unwrap_or_default();
            let module = str_field(record, &["module", "module_name"]).unwrap_or_default();
            let kind = str_field(record, &["kind", "relation"])
                .and_then(|s| s.parse::<MixinKind>().ok())
                .unwrap_or(MixinKind::Include);

            let Some(idx) = ctx.find_idx(owner) else {
                errors.push(
                    NormalizeDiagnostic::unresolved(format!(
                        "mixin host '{owner}' not found in index"
                    ))
                    .with_data(record.clone()),
                );
                continue;
            };

            let mixin = Mixin::new(kind, module);
            let host = ctx.get_mut(idx);
            if !host.mixins.contains(&mixin) {
                host.mixins.push(mixin);
            }
        }
        Ok(())
    }
}
