use super::{RecordKind, RecordProcessor, missing_field, str_field};
use crate::error::{NormalizeDiagnostic, NormalizeResult};
use crate::pipeline::{CancelToken, MethodCallEdge};
use crate::resolve::ResolutionContext;
use serde_json::Value;

/// Caller context assumed when a call record does not name one.
const TOPLEVEL_CALLER: &str = "main";

/// Normalizes raw method-call records into weighted call edges.
pub struct MethodCallProcessor;

impl RecordProcessor for MethodCallProcessor {
    fn kind(&self) -> RecordKind {
        RecordKind::MethodCall
    }

    fn validate(&self, record: &Value, errors: &mut Vec<NormalizeDiagnostic>) -> bool {
        if str_field(record, &["to", "callee", "method"]).is_none() {
            errors.push(missing_field(self.kind(), "to", record));
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
            let to = str_field(record, &["to", "callee", "method"]).unwrap_or_default();
            let from = str_field(record, &["from", "caller"]).unwrap_or(TOPLEVEL_CALLER);
            let frequency = record
                .get("frequency")
                .and_then(Value::as_u64)
                .map(|f| f.clamp(1, u64::from(u32::MAX)) as u32)
                .unwrap_or(1);
            let call_type = str_field(record, &["type", "call_type"]).map(str::to_string);

            ctx.method_calls.push(MethodCallEdge {
                from: from.to_string(),
                to: to.to_string(),
                frequency,
                call_type,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(records: Vec<Value>) -> (ResolutionContext, Vec<NormalizeDiagnostic>) {
        let mut ctx = ResolutionContext::new();
        let mut errors = Vec::new();
        MethodCallProcessor
            .process(&records, &mut ctx, &mut errors, &CancelToken::new())
            .unwrap();
        (ctx, errors)
    }

    #[test]
    fn test_call_edge_with_defaults() {
        let (ctx, errors) = run(vec![json!({"to": "User#save"})]);
        assert!(errors.is_empty());
        assert_eq!(ctx.method_calls.len(), 1);
        let edge = &ctx.method_calls[0];
        assert_eq!(edge.from, "main");
        assert_eq!(edge.frequency, 1);
        assert!(edge.call_type.is_none());
    }

    #[test]
    fn test_missing_target_skipped() {
        let (ctx, errors) = run(vec![json!({"from": "A#run"}), json!({"to": "B#go"})]);
        assert_eq!(errors.len(), 1);
        assert_eq!(ctx.method_calls.len(), 1);
    }

    #[test]
    fn test_frequency_and_type() {
        let (ctx, _) = run(vec![json!({
            "from": "Job#perform", "to": "Mailer.deliver",
            "frequency": 12, "type": "dynamic",
        })]);
        let edge = &ctx.method_calls[0];
        assert_eq!(edge.frequency, 12);
        assert_eq!(edge.call_type.as_deref(), Some("dynamic"));
    }
}
