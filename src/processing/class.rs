use super::{RecordKind, RecordProcessor, container_symbol, missing_field, str_field};
use crate::error::{NormalizeDiagnostic, NormalizeResult};
use crate::pipeline::CancelToken;
use crate::resolve::ResolutionContext;
use crate::types::SymbolKind;
use serde_json::Value;

/// Normalizes raw class records into class symbols.
pub struct ClassProcessor;

impl RecordProcessor for ClassProcessor {
    fn kind(&self) -> RecordKind {
        RecordKind::Class
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
            ctx.add(container_symbol(SymbolKind::Class, record));
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
        ClassProcessor
            .process(&records, &mut ctx, &mut errors, &CancelToken::new())
            .unwrap();
        (ctx, errors)
    }

    #[test]
    fn test_class_with_namespace_and_superclass() {
        let (ctx, errors) = run(vec![json!({
            "name": "User",
            "namespace": ["App", "Models"],
            "superclass": "ApplicationRecord",
            "source": "static-analysis",
        })]);

        assert!(errors.is_empty());
        let user = ctx.find("App::Models::User").unwrap();
        assert_eq!(user.name, "User");
        assert_eq!(user.namespace_path, vec!["App", "Models"]);
        assert_eq!(user.superclass.as_deref(), Some("ApplicationRecord"));
    }

    #[test]
    fn test_qualified_name_splits_namespace() {
        let (ctx, _) = run(vec![json!({"name": "App::User"})]);
        let user = ctx.find("App::User").unwrap();
        assert_eq!(user.name, "User");
        assert_eq!(user.namespace_path, vec!["App"]);
    }

    #[test]
    fn test_missing_name_skips_only_that_record() {
        let (ctx, errors) = run(vec![
            json!({"superclass": "Base"}),
            json!({"name": ""}),
            json!({"name": "Kept"}),
        ]);

        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("'name'"));
        assert_eq!(ctx.len(), 1);
        assert!(ctx.find("Kept").is_some());
    }

    #[test]
    fn test_non_map_record_reports_validation() {
        let (ctx, errors) = run(vec![json!("garbage")]);
        assert_eq!(errors.len(), 1);
        assert!(ctx.is_empty());
    }
}
