//! Canonical Record Adapter: turns heterogeneous extraction output into a
//! uniform set of raw record lists.
//!
//! Input is either a JSON value (the common case: a mapping with optional
//! `classes`/`modules`/`methods`/`method_calls`/`mixins` keys) or a
//! `FactSource` implementation. Detection is by capability — implementing the
//! trait — never by sniffing the shape of a plain map, so a map that happens
//! to carry the same-looking keys is still read key-by-key.

use serde_json::Value;

/// The five raw record lists every downstream processor consumes.
///
/// Elements stay untyped `Value`s here; structural validation (is this even
/// a map, does it carry a name) belongs to the record processors, which
/// report per-record diagnostics instead of rejecting the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFacts {
    pub classes: Vec<Value>,
    pub modules: Vec<Value>,
    pub methods: Vec<Value>,
    pub method_calls: Vec<Value>,
    pub mixins: Vec<Value>,
}

impl RawFacts {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.modules.is_empty()
            && self.methods.is_empty()
            && self.method_calls.is_empty()
            && self.mixins.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.classes.len()
            + self.modules.len()
            + self.methods.len()
            + self.method_calls.len()
            + self.mixins.len()
    }
}

/// Capability trait for pre-built fact sources.
///
/// An extractor that already organizes its output can implement this instead
/// of serializing to JSON; `export` is its own conversion into `RawFacts`.
pub trait FactSource {
    fn classes(&self) -> Vec<Value>;
    fn modules(&self) -> Vec<Value>;
    fn methods(&self) -> Vec<Value>;

    fn method_calls(&self) -> Vec<Value> {
        Vec::new()
    }

    fn mixins(&self) -> Vec<Value> {
        Vec::new()
    }

    fn export(&self) -> RawFacts {
        RawFacts {
            classes: self.classes(),
            modules: self.modules(),
            methods: self.methods(),
            method_calls: self.method_calls(),
            mixins: self.mixins(),
        }
    }
}

/// A value handed over by the extraction collaborator.
pub enum ExtractionInput {
    Json(Value),
    Source(Box<dyn FactSource>),
}

impl From<Value> for ExtractionInput {
    fn from(value: Value) -> Self {
        ExtractionInput::Json(value)
    }
}

/// Convert extraction output into uniform record lists.
///
/// Null, booleans, numbers, strings, and bare arrays at the top level yield
/// all-empty lists with no error. For a map, each key is read independently:
/// missing or null becomes an empty list, a non-array value is wrapped in a
/// single-element list, and an array is taken as-is.
pub fn adapt(input: ExtractionInput) -> RawFacts {
    match input {
        ExtractionInput::Source(source) => source.export(),
        ExtractionInput::Json(Value::Object(map)) => RawFacts {
            classes: read_list(map.get("classes")),
            modules: read_list(map.get("modules")),
            methods: read_list(map.get("methods")),
            method_calls: read_list(map.get("method_calls")),
            mixins: read_list(map.get("mixins")),
        },
        ExtractionInput::Json(_) => RawFacts::default(),
    }
}

fn read_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nil_and_scalar_input_yield_empty() {
        for input in [json!(null), json!(false), json!(42), json!("facts")] {
            let facts = adapt(ExtractionInput::Json(input));
            assert!(facts.is_empty());
        }
    }

    #[test]
    fn test_bare_array_yields_empty() {
        let facts = adapt(ExtractionInput::Json(json!([{"name": "User"}])));
        assert!(facts.is_empty());
    }

    #[test]
    fn test_map_read_key_by_key() {
        let facts = adapt(ExtractionInput::Json(json!({
            "classes": [{"name": "User"}, {"name": "Post"}],
            "methods": null,
        })));
        assert_eq!(facts.classes.len(), 2);
        assert!(facts.modules.is_empty());
        assert!(facts.methods.is_empty());
    }

    #[test]
    fn test_non_list_value_wrapped() {
        let facts = adapt(ExtractionInput::Json(json!({
            "classes": {"name": "User"},
        })));
        assert_eq!(facts.classes.len(), 1);
        assert_eq!(facts.classes[0]["name"], "User");
    }

    #[test]
    fn test_non_map_elements_survive_to_processing() {
        // Garbage elements are not dropped here; validation reports them.
        let facts = adapt(ExtractionInput::Json(json!({
            "classes": [{"name": "User"}, "oops", 7],
        })));
        assert_eq!(facts.classes.len(), 3);
    }

    struct StubSource;

    impl FactSource for StubSource {
        fn classes(&self) -> Vec<Value> {
            vec![json!({"name": "User"})]
        }
        fn modules(&self) -> Vec<Value> {
            vec![json!({"name": "Admin"})]
        }
        fn methods(&self) -> Vec<Value> {
            Vec::new()
        }
    }

    #[test]
    fn test_fact_source_converted_via_export() {
        let facts = adapt(ExtractionInput::Source(Box::new(StubSource)));
        assert_eq!(facts.classes.len(), 1);
        assert_eq!(facts.modules.len(), 1);
        assert!(facts.method_calls.is_empty());
    }

    #[test]
    fn test_plain_map_with_source_looking_keys_is_not_auto_detected() {
        // A map with "classes"/"modules" keys is still read key-by-key, not
        // treated as a fact-source object.
        let facts = adapt(ExtractionInput::Json(json!({
            "classes": [{"name": "A"}],
            "modules": [{"name": "B"}],
        })));
        assert_eq!(facts.classes.len(), 1);
        assert_eq!(facts.modules.len(), 1);
    }
}
