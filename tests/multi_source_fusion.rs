//! Multi-source fusion: the same symbols reported by independent extraction
//! sources of different reliability must collapse into one record per
//! identity, with provenance tracking which sources contributed.

use serde_json::json;
use std::sync::Arc;
use symgraph::{Normalizer, Settings, SourceOrigin};

fn normalizer() -> Normalizer {
    Normalizer::new(Arc::new(Settings::default()))
}

#[test]
fn conflicting_sources_fuse_into_one_symbol() {
    let result = normalizer()
        .normalize(json!({
            "classes": [
                {"name": "Payment", "source": "inferred"},
                {"name": "Payment", "superclass": "Transaction", "source": "static-analysis"},
                {"name": "Transaction", "source": "static-analysis"}
            ]
        }))
        .unwrap();

    let payments: Vec<_> = result
        .symbols
        .iter()
        .filter(|s| s.name == "Payment")
        .collect();
    assert_eq!(payments.len(), 1);

    let payment = payments[0];
    // higher-precedence source wins; weaker source never blanks a field
    assert_eq!(payment.superclass.as_deref(), Some("Transaction"));
    assert!(payment.provenance.sources.contains(&SourceOrigin::Inferred));
    assert!(
        payment
            .provenance
            .sources
            .contains(&SourceOrigin::StaticAnalysis)
    );
    assert_eq!(payment.provenance.best_origin(), SourceOrigin::StaticAnalysis);
}

#[test]
fn confidence_keeps_the_maximum_across_sources() {
    let result = normalizer()
        .normalize(json!({
            "classes": [
                {"name": "Job", "source": "doc-inference", "confidence": 0.2},
                {"name": "Job", "source": "doc-inference", "confidence": 0.9}
            ]
        }))
        .unwrap();

    let job = result.find("Job").unwrap();
    assert!((job.provenance.confidence - 0.9).abs() < f32::EPSILON);
}

#[test]
fn duplicated_input_yields_same_symbols_as_single_input() {
    let single = json!({
        "classes": [{"name": "App::Widget", "superclass": "App::Base"},
                    {"name": "App::Base"}],
        "methods": [{"name": "render", "owner": "App::Widget"}]
    });
    let doubled = json!({
        "classes": [{"name": "App::Widget", "superclass": "App::Base"},
                    {"name": "App::Base"},
                    {"name": "App::Widget", "superclass": "App::Base"},
                    {"name": "App::Base"}],
        "methods": [{"name": "render", "owner": "App::Widget"},
                    {"name": "render", "owner": "App::Widget"}]
    });

    let n = normalizer();
    let once = n.normalize(single).unwrap();
    let twice = n.normalize(doubled).unwrap();

    let keys = |r: &symgraph::NormalizedResult| -> Vec<(symgraph::SymbolId, String)> {
        r.symbols.iter().map(|s| (s.id, s.fqname.clone())).collect()
    };
    assert_eq!(keys(&once), keys(&twice));
    assert_eq!(once.symbols.len(), 3);
}

#[test]
fn ids_are_stable_across_processes_and_runs() {
    let n = normalizer();
    let a = n
        .normalize(json!({"classes": [{"name": "App::User"}]}))
        .unwrap();
    let b = n
        .normalize(json!({"classes": [{"name": "App::User"}]}))
        .unwrap();

    let id_a = a.find("App::User").unwrap().id;
    let id_b = b.find("App::User").unwrap().id;
    assert_eq!(id_a, id_b);
    // identity is content-derived, never an insertion counter
    assert_eq!(id_a, symgraph::symbol_id(symgraph::SymbolKind::Class, "App::User"));
}

#[test]
fn class_and_module_with_same_fqname_stay_distinct() {
    let result = normalizer()
        .normalize(json!({
            "classes": [{"name": "Config"}],
            "modules": [{"name": "Config"}]
        }))
        .unwrap();

    let matching: Vec<_> = result.symbols.iter().filter(|s| s.fqname == "Config").collect();
    assert_eq!(matching.len(), 2);
    assert_ne!(matching[0].id, matching[1].id);
}

#[test]
fn unknown_source_tag_falls_back_to_lowest_precedence() {
    let result = normalizer()
        .normalize(json!({
            "classes": [{"name": "Thing", "source": "psychic-guess"}]
        }))
        .unwrap();

    let thing = result.find("Thing").unwrap();
    assert_eq!(thing.provenance.best_origin(), SourceOrigin::Inferred);
}
