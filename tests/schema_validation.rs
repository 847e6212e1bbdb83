//! Schema Validation Tests
//!
//! Generated documents against the bundled schema, and the file-level
//! failure modes of `validate_file`.

use egrf_core::{
    EgrfGenerator, EntityKind, GeneratorConfig, GraphModel, GraphSpec, PredicateStyle, ReportKind,
    SchemaValidator, UnavailableMatcher, EGRF_VERSION,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::io::Write;

fn nested_graph() -> GraphModel {
    GraphSpec::from_json(
        r#"{
            "cuts": [{"name": "outer"}, {"name": "inner", "parent": "outer"}],
            "entities": [
                {"name": "Socrates", "kind": "individual"},
                {"name": "x", "kind": "variable", "context": "outer"}
            ],
            "predicates": [
                {"name": "Man", "args": ["Socrates"]},
                {"name": "Philosopher", "args": ["x"], "context": "outer"},
                {"name": "Mortal", "args": ["x"], "context": "inner"}
            ]
        }"#,
    )
    .unwrap()
    .build()
    .unwrap()
}

#[test]
fn test_bundled_schema_loads() {
    let validator = SchemaValidator::new().unwrap();
    assert_eq!(validator.get_schema_version(), EGRF_VERSION);
    assert!(validator.supports_generator_version());
}

#[test]
fn test_required_fields_are_the_document_sections() {
    let validator = SchemaValidator::new().unwrap();
    let required: BTreeSet<String> = validator.get_required_fields().into_iter().collect();
    let expected: BTreeSet<String> = [
        "version", "metadata", "entities", "predicates", "contexts", "visual", "semantics",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(required, expected);
}

#[cfg(feature = "schema-matcher")]
#[test]
fn test_generated_documents_conform() {
    let validator = SchemaValidator::new().unwrap();
    let empty = GraphModel::new();
    let (single, _) = empty.add_entity("x", EntityKind::Variable);

    for style in [PredicateStyle::None, PredicateStyle::Boxed] {
        let generator = EgrfGenerator::new(GeneratorConfig {
            predicate_style: style,
            ..Default::default()
        });
        for graph in [&empty, &single, &nested_graph()] {
            let (_, report) = generator.generate_validated(graph, &validator).unwrap();
            assert!(report.ok, "{:?}", report.message);
            assert_eq!(report.kind, ReportKind::Passed);
        }
    }
}

#[cfg(feature = "schema-matcher")]
#[test]
fn test_broken_text_only_bundle_is_rejected() {
    let validator = SchemaValidator::new().unwrap();
    let doc = EgrfGenerator::default().generate(&nested_graph()).unwrap();
    let mut value = doc.to_value().unwrap();

    let id = doc.predicates()[0].id.clone();
    value["visual"]["predicates"][&id]["border"] = json!("solid");

    let report = validator.validate(&value);
    assert!(!report.ok);
    assert_eq!(report.kind, ReportKind::SchemaViolation);
}

#[cfg(feature = "schema-matcher")]
#[test]
fn test_missing_section_is_rejected() {
    let validator = SchemaValidator::new().unwrap();
    let doc = EgrfGenerator::default().generate(&nested_graph()).unwrap();
    let mut value = doc.to_value().unwrap();
    value.as_object_mut().unwrap().remove("semantics");

    let report = validator.validate(&value);
    assert!(!report.ok);
    assert!(report.message.unwrap().starts_with("Schema validation error"));
}

#[test]
fn test_validation_does_not_change_document() {
    let validator = SchemaValidator::new().unwrap();
    let doc = EgrfGenerator::default().generate(&nested_graph()).unwrap();
    let before = doc.to_value().unwrap();

    let _ = validator.validate(&before);
    let _ = validator.validate_document(&doc);
    assert_eq!(doc.to_value().unwrap(), before);
}

#[test]
fn test_validate_file_not_found() {
    let validator = SchemaValidator::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.egrf");

    let report = validator.validate_file(&path);
    assert!(!report.ok);
    assert_eq!(report.kind, ReportKind::NotFound);
    assert!(report.message.unwrap().starts_with("File not found"));
}

#[test]
fn test_validate_file_invalid_json() {
    let validator = SchemaValidator::new().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{\"version\": ").unwrap();

    let report = validator.validate_file(file.path());
    assert!(!report.ok);
    assert_eq!(report.kind, ReportKind::InvalidJson);
    assert!(report.message.unwrap().starts_with("Invalid JSON"));
}

#[cfg(feature = "schema-matcher")]
#[test]
fn test_validate_file_round_trip() {
    let validator = SchemaValidator::new().unwrap();
    let json = EgrfGenerator::default().generate_json(&nested_graph()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested.egrf");
    std::fs::write(&path, json).unwrap();

    assert!(validator.validate_file(&path).ok);

    std::fs::write(&path, r#"{"version": "1.0.0"}"#).unwrap();
    let report = validator.validate_file(&path);
    assert!(!report.ok);
    assert_eq!(report.kind, ReportKind::SchemaViolation);
}

#[test]
fn test_degraded_mode_skips_but_still_reads_files() {
    let validator = SchemaValidator::new()
        .unwrap()
        .with_matcher(Box::new(UnavailableMatcher));
    assert!(!validator.schema().is_null());

    let report = validator.validate(&json!({"not": "a document"}));
    assert!(report.ok);
    assert_eq!(report.kind, ReportKind::Skipped);

    let dir = tempfile::tempdir().unwrap();
    let report = validator.validate_file(&dir.path().join("missing.egrf"));
    assert_eq!(report.kind, ReportKind::NotFound);
}
