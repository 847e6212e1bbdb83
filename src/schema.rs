//! Schema Validation - Documents Against the EGRF JSON Schema
//!
//! The schema is read and parsed once, when the validator is built. Matching
//! is delegated to a `SchemaMatcher`; when no real matcher is available the
//! validator runs in degraded mode and says so in every report.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::EGRF_VERSION;

/// Location of the bundled schema, relative to the crate root
pub const SCHEMA_RELATIVE_PATH: &str = "schema/egrf.schema.json";

/// Path of the bundled schema resource
pub fn default_schema_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(SCHEMA_RELATIVE_PATH)
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("EGRF schema not found at {0}")]
    NotFound(String),

    #[error("Failed to read EGRF schema {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in EGRF schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("EGRF schema cannot be compiled: {0}")]
    Compile(String),
}

/// The capability that checks an instance against the loaded schema.
pub trait SchemaMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// `false` puts the validator in degraded mode.
    fn is_available(&self) -> bool {
        true
    }

    /// Every mismatch found, or `Ok` when the instance conforms.
    fn check(&self, instance: &Value) -> Result<(), Vec<String>>;
}

/// Stand-in used when no schema engine is present. Never inspects documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableMatcher;

impl SchemaMatcher for UnavailableMatcher {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn check(&self, _instance: &Value) -> Result<(), Vec<String>> {
        Ok(())
    }
}

#[cfg(feature = "schema-matcher")]
pub struct JsonSchemaMatcher {
    compiled: jsonschema::Validator,
}

#[cfg(feature = "schema-matcher")]
impl JsonSchemaMatcher {
    pub fn new(schema: &Value) -> Result<Self, SchemaError> {
        let compiled = jsonschema::validator_for(schema)
            .map_err(|e| SchemaError::Compile(e.to_string()))?;
        Ok(Self { compiled })
    }
}

#[cfg(feature = "schema-matcher")]
impl SchemaMatcher for JsonSchemaMatcher {
    fn name(&self) -> &'static str {
        "jsonschema"
    }

    fn check(&self, instance: &Value) -> Result<(), Vec<String>> {
        let errors: Vec<String> = self
            .compiled
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// The best matcher this build provides for `schema`.
pub fn default_matcher(schema: &Value) -> Result<Box<dyn SchemaMatcher>, SchemaError> {
    #[cfg(feature = "schema-matcher")]
    {
        Ok(Box::new(JsonSchemaMatcher::new(schema)?))
    }
    #[cfg(not(feature = "schema-matcher"))]
    {
        let _ = schema;
        Ok(Box::new(UnavailableMatcher))
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Passed,
    /// Degraded mode: no matcher, nothing was checked
    Skipped,
    NotFound,
    Unreadable,
    InvalidJson,
    SchemaViolation,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub ok: bool,
    pub kind: ReportKind,
    pub message: Option<String>,
}

impl ValidationReport {
    fn passed() -> Self {
        Self { ok: true, kind: ReportKind::Passed, message: None }
    }

    fn skipped() -> Self {
        Self {
            ok: true,
            kind: ReportKind::Skipped,
            message: Some("Schema matcher unavailable - validation skipped".to_string()),
        }
    }

    fn failed(kind: ReportKind, message: String) -> Self {
        Self { ok: false, kind, message: Some(message) }
    }

    pub fn is_skipped(&self) -> bool {
        self.kind == ReportKind::Skipped
    }

    /// `(ok, message)` pair
    pub fn into_pair(self) -> (bool, Option<String>) {
        (self.ok, self.message)
    }
}

pub struct SchemaValidator {
    schema: Value,
    matcher: Box<dyn SchemaMatcher>,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("version", &self.get_schema_version())
            .field("matcher", &self.matcher.name())
            .finish()
    }
}

impl SchemaValidator {
    /// Load the bundled schema.
    pub fn new() -> Result<Self, SchemaError> {
        Self::from_path(&default_schema_path())
    }

    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                SchemaError::NotFound(path.display().to_string())
            } else {
                SchemaError::Read { path: path.display().to_string(), source }
            }
        })?;
        let schema: Value = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "loaded EGRF schema");
        Self::from_value(schema)
    }

    pub fn from_value(schema: Value) -> Result<Self, SchemaError> {
        let matcher = default_matcher(&schema)?;
        Ok(Self { schema, matcher })
    }

    /// Replace the matching capability, e.g. with `UnavailableMatcher`.
    pub fn with_matcher(mut self, matcher: Box<dyn SchemaMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn matcher_name(&self) -> &'static str {
        self.matcher.name()
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn validate(&self, document: &Value) -> ValidationReport {
        if !self.matcher.is_available() {
            warn!("schema matcher unavailable, document not checked");
            return ValidationReport::skipped();
        }

        match self.matcher.check(document) {
            Ok(()) => ValidationReport::passed(),
            Err(errors) => ValidationReport::failed(
                ReportKind::SchemaViolation,
                format!("Schema validation error: {}", errors.join("; ")),
            ),
        }
    }

    /// Serialize and validate any document value.
    pub fn validate_document<T: Serialize>(&self, document: &T) -> ValidationReport {
        match serde_json::to_value(document) {
            Ok(value) => self.validate(&value),
            Err(e) => ValidationReport::failed(
                ReportKind::InvalidJson,
                format!("Document cannot be represented as JSON: {}", e),
            ),
        }
    }

    pub fn validate_file(&self, path: &Path) -> ValidationReport {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return ValidationReport::failed(
                    ReportKind::NotFound,
                    format!("File not found: {}", path.display()),
                );
            }
            Err(e) => {
                return ValidationReport::failed(
                    ReportKind::Unreadable,
                    format!("Error reading file {}: {}", path.display(), e),
                );
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(document) => self.validate(&document),
            Err(e) => ValidationReport::failed(
                ReportKind::InvalidJson,
                format!("Invalid JSON in file: {}", e),
            ),
        }
    }

    /// First enumerated value of the schema's `version` property.
    pub fn get_schema_version(&self) -> String {
        self.schema
            .pointer("/properties/version/enum/0")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string()
    }

    pub fn get_required_fields(&self) -> Vec<String> {
        self.schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the schema accepts documents stamped with `EGRF_VERSION`,
    /// judged by matching semver major versions.
    pub fn supports_generator_version(&self) -> bool {
        let ours = semver::Version::parse(EGRF_VERSION);
        let theirs = semver::Version::parse(&self.get_schema_version());
        match (ours, theirs) {
            (Ok(ours), Ok(theirs)) => ours.major == theirs.major,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn tiny_schema() -> Value {
        json!({
            "type": "object",
            "required": ["version", "metadata"],
            "properties": {
                "version": {"type": "string", "enum": ["1.0.0"]},
                "metadata": {"type": "object"}
            }
        })
    }

    #[test]
    fn test_missing_schema_is_fatal() {
        let err =
            SchemaValidator::from_path(Path::new("/nonexistent/egrf.schema.json")).unwrap_err();
        assert!(matches!(err, SchemaError::NotFound(_)));
    }

    #[test]
    fn test_unparseable_schema_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = SchemaValidator::from_path(file.path()).unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
    }

    #[test]
    fn test_accessors_read_schema_metadata() {
        let validator = SchemaValidator::from_value(tiny_schema()).unwrap();
        assert_eq!(validator.get_schema_version(), "1.0.0");
        assert_eq!(validator.get_required_fields(), vec!["version", "metadata"]);
        assert!(validator.supports_generator_version());
    }

    #[test]
    fn test_degraded_mode_reports_skip() {
        let validator = SchemaValidator::from_value(tiny_schema())
            .unwrap()
            .with_matcher(Box::new(UnavailableMatcher));
        let report = validator.validate(&json!({"anything": true}));

        assert!(report.ok);
        assert!(report.is_skipped());
        assert!(report.message.unwrap().contains("skipped"));
    }

    #[cfg(feature = "schema-matcher")]
    #[test]
    fn test_structural_failure_is_reported() {
        let validator = SchemaValidator::from_value(tiny_schema()).unwrap();
        let report = validator.validate(&json!({"version": "9.9.9", "metadata": {}}));

        assert!(!report.ok);
        assert_eq!(report.kind, ReportKind::SchemaViolation);
        assert!(report.message.unwrap().starts_with("Schema validation error"));
    }

    #[cfg(feature = "schema-matcher")]
    #[test]
    fn test_conforming_instance_passes() {
        let validator = SchemaValidator::from_value(tiny_schema()).unwrap();
        let (ok, message) = validator
            .validate(&json!({"version": "1.0.0", "metadata": {}}))
            .into_pair();
        assert!(ok);
        assert_eq!(message, None);
    }
}
