//! EGRF Core - Existential Graph Rendering Compiler
//!
//! # Guarantees
//! 1. Contexts Form One Tree
//! 2. Every Item Has Exactly One Owner
//! 3. Ownership Before Layout
//! 4. Deterministic Output
//! 5. One Visual Descriptor Per Predicate
//! 6. Validation Never Edits Documents

pub mod graph;
pub mod context_tree;
pub mod config;
pub mod layout;
pub mod visual;
pub mod clif;
pub mod document;
pub mod hashing;
pub mod schema;
pub mod checks;
pub mod input;
pub mod generator;

pub use graph::{
    ContextId, ContextKind, EntityId, EntityKind, GraphError, GraphModel, ItemRef, PredicateId,
};
pub use context_tree::{ContextTree, OwnedItem};
pub use config::{
    AtomNotation, ConfigError, GeneratorConfig, LayoutConfig, OwnershipPolicy, PredicateStyle,
};
pub use layout::{BoundingBox, Layout, PositionCalculator};
pub use visual::{Appearance, PredicateVisual, VisualResolver, VisualSection};
pub use clif::ClifSerializer;
pub use document::{egrf_path, is_egrf_path, DocumentAssembler, EgrfDocument, EGRF_EXTENSION};
pub use hashing::{digest_hex, fingerprint};
pub use schema::{
    ReportKind, SchemaError, SchemaMatcher, SchemaValidator, UnavailableMatcher, ValidationReport,
};
pub use checks::{CheckReport, DocumentChecker, Violation, ViolationSeverity};
pub use input::GraphSpec;
pub use generator::{EgrfGenerator, GenerateError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Document format version stamped into every generated document
pub const EGRF_VERSION: &str = "1.0.0";
