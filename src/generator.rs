//! Generation Pipeline - Single Entry Point
//!
//! Stage order is fixed: resolve ownership, lay out, resolve visuals, derive
//! CLIF, assemble. Validation is a separate, optional step afterwards.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clif::ClifSerializer;
use crate::config::{GeneratorConfig, OwnershipPolicy};
use crate::context_tree::ContextTree;
use crate::document::{DocumentAssembler, EgrfDocument};
use crate::graph::GraphModel;
use crate::layout::PositionCalculator;
use crate::schema::{SchemaValidator, ValidationReport};
use crate::visual::VisualResolver;
use crate::EGRF_VERSION;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Item {0} has no explicit context (strict ownership)")]
    UnassignedItem(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub struct EgrfGenerator {
    config: GeneratorConfig,
}

impl EgrfGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the EGRF document for `graph`.
    ///
    /// Pure: the same graph and config always yield the same document.
    pub fn generate(&self, graph: &GraphModel) -> Result<EgrfDocument, GenerateError> {
        let tree = ContextTree::resolve(graph);

        if self.config.ownership == OwnershipPolicy::Strict {
            if let Some(item) = tree.fallback_items().first() {
                warn!(item = %item, "rejecting item without explicit context");
                return Err(GenerateError::UnassignedItem(item.to_string()));
            }
        }

        let layout = PositionCalculator::new(&self.config.layout).layout(&tree);
        debug!(items = layout.len(), "layout computed");

        let visual = VisualResolver::new(self.config.predicate_style).resolve_all(&tree, &layout);
        let clif = ClifSerializer::new(self.config.atom_notation).serialize(&tree);
        debug!(clif = %clif, "logical form derived");

        let document = DocumentAssembler::new(&self.config.metadata).assemble(&tree, visual, clif);
        info!(
            entities = document.entities().len(),
            predicates = document.predicates().len(),
            contexts = document.contexts().len(),
            "generated EGRF document"
        );
        Ok(document)
    }

    /// Generate, then validate the finished document.
    pub fn generate_validated(
        &self,
        graph: &GraphModel,
        validator: &SchemaValidator,
    ) -> Result<(EgrfDocument, ValidationReport), GenerateError> {
        if !validator.supports_generator_version() {
            warn!(
                schema = %validator.get_schema_version(),
                generator = EGRF_VERSION,
                "schema version differs from generated document version"
            );
        }

        let document = self.generate(graph)?;
        let report = validator.validate(&document.to_value()?);
        Ok((document, report))
    }

    /// Generate and serialize with the configured indent width.
    pub fn generate_json(&self, graph: &GraphModel) -> Result<String, GenerateError> {
        Ok(self.generate(graph)?.to_json(self.config.indent)?)
    }
}

impl Default for EgrfGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}
