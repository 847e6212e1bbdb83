//! EGRF Document - Assembly and Serialization
//!
//! The assembler only combines already-resolved parts and stamps the schema
//! version; it performs no validation. Documents have no mutators.

use serde::ser::Error as _;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::MetadataConfig;
use crate::context_tree::ContextTree;
use crate::graph::{ContextKind, EntityKind, ItemRef};
use crate::hashing;
use crate::visual::VisualSection;
use crate::{EGRF_VERSION, ENGINE_VERSION};

/// File extension for serialized documents
pub const EGRF_EXTENSION: &str = "egrf";

/// `path` with the `.egrf` extension added when it has none.
pub fn egrf_path(path: &Path) -> PathBuf {
    match path.extension() {
        Some(_) => path.to_path_buf(),
        None => path.with_extension(EGRF_EXTENSION),
    }
}

/// Whether `path` names a serialized document rather than a graph description.
pub fn is_egrf_path(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == EGRF_EXTENSION)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    /// Version of the generator that produced the document
    pub version: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredicateRecord {
    pub id: String,
    pub name: String,
    pub arity: usize,
    pub entities: Vec<String>,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContextRecord {
    pub id: String,
    pub kind: ContextKind,
    pub parent: Option<String>,
    pub depth: usize,
    pub negated: bool,
    pub contains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LogicalForm {
    pub clif_equivalent: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Semantics {
    pub logical_form: LogicalForm,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EgrfDocument {
    version: String,
    metadata: Metadata,
    entities: Vec<EntityRecord>,
    predicates: Vec<PredicateRecord>,
    contexts: Vec<ContextRecord>,
    visual: VisualSection,
    semantics: Semantics,
}

impl EgrfDocument {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    pub fn predicates(&self) -> &[PredicateRecord] {
        &self.predicates
    }

    pub fn contexts(&self) -> &[ContextRecord] {
        &self.contexts
    }

    pub fn visual(&self) -> &VisualSection {
        &self.visual
    }

    pub fn semantics(&self) -> &Semantics {
        &self.semantics
    }

    pub fn clif(&self) -> &str {
        &self.semantics.logical_form.clif_equivalent
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// JSON text; `indent == 0` gives compact output.
    pub fn to_json(&self, indent: usize) -> Result<String, serde_json::Error> {
        if indent == 0 {
            return serde_json::to_string(self);
        }

        let indent = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(serde_json::Error::custom)
    }

    /// SHA-256 over the compact JSON text
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        hashing::fingerprint(self)
    }
}

pub struct DocumentAssembler<'m> {
    metadata: &'m MetadataConfig,
}

impl<'m> DocumentAssembler<'m> {
    pub fn new(metadata: &'m MetadataConfig) -> Self {
        Self { metadata }
    }

    pub fn assemble(
        &self,
        tree: &ContextTree<'_>,
        visual: VisualSection,
        clif: String,
    ) -> EgrfDocument {
        let graph = tree.graph();
        let owner_of = |item: ItemRef| {
            tree.resolve_owner(item)
                .unwrap_or_else(|| tree.root())
                .to_string()
        };

        let entities = graph
            .entities()
            .map(|e| EntityRecord {
                id: e.id.to_string(),
                name: e.name.clone(),
                kind: e.kind,
                context: owner_of(ItemRef::Entity(e.id)),
            })
            .collect();

        let predicates = graph
            .predicates()
            .map(|p| PredicateRecord {
                id: p.id.to_string(),
                name: p.name.clone(),
                arity: p.arity(),
                entities: p.entities.iter().map(ToString::to_string).collect(),
                context: owner_of(ItemRef::Predicate(p.id)),
            })
            .collect();

        let contexts = graph
            .contexts()
            .map(|c| ContextRecord {
                id: c.id.to_string(),
                kind: c.kind,
                parent: c.parent.map(|p| p.to_string()),
                depth: c.depth,
                negated: c.is_negated(),
                contains: tree.contents(c.id).map(|i| i.to_string()).collect(),
            })
            .collect();

        EgrfDocument {
            version: EGRF_VERSION.to_string(),
            metadata: Metadata {
                title: self.metadata.title.clone(),
                description: self.metadata.description.clone(),
                version: ENGINE_VERSION.to_string(),
            },
            entities,
            predicates,
            contexts,
            visual,
            semantics: Semantics {
                logical_form: LogicalForm { clif_equivalent: clif },
            },
        }
    }
}
