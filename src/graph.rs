//! Graph Model - Persistent Existential Graphs
//!
//! Every construction operation returns a new graph value. Earlier values stay
//! valid and are never mutated. Tables are persistent ordered maps, so a new
//! version shares all untouched nodes with its predecessor and each add costs
//! O(log n).

use im::OrdMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Context not found: {0}")]
    UnknownContext(String),

    #[error("Entity not found: {0}")]
    UnknownEntity(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),
}

macro_rules! graph_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn index(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

graph_id!(EntityId, "entity");
graph_id!(PredicateId, "predicate");
graph_id!(ContextId, "context");

/// Any item a context can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemRef {
    Entity(EntityId),
    Predicate(PredicateId),
    Context(ContextId),
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Entity(id) => id.fmt(f),
            ItemRef::Predicate(id) => id.fmt(f),
            ItemRef::Context(id) => id.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A named constant
    Individual,
    /// An existentially quantified line of identity
    Variable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    SheetOfAssertion,
    Cut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    /// Explicit owner; `None` defers to the root fallback policy.
    pub context: Option<ContextId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub id: PredicateId,
    pub name: String,
    pub entities: Vec<EntityId>,
    pub context: Option<ContextId>,
}

impl Predicate {
    pub fn arity(&self) -> usize {
        self.entities.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub id: ContextId,
    pub parent: Option<ContextId>,
    pub kind: ContextKind,
    pub depth: usize,
}

impl Context {
    /// Odd depth means the context is negated relative to the sheet.
    pub fn is_negated(&self) -> bool {
        self.depth % 2 == 1
    }
}

#[derive(Debug, Clone)]
pub struct GraphModel {
    root: ContextId,
    next_id: u32,
    entities: OrdMap<EntityId, Entity>,
    predicates: OrdMap<PredicateId, Predicate>,
    contexts: OrdMap<ContextId, Context>,
}

impl GraphModel {
    /// An empty graph holding only the sheet of assertion.
    pub fn new() -> Self {
        let root = ContextId(0);
        let contexts = OrdMap::unit(root, Context {
            id: root,
            parent: None,
            kind: ContextKind::SheetOfAssertion,
            depth: 0,
        });

        Self {
            root,
            next_id: 1,
            entities: OrdMap::new(),
            predicates: OrdMap::new(),
            contexts,
        }
    }

    pub fn root(&self) -> ContextId {
        self.root
    }

    /// Add an entity without an explicit owner (it resolves to the root).
    pub fn add_entity(&self, name: &str, kind: EntityKind) -> (Self, EntityId) {
        let mut next = self.clone();
        let id = EntityId(next.allocate());
        next.entities.insert(id, Entity {
            id,
            name: name.to_string(),
            kind,
            context: None,
        });
        (next, id)
    }

    /// Add an entity owned by `context`.
    pub fn add_entity_in(
        &self,
        context: ContextId,
        name: &str,
        kind: EntityKind,
    ) -> Result<(Self, EntityId), GraphError> {
        self.require_context(context)?;
        let (mut next, id) = self.add_entity(name, kind);
        if let Some(entity) = next.entities.get_mut(&id) {
            entity.context = Some(context);
        }
        Ok((next, id))
    }

    /// Add a predicate without an explicit owner (it resolves to the root).
    pub fn add_predicate(
        &self,
        name: &str,
        entities: &[EntityId],
    ) -> Result<(Self, PredicateId), GraphError> {
        self.insert_predicate(None, name, entities)
    }

    /// Add a predicate owned by `context`.
    pub fn add_predicate_in(
        &self,
        context: ContextId,
        name: &str,
        entities: &[EntityId],
    ) -> Result<(Self, PredicateId), GraphError> {
        self.require_context(context)?;
        self.insert_predicate(Some(context), name, entities)
    }

    /// Create a context nested directly inside `parent`.
    pub fn create_context(
        &self,
        parent: ContextId,
        kind: ContextKind,
    ) -> Result<(Self, ContextId), GraphError> {
        let depth = self.require_context(parent)?.depth + 1;
        let mut next = self.clone();
        let id = ContextId(next.allocate());
        next.contexts.insert(id, Context {
            id,
            parent: Some(parent),
            kind,
            depth,
        });
        Ok((next, id))
    }

    /// Shorthand for `create_context(parent, ContextKind::Cut)`.
    pub fn add_cut(&self, parent: ContextId) -> Result<(Self, ContextId), GraphError> {
        self.create_context(parent, ContextKind::Cut)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn predicate(&self, id: PredicateId) -> Option<&Predicate> {
        self.predicates.get(&id)
    }

    pub fn context(&self, id: ContextId) -> Option<&Context> {
        self.contexts.get(&id)
    }

    /// Entities in creation order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Predicates in creation order
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.values()
    }

    /// Contexts in creation order, root first
    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    fn insert_predicate(
        &self,
        context: Option<ContextId>,
        name: &str,
        entities: &[EntityId],
    ) -> Result<(Self, PredicateId), GraphError> {
        if let Some(missing) = entities.iter().find(|e| !self.entities.contains_key(e)) {
            return Err(GraphError::UnknownEntity(missing.to_string()));
        }

        let mut next = self.clone();
        let id = PredicateId(next.allocate());
        next.predicates.insert(id, Predicate {
            id,
            name: name.to_string(),
            entities: entities.to_vec(),
            context,
        });
        Ok((next, id))
    }

    fn require_context(&self, id: ContextId) -> Result<&Context, GraphError> {
        self.contexts
            .get(&id)
            .ok_or_else(|| GraphError::UnknownContext(id.to_string()))
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new()
    }
}
