//! Graph Input - JSON Graph Descriptions
//!
//! A `GraphSpec` names cuts, entities and predicates and is replayed through
//! the graph construction operations. Cuts must be declared after their
//! parent, which rules out cycles.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::graph::{ContextId, EntityId, EntityKind, GraphError, GraphModel};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    #[serde(default)]
    pub cuts: Vec<CutSpec>,
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
    #[serde(default)]
    pub predicates: Vec<PredicateSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutSpec {
    pub name: String,
    /// Enclosing cut; the sheet of assertion when absent
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredicateSpec {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl GraphSpec {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Build the graph these declarations describe.
    pub fn build(&self) -> Result<GraphModel, GraphError> {
        let mut graph = GraphModel::new();
        let mut cuts: HashMap<&str, ContextId> = HashMap::new();
        let mut entities: HashMap<&str, EntityId> = HashMap::new();

        for cut in &self.cuts {
            if cuts.contains_key(cut.name.as_str()) {
                return Err(GraphError::DuplicateName(cut.name.clone()));
            }
            let parent = resolve_context(&graph, &cuts, cut.parent.as_deref())?;
            let (next, id) = graph.add_cut(parent)?;
            graph = next;
            cuts.insert(&cut.name, id);
        }

        for entity in &self.entities {
            if entities.contains_key(entity.name.as_str()) {
                return Err(GraphError::DuplicateName(entity.name.clone()));
            }
            let (next, id) = match entity.context.as_deref() {
                Some(name) => {
                    let ctx = resolve_context(&graph, &cuts, Some(name))?;
                    graph.add_entity_in(ctx, &entity.name, entity.kind)?
                }
                None => graph.add_entity(&entity.name, entity.kind),
            };
            graph = next;
            entities.insert(&entity.name, id);
        }

        for predicate in &self.predicates {
            let args = predicate
                .args
                .iter()
                .map(|a| {
                    entities
                        .get(a.as_str())
                        .copied()
                        .ok_or_else(|| GraphError::UnknownEntity(a.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let (next, _) = match predicate.context.as_deref() {
                Some(name) => {
                    let ctx = resolve_context(&graph, &cuts, Some(name))?;
                    graph.add_predicate_in(ctx, &predicate.name, &args)?
                }
                None => graph.add_predicate(&predicate.name, &args)?,
            };
            graph = next;
        }

        Ok(graph)
    }
}

/// `None` and `"sheet"` name the sheet of assertion.
fn resolve_context(
    graph: &GraphModel,
    cuts: &HashMap<&str, ContextId>,
    name: Option<&str>,
) -> Result<ContextId, GraphError> {
    match name {
        None | Some("sheet") => Ok(graph.root()),
        Some(name) => cuts
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownContext(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_nested_graph() {
        let spec = GraphSpec::from_json(
            r#"{
                "cuts": [{"name": "outer"}, {"name": "inner", "parent": "outer"}],
                "entities": [{"name": "x", "kind": "variable"}],
                "predicates": [
                    {"name": "Man", "args": ["x"], "context": "outer"},
                    {"name": "Mortal", "args": ["x"], "context": "inner"}
                ]
            }"#,
        )
        .unwrap();
        let graph = spec.build().unwrap();

        assert_eq!(graph.context_count(), 3);
        assert_eq!(graph.entity_count(), 1);
        let depths: Vec<_> = graph.contexts().map(|c| c.depth).collect();
        assert_eq!(depths, vec![0, 1, 2]);
    }

    #[test]
    fn test_parent_must_be_declared_first() {
        let spec = GraphSpec::from_json(
            r#"{"cuts": [{"name": "a", "parent": "b"}, {"name": "b", "parent": "a"}]}"#,
        )
        .unwrap();
        assert_eq!(spec.build().unwrap_err(), GraphError::UnknownContext("b".to_string()));
    }

    #[test]
    fn test_unknown_argument() {
        let spec =
            GraphSpec::from_json(r#"{"predicates": [{"name": "P", "args": ["ghost"]}]}"#).unwrap();
        assert_eq!(spec.build().unwrap_err(), GraphError::UnknownEntity("ghost".to_string()));
    }

    #[test]
    fn test_duplicate_entity_name() {
        let spec = GraphSpec::from_json(
            r#"{"entities": [
                {"name": "x", "kind": "variable"},
                {"name": "x", "kind": "individual"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(spec.build().unwrap_err(), GraphError::DuplicateName("x".to_string()));
    }
}
