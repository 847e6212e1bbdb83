//! CLIF Serializer - Logical Form From the Context Tree
//!
//! A context emits the conjunction of its predicates and one `(not ...)` per
//! child cut, so every cut adds exactly one negation. A variable is
//! existentially quantified in the innermost context that encloses its owner
//! and every predicate applied to it; individuals are constants. The empty
//! conjunction `(and)` stands for truth.
//!
//! Contexts are emitted innermost first from an explicit traversal order, so
//! nesting depth is bounded by memory rather than by the call stack.

use std::collections::BTreeMap;

use crate::config::AtomNotation;
use crate::context_tree::ContextTree;
use crate::graph::{ContextId, ContextKind, EntityKind, ItemRef, Predicate};

pub struct ClifSerializer {
    notation: AtomNotation,
}

impl ClifSerializer {
    pub fn new(notation: AtomNotation) -> Self {
        Self { notation }
    }

    /// Logical form of the whole graph, starting at the sheet of assertion.
    pub fn serialize(&self, tree: &ContextTree<'_>) -> String {
        self.context_form(tree, tree.root())
    }

    /// Logical form of `context` without the negation its own cut adds.
    pub fn context_form(&self, tree: &ContextTree<'_>, context: ContextId) -> String {
        let graph = tree.graph();
        let scopes = variable_scopes(tree);
        let mut forms: BTreeMap<ContextId, String> = BTreeMap::new();

        for ctx in tree.descendants(context).into_iter().rev() {
            let mut conjuncts = Vec::new();
            for item in tree.contents(ctx) {
                match item {
                    ItemRef::Predicate(id) => {
                        if let Some(predicate) = graph.predicate(id) {
                            conjuncts.push(self.atom(tree, predicate));
                        }
                    }
                    ItemRef::Context(child) => {
                        let inner = forms.remove(&child).unwrap_or_else(|| "(and)".to_string());
                        match tree.context(child).map(|c| c.kind) {
                            Some(ContextKind::Cut) => conjuncts.push(format!("(not {})", inner)),
                            _ => conjuncts.push(inner),
                        }
                    }
                    ItemRef::Entity(_) => {}
                }
            }

            let body = conjunction(conjuncts);
            let form = match scopes.get(&ctx) {
                Some(names) => format!("(exists ({}) {})", names.join(" "), body),
                None => body,
            };
            forms.insert(ctx, form);
        }

        forms.remove(&context).unwrap_or_else(|| "(and)".to_string())
    }

    fn atom(&self, tree: &ContextTree<'_>, predicate: &Predicate) -> String {
        let args: Vec<String> = predicate
            .entities
            .iter()
            .map(|id| {
                tree.graph()
                    .entity(*id)
                    .map_or_else(|| id.to_string(), |e| symbol(&e.name))
            })
            .collect();
        let name = symbol(&predicate.name);

        match self.notation {
            AtomNotation::Functional => format!("{}({})", name, args.join(", ")),
            AtomNotation::Prefix if args.is_empty() => format!("({})", name),
            AtomNotation::Prefix => format!("({} {})", name, args.join(" ")),
        }
    }
}

/// Quantifier placement: context -> variable names bound there, in entity order.
///
/// A variable used outside its owner is bound at the common ancestor of the
/// owner and every context holding a predicate over it, so no atom mentions
/// a variable outside its quantifier.
fn variable_scopes(tree: &ContextTree<'_>) -> BTreeMap<ContextId, Vec<String>> {
    let graph = tree.graph();
    let mut scope: BTreeMap<_, ContextId> = graph
        .entities()
        .filter(|e| e.kind == EntityKind::Variable)
        .filter_map(|e| tree.resolve_owner(ItemRef::Entity(e.id)).map(|owner| (e.id, owner)))
        .collect();

    for predicate in graph.predicates() {
        let Some(owner) = tree.resolve_owner(ItemRef::Predicate(predicate.id)) else {
            continue;
        };
        for id in &predicate.entities {
            if let Some(ctx) = scope.get_mut(id) {
                *ctx = tree.common_ancestor(*ctx, owner);
            }
        }
    }

    let mut bound: BTreeMap<ContextId, Vec<String>> = BTreeMap::new();
    for (id, ctx) in scope {
        if let Some(entity) = graph.entity(id) {
            bound.entry(ctx).or_default().push(symbol(&entity.name));
        }
    }
    bound
}

/// Names that are not plain CLIF symbols are single-quoted.
fn symbol(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '\'' | '"' | '\\' | ','));
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

fn conjunction(conjuncts: Vec<String>) -> String {
    match conjuncts.len() {
        0 => "(and)".to_string(),
        1 => conjuncts.into_iter().next().unwrap_or_default(),
        _ => format!("(and {})", conjuncts.join(" ")),
    }
}
