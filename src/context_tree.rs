//! Context Tree - Nesting and Ownership
//!
//! Resolving a graph into a `ContextTree` fixes the owner of every item. The
//! layout stage only accepts `OwnedItem` values handed out by a resolved tree,
//! so positions can never be computed ahead of ownership.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::graph::{Context, ContextId, GraphModel, ItemRef};

/// An item paired with its resolved owning context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedItem {
    item: ItemRef,
    owner: ContextId,
}

impl OwnedItem {
    pub fn item(&self) -> ItemRef {
        self.item
    }

    pub fn owner(&self) -> ContextId {
        self.owner
    }
}

#[derive(Debug, Clone)]
pub struct ContextTree<'g> {
    graph: &'g GraphModel,
    owners: BTreeMap<ItemRef, ContextId>,
    contents: BTreeMap<ContextId, BTreeSet<ItemRef>>,
    children: BTreeMap<ContextId, Vec<ContextId>>,
    fallbacks: Vec<ItemRef>,
}

impl<'g> ContextTree<'g> {
    /// Resolve ownership for every entity, predicate and context in `graph`.
    ///
    /// Items without an explicit context are owned by the root.
    pub fn resolve(graph: &'g GraphModel) -> Self {
        let root = graph.root();
        let mut owners = BTreeMap::new();
        let mut contents: BTreeMap<ContextId, BTreeSet<ItemRef>> = BTreeMap::new();
        let mut children: BTreeMap<ContextId, Vec<ContextId>> = BTreeMap::new();
        let mut fallbacks = Vec::new();

        for context in graph.contexts() {
            contents.entry(context.id).or_default();
            children.entry(context.id).or_default();
            if let Some(parent) = context.parent {
                children.entry(parent).or_default().push(context.id);
                owners.insert(ItemRef::Context(context.id), parent);
            }
        }

        let assigned = graph
            .entities()
            .map(|e| (ItemRef::Entity(e.id), e.context))
            .chain(graph.predicates().map(|p| (ItemRef::Predicate(p.id), p.context)));

        for (item, context) in assigned {
            let owner = match context {
                Some(ctx) => ctx,
                None => {
                    debug!(item = %item, "no explicit context, owned by root");
                    fallbacks.push(item);
                    root
                }
            };
            owners.insert(item, owner);
        }

        for (item, owner) in &owners {
            contents.entry(*owner).or_default().insert(*item);
        }

        Self {
            graph,
            owners,
            contents,
            children,
            fallbacks,
        }
    }

    pub fn graph(&self) -> &'g GraphModel {
        self.graph
    }

    pub fn root(&self) -> ContextId {
        self.graph.root()
    }

    pub fn context(&self, id: ContextId) -> Option<&'g Context> {
        self.graph.context(id)
    }

    /// Owning context of an item. `None` for the root context or unknown items.
    pub fn resolve_owner(&self, item: ItemRef) -> Option<ContextId> {
        self.owners.get(&item).copied()
    }

    /// The item with its owner attached, ready for placement.
    pub fn owned(&self, item: ItemRef) -> Option<OwnedItem> {
        self.resolve_owner(item).map(|owner| OwnedItem { item, owner })
    }

    /// Items directly inside `context`, ordered entities, predicates, then cuts.
    pub fn contained_items(&self, context: ContextId) -> BTreeSet<ItemRef> {
        self.contents.get(&context).cloned().unwrap_or_default()
    }

    pub(crate) fn contents(&self, context: ContextId) -> impl Iterator<Item = ItemRef> + '_ {
        self.contents.get(&context).into_iter().flatten().copied()
    }

    pub fn depth(&self, context: ContextId) -> Option<usize> {
        self.graph.context(context).map(|c| c.depth)
    }

    pub fn is_negated(&self, context: ContextId) -> bool {
        self.graph.context(context).map_or(false, Context::is_negated)
    }

    pub fn parent(&self, context: ContextId) -> Option<ContextId> {
        self.graph.context(context).and_then(|c| c.parent)
    }

    /// Direct child contexts in creation order
    pub fn children(&self, context: ContextId) -> &[ContextId] {
        self.children.get(&context).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ancestors of `context`, nearest first, ending at the root.
    pub fn ancestors(&self, context: ContextId) -> Vec<ContextId> {
        let mut chain = Vec::new();
        let mut current = self.parent(context);
        while let Some(id) = current {
            chain.push(id);
            current = self.parent(id);
        }
        chain
    }

    pub fn is_ancestor(&self, ancestor: ContextId, context: ContextId) -> bool {
        self.ancestors(context).contains(&ancestor)
    }

    /// `context` and every context nested in it, parents before children.
    pub fn descendants(&self, context: ContextId) -> Vec<ContextId> {
        let mut order = Vec::new();
        let mut stack = vec![context];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    /// Deepest context enclosing both `a` and `b` (either may be the answer).
    pub fn common_ancestor(&self, a: ContextId, b: ContextId) -> ContextId {
        let depth = |c: ContextId| self.depth(c).unwrap_or(0);
        let (mut a, mut b) = (a, b);
        while depth(a) > depth(b) {
            match self.parent(a) {
                Some(p) => a = p,
                None => break,
            }
        }
        while depth(b) > depth(a) {
            match self.parent(b) {
                Some(p) => b = p,
                None => break,
            }
        }
        while a != b {
            match (self.parent(a), self.parent(b)) {
                (Some(pa), Some(pb)) => {
                    a = pa;
                    b = pb;
                }
                _ => return self.root(),
            }
        }
        a
    }

    /// Items owned by the root only because they had no explicit context.
    pub fn fallback_items(&self) -> &[ItemRef] {
        &self.fallbacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EntityKind;

    #[test]
    fn test_unassigned_items_fall_back_to_root() {
        let graph = GraphModel::new();
        let (graph, x) = graph.add_entity("x", EntityKind::Variable);
        let (graph, p) = graph.add_predicate("P", &[x]).unwrap();
        let tree = ContextTree::resolve(&graph);

        assert_eq!(tree.resolve_owner(ItemRef::Entity(x)), Some(graph.root()));
        assert_eq!(tree.resolve_owner(ItemRef::Predicate(p)), Some(graph.root()));
        assert_eq!(tree.fallback_items().len(), 2);
    }

    #[test]
    fn test_explicit_assignment_wins() {
        let graph = GraphModel::new();
        let (graph, cut) = graph.add_cut(graph.root()).unwrap();
        let (graph, x) = graph.add_entity_in(cut, "x", EntityKind::Variable).unwrap();
        let tree = ContextTree::resolve(&graph);

        assert_eq!(tree.resolve_owner(ItemRef::Entity(x)), Some(cut));
        assert!(tree.contained_items(cut).contains(&ItemRef::Entity(x)));
        assert!(!tree.contained_items(graph.root()).contains(&ItemRef::Entity(x)));
        assert!(tree.fallback_items().is_empty());
    }

    #[test]
    fn test_root_has_no_owner() {
        let graph = GraphModel::new();
        let tree = ContextTree::resolve(&graph);
        assert_eq!(tree.resolve_owner(ItemRef::Context(graph.root())), None);
        assert!(tree.owned(ItemRef::Context(graph.root())).is_none());
    }

    #[test]
    fn test_depth_parity_and_ancestry() {
        let graph = GraphModel::new();
        let root = graph.root();
        let (graph, outer) = graph.add_cut(root).unwrap();
        let (graph, inner) = graph.add_cut(outer).unwrap();
        let tree = ContextTree::resolve(&graph);

        assert_eq!(tree.depth(inner), Some(2));
        assert!(tree.is_negated(outer));
        assert!(!tree.is_negated(inner));
        assert!(!tree.is_negated(root));
        assert_eq!(tree.ancestors(inner), vec![outer, root]);
        assert!(tree.is_ancestor(root, inner));
        assert!(!tree.is_ancestor(inner, outer));
        assert_eq!(tree.children(root), &[outer]);
        assert!(tree.contained_items(outer).contains(&ItemRef::Context(inner)));
    }

    #[test]
    fn test_contained_items_order() {
        let graph = GraphModel::new();
        let root = graph.root();
        let (graph, cut) = graph.add_cut(root).unwrap();
        let (graph, x) = graph.add_entity("x", EntityKind::Variable);
        let (graph, p) = graph.add_predicate("P", &[x]).unwrap();
        let tree = ContextTree::resolve(&graph);

        let items: Vec<_> = tree.contained_items(root).into_iter().collect();
        assert_eq!(
            items,
            vec![ItemRef::Entity(x), ItemRef::Predicate(p), ItemRef::Context(cut)]
        );
    }

    #[test]
    fn test_descendants_and_common_ancestor() {
        let graph = GraphModel::new();
        let root = graph.root();
        let (graph, left) = graph.add_cut(root).unwrap();
        let (graph, right) = graph.add_cut(root).unwrap();
        let (graph, deep) = graph.add_cut(left).unwrap();
        let tree = ContextTree::resolve(&graph);

        assert_eq!(tree.descendants(root), vec![root, left, deep, right]);
        assert_eq!(tree.descendants(left), vec![left, deep]);
        assert_eq!(tree.common_ancestor(deep, right), root);
        assert_eq!(tree.common_ancestor(deep, left), left);
        assert_eq!(tree.common_ancestor(deep, deep), deep);
    }
}
