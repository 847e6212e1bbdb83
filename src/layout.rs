//! Position Calculator - Deterministic Containment Layout
//!
//! Contexts are sized bottom-up from their contents, then placed top-down.
//! Inside a context, items are laid out in a near-square grid of rows, inset
//! by the margin and separated by the spacing. The result depends only on the
//! resolved tree and the layout config.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::context_tree::{ContextTree, OwnedItem};
use crate::graph::{ContextId, ItemRef};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size { width: 0.0, height: 0.0 };

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn size(&self) -> Size {
        Size { width: self.width, height: self.height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// True when `other` lies within this box shrunk by `inset` on every side.
    pub fn contains(&self, other: &BoundingBox, inset: f64) -> bool {
        const EPS: f64 = 1e-9;
        other.x + EPS >= self.x + inset
            && other.y + EPS >= self.y + inset
            && other.right() <= self.right() - inset + EPS
            && other.bottom() <= self.bottom() - inset + EPS
    }

    /// Strict overlap; boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Placement of every item in a resolved graph
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    boxes: BTreeMap<ItemRef, BoundingBox>,
}

impl Layout {
    pub fn get(&self, item: ItemRef) -> Option<BoundingBox> {
        self.boxes.get(&item).copied()
    }

    pub fn context(&self, id: ContextId) -> Option<BoundingBox> {
        self.get(ItemRef::Context(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemRef, &BoundingBox)> {
        self.boxes.iter()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

pub struct PositionCalculator<'c> {
    config: &'c LayoutConfig,
}

impl<'c> PositionCalculator<'c> {
    pub fn new(config: &'c LayoutConfig) -> Self {
        Self { config }
    }

    pub fn margin(&self) -> f64 {
        self.config.margin
    }

    /// Bounding box for a single item whose owner is already resolved.
    pub fn place(&self, tree: &ContextTree<'_>, item: OwnedItem) -> BoundingBox {
        let layout = self.layout(tree);
        // Every owned item handed out by the tree is part of the layout.
        layout
            .get(item.item())
            .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Bounding boxes for the root context and everything nested in it.
    ///
    /// Sizes are computed innermost context first and boxes outermost first,
    /// both over one traversal order, so deep nesting never recurses.
    pub fn layout(&self, tree: &ContextTree<'_>) -> Layout {
        let root = tree.root();
        let order = tree.descendants(root);

        let mut sizes = BTreeMap::new();
        for &context in order.iter().rev() {
            let size = self.measure_context(tree, context, &sizes);
            sizes.insert(context, size);
        }

        let root_size = sizes.get(&root).copied().unwrap_or(Size {
            width: self.config.canvas_width,
            height: self.config.canvas_height,
        });
        let mut boxes = BTreeMap::new();
        boxes.insert(
            ItemRef::Context(root),
            BoundingBox::new(0.0, 0.0, root_size.width, root_size.height),
        );
        for &context in &order {
            if let Some(bounds) = boxes.get(&ItemRef::Context(context)).copied() {
                self.place_contents(tree, context, bounds, &sizes, &mut boxes);
            }
        }
        Layout { boxes }
    }

    fn item_size(
        &self,
        tree: &ContextTree<'_>,
        item: ItemRef,
        sizes: &BTreeMap<ContextId, Size>,
    ) -> Size {
        match item {
            ItemRef::Entity(_) => Size {
                width: self.config.entity_size,
                height: self.config.entity_size,
            },
            ItemRef::Predicate(id) => {
                let chars = tree
                    .graph()
                    .predicate(id)
                    .map_or(0, |p| p.name.chars().count());
                Size {
                    width: self.config.predicate_width.max(chars as f64 * self.config.char_width),
                    height: self.config.predicate_height,
                }
            }
            ItemRef::Context(id) => sizes.get(&id).copied().unwrap_or(Size {
                width: self.config.min_cut_width,
                height: self.config.min_cut_height,
            }),
        }
    }

    /// Size of `context`; child contexts must already be in `sizes`.
    fn measure_context(
        &self,
        tree: &ContextTree<'_>,
        context: ContextId,
        sizes: &BTreeMap<ContextId, Size>,
    ) -> Size {
        let items: Vec<Size> = tree
            .contents(context)
            .map(|item| self.item_size(tree, item, sizes))
            .collect();
        let content = self.grid_extent(&items);

        let (min_w, min_h) = if context == tree.root() {
            (self.config.canvas_width, self.config.canvas_height)
        } else {
            (self.config.min_cut_width, self.config.min_cut_height)
        };
        Size {
            width: (content.width + 2.0 * self.config.margin).max(min_w),
            height: (content.height + 2.0 * self.config.margin).max(min_h),
        }
    }

    /// Boxes for the items directly inside `context`, whose box is `bounds`.
    fn place_contents(
        &self,
        tree: &ContextTree<'_>,
        context: ContextId,
        bounds: BoundingBox,
        sizes: &BTreeMap<ContextId, Size>,
        boxes: &mut BTreeMap<ItemRef, BoundingBox>,
    ) {
        let items: Vec<ItemRef> = tree.contents(context).collect();
        let columns = grid_columns(items.len());
        let mut y = bounds.y + self.config.margin;

        for row in items.chunks(columns.max(1)) {
            let mut x = bounds.x + self.config.margin;
            let mut row_height: f64 = 0.0;
            for &item in row {
                let size = self.item_size(tree, item, sizes);
                boxes.insert(item, BoundingBox::new(x, y, size.width, size.height));
                x += size.width + self.config.spacing;
                row_height = row_height.max(size.height);
            }
            y += row_height + self.config.spacing;
        }
    }

    fn grid_extent(&self, items: &[Size]) -> Size {
        if items.is_empty() {
            return Size::ZERO;
        }

        let columns = grid_columns(items.len());
        let rows: Vec<&[Size]> = items.chunks(columns).collect();
        let spacing = self.config.spacing;

        let width = rows
            .iter()
            .map(|row| {
                row.iter().map(|s| s.width).sum::<f64>() + spacing * (row.len() - 1) as f64
            })
            .fold(0.0, f64::max);
        let height = rows
            .iter()
            .map(|row| row.iter().map(|s| s.height).fold(0.0, f64::max))
            .sum::<f64>()
            + spacing * (rows.len() - 1) as f64;

        Size { width, height }
    }
}

/// Columns for a near-square grid of `n` items.
fn grid_columns(n: usize) -> usize {
    let mut columns = 1;
    while columns * columns < n {
        columns += 1;
    }
    columns
}
