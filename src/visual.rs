//! Visual Resolver - One Descriptor Per Item
//!
//! A predicate's look is an `Appearance`: either a box or a bare label. The
//! text-only field bundle is written in exactly one place (`Appearance::wire`),
//! and descriptors have no setters, so a resolved descriptor cannot be
//! partially overwritten later.

use serde::ser::Serializer;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::PredicateStyle;
use crate::context_tree::ContextTree;
use crate::graph::{ContextKind, ItemRef, Predicate};
use crate::layout::{BoundingBox, Layout, Point, Size};

pub const NONE: &str = "none";
pub const TRANSPARENT: &str = "transparent";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Fill {
    pub color: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
    pub style: String,
}

impl Stroke {
    fn solid(width: f64) -> Self {
        Self { color: "#000000".to_string(), width, style: "solid".to_string() }
    }

    fn hidden() -> Self {
        Self { color: TRANSPARENT.to_string(), width: 0.0, style: NONE.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Font {
    pub family: String,
    pub size: f64,
    pub weight: String,
    pub color: String,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            size: 14.0,
            weight: "normal".to_string(),
            color: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Label {
    pub text: String,
    /// Offset from the descriptor position
    pub position: Point,
    pub font: Font,
    pub alignment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Appearance {
    Boxed { size: Size, fill: Fill, stroke: Stroke },
    TextOnly,
}

/// Serialized field set shared by both styles.
#[derive(Serialize)]
struct AppearanceWire {
    style: &'static str,
    size: Size,
    fill: Fill,
    stroke: Stroke,
    border: &'static str,
    center_dot: &'static str,
    artifacts: &'static str,
    text_only: bool,
}

impl Appearance {
    pub fn is_text_only(&self) -> bool {
        matches!(self, Appearance::TextOnly)
    }

    pub fn style(&self) -> PredicateStyle {
        match self {
            Appearance::Boxed { .. } => PredicateStyle::Boxed,
            Appearance::TextOnly => PredicateStyle::None,
        }
    }

    pub fn size(&self) -> Size {
        match self {
            Appearance::Boxed { size, .. } => *size,
            Appearance::TextOnly => Size::ZERO,
        }
    }

    fn wire(&self) -> AppearanceWire {
        match self {
            Appearance::Boxed { size, fill, stroke } => AppearanceWire {
                style: "boxed",
                size: *size,
                fill: fill.clone(),
                stroke: stroke.clone(),
                border: "solid",
                center_dot: NONE,
                artifacts: NONE,
                text_only: false,
            },
            Appearance::TextOnly => AppearanceWire {
                style: NONE,
                size: Size::ZERO,
                fill: Fill { color: TRANSPARENT.to_string(), opacity: 0.0 },
                stroke: Stroke::hidden(),
                border: NONE,
                center_dot: NONE,
                artifacts: NONE,
                text_only: true,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredicateVisual {
    bounds: BoundingBox,
    appearance: Appearance,
    label: Label,
}

impl PredicateVisual {
    /// Reserved layout region
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Anchor point, the center of the reserved region
    pub fn position(&self) -> Point {
        self.bounds.center()
    }

    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    pub fn label(&self) -> &Label {
        &self.label
    }
}

impl Serialize for PredicateVisual {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            bounds: BoundingBox,
            position: Point,
            #[serde(flatten)]
            appearance: AppearanceWire,
            label: &'a Label,
        }

        Wire {
            bounds: self.bounds,
            position: self.position(),
            appearance: self.appearance.wire(),
            label: &self.label,
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntityVisual {
    pub bounds: BoundingBox,
    #[serde(rename = "type")]
    pub kind: String,
    pub stroke: Stroke,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContextVisual {
    pub bounds: BoundingBox,
    pub depth: usize,
    pub shaded: bool,
    pub fill: Fill,
    pub stroke: Stroke,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub background: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VisualSection {
    pub canvas: Canvas,
    pub entities: BTreeMap<String, EntityVisual>,
    pub predicates: BTreeMap<String, PredicateVisual>,
    pub contexts: BTreeMap<String, ContextVisual>,
}

pub struct VisualResolver {
    style: PredicateStyle,
}

impl VisualResolver {
    pub fn new(style: PredicateStyle) -> Self {
        Self { style }
    }

    /// The single descriptor for `predicate` placed at `bounds`.
    pub fn resolve(&self, predicate: &Predicate, bounds: BoundingBox) -> PredicateVisual {
        let appearance = match self.style {
            PredicateStyle::Boxed => Appearance::Boxed {
                size: bounds.size(),
                fill: Fill { color: "#ffffff".to_string(), opacity: 0.9 },
                stroke: Stroke::solid(1.0),
            },
            PredicateStyle::None => Appearance::TextOnly,
        };

        PredicateVisual {
            bounds,
            appearance,
            label: Label {
                text: predicate.name.clone(),
                position: Point { x: 0.0, y: 0.0 },
                font: Font::default(),
                alignment: "center".to_string(),
            },
        }
    }

    /// Descriptors for every laid-out item, built in one pass.
    pub fn resolve_all(&self, tree: &ContextTree<'_>, layout: &Layout) -> VisualSection {
        let graph = tree.graph();
        let root_box = layout
            .context(tree.root())
            .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0));

        let entities = graph
            .entities()
            .filter_map(|e| {
                let bounds = layout.get(ItemRef::Entity(e.id))?;
                Some((e.id.to_string(), entity_visual(bounds)))
            })
            .collect();

        let predicates = graph
            .predicates()
            .filter_map(|p| {
                layout
                    .get(ItemRef::Predicate(p.id))
                    .map(|b| (p.id.to_string(), self.resolve(p, b)))
            })
            .collect();

        let contexts = graph
            .contexts()
            .filter_map(|c| {
                layout.context(c.id).map(|b| {
                    let visual = context_visual(b, c.depth, c.kind);
                    (c.id.to_string(), visual)
                })
            })
            .collect();

        VisualSection {
            canvas: Canvas {
                width: root_box.width,
                height: root_box.height,
                background: "#ffffff".to_string(),
            },
            entities,
            predicates,
            contexts,
        }
    }
}

fn entity_visual(bounds: BoundingBox) -> EntityVisual {
    EntityVisual {
        bounds,
        kind: "line_of_identity".to_string(),
        stroke: Stroke::solid(3.0),
    }
}

fn context_visual(bounds: BoundingBox, depth: usize, kind: ContextKind) -> ContextVisual {
    let shaded = depth % 2 == 1;
    let fill = if shaded {
        Fill { color: "#d0d0d0".to_string(), opacity: 0.7 }
    } else {
        Fill { color: "#ffffff".to_string(), opacity: 0.0 }
    };
    let stroke = match kind {
        ContextKind::SheetOfAssertion => Stroke::hidden(),
        ContextKind::Cut => Stroke::solid(1.5),
    };

    ContextVisual { bounds, depth, shaded, fill, stroke }
}
