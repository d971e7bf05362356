//! The drawing surface the synchronizer materializes diagrams onto.
//!
//! [`Canvas`] is the capability boundary: a browser widget, a desktop view
//! or [`MemoryCanvas`] all expose the same five primitives.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::geometry::{Bounds, Point, Size};

/// Identifier of a shape on a canvas, unique for the canvas' lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u64);

impl ShapeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape:{}", self.0)
    }
}

impl Serialize for ShapeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RectangleShape {
    pub origin: Point,
    pub size: Size,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// An arrow between two points, optionally bound to the shapes it connects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowShape {
    pub start: Point,
    pub end: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_binding: Option<ShapeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_binding: Option<ShapeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Shape {
    Rectangle(RectangleShape),
    Arrow(ArrowShape),
}

impl Shape {
    pub fn bounds(&self) -> Bounds {
        match self {
            Shape::Rectangle(r) => Bounds::from_top_left(r.origin, r.size),
            Shape::Arrow(a) => Bounds::from_points(a.start, a.end),
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Shape::Rectangle(r) => r.label.as_deref(),
            Shape::Arrow(a) => a.label.as_deref(),
        }
    }
}

pub trait Canvas {
    /// Ids of every shape on the active surface.
    fn shape_ids(&self) -> Vec<ShapeId>;

    /// Delete all `ids` in one batch. Unknown ids are ignored.
    fn delete_shapes(&mut self, ids: &[ShapeId]);

    fn create_rectangle(&mut self, shape: RectangleShape) -> ShapeId;

    fn create_arrow(&mut self, shape: ArrowShape) -> ShapeId;

    /// Frame the bounding box of all current shapes.
    fn zoom_to_fit(&mut self);
}

/// A canvas that keeps its shapes in memory, in creation order.
#[derive(Debug, Clone, Default)]
pub struct MemoryCanvas {
    shapes: BTreeMap<ShapeId, Shape>,
    next_id: u64,
    viewport: Option<Bounds>,
}

impl MemoryCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn shapes(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.shapes.iter().map(|(id, shape)| (*id, shape))
    }

    /// The region framed by the last [`Canvas::zoom_to_fit`], if any.
    pub fn viewport(&self) -> Option<Bounds> {
        self.viewport
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot {
            shapes: self
                .shapes()
                .map(|(id, shape)| PlacedShape {
                    id,
                    shape: shape.clone(),
                })
                .collect(),
            viewport: self.viewport,
        }
    }

    fn insert(&mut self, shape: Shape) -> ShapeId {
        self.next_id += 1;
        let id = ShapeId(self.next_id);
        self.shapes.insert(id, shape);
        id
    }
}

impl Canvas for MemoryCanvas {
    fn shape_ids(&self) -> Vec<ShapeId> {
        self.shapes.keys().copied().collect()
    }

    fn delete_shapes(&mut self, ids: &[ShapeId]) {
        for id in ids {
            self.shapes.remove(id);
        }
    }

    fn create_rectangle(&mut self, shape: RectangleShape) -> ShapeId {
        self.insert(Shape::Rectangle(shape))
    }

    fn create_arrow(&mut self, shape: ArrowShape) -> ShapeId {
        self.insert(Shape::Arrow(shape))
    }

    fn zoom_to_fit(&mut self) {
        self.viewport = self
            .shapes
            .values()
            .map(Shape::bounds)
            .reduce(Bounds::merge);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedShape {
    pub id: ShapeId,
    pub shape: Shape,
}

/// Serializable view of a [`MemoryCanvas`].
#[derive(Debug, Clone, Serialize)]
pub struct CanvasSnapshot {
    pub shapes: Vec<PlacedShape>,
    pub viewport: Option<Bounds>,
}
