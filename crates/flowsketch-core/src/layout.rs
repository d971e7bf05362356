//! Single-column layout.
//!
//! Nodes are stacked top to bottom in input order at a fixed pitch, each
//! with the same fixed size. The generator is responsible for a meaningful
//! ordering; this module only guarantees stable, non-overlapping placement.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::geometry::{Bounds, Point, Size};
use crate::GraphDescription;

/// Left edge of the node column.
pub const COLUMN_X: f64 = 100.0;
/// Top edge of the first node.
pub const START_Y: f64 = 100.0;
/// Vertical distance between the top edges of consecutive nodes.
pub const ROW_GAP: f64 = 150.0;
pub const NODE_SIZE: Size = Size::new(200.0, 60.0);

/// Node id to node center point. Built fresh for every layout pass.
pub type PositionMap = HashMap<String, Point>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleDraw {
    pub node_id: String,
    /// Top-left corner.
    pub origin: Point,
    pub size: Size,
    pub label: Option<String>,
}

impl RectangleDraw {
    pub fn center(&self) -> Point {
        Bounds::from_top_left(self.origin, self.size).center()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowDraw {
    pub source: String,
    pub target: String,
    pub start: Point,
    pub end: Point,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DrawInstruction {
    Rectangle(RectangleDraw),
    Arrow(ArrowDraw),
}

/// Render-ready instructions: every rectangle, then every arrow, each group
/// in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrawPlan {
    instructions: Vec<DrawInstruction>,
}

impl DrawPlan {
    pub fn instructions(&self) -> &[DrawInstruction] {
        &self.instructions
    }

    pub fn rectangles(&self) -> impl Iterator<Item = &RectangleDraw> {
        self.instructions.iter().filter_map(|i| match i {
            DrawInstruction::Rectangle(r) => Some(r),
            DrawInstruction::Arrow(_) => None,
        })
    }

    pub fn arrows(&self) -> impl Iterator<Item = &ArrowDraw> {
        self.instructions.iter().filter_map(|i| match i {
            DrawInstruction::Arrow(a) => Some(a),
            DrawInstruction::Rectangle(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub positions: PositionMap,
    pub plan: DrawPlan,
}

/// Lay out `graph` in a single column. Never fails.
///
/// A later node with a duplicate id overwrites the earlier node's entry in
/// the position map; both rectangles are still drawn. Edges whose endpoints
/// are missing from the position map are dropped.
pub fn layout(graph: &GraphDescription) -> Layout {
    let mut positions = PositionMap::with_capacity(graph.nodes.len());
    let mut instructions = Vec::with_capacity(graph.nodes.len() + graph.edges.len());

    for (i, node) in graph.nodes.iter().enumerate() {
        let rect = RectangleDraw {
            node_id: node.id.clone(),
            origin: Point::new(COLUMN_X, START_Y + i as f64 * ROW_GAP),
            size: NODE_SIZE,
            label: text_of(&node.label),
        };
        if !node.id.is_empty() {
            positions.insert(node.id.clone(), rect.center());
        }
        instructions.push(DrawInstruction::Rectangle(rect));
    }

    for edge in &graph.edges {
        let (Some(&start), Some(&end)) = (positions.get(&edge.source), positions.get(&edge.target))
        else {
            debug!(
                from = edge.source.as_str(),
                to = edge.target.as_str();
                "Dropping dangling edge"
            );
            continue;
        };
        instructions.push(DrawInstruction::Arrow(ArrowDraw {
            source: edge.source.clone(),
            target: edge.target.clone(),
            start,
            end,
            label: text_of(&edge.label),
        }));
    }

    Layout {
        positions,
        plan: DrawPlan { instructions },
    }
}

fn text_of(label: &str) -> Option<String> {
    if label.trim().is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}
