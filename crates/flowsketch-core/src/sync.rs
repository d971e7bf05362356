//! Materializes a [`DrawPlan`] onto a [`Canvas`].
//!
//! Every render is a full replace: the canvas is cleared in one batch and
//! the plan is drawn from scratch, then the viewport is fitted. The canvas
//! is borrowed exclusively for the whole sequence, so no other render can
//! observe or interleave with a half-drawn surface.

use std::collections::HashMap;

use log::debug;

use crate::canvas::{ArrowShape, Canvas, RectangleShape, ShapeId};
use crate::layout::{DrawInstruction, DrawPlan};

pub fn render<C: Canvas + ?Sized>(plan: &DrawPlan, canvas: &mut C) {
    let stale = canvas.shape_ids();
    if !stale.is_empty() {
        canvas.delete_shapes(&stale);
    }

    // node id -> rectangle, later duplicates win like in the position map
    let mut bound: HashMap<&str, ShapeId> = HashMap::new();
    let mut rectangles = 0usize;
    let mut arrows = 0usize;

    for instruction in plan.instructions() {
        match instruction {
            DrawInstruction::Rectangle(rect) => {
                let id = canvas.create_rectangle(RectangleShape {
                    origin: rect.origin,
                    size: rect.size,
                    label: rect.label.clone(),
                });
                if !rect.node_id.is_empty() {
                    bound.insert(rect.node_id.as_str(), id);
                }
                rectangles += 1;
            }
            DrawInstruction::Arrow(arrow) => {
                canvas.create_arrow(ArrowShape {
                    start: arrow.start,
                    end: arrow.end,
                    start_binding: bound.get(arrow.source.as_str()).copied(),
                    end_binding: bound.get(arrow.target.as_str()).copied(),
                    label: arrow.label.clone(),
                });
                arrows += 1;
            }
        }
    }

    canvas.zoom_to_fit();

    debug!(
        cleared = stale.len(),
        rectangles = rectangles,
        arrows = arrows;
        "Canvas synchronized"
    );
}
