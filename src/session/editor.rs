use crate::input::PaintMode;
use crate::segmentation::{Point, SeedRect, Trimap};

/// Drag tracking and user edits of the trimap.
#[derive(Debug, Clone)]
pub struct TrimapEditor {
    drag_start: Option<Point>,
    brush_radius: u32,
}

impl TrimapEditor {
    pub fn new(brush_radius: u32) -> Self {
        Self {
            drag_start: None,
            brush_radius,
        }
    }

    /// Record the start of a drag. A second press replaces the first.
    pub fn begin_drag(&mut self, point: Point) {
        self.drag_start = Some(point);
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    /// End the current drag, returning where it started.
    pub fn finish_drag(&mut self) -> Option<Point> {
        self.drag_start.take()
    }

    /// Paint a disk of definite labels around `point`. Returns whether anything was painted.
    pub fn paint_at(&self, trimap: &mut Trimap, point: Point, mode: Option<PaintMode>) -> bool {
        let Some(mode) = mode else {
            return false;
        };
        trimap.paint_disk(point, self.brush_radius, mode.label());
        true
    }

    /// Rectangle spanned from `start` to `end`, or `None` when it has no area
    /// inside an image of `bounds`.
    pub fn seed_from_rect(&self, start: Point, end: Point, bounds: (u32, u32)) -> Option<SeedRect> {
        SeedRect::from_drag(start, end, bounds)
    }
}
