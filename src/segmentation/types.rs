use crate::error::SegmentationError;
use image::RgbImage;
use ndarray::{Array2, Zip};

/// Per-pixel classification held in a [`Trimap`].
///
/// Discriminants follow the usual GrabCut encoding, so the least significant
/// bit is set exactly for the foreground classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Label {
    Background = 0,
    Foreground = 1,
    ProbableBackground = 2,
    ProbableForeground = 3,
}

impl Label {
    /// Whether the pixel is kept in the composite.
    pub fn is_foreground(self) -> bool {
        (self as u8) & 1 == 1
    }

    /// Definite labels are set by the user (or the seed) and never by the solver.
    pub fn is_definite(self) -> bool {
        matches!(self, Label::Background | Label::Foreground)
    }
}

/// A position in image coordinates. May lie outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in image coordinates with non-zero area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SeedRect {
    /// Build the rectangle spanned by a drag from `start` to `end`, clipped to
    /// an image of `bounds` (width, height).
    ///
    /// Returns `None` when the signed width or height of the drag is not
    /// positive, or when nothing is left after clipping.
    pub fn from_drag(start: Point, end: Point, bounds: (u32, u32)) -> Option<Self> {
        let width = i64::from(end.x) - i64::from(start.x);
        let height = i64::from(end.y) - i64::from(start.y);
        if width <= 0 || height <= 0 {
            return None;
        }

        let (max_x, max_y) = (i64::from(bounds.0), i64::from(bounds.1));
        let x0 = i64::from(start.x).clamp(0, max_x);
        let y0 = i64::from(start.y).clamp(0, max_y);
        let x1 = i64::from(end.x).clamp(0, max_x);
        let y1 = i64::from(end.y).clamp(0, max_y);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Intersect with an image of the given size.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Self> {
        let right = self.right().min(width);
        let bottom = self.bottom().min(height);
        if right <= self.x || bottom <= self.y {
            return None;
        }
        Some(Self {
            x: self.x,
            y: self.y,
            width: right - self.x,
            height: bottom - self.y,
        })
    }
}

/// Label map with the same dimensions as the source image, indexed `[y, x]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trimap {
    labels: Array2<Label>,
}

impl Trimap {
    pub fn filled(width: u32, height: u32, label: Label) -> Self {
        Self {
            labels: Array2::from_elem((height as usize, width as usize), label),
        }
    }

    /// Definite background everywhere, probable foreground inside `rect`.
    pub fn from_seed(width: u32, height: u32, rect: SeedRect) -> Self {
        let mut trimap = Self::filled(width, height, Label::Background);
        for ((y, x), label) in trimap.labels.indexed_iter_mut() {
            if rect.contains(x as u32, y as u32) {
                *label = Label::ProbableForeground;
            }
        }
        trimap
    }

    pub fn width(&self) -> u32 {
        self.labels.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.labels.nrows() as u32
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Label> {
        self.labels.get((y as usize, x as usize)).copied()
    }

    pub fn set(&mut self, x: u32, y: u32, label: Label) {
        if let Some(slot) = self.labels.get_mut((y as usize, x as usize)) {
            *slot = label;
        }
    }

    pub fn fill(&mut self, label: Label) {
        self.labels.fill(label);
    }

    /// Label every pixel within `radius` of `center`. Pixels outside the map are skipped.
    pub fn paint_disk(&mut self, center: Point, radius: u32, label: Label) {
        let r = i64::from(radius);
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r {
                    continue;
                }
                let x = i64::from(center.x) + dx;
                let y = i64::from(center.y) + dy;
                if x < 0 || y < 0 {
                    continue;
                }
                self.set(x as u32, y as u32, label);
            }
        }
    }

    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    pub fn labels(&self) -> &Array2<Label> {
        &self.labels
    }

    pub(crate) fn labels_mut(&mut self) -> &mut Array2<Label> {
        &mut self.labels
    }

    /// Copy every definite label of `previous` back over this map.
    pub fn restore_definite(&mut self, previous: &Trimap) {
        Zip::from(&mut self.labels)
            .and(&previous.labels)
            .for_each(|label, &before| {
                if before.is_definite() {
                    *label = before;
                }
            });
    }

    pub(crate) fn check_matches(&self, image: &RgbImage) -> Result<(), SegmentationError> {
        let (image_width, image_height) = image.dimensions();
        if self.dimensions() != (image_width, image_height) {
            return Err(SegmentationError::DimensionMismatch {
                image_width,
                image_height,
                trimap_width: self.width(),
                trimap_height: self.height(),
            });
        }
        Ok(())
    }
}

/// Iterative foreground extraction solver.
///
/// Each call performs exactly one iteration. Implementations may only change
/// probable labels; definite labels are owned by the user.
pub trait Segmenter {
    /// Colour model state carried between iterations.
    type Models;

    /// Bootstrap a trimap and colour models from a seed rectangle and run one iteration.
    fn initialize(
        &mut self,
        image: &RgbImage,
        rect: SeedRect,
    ) -> Result<(Trimap, Self::Models), SegmentationError>;

    /// Run one iteration starting from the current trimap and models.
    fn refine(
        &mut self,
        image: &RgbImage,
        trimap: &mut Trimap,
        models: &mut Self::Models,
    ) -> Result<(), SegmentationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreground_bit_matches_kept_classes() {
        assert!(Label::Foreground.is_foreground());
        assert!(Label::ProbableForeground.is_foreground());
        assert!(!Label::Background.is_foreground());
        assert!(!Label::ProbableBackground.is_foreground());
    }

    #[test]
    fn degenerate_drags_produce_no_rect() {
        let bounds = (100, 100);
        assert_eq!(SeedRect::from_drag(Point::new(10, 10), Point::new(10, 10), bounds), None);
        assert_eq!(SeedRect::from_drag(Point::new(10, 10), Point::new(5, 5), bounds), None);
        assert_eq!(SeedRect::from_drag(Point::new(10, 10), Point::new(40, 10), bounds), None);
        assert_eq!(SeedRect::from_drag(Point::new(-20, -20), Point::new(-5, -5), bounds), None);
    }

    #[test]
    fn drag_is_clipped_to_image() {
        let rect = SeedRect::from_drag(Point::new(-5, 90), Point::new(30, 140), (100, 100));
        assert_eq!(
            rect,
            Some(SeedRect {
                x: 0,
                y: 90,
                width: 30,
                height: 10
            })
        );
    }

    #[test]
    fn seeded_trimap_splits_inside_and_outside() {
        let rect = SeedRect {
            x: 2,
            y: 2,
            width: 3,
            height: 3,
        };
        let trimap = Trimap::from_seed(8, 6, rect);
        assert_eq!(trimap.dimensions(), (8, 6));
        assert_eq!(trimap.get(3, 3), Some(Label::ProbableForeground));
        assert_eq!(trimap.get(5, 3), Some(Label::Background));
        assert_eq!(trimap.count(Label::ProbableForeground), 9);
        assert_eq!(trimap.get(8, 0), None);
    }

    #[test]
    fn disk_of_radius_one_is_a_plus_clipped_at_edges() {
        let mut trimap = Trimap::filled(5, 5, Label::ProbableBackground);
        trimap.paint_disk(Point::new(2, 2), 1, Label::Foreground);
        assert_eq!(trimap.count(Label::Foreground), 5);
        assert_eq!(trimap.get(1, 1), Some(Label::ProbableBackground));

        trimap.paint_disk(Point::new(0, 0), 1, Label::Background);
        assert_eq!(trimap.count(Label::Background), 3);

        trimap.paint_disk(Point::new(-10, 40), 1, Label::Background);
        assert_eq!(trimap.count(Label::Background), 3);
    }

    #[test]
    fn restore_definite_keeps_user_labels() {
        let mut before = Trimap::filled(4, 4, Label::ProbableForeground);
        before.set(0, 0, Label::Foreground);
        before.set(3, 3, Label::Background);

        let mut after = Trimap::filled(4, 4, Label::ProbableBackground);
        after.restore_definite(&before);

        assert_eq!(after.get(0, 0), Some(Label::Foreground));
        assert_eq!(after.get(3, 3), Some(Label::Background));
        assert_eq!(after.get(1, 1), Some(Label::ProbableBackground));
    }
}
