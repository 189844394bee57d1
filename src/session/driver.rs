use crate::error::SegmentationError;
use crate::segmentation::{Label, SeedRect, Segmenter, Trimap};
use image::{Rgb, RgbImage};

const SEED_OUTLINE_COLOR: Rgb<u8> = Rgb([110, 250, 110]);
const SEED_OUTLINE_HALF_WIDTH: i64 = 1;

struct Segmentation<M> {
    trimap: Trimap,
    models: M,
}

/// Owns the source image, the solver and its state, and produces composites.
pub struct SegmentationDriver<S: Segmenter> {
    image: RgbImage,
    solver: S,
    state: Option<Segmentation<S::Models>>,
    iterations: usize,
}

impl<S: Segmenter> SegmentationDriver<S> {
    pub fn new(image: RgbImage, solver: S) -> Self {
        Self {
            image,
            solver,
            state: None,
            iterations: 0,
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn has_trimap(&self) -> bool {
        self.state.is_some()
    }

    pub fn trimap(&self) -> Option<&Trimap> {
        self.state.as_ref().map(|s| &s.trimap)
    }

    pub fn trimap_mut(&mut self) -> Option<&mut Trimap> {
        self.state.as_mut().map(|s| &mut s.trimap)
    }

    /// Solver iterations run since startup.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Run exactly one solver iteration.
    ///
    /// With a seed the trimap and models are rebuilt from the rectangle;
    /// without one the existing state is refined. Returns `false` without
    /// calling the solver when there is neither a seed nor a trimap.
    pub fn run_iteration(&mut self, seed: Option<SeedRect>) -> Result<bool, SegmentationError> {
        if let Some(rect) = seed {
            let (trimap, models) = self.solver.initialize(&self.image, rect)?;
            self.state = Some(Segmentation { trimap, models });
        } else if let Some(state) = self.state.as_mut() {
            let before = state.trimap.clone();
            self.solver
                .refine(&self.image, &mut state.trimap, &mut state.models)?;
            state.trimap.restore_definite(&before);
        } else {
            return Ok(false);
        }

        self.iterations += 1;
        if let Some(trimap) = self.trimap() {
            tracing::info!(
                "Iteration {}: {} of {} pixels foreground",
                self.iterations,
                trimap.labels().iter().filter(|l| l.is_foreground()).count(),
                trimap.labels().len()
            );
        }
        Ok(true)
    }

    /// Label the whole trimap definite foreground, if there is one.
    pub fn mark_all_foreground(&mut self) {
        if let Some(trimap) = self.trimap_mut() {
            trimap.fill(Label::Foreground);
        }
    }

    /// Drop the trimap and colour models.
    pub fn clear(&mut self) {
        self.state = None;
    }

    pub fn render_composite(&self) -> RgbImage {
        composite(&self.image, self.trimap())
    }

    /// The source image with `rect` outlined.
    pub fn seed_preview(&self, rect: SeedRect) -> RgbImage {
        let mut preview = self.image.clone();
        outline(&mut preview, rect);
        preview
    }
}

/// Source pixels where the trimap says foreground, black elsewhere.
/// Without a trimap every pixel is kept.
pub fn composite(image: &RgbImage, trimap: Option<&Trimap>) -> RgbImage {
    let Some(trimap) = trimap else {
        return image.clone();
    };
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        match trimap.get(x, y) {
            Some(label) if label.is_foreground() => *image.get_pixel(x, y),
            _ => Rgb([0, 0, 0]),
        }
    })
}

fn outline(image: &mut RgbImage, rect: SeedRect) {
    let half = SEED_OUTLINE_HALF_WIDTH;
    let (x0, y0) = (i64::from(rect.x), i64::from(rect.y));
    let (x1, y1) = (i64::from(rect.right()) - 1, i64::from(rect.bottom()) - 1);
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));

    for y in (y0 - half).max(0)..=(y1 + half).min(height - 1) {
        for x in (x0 - half).max(0)..=(x1 + half).min(width - 1) {
            let on_edge = (x - x0).abs() <= half
                || (x - x1).abs() <= half
                || (y - y0).abs() <= half
                || (y - y1).abs() <= half;
            if on_edge {
                image.put_pixel(x as u32, y as u32, SEED_OUTLINE_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::Point;

    /// Seeds from the rectangle, then on refine overwrites every label.
    struct Overwriting;

    impl Segmenter for Overwriting {
        type Models = ();

        fn initialize(
            &mut self,
            image: &RgbImage,
            rect: SeedRect,
        ) -> Result<(Trimap, ()), SegmentationError> {
            Ok((Trimap::from_seed(image.width(), image.height(), rect), ()))
        }

        fn refine(
            &mut self,
            _image: &RgbImage,
            trimap: &mut Trimap,
            _models: &mut (),
        ) -> Result<(), SegmentationError> {
            trimap.fill(Label::ProbableBackground);
            Ok(())
        }
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8 + 1, y as u8 + 1, 50]))
    }

    fn rect(x: u32, y: u32, width: u32, height: u32) -> SeedRect {
        SeedRect {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn refine_without_trimap_does_nothing() {
        let mut driver = SegmentationDriver::new(gradient(8, 8), Overwriting);
        assert!(!driver.run_iteration(None).unwrap());
        assert!(!driver.has_trimap());
        assert_eq!(driver.iterations(), 0);
    }

    #[test]
    fn definite_labels_survive_a_hostile_solver() {
        let mut driver = SegmentationDriver::new(gradient(10, 10), Overwriting);
        assert!(driver.run_iteration(Some(rect(2, 2, 6, 6))).unwrap());

        let trimap = driver.trimap_mut().unwrap();
        trimap.paint_disk(Point::new(5, 5), 1, Label::Foreground);
        let before = trimap.clone();

        assert!(driver.run_iteration(None).unwrap());
        let after = driver.trimap().unwrap();
        for ((y, x), label) in before.labels().indexed_iter() {
            if label.is_definite() {
                assert_eq!(after.get(x as u32, y as u32), Some(*label));
            }
        }
        assert_eq!(after.get(3, 3), Some(Label::ProbableBackground));
        assert_eq!(driver.iterations(), 2);
    }

    #[test]
    fn composite_keeps_only_foreground_classes() {
        let image = gradient(4, 4);
        let mut trimap = Trimap::filled(4, 4, Label::Background);
        trimap.set(0, 0, Label::Foreground);
        trimap.set(1, 0, Label::ProbableForeground);
        trimap.set(2, 0, Label::ProbableBackground);

        let out = composite(&image, Some(&trimap));
        assert_eq!(out.get_pixel(0, 0), image.get_pixel(0, 0));
        assert_eq!(out.get_pixel(1, 0), image.get_pixel(1, 0));
        assert_eq!(out.get_pixel(2, 0).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(3, 3).0, [0, 0, 0]);

        assert_eq!(out, composite(&image, Some(&trimap)));
    }

    #[test]
    fn composite_without_trimap_is_the_source() {
        let image = gradient(5, 3);
        assert_eq!(composite(&image, None), image);
    }

    #[test]
    fn mark_all_then_clear_resets_state() {
        let mut driver = SegmentationDriver::new(gradient(6, 6), Overwriting);
        driver.run_iteration(Some(rect(1, 1, 3, 3))).unwrap();
        driver.mark_all_foreground();
        assert_eq!(driver.render_composite(), *driver.image());

        driver.clear();
        assert!(!driver.has_trimap());
        assert!(!driver.run_iteration(None).unwrap());
    }

    #[test]
    fn seed_preview_outlines_the_rectangle() {
        let driver = SegmentationDriver::new(gradient(20, 20), Overwriting);
        let preview = driver.seed_preview(rect(5, 5, 10, 10));
        assert_eq!(*preview.get_pixel(4, 10), SEED_OUTLINE_COLOR);
        assert_eq!(*preview.get_pixel(14, 14), SEED_OUTLINE_COLOR);
        assert_eq!(preview.get_pixel(10, 10), driver.image().get_pixel(10, 10));
        assert_eq!(preview.get_pixel(0, 0), driver.image().get_pixel(0, 0));
    }
}
