use super::gmm::{Color, GaussianMixture};
use super::graph::FlowGraph;
use super::types::{Label, SeedRect, Segmenter, Trimap};
use crate::error::SegmentationError;
use image::RgbImage;
use ndarray::Array2;

/// Foreground and background colour models carried between iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorModels {
    pub background: GaussianMixture,
    pub foreground: GaussianMixture,
}

/// GrabCut: alternate GMM fitting and graph-cut energy minimisation.
///
/// Each [`Segmenter`] call runs exactly one iteration.
#[derive(Debug, Clone)]
pub struct GrabCut {
    gamma: f64,
    lambda: f64,
}

impl Default for GrabCut {
    fn default() -> Self {
        Self::new(50.0)
    }
}

impl GrabCut {
    /// `gamma` weighs the smoothness term; definite labels are pinned with `9 * gamma`.
    pub fn new(gamma: f64) -> Self {
        Self {
            gamma,
            lambda: 9.0 * gamma,
        }
    }

    fn initial_models(
        &self,
        image: &RgbImage,
        trimap: &Trimap,
    ) -> Result<ColorModels, SegmentationError> {
        let (background, foreground) = split_samples(image, trimap);
        require_samples(&background, &foreground)?;
        tracing::debug!(
            "Fitting initial models on {} background / {} foreground samples",
            background.len(),
            foreground.len()
        );
        Ok(ColorModels {
            background: GaussianMixture::from_samples(&background),
            foreground: GaussianMixture::from_samples(&foreground),
        })
    }

    /// Reassign every pixel to its most likely component and relearn both mixtures.
    fn learn_models(
        &self,
        image: &RgbImage,
        trimap: &Trimap,
        models: &mut ColorModels,
    ) -> Result<(), SegmentationError> {
        let mut background = (Vec::new(), Vec::new());
        let mut foreground = (Vec::new(), Vec::new());
        for ((y, x), label) in trimap.labels().indexed_iter() {
            let color = color_at(image, x as u32, y as u32);
            let (gmm, bucket) = if label.is_foreground() {
                (&models.foreground, &mut foreground)
            } else {
                (&models.background, &mut background)
            };
            bucket.1.push(gmm.most_likely_component(color));
            bucket.0.push(color);
        }
        require_samples(&background.0, &foreground.0)?;

        models.background = GaussianMixture::learn(&background.0, &background.1);
        models.foreground = GaussianMixture::learn(&foreground.0, &foreground.1);
        Ok(())
    }

    fn build_graph(&self, image: &RgbImage, trimap: &Trimap, models: &ColorModels) -> FlowGraph {
        let (width, height) = image.dimensions();
        let colors = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            color_at(image, x as u32, y as u32)
        });
        let beta = beta(&colors);
        let diagonal = self.gamma / std::f64::consts::SQRT_2;
        let index = |x: usize, y: usize| y * width as usize + x;

        let mut graph = FlowGraph::new(colors.len());
        for ((y, x), &color) in colors.indexed_iter() {
            let node = index(x, y);
            let (from_source, to_sink) = match trimap.labels()[(y, x)] {
                Label::Background => (0.0, self.lambda),
                Label::Foreground => (self.lambda, 0.0),
                Label::ProbableBackground | Label::ProbableForeground => (
                    neg_log(models.background.probability(color)),
                    neg_log(models.foreground.probability(color)),
                ),
            };
            graph.add_terminal_weights(node, from_source, to_sink);

            let link = |other: Color, weight: f64| weight * (-beta * distance_sq(color, other)).exp();
            if x > 0 {
                graph.add_edge(node, index(x - 1, y), link(colors[(y, x - 1)], self.gamma));
            }
            if y > 0 {
                graph.add_edge(node, index(x, y - 1), link(colors[(y - 1, x)], self.gamma));
                if x > 0 {
                    graph.add_edge(node, index(x - 1, y - 1), link(colors[(y - 1, x - 1)], diagonal));
                }
                if x + 1 < width as usize {
                    graph.add_edge(node, index(x + 1, y - 1), link(colors[(y - 1, x + 1)], diagonal));
                }
            }
        }
        graph
    }

    fn iterate(
        &self,
        image: &RgbImage,
        trimap: &mut Trimap,
        models: &mut ColorModels,
    ) -> Result<(), SegmentationError> {
        self.learn_models(image, trimap, models)?;
        let mut graph = self.build_graph(image, trimap, models);
        let flow = graph.max_flow();
        let source_side = graph.source_side();

        let mut changed = 0usize;
        for (label, &foreground) in trimap.labels_mut().iter_mut().zip(&source_side) {
            if label.is_definite() {
                continue;
            }
            let next = if foreground {
                Label::ProbableForeground
            } else {
                Label::ProbableBackground
            };
            if *label != next {
                changed += 1;
                *label = next;
            }
        }
        tracing::debug!("Min cut flow {:.1}, {} labels changed", flow, changed);
        Ok(())
    }
}

impl Segmenter for GrabCut {
    type Models = ColorModels;

    fn initialize(
        &mut self,
        image: &RgbImage,
        rect: SeedRect,
    ) -> Result<(Trimap, ColorModels), SegmentationError> {
        let _span = tracing::debug_span!("grabcut_initialize").entered();
        let (width, height) = image.dimensions();
        let rect = rect
            .clip_to(width, height)
            .ok_or(SegmentationError::EmptyRegion)?;

        let mut trimap = Trimap::from_seed(width, height, rect);
        let mut models = self.initial_models(image, &trimap)?;
        self.iterate(image, &mut trimap, &mut models)?;
        Ok((trimap, models))
    }

    fn refine(
        &mut self,
        image: &RgbImage,
        trimap: &mut Trimap,
        models: &mut ColorModels,
    ) -> Result<(), SegmentationError> {
        let _span = tracing::debug_span!("grabcut_refine").entered();
        trimap.check_matches(image)?;
        self.iterate(image, trimap, models)
    }
}

fn color_at(image: &RgbImage, x: u32, y: u32) -> Color {
    let [r, g, b] = image.get_pixel(x, y).0;
    [f64::from(r), f64::from(g), f64::from(b)]
}

fn distance_sq(a: Color, b: Color) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

fn neg_log(p: f64) -> f64 {
    -p.max(f64::MIN_POSITIVE).ln()
}

/// `1 / (2 * mean squared colour difference)` over the 8-neighbourhood.
fn beta(colors: &Array2<Color>) -> f64 {
    let width = colors.ncols();
    let mut sum = 0.0;
    let mut count = 0usize;
    for ((y, x), &color) in colors.indexed_iter() {
        let mut add = |other: Color| {
            sum += distance_sq(color, other);
            count += 1;
        };
        if x > 0 {
            add(colors[(y, x - 1)]);
        }
        if y > 0 {
            add(colors[(y - 1, x)]);
            if x > 0 {
                add(colors[(y - 1, x - 1)]);
            }
            if x + 1 < width {
                add(colors[(y - 1, x + 1)]);
            }
        }
    }
    if sum <= f64::EPSILON || count == 0 {
        0.0
    } else {
        1.0 / (2.0 * sum / count as f64)
    }
}

fn split_samples(image: &RgbImage, trimap: &Trimap) -> (Vec<Color>, Vec<Color>) {
    let mut background = Vec::new();
    let mut foreground = Vec::new();
    for ((y, x), label) in trimap.labels().indexed_iter() {
        let color = color_at(image, x as u32, y as u32);
        if label.is_foreground() {
            foreground.push(color);
        } else {
            background.push(color);
        }
    }
    (background, foreground)
}

fn require_samples(background: &[Color], foreground: &[Color]) -> Result<(), SegmentationError> {
    if background.is_empty() {
        return Err(SegmentationError::MissingSamples { class: "background" });
    }
    if foreground.is_empty() {
        return Err(SegmentationError::MissingSamples { class: "foreground" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Red square on a blue field with a little deterministic texture.
    fn square_image(size: u32, lo: u32, hi: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, y| {
            let noise = ((x * 7 + y * 13) % 9) as u8;
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                Rgb([220 + noise, 30 + noise, 20])
            } else {
                Rgb([20, 40 + noise, 200 + noise])
            }
        })
    }

    fn seed(lo: u32, hi: u32) -> SeedRect {
        SeedRect {
            x: lo,
            y: lo,
            width: hi - lo,
            height: hi - lo,
        }
    }

    #[test]
    fn initialize_finds_the_square() {
        let image = square_image(40, 12, 28);
        let mut solver = GrabCut::default();
        let (trimap, _) = solver.initialize(&image, seed(8, 32)).unwrap();

        assert_eq!(trimap.get(20, 20), Some(Label::ProbableForeground));
        assert_eq!(trimap.get(9, 9), Some(Label::ProbableBackground));
        assert_eq!(trimap.get(2, 2), Some(Label::Background));
    }

    #[test]
    fn refine_keeps_definite_labels() {
        let image = square_image(40, 12, 28);
        let mut solver = GrabCut::default();
        let (mut trimap, mut models) = solver.initialize(&image, seed(8, 32)).unwrap();

        trimap.set(10, 10, Label::Foreground);
        trimap.set(20, 20, Label::Background);
        let background_before = trimap.count(Label::Background);

        solver.refine(&image, &mut trimap, &mut models).unwrap();

        assert_eq!(trimap.get(10, 10), Some(Label::Foreground));
        assert_eq!(trimap.get(20, 20), Some(Label::Background));
        assert_eq!(trimap.count(Label::Background), background_before);
    }

    #[test]
    fn seed_covering_everything_has_no_background() {
        let image = square_image(16, 4, 12);
        let mut solver = GrabCut::default();
        let err = solver.initialize(&image, seed(0, 16)).unwrap_err();
        assert!(matches!(
            err,
            SegmentationError::MissingSamples { class: "background" }
        ));
    }

    #[test]
    fn seed_outside_image_is_rejected() {
        let image = square_image(16, 4, 12);
        let mut solver = GrabCut::default();
        let err = solver.initialize(&image, seed(20, 30)).unwrap_err();
        assert!(matches!(err, SegmentationError::EmptyRegion));
    }

    #[test]
    fn refine_rejects_mismatched_trimap() {
        let image = square_image(16, 4, 12);
        let mut solver = GrabCut::default();
        let (_, mut models) = solver.initialize(&image, seed(2, 14)).unwrap();
        let mut wrong = Trimap::filled(8, 8, Label::ProbableForeground);
        let err = solver.refine(&image, &mut wrong, &mut models).unwrap_err();
        assert!(matches!(err, SegmentationError::DimensionMismatch { .. }));
    }
}
