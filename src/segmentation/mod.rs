mod gmm;
mod grabcut;
mod graph;
pub mod types;

pub use gmm::GaussianMixture;
pub use grabcut::{ColorModels, GrabCut};
pub use types::{Label, Point, SeedRect, Segmenter, Trimap};

/// Create the default solver (GrabCut with the usual smoothness weight).
pub fn create_default_segmenter() -> GrabCut {
    GrabCut::default()
}
