mod matte;
mod viewport;
#[cfg(feature = "gui")]
mod window;

pub use matte::{alpha_matte, save_alpha_matte};
pub use viewport::Viewport;
#[cfg(feature = "gui")]
pub use window::WindowOutput;

use anyhow::Result;
use image::RgbImage;

/// Trait for display destinations
pub trait OutputSink {
    /// Show a frame, replacing whatever was shown before
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;
}
