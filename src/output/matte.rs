use crate::error::{Result, SessionError};
use image::{imageops, ImageFormat, RgbImage, RgbaImage};
use std::path::Path;

/// Attach a binary alpha channel to a composite: opaque wherever the
/// grayscale brightness is above zero, transparent elsewhere.
pub fn alpha_matte(composite: &RgbImage) -> RgbaImage {
    let gray = imageops::grayscale(composite);
    RgbaImage::from_fn(composite.width(), composite.height(), |x, y| {
        let [r, g, b] = composite.get_pixel(x, y).0;
        let alpha = if gray.get_pixel(x, y).0[0] > 0 { 255 } else { 0 };
        image::Rgba([r, g, b, alpha])
    })
}

/// Write the alpha-matted composite to `path` as PNG.
pub fn save_alpha_matte(composite: &RgbImage, path: &Path) -> Result<()> {
    let _span = tracing::debug_span!("export").entered();
    alpha_matte(composite)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| SessionError::Export {
            path: path.to_path_buf(),
            source,
        })
}
