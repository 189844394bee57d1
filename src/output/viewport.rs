use crate::segmentation::Point;
use image::RgbImage;

/// Letterboxed placement of an image inside a window surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    image: (u32, u32),
    surface: (u32, u32),
    scale: f64,
    offset: (f64, f64),
}

impl Viewport {
    /// Fit `image` (width, height) into `surface`, preserving aspect ratio and centring it.
    pub fn new(image: (u32, u32), surface: (u32, u32)) -> Self {
        let (iw, ih) = (f64::from(image.0.max(1)), f64::from(image.1.max(1)));
        let (sw, sh) = (f64::from(surface.0), f64::from(surface.1));
        let scale = (sw / iw).min(sh / ih);
        let scale = if scale > 0.0 { scale } else { 1.0 };
        Self {
            image,
            surface,
            scale,
            offset: ((sw - iw * scale) / 2.0, (sh - ih * scale) / 2.0),
        }
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Map a surface position to image coordinates. The result may lie
    /// outside the image when the position is in the letterbox margin.
    pub fn to_image(&self, x: f64, y: f64) -> Point {
        Point::new(
            ((x - self.offset.0) / self.scale).floor() as i32,
            ((y - self.offset.1) / self.scale).floor() as i32,
        )
    }

    /// Draw `frame` into an RGBA `target` of the surface size, nearest-neighbour
    /// sampled, with black margins.
    pub fn blit(&self, frame: &RgbImage, target: &mut [u8]) {
        let width = self.surface.0 as usize;
        if width == 0 {
            return;
        }
        let (fw, fh) = frame.dimensions();
        for (i, pixel) in target.chunks_exact_mut(4).enumerate() {
            let sx = (i % width) as f64 + 0.5;
            let sy = (i / width) as f64 + 0.5;
            let p = self.to_image(sx, sy);
            let rgb = if p.x >= 0 && p.y >= 0 && (p.x as u32) < fw && (p.y as u32) < fh {
                frame.get_pixel(p.x as u32, p.y as u32).0
            } else {
                [0, 0, 0]
            };
            pixel[..3].copy_from_slice(&rgb);
            pixel[3] = 255;
        }
    }
}
