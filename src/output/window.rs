use super::{OutputSink, Viewport};
use anyhow::{Context, Result};
use image::RgbImage;
use pixels::{Pixels, SurfaceTexture};
use winit::window::Window;

/// Shows frames in a winit window through a `pixels` framebuffer.
///
/// The framebuffer has the size of the window surface; frames are
/// letterboxed into it on every redraw.
pub struct WindowOutput {
    window: &'static Window,
    pixels: Pixels<'static>,
    image_size: (u32, u32),
    viewport: Viewport,
    frame: Option<RgbImage>,
}

impl WindowOutput {
    pub fn new(window: &'static Window, image_size: (u32, u32)) -> Result<Self> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        tracing::info!("Opening {}x{} display surface", width, height);

        let surface_texture = SurfaceTexture::new(width, height, window);
        let pixels =
            Pixels::new(width, height, surface_texture).context("Failed to create pixels surface")?;

        Ok(Self {
            window,
            pixels,
            image_size,
            viewport: Viewport::new(image_size, (width, height)),
            frame: None,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels
            .resize_surface(width, height)
            .context("Failed to resize surface")?;
        self.pixels
            .resize_buffer(width, height)
            .context("Failed to resize buffer")?;
        self.viewport = Viewport::new(self.image_size, (width, height));
        self.window.request_redraw();
        Ok(())
    }

    /// Present the most recent frame.
    pub fn render(&mut self) -> Result<()> {
        let (width, height) = self.viewport.surface_size();
        if width == 0 || height == 0 {
            return Ok(());
        }
        if let Some(frame) = &self.frame {
            self.viewport.blit(frame, self.pixels.frame_mut());
        }
        self.pixels.render().context("Failed to render frame")
    }
}

impl OutputSink for WindowOutput {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        self.frame = Some(frame.clone());
        self.window.request_redraw();
        Ok(())
    }
}
