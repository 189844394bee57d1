mod driver;
mod editor;

pub use driver::{composite, SegmentationDriver};
pub use editor::TrimapEditor;

use crate::error::{Result, SessionError};
use crate::input::{InputEvent, PaintMode, PointerAction};
use crate::output::{save_alpha_matte, OutputSink};
use crate::segmentation::{Point, Segmenter};
use image::RgbImage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Runtime knobs of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Radius of the paint disk, in image pixels.
    pub brush_radius: u32,
    /// Appended to the input path to name the exported matte.
    pub output_suffix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            brush_radius: 1,
            output_suffix: ".bgcut.png".to_string(),
        }
    }
}

/// Key commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `c`: show everything as foreground, then drop the trimap so a new rectangle can be drawn.
    ShowAllAndReset,
    /// `s`: write the alpha-matted composite.
    Save,
    /// `n`: run one more refinement iteration.
    Refine,
    /// `q`: leave the event loop.
    Quit,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'c' => Some(Self::ShowAllAndReset),
            's' => Some(Self::Save),
            'n' => Some(Self::Refine),
            'q' => Some(Self::Quit),
            _ => None,
        }
    }
}

/// `<input>` followed by `suffix`, e.g. `photo.jpg.bgcut.png`.
pub fn output_path_for(input: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Load the source raster as 8-bit RGB.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).map_err(|source| SessionError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image.to_rgb8();
    tracing::info!(
        "Loaded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

/// One interactive segmentation session: routes input events to the trimap
/// editor, the segmentation driver and the key commands.
pub struct Session<S: Segmenter, O: OutputSink> {
    driver: SegmentationDriver<S>,
    editor: TrimapEditor,
    output: O,
    output_path: PathBuf,
}

impl<S: Segmenter, O: OutputSink> Session<S, O> {
    pub fn new(
        image: RgbImage,
        solver: S,
        output: O,
        input_path: &Path,
        config: &SessionConfig,
    ) -> Self {
        Self {
            driver: SegmentationDriver::new(image, solver),
            editor: TrimapEditor::new(config.brush_radius),
            output,
            output_path: output_path_for(input_path, &config.output_suffix),
        }
    }

    pub fn driver(&self) -> &SegmentationDriver<S> {
        &self.driver
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Show the untouched source image.
    pub fn start(&mut self) -> Result<()> {
        self.output.write_frame(self.driver.image())?;
        Ok(())
    }

    /// Process one event. Returns `true` when the session should end.
    ///
    /// Failures are logged and the session keeps going.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        let outcome = match event {
            InputEvent::Key(key) => match Command::from_key(key) {
                Some(command) => self.execute(command),
                None => Ok(false),
            },
            InputEvent::Pointer {
                action,
                position,
                paint,
            } => self.handle_pointer(action, position, paint).map(|()| false),
            InputEvent::Close => {
                tracing::info!("Window closed");
                Ok(true)
            }
        };

        outcome.unwrap_or_else(|err| {
            tracing::error!("{:#}", anyhow::Error::from(err));
            false
        })
    }

    fn handle_pointer(
        &mut self,
        action: PointerAction,
        position: Point,
        paint: Option<PaintMode>,
    ) -> Result<()> {
        match action {
            PointerAction::Press => self.editor.begin_drag(position),
            PointerAction::Move => {
                if self.editor.is_dragging() {
                    if let Some(trimap) = self.driver.trimap_mut() {
                        self.editor.paint_at(trimap, position, paint);
                    }
                }
            }
            PointerAction::Release => {
                let start = self.editor.finish_drag();
                if let Some(trimap) = self.driver.trimap_mut() {
                    self.editor.paint_at(trimap, position, paint);
                    return Ok(());
                }
                let Some(start) = start else {
                    tracing::debug!("Release at {:?} without a press", position);
                    return Ok(());
                };
                self.seed(start, position)?;
            }
        }
        Ok(())
    }

    fn seed(&mut self, start: Point, end: Point) -> Result<()> {
        let bounds = self.driver.image().dimensions();
        let Some(rect) = self.editor.seed_from_rect(start, end, bounds) else {
            tracing::debug!("Ignoring empty selection {:?} -> {:?}", start, end);
            return Ok(());
        };

        tracing::info!(
            "Selected {}x{} region at ({}, {})",
            rect.width,
            rect.height,
            rect.x,
            rect.y
        );
        if let Err(err) = self.driver.run_iteration(Some(rect)) {
            self.output.write_frame(self.driver.image())?;
            return Err(err.into());
        }
        let preview = self.driver.seed_preview(rect);
        self.output.write_frame(&preview)?;
        Ok(())
    }

    /// Run a key command. Returns `true` for [`Command::Quit`].
    pub fn execute(&mut self, command: Command) -> Result<bool> {
        tracing::debug!("Command {:?}", command);
        match command {
            Command::ShowAllAndReset => {
                self.driver.mark_all_foreground();
                let composite = self.driver.render_composite();
                self.driver.clear();
                self.output.write_frame(&composite)?;
            }
            Command::Save => {
                self.export()?;
            }
            Command::Refine => {
                if !self.driver.has_trimap() {
                    tracing::debug!("Nothing to refine yet");
                    return Ok(false);
                }
                self.driver.run_iteration(None)?;
                let composite = self.driver.render_composite();
                self.output.write_frame(&composite)?;
            }
            Command::Quit => return Ok(true),
        }
        Ok(false)
    }

    /// Write the alpha-matted composite to the output path.
    pub fn export(&self) -> Result<&Path> {
        let composite = self.driver.render_composite();
        save_alpha_matte(&composite, &self.output_path)?;
        tracing::info!("Saved {}", self.output_path.display());
        Ok(&self.output_path)
    }
}
