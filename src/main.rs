use anyhow::{Context, Result};
use bgcut::input::EventTranslator;
use bgcut::output::WindowOutput;
use bgcut::segmentation::create_default_segmenter;
use bgcut::session::load_image;
use bgcut::{Session, SessionConfig};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

const WINDOW_TITLE: &str = "BgCut";
const MAX_BRUSH_RADIUS: i64 = 64;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Interactively remove image background using the GrabCut algorithm",
    long_about = None
)]
struct Args {
    /// Image file to remove background from
    #[arg(long)]
    image: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Initial window width
    #[arg(long, default_value_t = 500)]
    window_width: u32,

    /// Initial window height
    #[arg(long, default_value_t = 500)]
    window_height: u32,

    /// Radius of the foreground/background brush, in image pixels
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(0..=MAX_BRUSH_RADIUS))]
    brush_radius: u32,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // --help and --version also land here
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    tracing::info!("BgCut starting");

    let config = SessionConfig {
        brush_radius: args.brush_radius,
        ..SessionConfig::default()
    };
    let image = load_image(&args.image)?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;

    // Leak the window to get a 'static reference for pixels
    let window: &'static Window = Box::leak(Box::new(
        WindowBuilder::new()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(
                f64::from(args.window_width),
                f64::from(args.window_height),
            ))
            .build(&event_loop)
            .context("Failed to create window")?,
    ));

    let output = WindowOutput::new(window, image.dimensions())?;
    let mut session = Session::new(
        image,
        create_default_segmenter(),
        output,
        &args.image,
        &config,
    );
    session.start()?;

    tracing::info!("Output: {}", session.output_path().display());
    tracing::info!("Drag a rectangle around the subject; Ctrl-drag marks foreground, Shift-drag background");
    tracing::info!("Keys: n = refine, c = show all and reset, s = save, q = quit");

    let mut translator = EventTranslator::default();
    // A display failure ends the loop and is returned from `run`
    let mut fatal: Option<anyhow::Error> = None;

    event_loop
        .run(|event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);

            let Event::WindowEvent { event, window_id } = event else {
                return;
            };
            if window_id != window.id() {
                return;
            }

            match event {
                WindowEvent::RedrawRequested => {
                    if let Err(err) = session.output_mut().render() {
                        fatal = Some(err.context("Failed to render frame"));
                        elwt.exit();
                    }
                }
                WindowEvent::Resized(size) => {
                    if let Err(err) = session.output_mut().resize(size.width, size.height) {
                        fatal = Some(err.context("Failed to resize surface"));
                        elwt.exit();
                    }
                }
                other => {
                    let viewport = *session.output().viewport();
                    if let Some(input) = translator.translate(&other, &viewport) {
                        if session.handle(input) {
                            elwt.exit();
                        }
                    }
                }
            }
        })
        .context("Event loop error")?;

    if let Some(err) = fatal {
        return Err(err);
    }
    tracing::info!("BgCut exiting");
    Ok(())
}
