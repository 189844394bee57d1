//! Interactive foreground extraction.
//!
//! The user drags a rectangle around the subject, refines the GrabCut
//! segmentation one iteration at a time while painting definite
//! foreground/background strokes, and exports the result as a PNG with a
//! transparent background.

pub mod error;
pub mod input;
pub mod output;
pub mod segmentation;
pub mod session;

pub use error::{Result, SegmentationError, SessionError};
pub use session::{Session, SessionConfig};
