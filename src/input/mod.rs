#[cfg(feature = "gui")]
mod winit_input;

#[cfg(feature = "gui")]
pub use winit_input::EventTranslator;

pub use crate::segmentation::Point;
use crate::segmentation::Label;

/// Pointer phase of an [`InputEvent::Pointer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Move,
    Press,
    Release,
}

/// Which definite label a stroke paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    Foreground,
    Background,
}

impl PaintMode {
    /// Ctrl marks foreground, Shift marks background; Ctrl wins when both are held.
    pub fn from_modifiers(control: bool, shift: bool) -> Option<Self> {
        if control {
            Some(Self::Foreground)
        } else if shift {
            Some(Self::Background)
        } else {
            None
        }
    }

    pub fn label(self) -> Label {
        match self {
            Self::Foreground => Label::Foreground,
            Self::Background => Label::Background,
        }
    }
}

/// Backend-neutral input delivered to the session one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Pointer activity at an image-space position.
    Pointer {
        action: PointerAction,
        position: Point,
        paint: Option<PaintMode>,
    },
    /// A key press, as the character it produced.
    Key(char),
    /// The window was closed.
    Close,
}

impl InputEvent {
    pub fn pointer(action: PointerAction, x: i32, y: i32, paint: Option<PaintMode>) -> Self {
        Self::Pointer {
            action,
            position: Point::new(x, y),
            paint,
        }
    }
}
