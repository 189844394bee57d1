use super::{InputEvent, PaintMode, PointerAction};
use crate::output::Viewport;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{Key, ModifiersState};

/// Turns winit window events into [`InputEvent`]s.
///
/// winit reports the cursor position and modifier state separately from
/// button presses, so both are tracked here.
#[derive(Debug, Default)]
pub struct EventTranslator {
    cursor: Option<PhysicalPosition<f64>>,
    modifiers: ModifiersState,
}

impl EventTranslator {
    pub fn translate(&mut self, event: &WindowEvent, viewport: &Viewport) -> Option<InputEvent> {
        match event {
            WindowEvent::CloseRequested => Some(InputEvent::Close),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(*position);
                Some(self.pointer(PointerAction::Move, *position, viewport))
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let position = self.cursor?;
                let action = match state {
                    ElementState::Pressed => PointerAction::Press,
                    ElementState::Released => PointerAction::Release,
                };
                Some(self.pointer(action, position, viewport))
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        logical_key: Key::Character(text),
                        ..
                    },
                ..
            } => text.chars().next().map(InputEvent::Key),
            _ => None,
        }
    }

    fn pointer(
        &self,
        action: PointerAction,
        position: PhysicalPosition<f64>,
        viewport: &Viewport,
    ) -> InputEvent {
        let paint =
            PaintMode::from_modifiers(self.modifiers.control_key(), self.modifiers.shift_key());
        InputEvent::Pointer {
            action,
            position: viewport.to_image(position.x, position.y),
            paint,
        }
    }
}
