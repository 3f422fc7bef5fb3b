//! Key and pointer routing for the reader.
//!
//! Keys map straight onto activations. Mouse reports are folded into gesture
//! calls: a left press in the recto half begins a `Next` gesture, in the verso
//! half a `Prev` gesture; drags track; the release ends the gesture. A
//! press/release pair with no horizontal travel, released on the half it was
//! pressed in, is also a click and dispatches the activation after the
//! gesture has ended.

use core_events::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use core_gesture::Side;
use core_render::TerminalLayer;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAction {
    Next,
    Prev,
    Close,
    Quit,
}

pub(crate) fn map_key(key: &KeyEvent) -> Option<KeyAction> {
    if key.mods.intersects(KeyModifiers::CTRL | KeyModifiers::ALT) {
        return None;
    }
    match key.code {
        KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('l') => Some(KeyAction::Next),
        KeyCode::Left | KeyCode::Backspace | KeyCode::Char('h') => Some(KeyAction::Prev),
        KeyCode::Char('c') => Some(KeyAction::Close),
        KeyCode::Char('q') => Some(KeyAction::Quit),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PointerAction {
    Begin(Side, f32),
    Track(f32),
    End(f32),
    Click(Side),
}

#[derive(Debug, Clone, Copy)]
struct Press {
    side: Side,
    start: u16,
    last: u16,
    travelled: bool,
}

#[derive(Debug, Default)]
pub(crate) struct PointerRouter {
    press: Option<Press>,
}

impl PointerRouter {
    /// Forget any press without emitting actions (focus lost).
    pub(crate) fn reset(&mut self) -> bool {
        self.press.take().is_some()
    }

    pub(crate) fn route(&mut self, event: &MouseEvent, layer: &TerminalLayer) -> Vec<PointerAction> {
        let x = f32::from(event.column);
        let mut out = Vec::new();
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                // The release of an earlier press happened outside the window.
                if let Some(stale) = self.press.take() {
                    out.push(PointerAction::End(f32::from(stale.last)));
                }
                let side = layer.side_of(event.column);
                self.press = Some(Press {
                    side,
                    start: event.column,
                    last: event.column,
                    travelled: false,
                });
                out.push(PointerAction::Begin(side, x));
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(press) = self.press.as_mut() {
                    press.last = event.column;
                    press.travelled |= event.column != press.start;
                    out.push(PointerAction::Track(x));
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(press) = self.press.take() {
                    out.push(PointerAction::End(x));
                    if !press.travelled && layer.side_of(event.column) == press.side {
                        trace!(target: "input.event", side = press.side.as_str(), "pointer_click");
                        out.push(PointerAction::Click(press.side));
                    }
                }
            }
            _ => {}
        }
        out
    }
}
