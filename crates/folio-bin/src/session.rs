//! Reader session: routes normalized input into the page-turn engine.

use crate::input::{KeyAction, PointerAction, PointerRouter, map_key};
use crate::{LoopControl, ShutdownReason};
use core_events::{InputEvent, MouseEvent};
use core_gesture::Side;
use core_render::{Reader, TerminalLayer};
use std::time::Instant;
use tracing::{debug, info};

pub(crate) struct ReaderSession {
    reader: Reader<TerminalLayer>,
    pointer: PointerRouter,
    needs_clear: bool,
}

impl ReaderSession {
    pub(crate) fn new(reader: Reader<TerminalLayer>) -> Self {
        Self {
            reader,
            pointer: PointerRouter::default(),
            needs_clear: true,
        }
    }

    pub(crate) fn reader(&self) -> &Reader<TerminalLayer> {
        &self.reader
    }

    pub(crate) fn layer_mut(&mut self) -> &mut TerminalLayer {
        self.reader.layer_mut()
    }

    /// True once after a resize: the next frame must wipe the screen first.
    pub(crate) fn take_needs_clear(&mut self) -> bool {
        std::mem::take(&mut self.needs_clear)
    }

    pub(crate) fn handle_input(&mut self, input: &InputEvent, now: Instant) -> LoopControl {
        match input {
            InputEvent::CtrlC => {
                info!(target: "runtime", "ctrl_c");
                LoopControl::Break {
                    reason: ShutdownReason::CtrlC,
                }
            }
            InputEvent::Key(key) => match map_key(key) {
                Some(KeyAction::Quit) => LoopControl::Break {
                    reason: ShutdownReason::KeyQuit,
                },
                Some(action) => {
                    // A key overrides any drag; its release must not click.
                    self.pointer.reset();
                    let transition = match action {
                        KeyAction::Next => self.reader.on_activate_next(now),
                        KeyAction::Prev => self.reader.on_activate_prev(now),
                        KeyAction::Close | KeyAction::Quit => self.reader.close(now),
                    };
                    debug!(target: "runtime", ?action, ?transition, "key_action");
                    LoopControl::Continue { redraw: true }
                }
                None => LoopControl::Continue { redraw: false },
            },
            InputEvent::Mouse(mouse) => self.handle_mouse(mouse, now),
            InputEvent::Resize(width, height) => {
                self.reader.layer_mut().resize(*width, *height);
                let half = self.reader.layer().half_width();
                self.reader.resize(half, now);
                self.needs_clear = true;
                LoopControl::Continue { redraw: true }
            }
            InputEvent::FocusLost => {
                self.pointer.reset();
                let abandoned = self.reader.abandon_gesture(now);
                LoopControl::Continue { redraw: abandoned }
            }
            InputEvent::FocusGained => LoopControl::Continue { redraw: false },
        }
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent, now: Instant) -> LoopControl {
        let actions = self.pointer.route(mouse, self.reader.layer());
        let redraw = !actions.is_empty();
        for action in actions {
            match action {
                PointerAction::Begin(side, x) => {
                    self.reader.begin_gesture(side, x, now);
                }
                PointerAction::Track(x) => {
                    self.reader.update_gesture(x);
                }
                PointerAction::End(x) => {
                    self.reader.end_gesture(x, now);
                }
                PointerAction::Click(Side::Next) => {
                    self.reader.on_activate_next(now);
                }
                PointerAction::Click(Side::Prev) => {
                    self.reader.on_activate_prev(now);
                }
            }
        }
        LoopControl::Continue { redraw }
    }

    /// Fire due timers. Returns true when the layer changed.
    pub(crate) fn tick(&mut self, now: Instant) -> bool {
        self.reader.tick(now)
    }

    pub(crate) fn wants_frame(&self) -> bool {
        self.reader.layer().wants_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_reader;
    use core_book::BookState;
    use core_config::EffectiveConfig;
    use core_content::demo_pages;
    use core_events::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEventKind};

    fn session() -> ReaderSession {
        let reader = build_reader(demo_pages(), "Demo", &EffectiveConfig::default(), 81, 20);
        ReaderSession::new(reader)
    }

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::plain(code))
    }

    fn mouse(kind: MouseEventKind, column: u16) -> InputEvent {
        InputEvent::Mouse(MouseEvent {
            kind,
            column,
            row: 8,
            mods: KeyModifiers::empty(),
        })
    }

    fn state(s: &ReaderSession) -> BookState {
        s.reader().book().state()
    }

    #[test]
    fn keys_turn_pages() {
        let mut s = session();
        let now = Instant::now();
        assert!(matches!(
            s.handle_input(&key(KeyCode::Right), now),
            LoopControl::Continue { redraw: true }
        ));
        s.handle_input(&key(KeyCode::Char(' ')), now);
        s.handle_input(&key(KeyCode::Char('l')), now);
        assert_eq!(state(&s), BookState::Open { current: 2 });
        s.handle_input(&key(KeyCode::Left), now);
        assert_eq!(state(&s), BookState::Open { current: 1 });
        s.handle_input(&key(KeyCode::Char('c')), now);
        assert_eq!(state(&s), BookState::Closed);
    }

    #[test]
    fn quit_keys_break_the_loop() {
        let mut s = session();
        let now = Instant::now();
        assert!(matches!(
            s.handle_input(&key(KeyCode::Char('q')), now),
            LoopControl::Break {
                reason: ShutdownReason::KeyQuit
            }
        ));
        assert!(matches!(
            s.handle_input(&InputEvent::CtrlC, now),
            LoopControl::Break {
                reason: ShutdownReason::CtrlC
            }
        ));
    }

    #[test]
    fn click_on_recto_opens_then_turns() {
        let mut s = session();
        let now = Instant::now();
        s.handle_input(&mouse(MouseEventKind::Down(MouseButton::Left), 70), now);
        s.handle_input(&mouse(MouseEventKind::Up(MouseButton::Left), 70), now);
        assert_eq!(state(&s), BookState::Open { current: 0 });
        s.handle_input(&mouse(MouseEventKind::Down(MouseButton::Left), 70), now);
        s.handle_input(&mouse(MouseEventKind::Up(MouseButton::Left), 70), now);
        assert_eq!(state(&s), BookState::Open { current: 1 });
    }

    #[test]
    fn long_drag_commits_a_turn() {
        let mut s = session();
        let now = Instant::now();
        s.handle_input(&key(KeyCode::Right), now);
        s.handle_input(&mouse(MouseEventKind::Down(MouseButton::Left), 75), now);
        s.handle_input(&mouse(MouseEventKind::Drag(MouseButton::Left), 55), now);
        assert!(s.reader().gesture().is_active());
        s.handle_input(&mouse(MouseEventKind::Up(MouseButton::Left), 30), now);
        assert!(!s.reader().gesture().is_active());
        assert_eq!(state(&s), BookState::Open { current: 1 });
    }

    #[test]
    fn focus_loss_abandons_drag() {
        let mut s = session();
        let now = Instant::now();
        s.handle_input(&key(KeyCode::Right), now);
        s.handle_input(&mouse(MouseEventKind::Down(MouseButton::Left), 75), now);
        s.handle_input(&mouse(MouseEventKind::Drag(MouseButton::Left), 20), now);
        s.handle_input(&InputEvent::FocusLost, now);
        assert!(!s.reader().gesture().is_active());
        // The release arrives after focus returns and must not turn anything.
        s.handle_input(&mouse(MouseEventKind::Up(MouseButton::Left), 20), now);
        assert_eq!(state(&s), BookState::Open { current: 0 });
    }

    #[test]
    fn resize_requests_clear_and_new_threshold() {
        let mut s = session();
        let now = Instant::now();
        assert!(s.take_needs_clear(), "first frame clears");
        assert!(!s.take_needs_clear());
        s.handle_input(&InputEvent::Resize(41, 20), now);
        assert!(s.take_needs_clear());
        assert_eq!(s.reader().gesture().half_width(), 20.0);
    }
}
