//! Async input service: crossterm `EventStream` -> normalized `core_events` input.

mod async_service;
mod mapping;

pub use async_service::AsyncInputShutdown;
pub use mapping::{map_key_event, map_mouse_event};

use async_service::spawn_async_event_task;
use core_events::{Event, KeyCode, KeyEvent, MouseEvent};
use tokio::task::JoinHandle;

/// Log a key press without its character payload (only the key family).
#[inline]
pub(crate) fn log_key_event(key: &KeyEvent) {
    let family = match key.code {
        KeyCode::Char(_) => "char",
        _ => "named",
    };
    tracing::trace!(target: "input.event", kind = "key", family, mods = ?key.mods);
}

#[inline]
pub(crate) fn log_mouse_event(mouse: &MouseEvent) {
    tracing::trace!(
        target: "input.event",
        kind = "mouse",
        mouse = ?mouse.kind,
        column = mouse.column,
        row = mouse.row
    );
}

/// Spawn the async input service backed by `crossterm::EventStream`.
///
/// Returns the `JoinHandle` for the background task alongside a shutdown handle
/// that can be used to request immediate termination.
pub fn spawn_async_input(
    sender: tokio::sync::mpsc::Sender<Event>,
) -> (JoinHandle<()>, AsyncInputShutdown) {
    spawn_async_event_task(sender)
}
