//! Input surface of the page-turn engine.
//!
//! `Reader` owns the book, the single gesture slot and the render sync, and is
//! the only place where the three meet. Click and key activations dispatch
//! navigation directly; pointer drags go through the gesture controller.
//! Either way the resulting transition is handed to `RenderSync` before the
//! call returns.
//!
//! A direct activation arriving while a drag is in flight abandons the drag
//! first, so a session never outlives the state it was started against.

use crate::RenderLayer;
use crate::sync::RenderSync;
use core_book::{Book, Transition, VisibleFaces};
use core_gesture::{GestureController, GestureRelease, GestureStart, GestureTuning, Side};
use std::time::{Duration, Instant};
use tracing::debug;

pub struct Reader<L: RenderLayer> {
    book: Book<L::Content>,
    gesture: GestureController,
    sync: RenderSync<L>,
}

impl<L: RenderLayer> Reader<L> {
    /// Build the reader and mount every leaf into `layer`.
    pub fn new(
        book: Book<L::Content>,
        layer: L,
        half_width: f32,
        tuning: GestureTuning,
        resize_debounce: Duration,
    ) -> Self {
        let mut sync = RenderSync::new(layer, tuning.settle, resize_debounce);
        sync.mount(&book);
        Self {
            book,
            gesture: GestureController::new(half_width, tuning),
            sync,
        }
    }

    pub fn book(&self) -> &Book<L::Content> {
        &self.book
    }

    pub fn gesture(&self) -> &GestureController {
        &self.gesture
    }

    pub fn sync(&self) -> &RenderSync<L> {
        &self.sync
    }

    pub fn layer(&self) -> &L {
        self.sync.layer()
    }

    pub fn layer_mut(&mut self) -> &mut L {
        self.sync.layer_mut()
    }

    pub fn on_activate_next(&mut self, now: Instant) -> Transition {
        self.abandon_gesture(now);
        let transition = self.book.advance();
        self.sync.apply(&self.book, transition, now);
        transition
    }

    pub fn on_activate_prev(&mut self, now: Instant) -> Transition {
        self.abandon_gesture(now);
        let transition = self.book.retreat();
        self.sync.apply(&self.book, transition, now);
        transition
    }

    pub fn close(&mut self, now: Instant) -> Transition {
        self.abandon_gesture(now);
        let transition = self.book.close();
        self.sync.apply(&self.book, transition, now);
        transition
    }

    pub fn begin_gesture(&mut self, side: Side, x: f32, now: Instant) -> GestureStart {
        let start = self.gesture.begin(&mut self.book, side, x);
        match start {
            GestureStart::Started { target, angle } => self.sync.gesture_started(target, angle),
            GestureStart::ClosedBook => self.sync.apply(&self.book, Transition::Closed, now),
            GestureStart::Rejected | GestureStart::Busy => {}
        }
        start
    }

    /// Returns the angle pushed to the layer, `None` without an active session.
    pub fn update_gesture(&mut self, x: f32) -> Option<f32> {
        let (target, angle) = self.gesture.update(x)?;
        self.sync.gesture_tracked(target, angle);
        Some(angle)
    }

    pub fn end_gesture(&mut self, x: f32, now: Instant) -> Option<GestureRelease> {
        let release = self.gesture.end(&mut self.book, x)?;
        self.sync.gesture_released(&self.book, &release, now);
        Some(release)
    }

    /// Drop an in-flight drag without committing (focus lost, override).
    pub fn abandon_gesture(&mut self, now: Instant) -> bool {
        let Some(session) = self.gesture.cancel() else {
            return false;
        };
        self.sync.gesture_abandoned(&self.book, &session, now);
        true
    }

    /// New book half width. The gesture controller sees it immediately; the
    /// fixed pages re-sync once resizes settle.
    pub fn resize(&mut self, half_width: f32, now: Instant) {
        self.gesture.set_half_width(half_width);
        self.sync.request_resync(now);
        debug!(target: "render.sync", half_width, "resize_requested");
    }

    /// Fire due settle and resize deadlines.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.sync.poll(&self.book, now)
    }

    pub fn current_visible_faces(&self) -> VisibleFaces<'_, L::Content> {
        self.book.current_visible_faces()
    }
}
