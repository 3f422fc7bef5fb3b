//! Pushes book state out to a [`RenderLayer`].
//!
//! `RenderSync` is the only caller of the layer. It turns navigation
//! transitions and gesture lifecycle events into placement, rotation, depth
//! and turning-flag updates, and it owns the two kinds of deferred work:
//! per-target settle deadlines that clear the turning flag, and the resize
//! debounce that re-materialises the fixed pages. Neither ever mutates the
//! book.

use crate::timers::{Debounce, SettleTimers};
use crate::{RenderLayer, Slot};
use core_book::{Book, Transition, TurnTarget};
use core_gesture::{FLIPPED_ANGLE, GestureOutcome, GestureRelease, GestureSession, REST_ANGLE};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub struct RenderSync<L: RenderLayer> {
    layer: L,
    settle: Duration,
    timers: SettleTimers,
    resize: Debounce,
}

impl<L: RenderLayer> RenderSync<L> {
    pub fn new(layer: L, settle: Duration, resize_debounce: Duration) -> Self {
        Self {
            layer,
            settle,
            timers: SettleTimers::new(),
            resize: Debounce::new(resize_debounce),
        }
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut L {
        &mut self.layer
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    pub fn is_turning(&self, target: TurnTarget) -> bool {
        self.timers.is_pending(target)
    }

    /// Earliest pending deadline (settle or resize), for tick scheduling.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.timers.next_deadline(), self.resize.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Materialise every leaf face and snap the whole stack to the model.
    pub fn mount(&mut self, book: &Book<L::Content>) {
        for leaf in book.leaves() {
            let i = leaf.index();
            let front = self.layer.render_face(leaf.front_face());
            self.layer.place(Slot::LeafFront(i), Some(front));
            let back = self.layer.render_face(leaf.back_face());
            self.layer.place(Slot::LeafBack(i), Some(back));
            self.layer.apply_depth(i, leaf.depth());
            self.layer
                .apply_rotation(TurnTarget::Leaf(i), leaf_angle(leaf.is_flipped()), false);
        }
        self.layer.apply_rotation(
            TurnTarget::Cover,
            leaf_angle(book.is_open()),
            false,
        );
        self.layer.set_open(book.is_open());
        self.sync_visible(book);
        debug!(target: "render.sync", leaves = book.len(), open = book.is_open(), "mounted");
    }

    /// Re-render the two fixed pages from `content_at(current)`.
    pub fn sync_visible(&mut self, book: &Book<L::Content>) {
        let faces = book.current_visible_faces();
        let right = faces.right.map(|f| self.layer.render_face(f));
        self.layer.place(Slot::FixedRight, right);
        let left = faces.left.map(|f| self.layer.render_face(f));
        self.layer.place(Slot::FixedLeft, left);
        trace!(target: "render.sync", current = book.current(), "visible_synced");
    }

    /// Reflect a navigation transition that already happened on `book`.
    pub fn apply(&mut self, book: &Book<L::Content>, transition: Transition, now: Instant) {
        match transition {
            Transition::Rejected => return,
            Transition::Opened => {
                self.layer.set_open(true);
                self.begin_turning(TurnTarget::Cover, now);
                self.layer
                    .apply_rotation(TurnTarget::Cover, FLIPPED_ANGLE, true);
                self.sync_visible(book);
            }
            Transition::Flipped { leaf } => {
                let target = TurnTarget::Leaf(leaf);
                self.begin_turning(target, now);
                self.layer.apply_rotation(target, FLIPPED_ANGLE, true);
                if let Some(depth) = book.depth_of(leaf) {
                    self.layer.apply_depth(leaf, depth);
                }
                self.sync_visible(book);
            }
            Transition::Unflipped { leaf, closed } => {
                let target = TurnTarget::Leaf(leaf);
                self.begin_turning(target, now);
                self.layer.apply_rotation(target, REST_ANGLE, true);
                if let Some(depth) = book.depth_of(leaf) {
                    self.layer.apply_depth(leaf, depth);
                }
                self.sync_visible(book);
                if closed {
                    self.close_all(book);
                }
            }
            Transition::Closed => self.close_all(book),
        }
        debug!(target: "render.sync", transition = ?transition, current = book.current(), "transition_applied");
    }

    /// Return every leaf and the cover to the model's (closed) pose.
    pub fn close_all(&mut self, book: &Book<L::Content>) {
        for leaf in book.leaves() {
            self.layer.apply_rotation(
                TurnTarget::Leaf(leaf.index()),
                leaf_angle(leaf.is_flipped()),
                true,
            );
            self.layer.apply_depth(leaf.index(), leaf.depth());
        }
        self.layer.apply_rotation(TurnTarget::Cover, REST_ANGLE, true);
        self.layer.set_open(book.is_open());
        self.sync_visible(book);
    }

    pub fn gesture_started(&mut self, target: TurnTarget, angle: f32) {
        // A settle deadline left over from an earlier turn must not clear the
        // flag mid-drag.
        self.timers.cancel(target);
        self.layer.set_turning(target, true);
        self.layer.apply_rotation(target, angle, false);
    }

    pub fn gesture_tracked(&mut self, target: TurnTarget, angle: f32) {
        self.layer.apply_rotation(target, angle, false);
    }

    pub fn gesture_released(
        &mut self,
        book: &Book<L::Content>,
        release: &GestureRelease,
        now: Instant,
    ) {
        match release.outcome {
            GestureOutcome::Committed(transition) => self.apply(book, transition, now),
            GestureOutcome::Reverted | GestureOutcome::Settled | GestureOutcome::Stale => {
                self.layer
                    .apply_rotation(release.target, release.pose.angle(), true);
                if let TurnTarget::Leaf(i) = release.target
                    && let Some(depth) = book.depth_of(i)
                {
                    self.layer.apply_depth(i, depth);
                }
            }
        }
        self.layer.set_turning(release.target, true);
        self.timers.schedule(release.target, now + release.settle);
    }

    /// A session dropped without release (focus loss, keyboard override):
    /// ease the target back to whatever the model says.
    pub fn gesture_abandoned(
        &mut self,
        book: &Book<L::Content>,
        session: &GestureSession,
        now: Instant,
    ) {
        let flipped = match session.target {
            TurnTarget::Cover => book.is_open(),
            TurnTarget::Leaf(i) => book.leaf(i).is_some_and(|l| l.is_flipped()),
        };
        self.layer
            .apply_rotation(session.target, leaf_angle(flipped), true);
        self.timers.schedule(session.target, now + self.settle);
    }

    /// Debounced: the fixed pages are re-synced once resizes stop arriving.
    pub fn request_resync(&mut self, now: Instant) {
        self.resize.arm(now);
    }

    /// Fire due deadlines. Returns true when the layer was touched.
    pub fn poll(&mut self, book: &Book<L::Content>, now: Instant) -> bool {
        let expired = self.timers.poll_expired(now);
        let mut touched = !expired.is_empty();
        for target in expired {
            self.layer.set_turning(target, false);
            trace!(target: "render.sync", target = ?target, "turning_cleared");
        }
        if self.resize.poll(now) {
            self.sync_visible(book);
            debug!(target: "render.sync", "resize_resynced");
            touched = true;
        }
        touched
    }

    fn begin_turning(&mut self, target: TurnTarget, now: Instant) {
        self.layer.set_turning(target, true);
        self.timers.schedule(target, now + self.settle);
    }
}

#[inline]
fn leaf_angle(flipped: bool) -> f32 {
    if flipped { FLIPPED_ANGLE } else { REST_ANGLE }
}
