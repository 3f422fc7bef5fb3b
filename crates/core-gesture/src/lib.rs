//! Gesture controller: converts a horizontal pointer drag into a leaf rotation
//! and decides commit vs. revert at release.
//!
//! Lifecycle:
//! 1. `begin` checks the direction guard and records the target + `start_x`.
//! 2. `update` maps `dx` to an angle. Vertical motion never reaches this crate.
//! 3. `end` compares `dx` against `half_width * threshold_ratio` and either
//!    commits the matching half-transition on the book or leaves it untouched.
//!
//! Exclusivity: a single session slot. `begin` while a session is active
//! returns [`GestureStart::Busy`] and leaves the running session alone. The
//! session is consumed at `end`; the settle delay reported in
//! [`GestureRelease`] is purely presentational and does not hold the slot.
//!
//! `half_width` is read at `update`/`end` time, so a resize in the middle of a
//! drag changes both the travel and the threshold for the rest of it.

mod angle;

pub use angle::{drag_angle, drag_progress};

use core_book::{Book, Transition, TurnTarget};
use std::time::Duration;
use tracing::{debug, trace};

pub const DEFAULT_THRESHOLD_RATIO: f32 = 0.25;
pub const DEFAULT_TRAVEL_RATIO: f32 = 0.85;
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(220);

/// Leaf lying on the unread (right) side.
pub const REST_ANGLE: f32 = 0.0;
/// Leaf turned onto the read (left) side.
pub const FLIPPED_ANGLE: f32 = -180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Next,
    Prev,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Next => "next",
            Side::Prev => "prev",
        }
    }

    /// Angle the target is snapped to when the session begins.
    pub fn initial_angle(&self) -> f32 {
        match self {
            Side::Next => REST_ANGLE,
            Side::Prev => FLIPPED_ANGLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureTuning {
    /// Fraction of the half width `|dx|` must exceed to commit.
    pub threshold_ratio: f32,
    /// Fraction of the half width that maps to a full 180 degree turn.
    pub travel_ratio: f32,
    /// How long the released target keeps its "turning" presentation.
    pub settle: Duration,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            threshold_ratio: DEFAULT_THRESHOLD_RATIO,
            travel_ratio: DEFAULT_TRAVEL_RATIO,
            settle: DEFAULT_SETTLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    pub side: Side,
    pub target: TurnTarget,
    pub start_x: f32,
    pub angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureStart {
    Started { target: TurnTarget, angle: f32 },
    /// Guard for the requested direction failed; nothing changed.
    Rejected,
    /// `Prev` on an open book at `current == 0`: the book was closed instead of
    /// starting a session.
    ClosedBook,
    /// Another session is still in flight.
    Busy,
}

/// Pose the target settles into after release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Rest,
    Flipped,
}

impl Pose {
    pub fn angle(&self) -> f32 {
        match self {
            Pose::Rest => REST_ANGLE,
            Pose::Flipped => FLIPPED_ANGLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Threshold cleared; the book transitioned.
    Committed(Transition),
    /// Threshold not cleared; target snaps back to where it started.
    Reverted,
    /// `Prev` drag below threshold: the leaf falls back onto the turned pile.
    /// `current` is unchanged and the leaf is still flipped, so the pose agrees
    /// with the model.
    Settled,
    /// The book moved under the session (keyboard close, activation) and the
    /// target no longer matches `current`; the release is ignored.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureRelease {
    pub side: Side,
    pub target: TurnTarget,
    pub dx: f32,
    pub outcome: GestureOutcome,
    pub pose: Pose,
    pub settle: Duration,
}

#[derive(Debug, Clone)]
pub struct GestureController {
    session: Option<GestureSession>,
    half_width: f32,
    tuning: GestureTuning,
}

impl GestureController {
    pub fn new(half_width: f32, tuning: GestureTuning) -> Self {
        Self {
            session: None,
            half_width: half_width.max(0.0),
            tuning,
        }
    }

    pub fn tuning(&self) -> GestureTuning {
        self.tuning
    }

    pub fn half_width(&self) -> f32 {
        self.half_width
    }

    pub fn set_half_width(&mut self, half_width: f32) {
        let half_width = half_width.max(0.0);
        if half_width != self.half_width {
            trace!(
                target: "gesture",
                old = self.half_width,
                new = half_width,
                active = self.session.is_some(),
                "half_width_changed"
            );
        }
        self.half_width = half_width;
    }

    /// Horizontal distance a release must exceed to commit.
    pub fn threshold(&self) -> f32 {
        self.half_width * self.tuning.threshold_ratio
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    pub fn begin<C>(&mut self, book: &mut Book<C>, side: Side, pointer_x: f32) -> GestureStart {
        if self.session.is_some() {
            debug!(target: "gesture", side = side.as_str(), "gesture_begin_busy");
            return GestureStart::Busy;
        }

        let target = match side {
            Side::Next => {
                if !book.can_advance() {
                    trace!(target: "gesture", side = side.as_str(), "gesture_begin_rejected");
                    return GestureStart::Rejected;
                }
                if book.is_open() {
                    TurnTarget::Leaf(book.current())
                } else {
                    TurnTarget::Cover
                }
            }
            Side::Prev => {
                if !book.can_retreat() {
                    if book.is_open() && book.current() == 0 {
                        book.close();
                        debug!(target: "gesture", "gesture_begin_closed_book");
                        return GestureStart::ClosedBook;
                    }
                    trace!(target: "gesture", side = side.as_str(), "gesture_begin_rejected");
                    return GestureStart::Rejected;
                }
                TurnTarget::Leaf(book.current() - 1)
            }
        };

        let angle = side.initial_angle();
        self.session = Some(GestureSession {
            side,
            target,
            start_x: pointer_x,
            angle,
        });
        debug!(
            target: "gesture",
            side = side.as_str(),
            target = ?target,
            start_x = pointer_x,
            "gesture_started"
        );
        GestureStart::Started { target, angle }
    }

    /// Track pointer motion. Returns the target and its new angle, or `None` when
    /// no session is active.
    pub fn update(&mut self, pointer_x: f32) -> Option<(TurnTarget, f32)> {
        let span = self.half_width * self.tuning.travel_ratio;
        let session = self.session.as_mut()?;
        let dx = pointer_x - session.start_x;
        session.angle = drag_angle(session.side, dx, span);
        Some((session.target, session.angle))
    }

    /// Abandon the active session without touching the book.
    pub fn cancel(&mut self) -> Option<GestureSession> {
        let session = self.session.take();
        if let Some(s) = &session {
            debug!(target: "gesture", side = s.side.as_str(), target = ?s.target, "gesture_cancelled");
        }
        session
    }

    pub fn end<C>(&mut self, book: &mut Book<C>, pointer_x: f32) -> Option<GestureRelease> {
        let session = self.session.take()?;
        let dx = pointer_x - session.start_x;
        let threshold = self.threshold();

        let (outcome, pose) = if !target_still_valid(book, &session) {
            (GestureOutcome::Stale, pose_from_model(book, session.target))
        } else {
            match (session.target, session.side) {
                (TurnTarget::Cover, _) => {
                    if dx < -threshold {
                        (GestureOutcome::Committed(book.open_cover()), Pose::Flipped)
                    } else {
                        (GestureOutcome::Reverted, Pose::Rest)
                    }
                }
                (TurnTarget::Leaf(_), Side::Next) => {
                    if dx < -threshold {
                        (GestureOutcome::Committed(book.flip_current()), Pose::Flipped)
                    } else {
                        (GestureOutcome::Reverted, Pose::Rest)
                    }
                }
                (TurnTarget::Leaf(_), Side::Prev) => {
                    if dx > threshold {
                        (GestureOutcome::Committed(book.unflip_previous()), Pose::Rest)
                    } else {
                        (GestureOutcome::Settled, Pose::Flipped)
                    }
                }
            }
        };

        debug!(
            target: "gesture",
            side = session.side.as_str(),
            target = ?session.target,
            dx,
            threshold,
            outcome = ?outcome,
            "gesture_released"
        );

        Some(GestureRelease {
            side: session.side,
            target: session.target,
            dx,
            outcome,
            pose,
            settle: self.tuning.settle,
        })
    }
}

fn target_still_valid<C>(book: &Book<C>, session: &GestureSession) -> bool {
    match (session.target, session.side) {
        (TurnTarget::Cover, _) => !book.is_open(),
        (TurnTarget::Leaf(i), Side::Next) => book.is_open() && book.current() == i,
        (TurnTarget::Leaf(i), Side::Prev) => book.is_open() && book.current() == i + 1,
    }
}

fn pose_from_model<C>(book: &Book<C>, target: TurnTarget) -> Pose {
    let flipped = match target {
        TurnTarget::Cover => book.is_open(),
        TurnTarget::Leaf(i) => book.leaf(i).is_some_and(|l| l.is_flipped()),
    };
    if flipped { Pose::Flipped } else { Pose::Rest }
}
