use crate::{FLIPPED_ANGLE, Side};

/// Fraction of a full turn covered by `dx` over `span` pixels/columns, in `[0, 1]`.
/// A degenerate span (zero-width book) yields no progress.
pub fn drag_progress(dx: f32, span: f32) -> f32 {
    if span <= 0.0 || !dx.is_finite() {
        return 0.0;
    }
    (dx.abs() / span).clamp(0.0, 1.0)
}

/// Rotation for a drag of `dx` along `span`. `Next` turns away from 0 toward
/// -180; `Prev` starts at -180 and comes back toward 0.
pub fn drag_angle(side: Side, dx: f32, span: f32) -> f32 {
    let progress = drag_progress(dx, span);
    match side {
        Side::Next => FLIPPED_ANGLE * progress,
        Side::Prev => FLIPPED_ANGLE + 180.0 * progress,
    }
}
