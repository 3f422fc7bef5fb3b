//! Terminal implementation of [`RenderLayer`].
//!
//! The screen is a header row, the book area and a hint row. The book area is
//! split by a one column spine into a verso (left) and recto (right) half.
//!
//! Resting pages are the two fixed slots. A leaf or the cover that is turning
//! or mid-rotation is projected as a column band hinged on the spine whose
//! width is `|cos(angle)|` of the half width: on the right half showing its
//! front while the angle is above -90, on the left half showing its back
//! after. Whatever a moving band uncovers is redrawn from the resting stack so
//! the page underneath shows through.
//!
//! Animated rotations tween from the displayed angle over the settle
//! duration. The tween clock starts on the first `compose` after the request,
//! so the layer never reads the wall clock itself.

use crate::face::FacePlate;
use crate::{CellFlags, Frame, RenderLayer, Slot, text_width};
use core_book::{Face, TurnTarget};
use core_content::Page;
use core_gesture::{FLIPPED_ANGLE, REST_ANGLE, Side};
use std::time::{Duration, Instant};
use tracing::trace;

const HINTS: &str = " ←/h prev   →/l/space next   c close   q quit   drag a page to turn it";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rotation {
    from: f32,
    to: f32,
    animated: bool,
    started: Option<Instant>,
    shown: f32,
}

impl Rotation {
    fn at_rest(angle: f32) -> Self {
        Self {
            from: angle,
            to: angle,
            animated: false,
            started: None,
            shown: angle,
        }
    }

    fn retarget(&mut self, degrees: f32, animated: bool) {
        self.from = self.shown;
        self.to = degrees;
        self.animated = animated && self.from != degrees;
        self.started = None;
        if !self.animated {
            self.shown = degrees;
        }
    }

    /// Advance the tween to `now` and return the displayed angle.
    fn advance(&mut self, now: Instant, duration: Duration) -> f32 {
        if !self.animated {
            self.shown = self.to;
            return self.shown;
        }
        let started = *self.started.get_or_insert(now);
        let t = if duration.is_zero() {
            1.0
        } else {
            (now.saturating_duration_since(started).as_secs_f32() / duration.as_secs_f32())
                .clamp(0.0, 1.0)
        };
        // Ease out.
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        self.shown = self.from + (self.to - self.from) * eased;
        if t >= 1.0 {
            self.animated = false;
            self.shown = self.to;
        }
        self.shown
    }

    fn in_motion(&self) -> bool {
        self.animated || (self.shown != REST_ANGLE && self.shown != FLIPPED_ANGLE)
    }
}

#[derive(Debug, Clone)]
struct LeafView {
    front: Option<FacePlate>,
    back: Option<FacePlate>,
    depth: u32,
    rotation: Rotation,
    turning: bool,
}

impl Default for LeafView {
    fn default() -> Self {
        Self {
            front: None,
            back: None,
            depth: 0,
            rotation: Rotation::at_rest(REST_ANGLE),
            turning: false,
        }
    }
}

/// Screen geometry derived from the terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: u16,
    pub height: u16,
    /// First row of the book area.
    pub top: u16,
    /// Rows in the book area.
    pub rows: u16,
    pub spine: u16,
    /// Columns in each half.
    pub half: u16,
}

impl Layout {
    pub fn new(width: u16, height: u16) -> Self {
        let rows = height.saturating_sub(2);
        let half = width.saturating_sub(1) / 2;
        Self {
            width,
            height,
            top: 1,
            rows,
            spine: half,
            half,
        }
    }

    fn left_x(&self) -> u16 {
        0
    }

    fn right_x(&self) -> u16 {
        self.spine + 1
    }
}

pub struct TerminalLayer {
    title: String,
    tween: Duration,
    layout: Layout,
    open: bool,
    fixed_left: Option<FacePlate>,
    fixed_right: Option<FacePlate>,
    leaves: Vec<LeafView>,
    cover: Rotation,
    cover_turning: bool,
    dirty: bool,
}

impl TerminalLayer {
    pub fn new(title: impl Into<String>, width: u16, height: u16, tween: Duration) -> Self {
        Self {
            title: title.into(),
            tween,
            layout: Layout::new(width, height),
            open: false,
            fixed_left: None,
            fixed_right: None,
            leaves: Vec::new(),
            cover: Rotation::at_rest(REST_ANGLE),
            cover_turning: false,
            dirty: true,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Half width in columns as seen by the gesture controller.
    pub fn half_width(&self) -> f32 {
        f32::from(self.layout.half)
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.layout = Layout::new(width, height);
        self.dirty = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// True while something changed since the last compose or a tween runs.
    pub fn wants_frame(&self) -> bool {
        self.dirty
            || self.cover.animated
            || self.leaves.iter().any(|l| l.rotation.animated)
    }

    /// Angle last shown for `target`.
    pub fn shown_angle(&self, target: TurnTarget) -> Option<f32> {
        match target {
            TurnTarget::Cover => Some(self.cover.shown),
            TurnTarget::Leaf(i) => self.leaves.get(i).map(|l| l.rotation.shown),
        }
    }

    pub fn depth(&self, leaf: usize) -> Option<u32> {
        self.leaves.get(leaf).map(|l| l.depth)
    }

    pub fn is_turning(&self, target: TurnTarget) -> bool {
        match target {
            TurnTarget::Cover => self.cover_turning,
            TurnTarget::Leaf(i) => self.leaves.get(i).is_some_and(|l| l.turning),
        }
    }

    /// Which turn a pointer column starts. The spine counts as verso.
    pub fn side_of(&self, column: u16) -> Side {
        if column <= self.layout.spine {
            Side::Prev
        } else {
            Side::Next
        }
    }

    fn leaf_mut(&mut self, i: usize) -> &mut LeafView {
        if self.leaves.len() <= i {
            self.leaves.resize_with(i + 1, LeafView::default);
        }
        &mut self.leaves[i]
    }

    /// Build the frame for `now`, advancing any running tweens.
    pub fn compose(&mut self, now: Instant) -> Frame {
        let layout = self.layout;
        let mut frame = Frame::new(layout.width, layout.height);
        if layout.width < 3 || layout.rows == 0 {
            self.dirty = false;
            return frame;
        }

        let tween = self.tween;
        let cover_angle = self.cover.advance(now, tween);
        for leaf in &mut self.leaves {
            leaf.rotation.advance(now, tween);
        }

        self.draw_header(&mut frame);
        for row in 0..layout.rows {
            frame.set_cluster(layout.spine, layout.top + row, "│", 1, CellFlags::DIM);
        }

        let cover_resting_closed = !self.cover.in_motion() && cover_angle == REST_ANGLE;
        if cover_resting_closed && !self.cover_turning {
            self.draw_cover(&mut frame, layout.right_x(), layout.half, CellFlags::empty());
        } else {
            self.draw_fixed(&mut frame);
            self.draw_uncovered(&mut frame);
            self.draw_moving_leaves(&mut frame);
            if self.cover.in_motion() || self.cover_turning {
                self.draw_cover_band(&mut frame, cover_angle);
            }
        }

        frame.put_str(
            0,
            layout.height - 1,
            HINTS,
            layout.width,
            CellFlags::DIM,
        );
        self.dirty = false;
        trace!(target: "render.terminal", w = layout.width, h = layout.height, open = self.open, "frame_composed");
        frame
    }

    fn draw_header(&self, frame: &mut Frame) {
        let status = match (&self.fixed_left, &self.fixed_right, self.open) {
            (_, _, false) => "closed".to_string(),
            (Some(l), Some(r), _) => format!("pages {}-{}", l.number, r.number),
            (Some(l), None, _) => format!("page {} (end)", l.number),
            (None, Some(r), _) => format!("page {}", r.number),
            (None, None, _) => String::new(),
        };
        let width = frame.width;
        let used = frame.put_str(1, 0, &self.title, width.saturating_sub(2), CellFlags::BOLD);
        let status_w = text_width(&status);
        let x = width.saturating_sub(status_w + 1);
        if x > used + 2 {
            frame.put_str(x, 0, &status, status_w, CellFlags::DIM);
        }
    }

    fn draw_fixed(&self, frame: &mut Frame) {
        let l = self.layout;
        if let Some(plate) = &self.fixed_left {
            plate.draw(frame, l.left_x() + 1, l.top, l.half.saturating_sub(2), l.rows, CellFlags::empty());
        }
        if let Some(plate) = &self.fixed_right {
            plate.draw(frame, l.right_x() + 1, l.top, l.half.saturating_sub(2), l.rows, CellFlags::empty());
        }
    }

    /// Redraw a half from the resting stack when a moving leaf no longer
    /// covers it.
    fn draw_uncovered(&self, frame: &mut Frame) {
        if !self.leaves.iter().any(|l| l.rotation.in_motion() || l.turning) {
            return;
        }
        let l = self.layout;
        let resting = |flipped: bool| {
            self.leaves
                .iter()
                .filter(|v| !v.rotation.in_motion() && !v.turning)
                .filter(|v| (v.rotation.shown == FLIPPED_ANGLE) == flipped)
                .max_by_key(|v| v.depth)
        };
        let under_right = resting(false).and_then(|v| v.front.as_ref());
        let under_left = resting(true).and_then(|v| v.back.as_ref());
        frame.clear_rect(l.right_x(), l.top, l.half, l.rows, CellFlags::empty());
        if let Some(plate) = under_right {
            plate.draw(frame, l.right_x() + 1, l.top, l.half.saturating_sub(2), l.rows, CellFlags::empty());
        }
        frame.clear_rect(l.left_x(), l.top, l.half, l.rows, CellFlags::empty());
        if let Some(plate) = under_left {
            plate.draw(frame, l.left_x() + 1, l.top, l.half.saturating_sub(2), l.rows, CellFlags::empty());
        }
    }

    fn draw_moving_leaves(&self, frame: &mut Frame) {
        let mut moving: Vec<&LeafView> = self
            .leaves
            .iter()
            .filter(|v| v.rotation.in_motion() || v.turning)
            .collect();
        // Stack order: depth ascending, turning leaves lifted above the rest.
        moving.sort_by_key(|v| (v.turning, v.depth));
        for view in moving {
            let angle = view.rotation.shown;
            let plate = if angle > -90.0 { &view.front } else { &view.back };
            self.draw_band(frame, angle, plate.as_ref(), view.turning);
        }
    }

    fn draw_cover_band(&self, frame: &mut Frame, angle: f32) {
        let (x, w) = self.band(angle);
        if w == 0 {
            return;
        }
        if angle > -90.0 {
            self.draw_cover(frame, x, w, CellFlags::empty());
        } else {
            frame.clear_rect(x, self.layout.top, w, self.layout.rows, CellFlags::DIM);
        }
        self.draw_edge(frame, angle, x, w, self.cover_turning);
    }

    /// Column span of a rotating sheet: hinged on the spine, on the right
    /// half while `angle > -90`.
    fn band(&self, angle: f32) -> (u16, u16) {
        let l = self.layout;
        let w = (angle.to_radians().cos().abs() * f32::from(l.half)).round() as u16;
        let w = w.min(l.half);
        if angle > -90.0 {
            (l.right_x(), w)
        } else {
            (l.spine - w, w)
        }
    }

    fn draw_band(&self, frame: &mut Frame, angle: f32, plate: Option<&FacePlate>, turning: bool) {
        let (x, w) = self.band(angle);
        if w == 0 {
            return;
        }
        let l = self.layout;
        frame.clear_rect(x, l.top, w, l.rows, CellFlags::empty());
        if let Some(plate) = plate
            && w > 2
        {
            plate.draw(frame, x + 1, l.top, w - 2, l.rows, CellFlags::empty());
        }
        self.draw_edge(frame, angle, x, w, turning);
    }

    /// Outer edge of a moving sheet, reversed while it is marked turning.
    fn draw_edge(&self, frame: &mut Frame, angle: f32, x: u16, w: u16, turning: bool) {
        let l = self.layout;
        let edge_x = if angle > -90.0 { x + w - 1 } else { x };
        let flags = if turning {
            CellFlags::REVERSE
        } else {
            CellFlags::DIM
        };
        for row in 0..l.rows {
            frame.set_cluster(edge_x, l.top + row, "┃", 1, flags);
        }
    }

    fn draw_cover(&self, frame: &mut Frame, x: u16, w: u16, extra: CellFlags) {
        let l = self.layout;
        frame.clear_rect(x, l.top, w, l.rows, extra);
        if w < 4 || l.rows < 3 {
            return;
        }
        let inner = w - 2;
        let mid = l.top + l.rows / 2;
        let title_w = text_width(&self.title).min(inner);
        frame.put_str(
            x + 1 + (inner - title_w) / 2,
            mid.saturating_sub(1),
            &self.title,
            inner,
            CellFlags::BOLD | extra,
        );
        let hint = "open →";
        let hint_w = text_width(hint).min(inner);
        frame.put_str(x + 1 + (inner - hint_w) / 2, mid + 1, hint, inner, CellFlags::DIM | extra);
        for row in 0..l.rows {
            frame.set_cluster(x, l.top + row, "┃", 1, CellFlags::BOLD);
            frame.set_cluster(x + w - 1, l.top + row, "┃", 1, CellFlags::BOLD);
        }
    }
}

impl RenderLayer for TerminalLayer {
    type Content = Page;
    type Renderable = FacePlate;

    fn render_face(&mut self, face: Face<'_, Page>) -> FacePlate {
        FacePlate::from_face(face)
    }

    fn place(&mut self, slot: Slot, renderable: Option<FacePlate>) {
        match slot {
            Slot::FixedLeft => self.fixed_left = renderable,
            Slot::FixedRight => self.fixed_right = renderable,
            Slot::LeafFront(i) => self.leaf_mut(i).front = renderable,
            Slot::LeafBack(i) => self.leaf_mut(i).back = renderable,
        }
        self.dirty = true;
    }

    fn apply_rotation(&mut self, target: TurnTarget, degrees: f32, animated: bool) {
        match target {
            TurnTarget::Cover => self.cover.retarget(degrees, animated),
            TurnTarget::Leaf(i) => self.leaf_mut(i).rotation.retarget(degrees, animated),
        }
        self.dirty = true;
    }

    fn apply_depth(&mut self, leaf: usize, depth: u32) {
        self.leaf_mut(leaf).depth = depth;
        self.dirty = true;
    }

    fn set_turning(&mut self, target: TurnTarget, on: bool) {
        match target {
            TurnTarget::Cover => self.cover_turning = on,
            TurnTarget::Leaf(i) => self.leaf_mut(i).turning = on,
        }
        self.dirty = true;
    }

    fn set_open(&mut self, open: bool) {
        self.open = open;
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_book::FaceSide;

    const TWEEN: Duration = Duration::from_millis(200);

    fn plate(number: u32, title: &str, side: FaceSide) -> FacePlate {
        FacePlate {
            title: title.into(),
            body: String::new(),
            image: None,
            number,
            side,
        }
    }

    fn screen(frame: &Frame) -> String {
        (0..frame.height)
            .map(|y| frame.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn layout_splits_halves_around_spine() {
        let l = Layout::new(41, 12);
        assert_eq!((l.half, l.spine, l.rows), (20, 20, 10));
        assert_eq!(l.right_x(), 21);
    }

    #[test]
    fn closed_book_shows_cover() {
        let mut layer = TerminalLayer::new("Folio Demo", 41, 12, TWEEN);
        let frame = layer.compose(Instant::now());
        let text = screen(&frame);
        assert!(text.contains("Folio Demo"));
        assert!(text.contains("closed"));
        assert!(!layer.wants_frame());
    }

    #[test]
    fn open_book_shows_fixed_pages() {
        let mut layer = TerminalLayer::new("Folio", 41, 12, TWEEN);
        layer.set_open(true);
        layer.apply_rotation(TurnTarget::Cover, FLIPPED_ANGLE, false);
        layer.place(Slot::FixedLeft, Some(plate(2, "Verso", FaceSide::Left)));
        layer.place(Slot::FixedRight, Some(plate(3, "Recto", FaceSide::Right)));
        let frame = layer.compose(Instant::now());
        let text = screen(&frame);
        assert!(text.contains("pages 2-3"));
        assert!(frame.row_text(1).contains("Verso"));
        assert!(frame.row_text(1).contains("Recto"));
    }

    #[test]
    fn band_narrows_towards_ninety_degrees() {
        let layer = TerminalLayer::new("Folio", 41, 12, TWEEN);
        assert_eq!(layer.band(0.0), (21, 20));
        let (x, w) = layer.band(-60.0);
        assert_eq!((x, w), (21, 10));
        let (x, w) = layer.band(-120.0);
        assert_eq!((x, w), (10, 10), "past the spine the band hangs left");
        assert_eq!(layer.band(-90.0).1, 0);
    }

    #[test]
    fn animated_rotation_tweens_then_rests() {
        let mut layer = TerminalLayer::new("Folio", 41, 12, TWEEN);
        layer.apply_rotation(TurnTarget::Leaf(0), FLIPPED_ANGLE, true);
        let t0 = Instant::now();
        layer.compose(t0);
        assert_eq!(layer.shown_angle(TurnTarget::Leaf(0)), Some(REST_ANGLE));
        assert!(layer.wants_frame());
        layer.compose(t0 + TWEEN / 2);
        let mid = layer.shown_angle(TurnTarget::Leaf(0)).unwrap_or_default();
        assert!(mid < REST_ANGLE && mid > FLIPPED_ANGLE, "mid tween angle {mid}");
        layer.compose(t0 + TWEEN);
        assert_eq!(layer.shown_angle(TurnTarget::Leaf(0)), Some(FLIPPED_ANGLE));
        assert!(!layer.wants_frame());
    }

    #[test]
    fn snapped_rotation_applies_immediately() {
        let mut layer = TerminalLayer::new("Folio", 41, 12, TWEEN);
        layer.apply_rotation(TurnTarget::Leaf(2), -45.0, false);
        assert_eq!(layer.shown_angle(TurnTarget::Leaf(2)), Some(-45.0));
        assert_eq!(layer.depth(2), Some(0));
    }

    #[test]
    fn dragged_leaf_reveals_page_beneath() {
        let mut layer = TerminalLayer::new("Folio", 41, 12, TWEEN);
        layer.set_open(true);
        layer.apply_rotation(TurnTarget::Cover, FLIPPED_ANGLE, false);
        for (i, depth) in [(0usize, 4u32), (1, 3)] {
            let n = i as u32 * 2;
            layer.place(Slot::LeafFront(i), Some(plate(n + 1, &format!("Front{i}"), FaceSide::Right)));
            layer.place(Slot::LeafBack(i), Some(plate(n + 2, &format!("Back{i}"), FaceSide::Left)));
            layer.apply_depth(i, depth);
        }
        layer.place(Slot::FixedRight, Some(plate(1, "Front0", FaceSide::Right)));
        layer.set_turning(TurnTarget::Leaf(0), true);
        layer.apply_rotation(TurnTarget::Leaf(0), -75.0, false);
        let frame = layer.compose(Instant::now());
        // Footer of the last book row belongs to the page underneath (3), not
        // to the fixed page being turned (1).
        let footer = frame.row_text(10);
        assert!(footer.trim_end().ends_with('3'), "page under the dragged leaf: {footer:?}");
        assert_eq!(frame.flags_at(21 + layer.band(-75.0).1 - 1, 1), Some(CellFlags::REVERSE));
    }

    #[test]
    fn side_of_splits_at_spine() {
        let layer = TerminalLayer::new("Folio", 41, 12, TWEEN);
        assert_eq!(layer.side_of(3), Side::Prev);
        assert_eq!(layer.side_of(20), Side::Prev);
        assert_eq!(layer.side_of(21), Side::Next);
    }

    #[test]
    fn tiny_terminal_composes_blank() {
        let mut layer = TerminalLayer::new("Folio", 2, 1, TWEEN);
        let frame = layer.compose(Instant::now());
        assert_eq!(frame.cells.len(), 2);
    }
}
