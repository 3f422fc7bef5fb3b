//! Render sync + terminal presentation for the book.
//!
//! The navigation and gesture crates never draw. Every state change they
//! report (a [`core_book::Transition`], a gesture start/track/release) is
//! pushed through [`sync::RenderSync`] into a [`RenderLayer`], the narrow
//! seam between the page-turn engine and whatever materialises pages.
//!
//! Components:
//! - `Cell` / `Frame`: logical character grid. Leader cells carry a full
//!   grapheme cluster and its width; continuation cells (width 0) fill the
//!   remaining columns of a wide cluster and never print text.
//! - `sync`: applies transitions and gesture updates to a layer, owns the
//!   settle timers and the resize debounce.
//! - `reader`: input surface tying `Book`, `GestureController` and
//!   `RenderSync` together.
//! - `terminal` / `face`: the crossterm-backed layer projecting leaves into a
//!   `Frame`.
//! - `writer`: command list flushed to the terminal.
//! - `timers`: cancellable deadlines polled on tick.

use bitflags::bitflags;
use core_book::{Face, TurnTarget};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

pub mod face;
pub mod reader;
pub mod sync;
pub mod terminal;
pub mod timers;
pub mod writer;

pub use reader::Reader;
pub use sync::RenderSync;
pub use terminal::TerminalLayer;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CellFlags: u8 {
        const REVERSE = 0b0000_0001;
        const BOLD    = 0b0000_0010;
        const DIM     = 0b0000_0100;
    }
}

/// Where a rendered face is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Verso visible to the left of the spine.
    FixedLeft,
    /// Recto visible to the right of the spine.
    FixedRight,
    LeafFront(usize),
    LeafBack(usize),
}

/// Everything the page-turn engine asks of a presentation backend.
///
/// Implementations only record presentation state; they never decide
/// navigation. Angles are in degrees, `0` lying on the right and `-180`
/// turned onto the left. Higher depth stacks on top.
pub trait RenderLayer {
    type Content;
    type Renderable;

    fn render_face(&mut self, face: Face<'_, Self::Content>) -> Self::Renderable;
    /// `None` empties the slot.
    fn place(&mut self, slot: Slot, renderable: Option<Self::Renderable>);
    /// `animated == false` snaps (pointer tracking); `true` eases to `degrees`.
    fn apply_rotation(&mut self, target: TurnTarget, degrees: f32, animated: bool);
    fn apply_depth(&mut self, leaf: usize, depth: u32);
    fn set_turning(&mut self, target: TurnTarget, on: bool);
    fn set_open(&mut self, open: bool);
}

/// Display width of a single grapheme cluster, never less than one column.
#[inline]
pub fn cluster_width(cluster: &str) -> u16 {
    UnicodeWidthStr::width(cluster).max(1) as u16
}

/// Display width of a string measured cluster by cluster.
pub fn text_width(text: &str) -> u16 {
    text.graphemes(true)
        .map(cluster_width)
        .fold(0u16, u16::saturating_add)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Full grapheme cluster string (leader cells only). Empty for continuation cells.
    pub cluster: String,
    /// Visual width in terminal columns. `0` designates a continuation cell.
    pub width: u8,
    pub flags: CellFlags,
}

impl Cell {
    #[inline]
    pub fn leader(cluster: &str, width: u16, flags: CellFlags) -> Self {
        Self {
            cluster: cluster.to_string(),
            width: width.max(1) as u8,
            flags,
        }
    }
    #[inline]
    pub fn continuation(flags: CellFlags) -> Self {
        Self {
            cluster: String::new(),
            width: 0,
            flags,
        }
    }
    #[inline]
    pub fn is_leader(&self) -> bool {
        self.width > 0
    }
    #[inline]
    pub fn visual_width(&self) -> u16 {
        self.width as u16
    }
}

impl Default for Cell {
    fn default() -> Self {
        // Blank areas are single space leaders.
        Cell {
            cluster: " ".to_string(),
            width: 1,
            flags: CellFlags::empty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<Cell>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width as usize) * (height as usize)],
        }
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Set a full cluster at (x,y) and populate continuation cells for its width.
    pub fn set_cluster(&mut self, x: u16, y: u16, cluster: &str, width: u16, flags: CellFlags) {
        if x >= self.width || y >= self.height {
            return;
        }
        let w = width.max(1).min(self.width - x);
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = Cell::leader(cluster, w, flags);
        }
        for dx in 1..w {
            if let Some(c_idx) = self.index(x + dx, y) {
                self.cells[c_idx] = Cell::continuation(flags);
            }
        }
    }

    /// Write `text` from (x,y) without exceeding `max_width` columns. A wide
    /// cluster that would straddle the limit is dropped. Returns columns used.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, max_width: u16, flags: CellFlags) -> u16 {
        let mut used = 0u16;
        for g in text.graphemes(true) {
            let w = cluster_width(g);
            if used + w > max_width {
                break;
            }
            self.set_cluster(x + used, y, g, w, flags);
            used += w;
        }
        used
    }

    /// Blank a rectangle, clipped to the frame.
    pub fn clear_rect(&mut self, x: u16, y: u16, w: u16, h: u16, flags: CellFlags) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for row in y..y_end {
            for col in x..x_end {
                if let Some(idx) = self.index(col, row) {
                    self.cells[idx] = Cell::leader(" ", 1, flags);
                }
            }
        }
    }

    /// Iterate leader cells of a row, yielding (&str, width, flags, start_x).
    pub fn row_leaders<'a>(
        &'a self,
        y: u16,
    ) -> impl Iterator<Item = (&'a str, u16, CellFlags, u16)> + 'a {
        let width = if y < self.height { self.width } else { 0 };
        let start = y as usize * self.width as usize;
        let mut x = 0u16;
        std::iter::from_fn(move || {
            while x < width {
                let cell = &self.cells[start + x as usize];
                if cell.is_leader() {
                    let w = cell.visual_width();
                    let out = (&*cell.cluster, w, cell.flags, x);
                    x = x.saturating_add(w);
                    return Some(out);
                } else {
                    x += 1;
                }
            }
            None
        })
    }

    /// Row contents as a plain string (testing / diagnostics only).
    pub fn row_text(&self, y: u16) -> String {
        self.row_leaders(y).map(|(c, _, _, _)| c).collect()
    }

    pub fn flags_at(&self, x: u16, y: u16) -> Option<CellFlags> {
        self.index(x, y).map(|i| self.cells[i].flags)
    }
}
