//! Leaf: one physical sheet pairing an odd page (front) with an even page (back).
//!
//! Depth model:
//! * Unflipped leaves sit at `resting_depth = 2 * total - index`, so index 0 is
//!   on top of the unread pile.
//! * Flipped leaves sit at `1 + index`, beneath every unflipped leaf, with the
//!   most recently turned leaf on top of the turned pile.
//! * Flipped depths span `1..=total` and resting depths span `total+1..=2*total`;
//!   the two ranges never overlap.

/// Which half of the spread a face prints on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceSide {
    Left,
    Right,
}

/// Borrowed view of one printable face. `content` is `None` for the empty back
/// of a trailing odd page; the renderer still prints the page number.
#[derive(Debug)]
pub struct Face<'a, C> {
    pub content: Option<&'a C>,
    pub number: u32,
    pub side: FaceSide,
}

impl<C> Clone for Face<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Face<'_, C> {}

impl<C> PartialEq for Face<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        let same_content = match (self.content, other.content) {
            (Some(a), Some(b)) => std::ptr::eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_content && self.number == other.number && self.side == other.side
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf<C> {
    index: usize,
    front: C,
    back: Option<C>,
    front_number: u32,
    back_number: u32,
    flipped: bool,
    resting_depth: u32,
}

impl<C> Leaf<C> {
    pub(crate) fn new(index: usize, total: usize, front: C, back: Option<C>) -> Self {
        let ordinal = index as u32;
        Self {
            index,
            front,
            back,
            front_number: ordinal * 2 + 1,
            back_number: ordinal * 2 + 2,
            flipped: false,
            resting_depth: (2 * total - index) as u32,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn front(&self) -> &C {
        &self.front
    }

    pub fn back(&self) -> Option<&C> {
        self.back.as_ref()
    }

    pub fn front_number(&self) -> u32 {
        self.front_number
    }

    pub fn back_number(&self) -> u32 {
        self.back_number
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn resting_depth(&self) -> u32 {
        self.resting_depth
    }

    pub fn flipped_depth(&self) -> u32 {
        self.index as u32 + 1
    }

    /// Stacking depth for the leaf's current flip state. Higher draws on top.
    pub fn depth(&self) -> u32 {
        if self.flipped {
            self.flipped_depth()
        } else {
            self.resting_depth
        }
    }

    /// Odd page, printed on the right half.
    pub fn front_face(&self) -> Face<'_, C> {
        Face {
            content: Some(&self.front),
            number: self.front_number,
            side: FaceSide::Right,
        }
    }

    /// Even page, printed on the left half once the leaf is turned.
    pub fn back_face(&self) -> Face<'_, C> {
        Face {
            content: self.back.as_ref(),
            number: self.back_number,
            side: FaceSide::Left,
        }
    }

    pub(crate) fn set_flipped(&mut self, flipped: bool) {
        self.flipped = flipped;
    }
}
