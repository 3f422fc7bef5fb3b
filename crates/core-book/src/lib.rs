//! Book model: the ordered leaf stack plus the open/current cursors.
//!
//! `Book` exclusively owns its leaves. The flip flag of every leaf is a pure
//! function of `current` (`leaf.flipped == leaf.index < current`); the
//! navigation transitions in [`nav`] are the only code paths that move
//! `current`, and each of them restores that relation before returning.
//!
//! Content is generic and opaque (`C`): the model pairs, numbers and stacks
//! pages but never inspects them. Rendering a face is the job of whatever
//! layer consumes [`VisibleFaces`] / [`Face`].

pub mod leaf;
pub mod nav;

pub use leaf::{Face, FaceSide, Leaf};
pub use nav::Transition;

/// Something a rotation or turning flag can be applied to: the cover (only
/// while the book is closed) or one leaf addressed by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnTarget {
    Cover,
    Leaf(usize),
}

/// Externally observable book state (two UI states).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookState {
    Closed,
    Open { current: usize },
}

/// Faces occupying the two fixed slots beside the spine.
#[derive(Debug)]
pub struct VisibleFaces<'a, C> {
    pub right: Option<Face<'a, C>>,
    pub left: Option<Face<'a, C>>,
}

impl<C> Clone for VisibleFaces<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for VisibleFaces<'_, C> {}

#[derive(Debug, Clone)]
pub struct Book<C> {
    leaves: Vec<Leaf<C>>,
    is_open: bool,
    current: usize,
}

impl<C> Book<C> {
    /// Pair a flat page sequence into leaves: `(1,2)`, `(3,4)`, ... A trailing odd
    /// page gets an empty back face.
    pub fn from_pages<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        let pages: Vec<C> = pages.into_iter().collect();
        let total = pages.len().div_ceil(2);
        let mut leaves = Vec::with_capacity(total);
        let mut iter = pages.into_iter();
        while let Some(front) = iter.next() {
            let back = iter.next();
            leaves.push(Leaf::new(leaves.len(), total, front, back));
        }
        tracing::debug!(target: "book", leaves = leaves.len(), "book_constructed");
        Self {
            leaves,
            is_open: false,
            current: 0,
        }
    }

    pub fn leaves(&self) -> &[Leaf<C>] {
        &self.leaves
    }

    pub fn leaf(&self, index: usize) -> Option<&Leaf<C>> {
        self.leaves.get(index)
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Number of leaves already turned past the spine.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn state(&self) -> BookState {
        if self.is_open {
            BookState::Open {
                current: self.current,
            }
        } else {
            BookState::Closed
        }
    }

    /// Stacking depth of leaf `index`, or `None` when out of range.
    pub fn depth_of(&self, index: usize) -> Option<u32> {
        self.leaves.get(index).map(Leaf::depth)
    }

    /// Faces for the fixed slots when `current` leaves have been turned. Total
    /// over `0..=len`; out-of-range positions simply yield empty slots.
    pub fn content_at(&self, current: usize) -> VisibleFaces<'_, C> {
        let right = self.leaves.get(current).map(Leaf::front_face);
        let left = current
            .checked_sub(1)
            .and_then(|i| self.leaves.get(i))
            .map(Leaf::back_face);
        VisibleFaces { right, left }
    }

    /// Re-sync query used after environmental events (resize). Never mutates.
    pub fn current_visible_faces(&self) -> VisibleFaces<'_, C> {
        self.content_at(self.current)
    }

    /// True when every leaf's flip flag matches its position relative to
    /// `current` and `current` is within range.
    pub fn flip_invariant_holds(&self) -> bool {
        self.current <= self.leaves.len()
            && (self.is_open || self.current == 0)
            && self
                .leaves
                .iter()
                .all(|leaf| leaf.is_flipped() == (leaf.index() < self.current))
    }
}
