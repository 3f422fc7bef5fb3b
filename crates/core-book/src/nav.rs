//! Navigation state machine.
//!
//! States: `Closed` (`is_open = false`, `current = 0`) and `Open`
//! (`current` in `0..=len`). "Retreat past the cover" and "cover closed" are the
//! same observable state, so any path that brings an open book back to
//! `current == 0` through `retreat` ends in `close()`.
//!
//! Guard failures are silent: the book is left untouched and the call returns
//! [`Transition::Rejected`].

use crate::Book;
use tracing::trace;

/// Description of what a transition changed, consumed by the render sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Guard rejected the request; nothing changed.
    Rejected,
    /// Cover opened; `current` unchanged.
    Opened,
    /// `leaf` turned past the spine; `current` now equals `leaf + 1`.
    Flipped { leaf: usize },
    /// `leaf` returned to the unread pile. `closed` is set when that brought
    /// `current` to 0 and the book closed as a consequence.
    Unflipped { leaf: usize, closed: bool },
    /// Every leaf unflipped, cover closed.
    Closed,
}

impl Transition {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Transition::Rejected)
    }

    /// True when the transition left the book closed.
    pub fn closes(&self) -> bool {
        matches!(
            self,
            Transition::Closed | Transition::Unflipped { closed: true, .. }
        )
    }
}

impl<C> Book<C> {
    pub fn can_advance(&self) -> bool {
        if self.is_open {
            self.current < self.leaves.len()
        } else {
            true
        }
    }

    pub fn can_retreat(&self) -> bool {
        self.is_open && self.current > 0
    }

    /// Open the cover. No-op (rejected) when already open.
    pub fn open_cover(&mut self) -> Transition {
        if self.is_open {
            trace!(target: "book.nav", "open_cover_ignored_already_open");
            return Transition::Rejected;
        }
        self.is_open = true;
        trace!(target: "book.nav", "cover_opened");
        Transition::Opened
    }

    /// Next page: opens the cover when closed, otherwise turns `leaves[current]`.
    pub fn advance(&mut self) -> Transition {
        if !self.can_advance() {
            trace!(target: "book.nav", current = self.current, "advance_rejected");
            return Transition::Rejected;
        }
        if !self.is_open {
            return self.open_cover();
        }
        self.flip_current()
    }

    /// Previous page. Open at `current == 0` closes; closed is a no-op.
    pub fn retreat(&mut self) -> Transition {
        if !self.can_retreat() {
            if self.is_open && self.current == 0 {
                return self.close();
            }
            trace!(target: "book.nav", "retreat_rejected");
            return Transition::Rejected;
        }
        self.unflip_previous()
    }

    /// Close from any state: unflip every leaf, restore resting depths.
    pub fn close(&mut self) -> Transition {
        for leaf in &mut self.leaves {
            leaf.set_flipped(false);
        }
        self.current = 0;
        self.is_open = false;
        trace!(target: "book.nav", "book_closed");
        Transition::Closed
    }

    /// Flip half of `advance`: turn `leaves[current]` and bump `current`.
    /// Requires an open book with an unturned leaf remaining.
    pub fn flip_current(&mut self) -> Transition {
        if !self.is_open {
            return Transition::Rejected;
        }
        let index = self.current;
        let Some(leaf) = self.leaves.get_mut(index) else {
            return Transition::Rejected;
        };
        leaf.set_flipped(true);
        self.current += 1;
        trace!(target: "book.nav", leaf = index, current = self.current, "leaf_flipped");
        Transition::Flipped { leaf: index }
    }

    /// Unflip half of `retreat`: return `leaves[current-1]` to the unread pile,
    /// then close if that reached the cover.
    pub fn unflip_previous(&mut self) -> Transition {
        if !self.can_retreat() {
            return Transition::Rejected;
        }
        let index = self.current - 1;
        self.leaves[index].set_flipped(false);
        self.current = index;
        trace!(target: "book.nav", leaf = index, current = self.current, "leaf_unflipped");
        let closed = self.current == 0;
        if closed {
            self.close();
        }
        Transition::Unflipped { leaf: index, closed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BookState;

    fn open_book(pages: usize) -> Book<usize> {
        let mut book = Book::from_pages(1..=pages);
        assert_eq!(book.advance(), Transition::Opened);
        book
    }

    #[test]
    fn advance_from_closed_opens_without_flipping() {
        let mut book = Book::from_pages(1..=4);
        assert_eq!(book.advance(), Transition::Opened);
        assert_eq!(book.state(), BookState::Open { current: 0 });
        assert!(book.leaves().iter().all(|l| !l.is_flipped()));
    }

    #[test]
    fn advance_flips_then_rejects_at_end() {
        let mut book = open_book(4);
        assert_eq!(book.advance(), Transition::Flipped { leaf: 0 });
        assert_eq!(book.advance(), Transition::Flipped { leaf: 1 });
        assert_eq!(book.current(), 2);
        assert_eq!(book.advance(), Transition::Rejected);
        assert_eq!(book.current(), 2);
        assert!(book.is_open(), "end of book stays open");
        assert!(book.flip_invariant_holds());
    }

    #[test]
    fn retreat_when_closed_is_noop() {
        let mut book = Book::from_pages(1..=4);
        assert_eq!(book.retreat(), Transition::Rejected);
        assert_eq!(book.state(), BookState::Closed);
    }

    #[test]
    fn retreat_to_first_leaf_closes() {
        let mut book = open_book(4);
        book.advance();
        assert_eq!(book.current(), 1);
        let t = book.retreat();
        assert_eq!(t, Transition::Unflipped { leaf: 0, closed: true });
        assert!(t.closes());
        assert_eq!(book.state(), BookState::Closed);
    }

    #[test]
    fn retreat_when_open_at_zero_closes() {
        let mut book = open_book(4);
        assert_eq!(book.retreat(), Transition::Closed);
        assert_eq!(book.state(), BookState::Closed);
    }

    #[test]
    fn retreat_mid_book_stays_open() {
        let mut book = open_book(6);
        book.advance();
        book.advance();
        assert_eq!(
            book.retreat(),
            Transition::Unflipped {
                leaf: 1,
                closed: false
            }
        );
        assert_eq!(book.state(), BookState::Open { current: 1 });
        assert!(book.flip_invariant_holds());
    }

    #[test]
    fn close_is_idempotent() {
        let mut book = open_book(6);
        book.advance();
        book.advance();
        book.close();
        let once = (book.state(), book.current());
        book.close();
        assert_eq!((book.state(), book.current()), once);
        assert_eq!(once, (BookState::Closed, 0));
        assert!(book.leaves().iter().all(|l| !l.is_flipped()));
        assert!(
            book.leaves()
                .iter()
                .all(|l| l.depth() == l.resting_depth())
        );
    }

    #[test]
    fn open_cover_twice_rejects_second() {
        let mut book = Book::from_pages(1..=2);
        assert_eq!(book.open_cover(), Transition::Opened);
        assert_eq!(book.open_cover(), Transition::Rejected);
    }

    #[test]
    fn flip_halves_respect_guards() {
        let mut book = Book::from_pages(1..=2);
        assert_eq!(book.flip_current(), Transition::Rejected, "closed book");
        assert_eq!(book.unflip_previous(), Transition::Rejected);
        book.open_cover();
        assert_eq!(book.flip_current(), Transition::Flipped { leaf: 0 });
        assert_eq!(book.flip_current(), Transition::Rejected, "no leaf left");
    }

    #[test]
    fn depth_after_first_flip_is_lowest() {
        let mut book = open_book(6);
        book.advance();
        assert_eq!(book.depth_of(0), Some(1));
        let min = (0..book.len()).filter_map(|i| book.depth_of(i)).min();
        assert_eq!(min, Some(1));
    }

    #[test]
    fn empty_book_opens_but_cannot_turn() {
        let mut book: Book<u8> = Book::from_pages(Vec::new());
        assert_eq!(book.advance(), Transition::Opened);
        assert!(!book.can_advance());
        assert_eq!(book.advance(), Transition::Rejected);
        assert_eq!(book.retreat(), Transition::Closed);
    }
}
