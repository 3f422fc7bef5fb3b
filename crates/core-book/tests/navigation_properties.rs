//! Property tests: the flip invariant holds across arbitrary navigation
//! sequences, and the documented boundary behaviours.

use core_book::{Book, BookState, Transition};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Advance,
    Retreat,
    OpenCover,
    Close,
    FlipCurrent,
    UnflipPrevious,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Advance),
        3 => Just(Op::Retreat),
        1 => Just(Op::OpenCover),
        1 => Just(Op::Close),
        1 => Just(Op::FlipCurrent),
        1 => Just(Op::UnflipPrevious),
    ]
}

fn apply(book: &mut Book<usize>, op: Op) -> Transition {
    match op {
        Op::Advance => book.advance(),
        Op::Retreat => book.retreat(),
        Op::OpenCover => book.open_cover(),
        Op::Close => book.close(),
        Op::FlipCurrent => book.flip_current(),
        Op::UnflipPrevious => book.unflip_previous(),
    }
}

proptest! {
    #[test]
    fn flip_invariant_holds_for_all_reachable_states(
        pages in 0usize..24,
        ops in prop::collection::vec(op_strategy(), 0..64),
    ) {
        let mut book = Book::from_pages(0..pages);
        prop_assert!(book.flip_invariant_holds());
        for op in ops {
            let before = book.state();
            let t = apply(&mut book, op);
            prop_assert!(book.flip_invariant_holds(), "after {:?} from {:?}", op, before);
            if t.is_rejected() {
                prop_assert_eq!(book.state(), before, "rejection must not change state");
            }
            for leaf in book.leaves() {
                let expected = if leaf.is_flipped() {
                    leaf.index() as u32 + 1
                } else {
                    leaf.resting_depth()
                };
                prop_assert_eq!(leaf.depth(), expected);
            }
        }
    }

    #[test]
    fn flipped_depths_stay_below_resting_depths(pages in 1usize..40, turns in 0usize..20) {
        let mut book = Book::from_pages(0..pages);
        book.advance();
        for _ in 0..turns {
            book.advance();
        }
        let max_flipped = book.leaves().iter().filter(|l| l.is_flipped()).map(|l| l.depth()).max();
        let min_resting = book.leaves().iter().filter(|l| !l.is_flipped()).map(|l| l.depth()).min();
        if let (Some(f), Some(r)) = (max_flipped, min_resting) {
            prop_assert!(f < r);
        }
    }
}

#[test]
fn round_trip_returns_to_closed() {
    for pages in [1usize, 2, 5, 6, 11] {
        let mut book = Book::from_pages(0..pages);
        let k = book.len();
        for _ in 0..=k {
            book.advance();
        }
        assert_eq!(book.state(), BookState::Open { current: k });
        for _ in 0..=k {
            book.retreat();
        }
        assert_eq!(book.state(), BookState::Closed);
        assert!(book.leaves().iter().all(|l| !l.is_flipped()));
    }
}

#[test]
fn retreat_from_first_leaf_yields_closed_not_open_zero() {
    let mut book = Book::from_pages(0..6);
    book.advance();
    book.advance();
    assert_eq!(book.state(), BookState::Open { current: 1 });
    book.retreat();
    assert_eq!(book.state(), BookState::Closed);
}
