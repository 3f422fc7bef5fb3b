//! Release decisions at a 400 column half width (threshold 100) and the flip
//! invariant across mixed gesture / keyboard sequences.

use core_book::{Book, Transition};
use core_gesture::{GestureController, GestureOutcome, GestureStart, GestureTuning, Side};
use proptest::prelude::*;

fn book_open_at(current: usize) -> Book<u32> {
    let mut book = Book::from_pages(1..=10);
    book.advance();
    for _ in 0..current {
        book.advance();
    }
    book
}

fn drag(book: &mut Book<u32>, side: Side, dx: f32) -> Option<GestureOutcome> {
    let mut g = GestureController::new(400.0, GestureTuning::default());
    let start = 500.0;
    match g.begin(book, side, start) {
        GestureStart::Started { .. } => {}
        _ => return None,
    }
    g.update(start + dx / 2.0);
    g.end(book, start + dx).map(|r| r.outcome)
}

#[test]
fn next_drag_of_150_commits() {
    let mut book = book_open_at(1);
    let outcome = drag(&mut book, Side::Next, -150.0);
    assert_eq!(
        outcome,
        Some(GestureOutcome::Committed(Transition::Flipped { leaf: 1 }))
    );
    assert_eq!(book.current(), 2);
}

#[test]
fn next_drag_of_50_reverts() {
    let mut book = book_open_at(1);
    assert_eq!(drag(&mut book, Side::Next, -50.0), Some(GestureOutcome::Reverted));
    assert_eq!(book.current(), 1);
}

#[test]
fn next_drag_in_wrong_direction_reverts() {
    let mut book = book_open_at(1);
    assert_eq!(drag(&mut book, Side::Next, 300.0), Some(GestureOutcome::Reverted));
    assert_eq!(book.current(), 1);
}

#[test]
fn prev_drag_of_120_commits() {
    let mut book = book_open_at(3);
    let outcome = drag(&mut book, Side::Prev, 120.0);
    assert_eq!(
        outcome,
        Some(GestureOutcome::Committed(Transition::Unflipped {
            leaf: 2,
            closed: false
        }))
    );
    assert_eq!(book.current(), 2);
}

#[test]
fn prev_drag_of_30_only_settles() {
    let mut book = book_open_at(3);
    assert_eq!(drag(&mut book, Side::Prev, 30.0), Some(GestureOutcome::Settled));
    assert_eq!(book.current(), 3);
    assert!(book.leaf(2).is_some_and(|l| l.is_flipped()));
}

#[test]
fn exactly_at_threshold_does_not_commit() {
    let mut book = book_open_at(1);
    assert_eq!(drag(&mut book, Side::Next, -100.0), Some(GestureOutcome::Reverted));
    let mut book = book_open_at(1);
    assert_eq!(drag(&mut book, Side::Prev, 100.0), Some(GestureOutcome::Settled));
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Drag(bool, f32),
    Key(bool),
    Close,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (any::<bool>(), -400.0f32..400.0).prop_map(|(next, dx)| Step::Drag(next, dx)),
        2 => any::<bool>().prop_map(Step::Key),
        1 => Just(Step::Close),
    ]
}

proptest! {
    #[test]
    fn invariant_survives_gestures(steps in prop::collection::vec(step_strategy(), 0..48)) {
        let mut book: Book<u32> = Book::from_pages(1..=7);
        let mut g = GestureController::new(400.0, GestureTuning::default());
        for step in steps {
            match step {
                Step::Drag(next, dx) => {
                    let side = if next { Side::Next } else { Side::Prev };
                    if let GestureStart::Started { .. } = g.begin(&mut book, side, 0.0) {
                        g.update(dx);
                        g.end(&mut book, dx);
                    }
                }
                Step::Key(true) => { book.advance(); }
                Step::Key(false) => { book.retreat(); }
                Step::Close => { book.close(); }
            }
            prop_assert!(book.flip_invariant_holds());
            prop_assert!(!g.is_active());
        }
    }
}
