//! Coverage properties of the position sequences over arbitrary boxes.
//!
//! Run with: `cargo test -p placebot-canvas --test sequence_properties`

use std::collections::HashSet;

use placebot_canvas::fill::{PositionSequence, RandomFill, RowFill, SpiralFill};
use proptest::prelude::*;

fn drain(seq: &mut dyn PositionSequence) -> Vec<(usize, usize)> {
    std::iter::from_fn(|| seq.next()).collect()
}

fn assert_exact_cover(cells: &[(usize, usize)], width: usize, height: usize) {
    let unique: HashSet<_> = cells.iter().copied().collect();
    assert_eq!(cells.len(), width * height);
    assert_eq!(unique.len(), width * height);
    assert!(cells.iter().all(|&(x, y)| x < width && y < height));
}

proptest! {
    #[test]
    fn test_row_scan_covers_box_once(width in 0usize..40, height in 0usize..40, inverted: bool) {
        let mut fill = RowFill::new(inverted);
        fill.reset(width, height);
        let cells = drain(&mut fill);
        assert_exact_cover(&cells, width, height);
        prop_assert_eq!(fill.next(), None);
    }

    #[test]
    fn test_random_is_a_permutation(width in 1usize..40, height in 1usize..40) {
        let mut fill = RandomFill::new();
        fill.reset(width, height);
        let cells = drain(&mut fill);
        assert_exact_cover(&cells, width, height);
        prop_assert_eq!(fill.next(), None);
    }

    #[test]
    fn test_spiral_stays_in_bounds_and_ends(width in 1usize..40, height in 1usize..40) {
        let mut fill = SpiralFill::new();
        fill.reset(width, height);
        let cells = drain(&mut fill);
        assert_exact_cover(&cells, width, height);
        prop_assert_eq!(fill.next(), None);
    }
}

#[test]
fn test_random_full_board_permutation() {
    let mut fill = RandomFill::new();
    fill.reset(250, 160);
    let cells = drain(&mut fill);
    assert_exact_cover(&cells, 250, 160);
}

#[test]
fn test_sequences_resume_between_calls() {
    let mut a = SpiralFill::new();
    let mut b = SpiralFill::new();
    a.reset(6, 5);
    b.reset(6, 5);

    // Interleave pulls from two generators; each keeps its own place.
    let mut from_a = Vec::new();
    let mut from_b = Vec::new();
    loop {
        let next_a = a.next();
        let next_b = b.next();
        if next_a.is_none() && next_b.is_none() {
            break;
        }
        from_a.extend(next_a);
        from_b.extend(next_b);
    }
    assert_eq!(from_a, from_b);
    assert_exact_cover(&from_a, 6, 5);
}
