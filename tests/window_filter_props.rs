use std::collections::BTreeSet;

use proptest::prelude::*;
use snptree::filter::WindowFilter;
use test_case::test_case;

/// Quadratic scan: every position looks at the whole set.
fn naive_retain(positions: &BTreeSet<u64>, window_size: u64, threshold: usize) -> BTreeSet<u64> {
    let half = window_size / 2;
    positions
        .iter()
        .copied()
        .filter(|&p| {
            let lo = p.saturating_sub(half);
            let hi = p.saturating_add(half);
            let neighbours = positions
                .iter()
                .filter(|&&q| q != p && lo <= q && q < hi)
                .count();
            neighbours <= threshold
        })
        .collect()
}

proptest! {
    #[test]
    fn binary_search_matches_naive_scan(
        positions in proptest::collection::btree_set(0u64..20_000, 0..120),
        window_size in 1u64..4_000,
        threshold in 0usize..6,
    ) {
        let filter = WindowFilter::new(window_size, threshold);
        prop_assert_eq!(
            filter.retain(&positions),
            naive_retain(&positions, window_size, threshold)
        );
    }

    #[test]
    fn filtering_never_adds_positions(
        positions in proptest::collection::btree_set(0u64..5_000, 0..80),
    ) {
        let kept = WindowFilter::default().retain(&positions);
        prop_assert!(kept.is_subset(&positions));
    }
}

#[test_case(&[100, 200, 300, 5000], 200, true; "count equal to threshold is kept")]
#[test_case(&[100, 200, 300, 400], 200, false; "count above threshold is dropped")]
#[test_case(&[100, 200, 300, 400], 5000, false; "absent position stays absent")]
#[test_case(&[200, 300, 400, 700], 200, true; "upper bound is exclusive")]
#[test_case(&[200, 699, 701, 5000], 699, true; "isolated enough")]
fn default_window_boundaries(positions: &[u64], target: u64, kept: bool) {
    let set: BTreeSet<u64> = positions.iter().copied().collect();
    let retained = WindowFilter::default().retain(&set);
    assert_eq!(retained.contains(&target), kept);
}

#[test]
fn lower_bound_is_inclusive() {
    // Window around 600 is [100, 1100): 100 counts, so 600 has three neighbours.
    let set: BTreeSet<u64> = [100, 600, 700, 800].into_iter().collect();
    let retained = WindowFilter::default().retain(&set);
    assert!(!retained.contains(&600));

    let set: BTreeSet<u64> = [99, 600, 700, 800].into_iter().collect();
    let retained = WindowFilter::default().retain(&set);
    assert!(retained.contains(&600));
}
