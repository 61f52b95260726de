use std::collections::BTreeSet;

use crate::genomics::Position;
use crate::groups::{ChromPositions, GroupPositionSet};

/// Default window width in bases.
pub const DEFAULT_WINDOW_SIZE: u64 = 1000;
/// Default number of neighbours tolerated inside a window.
pub const DEFAULT_THRESHOLD: usize = 2;

/// Sliding-window SNP density filter.
///
/// A position `p` is dropped when more than `threshold` other positions of the
/// same contig fall in `[p - w/2, p + w/2)`, where `w/2` is the integer half of
/// the window size.
///
/// Counting uses binary search over the sorted positions, so a contig with `n`
/// positions costs `O(n log n)` instead of a full rescan per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFilter {
    window_size: u64,
    threshold: usize,
}

impl Default for WindowFilter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE, DEFAULT_THRESHOLD)
    }
}

impl WindowFilter {
    /// Filter with the given window width and neighbour threshold.
    pub fn new(window_size: u64, threshold: usize) -> Self {
        Self {
            window_size,
            threshold,
        }
    }

    /// Window width.
    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    /// Neighbour threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of other positions in `p`'s window. `sorted` must be ascending and
    /// duplicate-free.
    pub fn neighbours(&self, sorted: &[Position], p: Position) -> usize {
        let half = self.window_size / 2;
        let lower = p.saturating_sub(half);
        let upper = p.saturating_add(half);
        let start = sorted.partition_point(|&q| q < lower);
        let end = sorted.partition_point(|&q| q < upper);
        let in_window = end.saturating_sub(start);
        let self_counted = lower <= p && p < upper && sorted.binary_search(&p).is_ok();
        in_window - usize::from(self_counted)
    }

    /// Positions of one contig that survive the filter, ascending.
    pub fn retain_sorted(&self, sorted: &[Position]) -> Vec<Position> {
        sorted
            .iter()
            .copied()
            .filter(|&p| self.neighbours(sorted, p) <= self.threshold)
            .collect()
    }

    /// Positions of one contig that survive the filter.
    pub fn retain(&self, positions: &BTreeSet<Position>) -> BTreeSet<Position> {
        let sorted: Vec<Position> = positions.iter().copied().collect();
        self.retain_sorted(&sorted).into_iter().collect()
    }

    /// Filter every contig of one group independently.
    pub fn apply_group(&self, positions: &ChromPositions) -> ChromPositions {
        positions
            .iter()
            .map(|(chrom, set)| (chrom.clone(), self.retain(set)))
            .collect()
    }

    /// Filter every group of every species.
    pub fn apply(&self, set: &GroupPositionSet) -> GroupPositionSet {
        set.map_positions(|_, _, entry| self.apply_group(&entry.positions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_window_is_truncated() {
        let filter = WindowFilter::new(5, 0);
        // half = 2: window of 10 is [8, 12)
        assert_eq!(filter.neighbours(&[8, 10, 12], 10), 1);
    }

    #[test]
    fn zero_window_counts_nothing() {
        let filter = WindowFilter::new(0, 0);
        assert_eq!(filter.retain_sorted(&[1, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn positions_near_zero_do_not_underflow() {
        let filter = WindowFilter::new(1000, 1);
        assert_eq!(filter.neighbours(&[1, 2, 3], 1), 2);
        assert_eq!(filter.retain_sorted(&[1, 2, 3]), Vec::<Position>::new());
    }
}
