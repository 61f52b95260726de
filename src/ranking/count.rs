use std::collections::BTreeMap;

use crate::alignment::GroupAlignment;
use crate::genomics::Position;

/// Positions bucketed by how many strains differ from the reference there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnpRanking {
    /// strain count → contig → positions (ascending).
    pub buckets: BTreeMap<usize, BTreeMap<String, Vec<Position>>>,
    /// Number of ranked positions.
    pub total: usize,
}

impl SnpRanking {
    /// Buckets from the most to the least shared.
    pub fn descending(&self) -> impl Iterator<Item = (usize, &BTreeMap<String, Vec<Position>>)> {
        self.buckets.iter().rev().map(|(count, chroms)| (*count, chroms))
    }

    /// Rank of a position, if it was ranked.
    pub fn count_of(&self, chrom: &str, position: Position) -> Option<usize> {
        self.buckets.iter().find_map(|(count, chroms)| {
            chroms
                .get(chrom)
                .filter(|positions| positions.binary_search(&position).is_ok())
                .map(|_| *count)
        })
    }
}

/// Count, per column, the strains whose base differs from the reference row.
///
/// Columns without a reference base, and strains without a cell, are not
/// counted. Columns no strain differs at are left out.
pub fn count_differing(alignment: &GroupAlignment) -> BTreeMap<String, BTreeMap<Position, usize>> {
    let mut counts: BTreeMap<String, BTreeMap<Position, usize>> = BTreeMap::new();
    for row in alignment.strains.values() {
        for (chrom, bases) in row {
            for (&pos, &base) in bases {
                let Some(reference) = alignment.reference_base(chrom, pos) else {
                    continue;
                };
                if base != reference {
                    *counts
                        .entry(chrom.clone())
                        .or_default()
                        .entry(pos)
                        .or_default() += 1;
                }
            }
        }
    }
    counts
}

/// Bucket a group's columns by the number of strains carrying a SNP there.
pub fn rank_snps(alignment: &GroupAlignment) -> SnpRanking {
    let mut ranking = SnpRanking::default();
    for (chrom, positions) in count_differing(alignment) {
        for (pos, count) in positions {
            ranking
                .buckets
                .entry(count)
                .or_default()
                .entry(chrom.clone())
                .or_default()
                .push(pos);
            ranking.total += 1;
        }
    }
    ranking
}
