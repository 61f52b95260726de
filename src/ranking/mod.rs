//! SNP column ranking and phylogenetic ordering.

mod count;
mod sort;

pub use count::{count_differing, rank_snps, SnpRanking};
pub use sort::{sort_snps, tree_mismatches, SortError, SortedSnps};
