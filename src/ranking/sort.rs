use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::count::SnpRanking;
use crate::alignment::GroupAlignment;
use crate::genomics::Position;

/// Errors raised while ordering SNP columns.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortError {
    /// No strain order is available for the group.
    #[error("no tree order available for {species}/{group}")]
    UndefinedTreeOrder {
        /// Species code.
        species: String,
        /// Group label.
        group: String,
    },
}

/// Final column order of one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedSnps {
    /// `(strain count, contig → ascending positions)`, most shared first.
    pub buckets: Vec<(usize, BTreeMap<String, Vec<Position>>)>,
}

impl SortedSnps {
    /// Columns in report order: buckets, then contigs, then positions.
    pub fn columns(&self) -> Vec<(String, Position)> {
        self.buckets
            .iter()
            .flat_map(|(_, chroms)| {
                chroms
                    .iter()
                    .flat_map(|(chrom, positions)| positions.iter().map(move |pos| (chrom.clone(), *pos)))
            })
            .collect()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.buckets
            .iter()
            .flat_map(|(_, chroms)| chroms.values())
            .map(Vec::len)
            .sum()
    }

    /// True when no column survived.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Order ranked columns by strain count, then by tree discovery.
///
/// Buckets are walked from the highest count down. Inside a bucket, strains
/// are visited in `tree_order` (the reference row skipped), and a position is
/// collected the first time a visited strain differs from the reference
/// there. Each bucket holds its positions ascending per contig.
pub fn sort_snps(
    alignment: &GroupAlignment,
    ranking: &SnpRanking,
    tree_order: &[String],
) -> Result<SortedSnps, SortError> {
    if tree_order.is_empty() {
        return Err(SortError::UndefinedTreeOrder {
            species: alignment.species.clone(),
            group: alignment.group.clone(),
        });
    }

    let mut sorted = SortedSnps::default();
    for (count, chroms) in ranking.descending() {
        let mut seen: BTreeMap<&str, BTreeSet<Position>> = BTreeMap::new();
        for strain in tree_order
            .iter()
            .filter(|strain| **strain != alignment.reference_id)
        {
            for (chrom, positions) in chroms {
                let found = seen.entry(chrom.as_str()).or_default();
                for &pos in positions {
                    let (Some(base), Some(reference)) = (
                        alignment.strain_base(strain, chrom, pos),
                        alignment.reference_base(chrom, pos),
                    ) else {
                        continue;
                    };
                    if base != reference {
                        found.insert(pos);
                    }
                }
            }
        }
        let bucket: BTreeMap<String, Vec<Position>> = seen
            .into_iter()
            .map(|(chrom, positions)| (chrom.to_string(), positions.into_iter().collect()))
            .collect();
        sorted.buckets.push((count, bucket));
    }
    Ok(sorted)
}

/// Strains of `tree_order` missing from the alignment, and members the tree omits.
pub fn tree_mismatches(alignment: &GroupAlignment, tree_order: &[String]) -> (Vec<String>, Vec<String>) {
    let in_tree: BTreeSet<&str> = tree_order.iter().map(String::as_str).collect();
    let unknown = tree_order
        .iter()
        .filter(|name| **name != alignment.reference_id && !alignment.strains.contains_key(*name))
        .cloned()
        .collect();
    let missing = alignment
        .strains
        .keys()
        .filter(|name| !in_tree.contains(name.as_str()))
        .cloned()
        .collect();
    (unknown, missing)
}
