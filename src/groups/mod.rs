//! Group classification.
//!
//! Strains are assigned to groups by the curated defining-SNP catalog, and the
//! SNP positions of all members of a group are unioned into that group's
//! position set (species → group → contig → positions).

mod catalog;
mod classify;

use std::collections::{BTreeMap, BTreeSet};

pub use catalog::{DefiningSnp, DefiningSnpCatalog, DEFINING_SNPS_FILE};
pub use classify::{determine_groups, groups_for_strain, ALL_GROUP};

use crate::genomics::Position;
use crate::positions::StrainSnps;

/// contig → positions.
pub type ChromPositions = BTreeMap<String, BTreeSet<Position>>;

/// Members and candidate positions of one group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupPositions {
    /// Member strains in name order.
    pub members: BTreeSet<String>,
    /// contig → candidate positions.
    pub positions: ChromPositions,
}

impl GroupPositions {
    /// Total positions across contigs.
    pub fn len(&self) -> usize {
        self.positions.values().map(BTreeSet::len).sum()
    }

    /// True when no contig holds a position.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy with the same members and new positions.
    pub fn with_positions(&self, positions: ChromPositions) -> Self {
        Self {
            members: self.members.clone(),
            positions,
        }
    }
}

/// species → group → members and positions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupPositionSet {
    species: BTreeMap<String, BTreeMap<String, GroupPositions>>,
}

impl GroupPositionSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Union a strain's SNP positions into each of its groups under `species`.
    pub fn add_strain(&mut self, species: &str, strain: &str, snps: &StrainSnps, groups: &[String]) {
        let by_group = self.species.entry(species.to_string()).or_default();
        for group in groups {
            let entry = by_group.entry(group.clone()).or_default();
            entry.members.insert(strain.to_string());
            for (chrom, positions) in &snps.positions {
                entry
                    .positions
                    .entry(chrom.clone())
                    .or_default()
                    .extend(positions.iter().copied());
            }
        }
    }

    /// Build the set for a batch. `species_of` maps a strain name to its species code.
    pub fn build<F>(
        strains: &BTreeMap<String, StrainSnps>,
        strain_groups: &BTreeMap<String, Vec<String>>,
        mut species_of: F,
    ) -> Self
    where
        F: FnMut(&str) -> String,
    {
        let mut set = Self::new();
        for (strain, snps) in strains {
            if let Some(groups) = strain_groups.get(strain) {
                let species = species_of(strain.as_str());
                set.add_strain(&species, strain, snps, groups);
            }
        }
        set
    }

    /// One group.
    pub fn get(&self, species: &str, group: &str) -> Option<&GroupPositions> {
        self.species.get(species).and_then(|groups| groups.get(group))
    }

    /// Iterate `(species, group, entry)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &GroupPositions)> {
        self.species.iter().flat_map(|(species, groups)| {
            groups
                .iter()
                .map(move |(group, entry)| (species.as_str(), group.as_str(), entry))
        })
    }

    /// Rebuild every group's positions with `f`, keeping members.
    pub fn map_positions<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&str, &str, &GroupPositions) -> ChromPositions,
    {
        let species = self
            .species
            .iter()
            .map(|(species, groups)| {
                let groups = groups
                    .iter()
                    .map(|(group, entry)| {
                        let positions = f(species.as_str(), group.as_str(), entry);
                        (group.clone(), entry.with_positions(positions))
                    })
                    .collect();
                (species.clone(), groups)
            })
            .collect();
        Self { species }
    }

    /// Number of groups across species.
    pub fn group_count(&self) -> usize {
        self.species.values().map(BTreeMap::len).sum()
    }
}
