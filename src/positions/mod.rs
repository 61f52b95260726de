//! SNP position aggregation.
//!
//! Collapses per-strain position maps into:
//!
//! * each strain's ordered list of SNP positions per contig,
//! * a consolidated reference map (reference id → contig → position → base)
//!   holding every position called as a SNP by any strain mapped to that
//!   reference,
//! * a global contig → position → base table across all references.
//!
//! Only SNP calls feed these tables; insertions and deletions never become
//! alignment columns.

use std::collections::BTreeMap;

use crate::genomics::{FilterClass, Position, StrainPositionMap};

/// contig → position → reference base.
pub type ReferenceBases = BTreeMap<String, BTreeMap<Position, String>>;

/// SNP view of one strain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrainSnps {
    /// Consolidated reference the strain was mapped to.
    pub reference_id: String,
    /// contig → SNP positions in file order. Every contig of the strain has an entry.
    pub positions: BTreeMap<String, Vec<Position>>,
}

impl StrainSnps {
    /// Extract the SNP positions of a parsed strain.
    pub fn from_map(map: &StrainPositionMap, reference_id: impl Into<String>) -> Self {
        let positions = map
            .records
            .iter()
            .map(|(chrom, records)| {
                let snps = records
                    .iter()
                    .filter(|(_, record)| record.filter_class == FilterClass::Pass)
                    .map(|(pos, _)| *pos)
                    .collect();
                (chrom.clone(), snps)
            })
            .collect();
        Self {
            reference_id: reference_id.into(),
            positions,
        }
    }

    /// True when the strain has a SNP at `position` on any contig.
    pub fn has_snp_anywhere(&self, position: Position) -> bool {
        self.positions.values().any(|list| list.contains(&position))
    }

    /// Number of SNP positions across all contigs.
    pub fn count(&self) -> usize {
        self.positions.values().map(Vec::len).sum()
    }
}

/// Consolidated reference bases, keyed by reference id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConsolidatedReferenceMap {
    by_reference: BTreeMap<String, ReferenceBases>,
    global: ReferenceBases,
}

impl ConsolidatedReferenceMap {
    /// Bases for one consolidated reference.
    pub fn reference(&self, reference_id: &str) -> Option<&ReferenceBases> {
        self.by_reference.get(reference_id)
    }

    /// Reference base at a position, preferring the given reference and
    /// falling back to any reference that called the position.
    pub fn base(&self, reference_id: &str, chrom: &str, position: Position) -> Option<&str> {
        fn lookup<'a>(bases: &'a ReferenceBases, chrom: &str, position: Position) -> Option<&'a str> {
            bases
                .get(chrom)
                .and_then(|positions| positions.get(&position))
                .map(String::as_str)
        }
        self.by_reference
            .get(reference_id)
            .and_then(|bases| lookup(bases, chrom, position))
            .or_else(|| lookup(&self.global, chrom, position))
    }

    /// Iterate references in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReferenceBases)> {
        self.by_reference.iter().map(|(id, bases)| (id.as_str(), bases))
    }

    fn record(&mut self, reference_id: &str, chrom: &str, position: Position, base: &str) {
        for table in [
            self.by_reference.entry(reference_id.to_string()).or_default(),
            &mut self.global,
        ] {
            table
                .entry(chrom.to_string())
                .or_default()
                .insert(position, base.to_string());
        }
    }
}

/// Aggregated SNP positions for a batch of strains.
#[derive(Debug, Clone, Default)]
pub struct SnpPositions {
    /// strain → SNP view.
    pub strains: BTreeMap<String, StrainSnps>,
    /// reference id → contig → position → base.
    pub consolidated: ConsolidatedReferenceMap,
}

impl SnpPositions {
    /// Empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one strain into the aggregate under its consolidated reference id.
    pub fn add(&mut self, map: &StrainPositionMap, reference_id: &str) {
        let by_reference = self
            .consolidated
            .by_reference
            .entry(reference_id.to_string())
            .or_default();
        for chrom in map.records.keys() {
            by_reference.entry(chrom.clone()).or_default();
        }
        for (chrom, position, record) in map.iter() {
            if record.filter_class == FilterClass::Pass {
                self.consolidated
                    .record(reference_id, chrom, position, &record.ref_base);
            }
        }
        self.strains.insert(
            map.strain.clone(),
            StrainSnps::from_map(map, reference_id),
        );
    }

    /// Aggregate a batch, resolving each strain's reference id with `reference_of`.
    pub fn aggregate<'a, I, F>(maps: I, mut reference_of: F) -> Self
    where
        I: IntoIterator<Item = &'a StrainPositionMap>,
        F: FnMut(&StrainPositionMap) -> String,
    {
        let mut aggregate = Self::new();
        for map in maps {
            let reference_id = reference_of(map);
            aggregate.add(map, &reference_id);
        }
        aggregate
    }
}
