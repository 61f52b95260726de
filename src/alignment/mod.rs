//! Per-group strain × position base matrices.
//!
//! Each group alignment carries a reference row (the consolidated reference
//! base at every group position) and one row per member strain.

mod fasta;
mod iupac;

use std::collections::{BTreeMap, BTreeSet};

pub use fasta::{write_fasta, FastaWriter, DEFAULT_LINE_WIDTH};
pub use iupac::{encode_call, iupac_code, DEFAULT_MIXED_FRACTION, GAP};

use crate::genomics::{Position, StrainPositionMap};
use crate::groups::{ChromPositions, GroupPositions};
use crate::positions::SnpPositions;

/// contig → position → base.
pub type SequenceRow = BTreeMap<String, BTreeMap<Position, char>>;

/// Base matrix of one species/group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupAlignment {
    /// Species code.
    pub species: String,
    /// Group label.
    pub group: String,
    /// Consolidated reference id labelling the reference row.
    pub reference_id: String,
    /// Reference row.
    pub reference: SequenceRow,
    /// strain → row.
    pub strains: BTreeMap<String, SequenceRow>,
}

fn cell(row: &SequenceRow, chrom: &str, position: Position) -> Option<char> {
    row.get(chrom).and_then(|bases| bases.get(&position)).copied()
}

impl GroupAlignment {
    /// Reference base at a column.
    pub fn reference_base(&self, chrom: &str, position: Position) -> Option<char> {
        cell(&self.reference, chrom, position)
    }

    /// A strain's base at a column.
    pub fn strain_base(&self, strain: &str, chrom: &str, position: Position) -> Option<char> {
        self.strains
            .get(strain)
            .and_then(|row| cell(row, chrom, position))
    }

    /// Columns held by the reference row, per contig.
    pub fn positions(&self) -> ChromPositions {
        self.reference
            .iter()
            .map(|(chrom, bases)| (chrom.clone(), bases.keys().copied().collect::<BTreeSet<_>>()))
            .collect()
    }

    /// Columns in contig then position order.
    pub fn columns(&self) -> Vec<(String, Position)> {
        self.reference
            .iter()
            .flat_map(|(chrom, bases)| bases.keys().map(move |pos| (chrom.clone(), *pos)))
            .collect()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.reference.values().map(BTreeMap::len).sum()
    }
}

/// Builds group alignments from parsed strains and aggregated positions.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentBuilder<'a> {
    strains: &'a BTreeMap<String, StrainPositionMap>,
    positions: &'a SnpPositions,
    mixed_fraction: f64,
}

impl<'a> AlignmentBuilder<'a> {
    /// Builder over a parsed batch.
    pub fn new(
        strains: &'a BTreeMap<String, StrainPositionMap>,
        positions: &'a SnpPositions,
    ) -> Self {
        Self {
            strains,
            positions,
            mixed_fraction: DEFAULT_MIXED_FRACTION,
        }
    }

    /// Set the allele fraction below which calls are encoded as mixed.
    pub fn with_mixed_fraction(mut self, fraction: f64) -> Self {
        self.mixed_fraction = fraction;
        self
    }

    /// Reference id of a group: that of its first member by name.
    pub fn group_reference(&self, entry: &GroupPositions) -> Option<String> {
        entry
            .members
            .iter()
            .find_map(|strain| self.positions.strains.get(strain))
            .map(|snps| snps.reference_id.clone())
    }

    /// Build the alignment for one group.
    pub fn build(&self, species: &str, group: &str, entry: &GroupPositions) -> GroupAlignment {
        let consolidated = &self.positions.consolidated;
        let reference_id = self.group_reference(entry).unwrap_or_default();

        let mut reference = SequenceRow::new();
        for (chrom, positions) in &entry.positions {
            let row = reference.entry(chrom.clone()).or_default();
            for &pos in positions {
                if let Some(base) = consolidated
                    .base(&reference_id, chrom, pos)
                    .and_then(|base| base.chars().next())
                {
                    row.insert(pos, base);
                }
            }
        }

        let mut strains = BTreeMap::new();
        for strain in &entry.members {
            let Some(map) = self.strains.get(strain) else {
                continue;
            };
            let strain_reference = self
                .positions
                .strains
                .get(strain)
                .map(|snps| snps.reference_id.as_str())
                .unwrap_or(reference_id.as_str());
            let mut row = SequenceRow::new();
            for (chrom, positions) in &entry.positions {
                let bases = row.entry(chrom.clone()).or_default();
                for &pos in positions {
                    let base = match map.get(chrom, pos) {
                        Some(record) => encode_call(record, self.mixed_fraction),
                        None => consolidated
                            .base(strain_reference, chrom, pos)
                            .and_then(|base| base.chars().next()),
                    };
                    if let Some(base) = base {
                        bases.insert(pos, base);
                    }
                }
            }
            strains.insert(strain.clone(), row);
        }

        GroupAlignment {
            species: species.to_string(),
            group: group.to_string(),
            reference_id,
            reference,
            strains,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::GvcfParser;
    use std::io::Cursor;

    fn parse(strain: &str, body: &str) -> StrainPositionMap {
        let text = format!("##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{strain}\n{body}");
        GvcfParser::default()
            .parse_reader(strain, Cursor::new(text))
            .unwrap()
    }

    #[test]
    fn strain_without_call_inherits_reference_base() {
        let a = parse(
            "A",
            "NC_0001\t50\t.\tA\tG,<*>\t40\tPASS\t.\tGT:VAF\t1/1:1.0,0\n",
        );
        let b = parse(
            "B",
            concat!(
                "NC_0001\t10\t.\tC\tT,<*>\t40\tPASS\t.\tGT:VAF\t1/1:1.0,0\n",
                "NC_0001\t60\t.\tC\t<*>\t0\t.\tEND=61\tGT:MIN_DP\t./.:0\n",
            ),
        );
        let strains: BTreeMap<_, _> = [("A".to_string(), a), ("B".to_string(), b)]
            .into_iter()
            .collect();
        let positions = SnpPositions::aggregate(strains.values(), |_| "NC_0001".to_string());

        let mut entry = GroupPositions::default();
        entry.members.extend(["A".to_string(), "B".to_string()]);
        entry
            .positions
            .insert("NC_0001".to_string(), [10, 50].into_iter().collect());

        let alignment = AlignmentBuilder::new(&strains, &positions).build("sp", "All", &entry);

        assert_eq!(alignment.reference_id, "NC_0001");
        assert_eq!(alignment.reference_base("NC_0001", 50), Some('A'));
        assert_eq!(alignment.strain_base("A", "NC_0001", 50), Some('G'));
        assert_eq!(alignment.strain_base("B", "NC_0001", 50), Some('A'));
        assert_eq!(alignment.strain_base("A", "NC_0001", 10), Some('C'));
        assert_eq!(alignment.strain_base("B", "NC_0001", 10), Some('T'));
        assert_eq!(alignment.column_count(), 2);
    }
}
