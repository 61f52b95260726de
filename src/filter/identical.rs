use std::collections::BTreeMap;

use crate::alignment::{GroupAlignment, SequenceRow};

/// Drop alignment columns that carry no signal.
///
/// For each column, the bases of the non-reference strains are tallied. The
/// column is kept when some base is carried by fewer strains than there are
/// strains in the group; a column where every strain shows the same base is
/// removed from every row, the reference row included.
pub fn remove_identical_calls(alignment: &GroupAlignment) -> GroupAlignment {
    let strain_count = alignment.strains.len();
    let mut tallies: BTreeMap<&str, BTreeMap<u64, BTreeMap<char, usize>>> = BTreeMap::new();
    for row in alignment.strains.values() {
        for (chrom, bases) in row {
            let columns = tallies.entry(chrom.as_str()).or_default();
            for (&pos, &base) in bases {
                *columns.entry(pos).or_default().entry(base).or_default() += 1;
            }
        }
    }

    let informative = |chrom: &str, pos: u64| {
        tallies
            .get(chrom)
            .and_then(|columns| columns.get(&pos))
            .is_some_and(|counts| counts.values().any(|&count| count < strain_count))
    };
    let keep = |row: &SequenceRow| -> SequenceRow {
        row.iter()
            .map(|(chrom, bases)| {
                let kept = bases
                    .iter()
                    .filter(|(&pos, _)| informative(chrom.as_str(), pos))
                    .map(|(&pos, &base)| (pos, base))
                    .collect();
                (chrom.clone(), kept)
            })
            .collect()
    };

    GroupAlignment {
        species: alignment.species.clone(),
        group: alignment.group.clone(),
        reference_id: alignment.reference_id.clone(),
        reference: keep(&alignment.reference),
        strains: alignment
            .strains
            .iter()
            .map(|(strain, row)| (strain.clone(), keep(row)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(u64, char)]) -> SequenceRow {
        [("NC_0001".to_string(), cells.iter().copied().collect())]
            .into_iter()
            .collect()
    }

    fn alignment(strains: &[(&str, &[(u64, char)])]) -> GroupAlignment {
        GroupAlignment {
            species: "sp".into(),
            group: "All".into(),
            reference_id: "NC_0001".into(),
            reference: row(&[(500, 'G'), (600, 'A')]),
            strains: strains
                .iter()
                .map(|(name, cells)| (name.to_string(), row(cells)))
                .collect(),
        }
    }

    #[test]
    fn shared_base_column_is_removed() {
        let input = alignment(&[
            ("s1", &[(500, 'G'), (600, 'A')]),
            ("s2", &[(500, 'G'), (600, 'T')]),
            ("s3", &[(500, 'G'), (600, 'A')]),
        ]);
        let output = remove_identical_calls(&input);

        assert_eq!(output.positions()["NC_0001"].iter().copied().collect::<Vec<_>>(), vec![600]);
        assert_eq!(output.strain_base("s2", "NC_0001", 600), Some('T'));
        assert_eq!(output.strain_base("s1", "NC_0001", 500), None);
    }

    #[test]
    fn single_strain_group_has_no_informative_columns() {
        let output = remove_identical_calls(&alignment(&[("s1", &[(500, 'T'), (600, 'A')])]));
        assert_eq!(output.column_count(), 0);
    }
}
