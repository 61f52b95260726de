use std::collections::BTreeMap;

use snptree::alignment::{GroupAlignment, SequenceRow};
use snptree::filter::remove_identical_calls;
use snptree::ranking::{rank_snps, sort_snps};

const CHROM: &str = "NC_0001";

fn row(cells: &[(u64, char)]) -> SequenceRow {
    [(CHROM.to_string(), cells.iter().copied().collect())]
        .into_iter()
        .collect()
}

/// Reference `A` at every column; each strain carries `G` where listed.
fn alignment(columns: &[u64], strains: &[(&str, Vec<u64>)]) -> GroupAlignment {
    let reference: Vec<(u64, char)> = columns.iter().map(|&pos| (pos, 'A')).collect();
    let strains: BTreeMap<String, SequenceRow> = strains
        .iter()
        .map(|(name, differing)| {
            let cells: Vec<(u64, char)> = columns
                .iter()
                .map(|&pos| (pos, if differing.contains(&pos) { 'G' } else { 'A' }))
                .collect();
            (name.to_string(), row(&cells))
        })
        .collect();
    GroupAlignment {
        species: "sp".into(),
        group: "All".into(),
        reference_id: CHROM.into(),
        reference: row(&reference),
        strains,
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

#[test]
fn shared_columns_sort_before_rarer_ones() {
    // P1 = 900 (3 strains), P2 = 700 and P3 = 300 (5 strains each).
    let alignment = alignment(
        &[300, 700, 900],
        &[
            ("s1", vec![300, 700, 900]),
            ("s2", vec![300, 700, 900]),
            ("s3", vec![300, 700, 900]),
            ("s4", vec![300, 700]),
            ("s5", vec![300, 700]),
            ("s6", vec![]),
        ],
    );
    let ranking = rank_snps(&alignment);
    let order = names(&["s6", "s5", "NC_0001", "s4", "s3", "s2", "s1"]);
    let sorted = sort_snps(&alignment, &ranking, &order).unwrap();

    let columns: Vec<u64> = sorted.columns().into_iter().map(|(_, pos)| pos).collect();
    assert_eq!(columns, vec![300, 700, 900]);
    assert_eq!(
        sorted.buckets.iter().map(|(count, _)| *count).collect::<Vec<_>>(),
        vec![5, 3]
    );
}

#[test]
fn invariant_column_is_removed() {
    // Reference and all three strains carry G at 500.
    let mut alignment = alignment(
        &[400, 500],
        &[("s1", vec![400, 500]), ("s2", vec![500]), ("s3", vec![500])],
    );
    alignment
        .reference
        .get_mut(CHROM)
        .unwrap()
        .insert(500, 'G');

    let informative = remove_identical_calls(&alignment);

    let positions = informative.positions();
    assert!(!positions[CHROM].contains(&500));
    assert!(positions[CHROM].contains(&400));
    assert_eq!(informative.strain_base("s1", CHROM, 400), Some('G'));
    assert_eq!(informative.strain_base("s2", CHROM, 500), None);
}

#[test]
fn sort_order_is_stable_across_runs() {
    let alignment = alignment(
        &[10, 20, 30, 40],
        &[("a", vec![10, 40]), ("b", vec![20, 40]), ("c", vec![30])],
    );
    let order = names(&["c", "b", "a"]);
    let first = sort_snps(&alignment, &rank_snps(&alignment), &order).unwrap();
    for _ in 0..5 {
        assert_eq!(sort_snps(&alignment, &rank_snps(&alignment), &order).unwrap(), first);
    }
    let columns: Vec<u64> = first.columns().into_iter().map(|(_, pos)| pos).collect();
    assert_eq!(columns, vec![40, 10, 20, 30]);
}
