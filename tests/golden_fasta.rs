#[path = "common/mod.rs"]
mod common;

use std::fs;

use common::{assert_snapshot, deletion_line, snp_line, write_gvcf};
use snptree::{Pipeline, PipelineConfig};

const MIXED_CALL: &str =
    "NC_0001\t200\t.\tC\tT,<*>\t40\tPASS\t.\tGT:GQ:DP:AD:VAF:PL\t0/1:40:20:12,8,0:0.4,0:60,0,50\n";

#[test]
fn mixed_calls_and_deletions_match_snapshot() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_gvcf(
        input.path(),
        "s1",
        &[snp_line("NC_0001", 100, 'A', 'G', 40.0), MIXED_CALL.to_string()].concat(),
    );
    write_gvcf(
        input.path(),
        "s2",
        &[deletion_line("NC_0001", 95, 105), snp_line("NC_0001", 300, 'G', 'A', 40.0)].concat(),
    );

    let prepared = Pipeline::new(PipelineConfig::new(input.path(), out.path()))
        .unwrap()
        .prepare()
        .unwrap();

    assert_eq!(prepared.fastas.len(), 1);
    let written = fs::read_to_string(&prepared.fastas[0].path).unwrap();
    assert_snapshot("alignments/mixed_and_deleted.fasta", &written);
}
