#[path = "common/mod.rs"]
mod common;

use common::{deletion_line, reference_line, snp_line, write_gvcf};
use snptree::genomics::{
    discover_inputs, BatchLoader, FilterClass, GvcfError, GvcfParser, StrainInput, VariantCaller,
};
use test_case::test_case;

#[test]
fn deletion_block_emits_one_record_per_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gvcf(dir.path(), "s1", &deletion_line("NC_0001", 100, 105));

    let map = GvcfParser::default().parse_path("s1", &path).unwrap();

    assert_eq!(map.len(), 6);
    for pos in 100..=105 {
        let record = map.get("NC_0001", pos).expect("every position of the block is stored");
        assert_eq!(record.filter_class, FilterClass::Deletion);
        assert_eq!(record.length, 5);
    }
    assert!(map.get("NC_0001", 106).is_none());
}

#[test_case(20.01, true; "just above cutoff")]
#[test_case(19.99, false; "just below cutoff")]
#[test_case(20.0, false; "cutoff itself")]
fn snp_quality_boundary(qual: f64, stored: bool) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gvcf(dir.path(), "s1", &snp_line("NC_0001", 50, 'A', 'G', qual));

    let map = GvcfParser::default().parse_path("s1", &path).unwrap();

    match map.get("NC_0001", 50) {
        Some(record) => {
            assert!(stored, "record below cutoff must be dropped");
            assert_eq!(record.filter_class, FilterClass::Pass);
        }
        None => assert!(!stored, "record above cutoff must be stored"),
    }
}

#[test]
fn parsing_twice_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let body = [
        reference_line("NC_0001", 1, 49),
        snp_line("NC_0001", 50, 'A', 'G', 44.0),
        deletion_line("NC_0001", 60, 62),
        "NC_0001\t80\t.\tT\tTAC,<*>\t31\tPASS\t.\tGT:GQ\t1/1:30\n".to_string(),
    ]
    .concat();
    let path = write_gvcf(dir.path(), "s1", &body);

    let parser = GvcfParser::default();
    let first = parser.parse_path("s1", &path).unwrap();
    let second = parser.parse_path("s1", &path).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[test]
fn truncated_line_is_a_hard_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gvcf(dir.path(), "bad", "NC_0001\t50\t.\tA\tG\n");

    let err = GvcfParser::default().parse_path("bad", &path).unwrap_err();
    assert!(matches!(
        err,
        GvcfError::Record { line: 1, .. } | GvcfError::FieldCount { line: 1, .. }
    ));
}

#[test]
fn missing_sample_column_is_a_hard_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gvcf(dir.path(), "bad", "NC_0001\t50\t.\tA\tG,<*>\t40\tPASS\t.\tGT\n");

    let err = GvcfParser::default().parse_path("bad", &path).unwrap_err();
    assert!(matches!(
        err,
        GvcfError::FieldCount {
            line: 1,
            expected: 10,
            found: 9
        }
    ));
}

#[test_case("GT:GQ\t./.:0"; "min depth absent")]
#[test_case("GT:GQ:MIN_DP\t./.:0:zero"; "min depth not a number")]
fn block_with_unusable_min_depth_fails_the_strain(format_and_sample: &str) {
    let dir = tempfile::tempdir().unwrap();
    let body = format!("NC_0001\t100\t.\tA\t<*>\t0\t.\tEND=105\t{format_and_sample}\n");
    write_gvcf(dir.path(), "bad", &body);
    write_gvcf(dir.path(), "good", &deletion_line("NC_0001", 100, 105));

    let inputs = discover_inputs(dir.path(), VariantCaller::DeepVariant).unwrap();
    let batch = BatchLoader::default().load(&inputs).unwrap();

    assert_eq!(batch.parsed["good"].len(), 6);
    assert_eq!(batch.failures.len(), 1);
    assert!(matches!(
        batch.failures[0].error,
        GvcfError::InvalidField { field: "MIN_DP", .. }
    ));
}

#[test]
fn corrupt_strain_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    write_gvcf(dir.path(), "good", &snp_line("NC_0001", 50, 'A', 'G', 40.0));
    write_gvcf(dir.path(), "bad", "NC_0001\tnot-a-number\t.\tA\tG,<*>\t40\tPASS\t.\tGT\t1/1\n");
    std::fs::write(dir.path().join("README.txt"), "not an input").unwrap();

    let inputs = discover_inputs(dir.path(), VariantCaller::DeepVariant).unwrap();
    let names: Vec<&str> = inputs.iter().map(|input| input.strain.as_str()).collect();
    assert_eq!(names, vec!["bad", "good"]);

    let batch = BatchLoader::default().with_threads(2).load(&inputs).unwrap();
    assert_eq!(batch.parsed.len(), 1);
    assert!(batch.parsed["good"].get("NC_0001", 50).is_some());
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].strain, "bad");
    assert!(matches!(
        batch.failures[0].error,
        GvcfError::InvalidField { field: "POS", .. }
    ));
}

#[test]
fn empty_folder_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = discover_inputs(dir.path(), VariantCaller::DeepVariant).unwrap_err();
    assert!(matches!(err, GvcfError::NoInputs { .. }));
}

#[test]
fn strain_name_strips_compound_extension() {
    let input = StrainInput::from_path("/data/03-1057.gvcf.gz");
    assert_eq!(input.strain, "03-1057");
}
