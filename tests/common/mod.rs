#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

pub const GVCF_HEADER: &str = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsample\n";

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("SNPTREE_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set SNPTREE_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

/// A SNP line with VAF 1.0 and the given quality.
pub fn snp_line(chrom: &str, pos: u64, reference: char, alt: char, qual: f64) -> String {
    format!("{chrom}\t{pos}\t.\t{reference}\t{alt},<*>\t{qual}\tPASS\t.\tGT:GQ:DP:AD:VAF:PL\t1/1:40:20:0,20,0:1,0:60,50,0\n")
}

/// A zero-depth reference block covering `[start, end]`.
pub fn deletion_line(chrom: &str, start: u64, end: u64) -> String {
    format!("{chrom}\t{start}\t.\tA\t<*>\t0\t.\tEND={end}\tGT:GQ:MIN_DP:PL\t./.:0:0:0,0,0\n")
}

/// A covered reference block; parsed but never stored.
pub fn reference_line(chrom: &str, start: u64, end: u64) -> String {
    format!("{chrom}\t{start}\t.\tA\t<*>\t0\t.\tEND={end}\tGT:GQ:MIN_DP:PL\t0/0:50:15:0,50,99\n")
}

/// Write `body` below the gVCF header as `<dir>/<strain>.gvcf.gz`.
pub fn write_gvcf(dir: &Path, strain: &str, body: &str) -> PathBuf {
    let path = dir.join(format!("{strain}.gvcf.gz"));
    let mut encoder = GzEncoder::new(File::create(&path).expect("create gvcf"), Compression::default());
    encoder
        .write_all(GVCF_HEADER.as_bytes())
        .and_then(|()| encoder.write_all(body.as_bytes()))
        .expect("write gvcf");
    encoder.finish().expect("finish gzip stream");
    path
}

/// Write a Newick tree where the pipeline expects the best tree of a group.
pub fn write_tree(tree_dir: &Path, species: &str, group: &str, newick: &str) -> PathBuf {
    let path = snptree::tree::best_tree_path(tree_dir, species, group);
    fs::create_dir_all(path.parent().expect("tree folder")).expect("create tree folder");
    fs::write(&path, newick).expect("write tree");
    path
}
