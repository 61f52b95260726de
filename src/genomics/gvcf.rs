use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use super::io::open_gzip;
use super::record::{for_each_record, parse_integer, RecordFields};
use super::types::{FilterClass, StrainPositionMap, VariantRecord};

/// Placeholder the caller writes for "any non-reference allele".
const NON_REF_PLACEHOLDER: &str = "<*>";
/// Default QUAL threshold for SNP calls.
pub const DEFAULT_QUALITY_CUTOFF: f64 = 20.0;

/// Errors raised while parsing a variant file.
#[derive(Debug, Error)]
pub enum GvcfError {
    /// The file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The meta lines and `#CHROM` line do not form a valid VCF header.
    #[error("invalid VCF header in {name}: {source}")]
    Header {
        /// Strain or file name.
        name: String,
        /// Decoder error.
        #[source]
        source: std::io::Error,
    },

    /// A data line could not be decoded.
    #[error("line {line}: malformed record: {source}")]
    Record {
        /// 1-based data line number.
        line: usize,
        /// Decoder error.
        #[source]
        source: std::io::Error,
    },

    /// A directory holds no variant files of the requested kind.
    #[error("no {marker} files found in {dir}")]
    NoInputs {
        /// Searched directory.
        dir: PathBuf,
        /// File name marker that was looked for.
        marker: &'static str,
    },

    /// A data line does not have the expected number of columns.
    #[error("line {line}: expected {expected} tab-separated fields, found {found}")]
    FieldCount {
        /// 1-based data line number.
        line: usize,
        /// Expected column count.
        expected: usize,
        /// Actual column count.
        found: usize,
    },

    /// A required sub-field could not be parsed.
    #[error("line {line}: invalid {field} value '{value}'")]
    InvalidField {
        /// 1-based data line number.
        line: usize,
        /// Field name.
        field: &'static str,
        /// Raw text.
        value: String,
    },
}

impl GvcfError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        GvcfError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Streaming parser for compressed single-sample gVCF files.
#[derive(Debug, Clone)]
pub struct GvcfParser {
    quality_cutoff: f64,
}

impl Default for GvcfParser {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY_CUTOFF)
    }
}

impl GvcfParser {
    /// Create a parser with the given SNP quality cutoff (strictly greater passes).
    pub fn new(quality_cutoff: f64) -> Self {
        Self { quality_cutoff }
    }

    /// Quality cutoff in use.
    pub fn quality_cutoff(&self) -> f64 {
        self.quality_cutoff
    }

    /// Parse a gzip-compressed gVCF file.
    pub fn parse_path(
        &self,
        strain: &str,
        path: impl AsRef<Path>,
    ) -> Result<StrainPositionMap, GvcfError> {
        let path = path.as_ref();
        let reader = open_gzip(path)?;
        self.parse_reader(strain, reader).map_err(|err| match err {
            GvcfError::Header { source, .. } => GvcfError::Header {
                name: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse already-decompressed gVCF text.
    pub fn parse_reader<R: BufRead>(
        &self,
        strain: &str,
        reader: R,
    ) -> Result<StrainPositionMap, GvcfError> {
        let mut map = StrainPositionMap::new(strain);
        for_each_record(strain, reader, |line, fields| {
            self.classify(line, &fields, &mut map)
        })?;
        Ok(map)
    }

    fn classify(
        &self,
        line: usize,
        fields: &RecordFields,
        map: &mut StrainPositionMap,
    ) -> Result<(), GvcfError> {
        let (chrom, pos, reference) = (fields.chrom.as_str(), fields.pos, fields.reference.as_str());
        let info = fields.info_stats();
        let end = match info.get("END") {
            Some(value) => parse_integer(line, "END", value)?,
            None => pos,
        };

        map.observe_chromosome(chrom);

        let alleles = AlleleSummary::from_alternates(&fields.alternates, reference);
        let quality = fields.quality;
        let stats = Arc::new(fields.format_stats());
        let chrom_name: Arc<str> = Arc::from(chrom);
        let record = |filter_class, length| VariantRecord {
            chrom: Arc::clone(&chrom_name),
            ref_base: reference.to_string(),
            alt_base: alleles.joined.clone(),
            quality,
            length,
            filter_class,
            stats: Arc::clone(&stats),
        };

        let passed = fields.filter == "PASS";
        if passed
            && reference.len() == 1
            && alleles.max_len == 1
            && quality.is_some_and(|q| q > self.quality_cutoff)
        {
            map.insert(chrom, pos, record(FilterClass::Pass, 1));
        } else if passed && alleles.max_len > 1 {
            map.insert(
                chrom,
                pos,
                record(FilterClass::Insertion, alleles.max_len as u64),
            );
        } else if end != pos {
            let min_depth = stats.get("MIN_DP").ok_or_else(|| GvcfError::InvalidField {
                line,
                field: "MIN_DP",
                value: fields.format.clone(),
            })?;
            if parse_integer(line, "MIN_DP", min_depth)? != 0 {
                return Ok(());
            }
            if end < pos {
                return Err(GvcfError::InvalidField {
                    line,
                    field: "END",
                    value: end.to_string(),
                });
            }
            let deletion = record(FilterClass::Deletion, end - pos);
            for position in pos..=end {
                map.insert(chrom, position, deletion.clone());
            }
        }
        Ok(())
    }
}

/// Alternate alleles after substituting the non-reference placeholder.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AlleleSummary {
    pub joined: String,
    pub max_len: usize,
}

impl AlleleSummary {
    pub(crate) fn from_alternates(alternates: &[String], reference: &str) -> Self {
        let mut joined = String::new();
        let mut max_len = 0;
        for allele in alternates {
            let candidate = allele.replace(NON_REF_PLACEHOLDER, reference);
            if candidate.is_empty() {
                continue;
            }
            joined.push_str(&candidate);
            max_len = max_len.max(candidate.len());
        }
        Self {
            joined,
            max_len: max_len.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\ts1\n";

    fn parse(body: &str) -> Result<StrainPositionMap, GvcfError> {
        let text = format!("{HEADER}{body}");
        GvcfParser::default().parse_reader("s1", Cursor::new(text))
    }

    #[test]
    fn snp_line_is_classified_as_pass() {
        let map = parse("NC_0001\t50\t.\tA\tG,<*>\t45.2\tPASS\t.\tGT:GQ:DP:AD:VAF:PL\t1/1:40:18:0,18,0:1,0:60,55,0\n")
            .unwrap();
        let record = map.get("NC_0001", 50).unwrap();
        assert_eq!(record.filter_class, FilterClass::Pass);
        assert_eq!(record.alt_base, "GA");
        assert_eq!(record.length, 1);
        assert_eq!(record.stat("VAF"), Some("1,0"));
        assert_eq!(map.best_reference, "NC_0001");
    }

    #[test]
    fn insertion_uses_longest_allele() {
        let map = parse("NC_0001\t70\t.\tC\tCGAG,<*>\t33\tPASS\t.\tGT:GQ\t1/1:30\n").unwrap();
        let record = map.get("NC_0001", 70).unwrap();
        assert_eq!(record.filter_class, FilterClass::Insertion);
        assert_eq!(record.length, 4);
    }

    #[test]
    fn zero_depth_block_expands_to_every_position() {
        let map = parse("NC_0001\t100\t.\tA\t<*>\t0\t.\tEND=105\tGT:GQ:MIN_DP:PL\t./.:0:0:0,0,0\n")
            .unwrap();
        assert_eq!(map.len(), 6);
        for pos in 100..=105 {
            let record = map.get("NC_0001", pos).unwrap();
            assert_eq!(record.filter_class, FilterClass::Deletion);
            assert_eq!(record.length, 5);
        }
    }

    #[test]
    fn covered_reference_block_is_dropped() {
        let map = parse("NC_0001\t1\t.\tA\t<*>\t0\t.\tEND=99\tGT:GQ:MIN_DP:PL\t0/0:50:12:0,50,99\n")
            .unwrap();
        assert!(map.is_empty());
        assert!(map.chromosomes.contains("NC_0001"));
    }

    #[test]
    fn truncated_line_is_fatal() {
        let err = parse("NC_0001\t50\t.\tA\tG,<*>\t45.2\tPASS\n").unwrap_err();
        assert!(matches!(
            err,
            GvcfError::Record { line: 1, .. } | GvcfError::FieldCount { line: 1, .. }
        ));
    }

    #[test]
    fn unparsable_end_is_fatal() {
        let err = parse("NC_0001\t100\t.\tA\t<*>\t0\t.\tEND=x\tGT:MIN_DP\t./.:0\n").unwrap_err();
        assert!(matches!(err, GvcfError::InvalidField { field: "END", .. }));
    }

    #[test]
    fn block_without_min_depth_is_fatal() {
        let err = parse("NC_0001\t100\t.\tA\t<*>\t0\t.\tEND=105\tGT:GQ\t./.:0\n").unwrap_err();
        assert!(matches!(
            err,
            GvcfError::InvalidField {
                line: 1,
                field: "MIN_DP",
                ..
            }
        ));
    }

    #[test]
    fn block_with_non_numeric_min_depth_is_fatal() {
        let err = parse("NC_0001\t100\t.\tA\t<*>\t0\t.\tEND=105\tGT:GQ:MIN_DP\t./.:0:zero\n")
            .unwrap_err();
        match err {
            GvcfError::InvalidField { field, value, .. } => {
                assert_eq!(field, "MIN_DP");
                assert_eq!(value, "zero");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn single_position_line_needs_no_min_depth() {
        let map = parse("NC_0001\t40\t.\tA\t<*>\t0\t.\t.\tGT:GQ\t0/0:50\n").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn missing_header_is_reported() {
        let err = GvcfParser::default()
            .parse_reader("s1", Cursor::new("NC_0001\t50\t.\tA\tG,<*>\t45\tPASS\t.\tGT\t1/1\n"))
            .unwrap_err();
        assert!(matches!(err, GvcfError::Header { .. }));
    }

    #[test]
    fn allele_summary_substitutes_placeholder() {
        let alleles = |list: &[&str]| list.iter().map(|a| a.to_string()).collect::<Vec<_>>();
        let summary = AlleleSummary::from_alternates(&alleles(&["A", "G", "<*>"]), "C");
        assert_eq!(summary.joined, "AGC");
        assert_eq!(summary.max_len, 1);

        let reference_only = AlleleSummary::from_alternates(&alleles(&["<*>"]), "T");
        assert_eq!(reference_only.max_len, 1);
    }
}
