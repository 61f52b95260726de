use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use super::gvcf::GvcfError;
use super::io::open_text;
use super::record::{for_each_record, parse_integer, RecordFields};
use super::types::{FilterClass, StrainPositionMap, VariantRecord};

/// Minimum QUAL for FreeBayes SNP calls.
pub const DEFAULT_FREEBAYES_MIN_QUALITY: f64 = 150.0;

/// Parser for plain (filtered) FreeBayes VCF output.
///
/// Depth comes from the `DP` INFO key; zero-depth sites are deletions, single-base
/// sites at or above the quality floor are SNPs, and longer reference alleles are
/// insertions.
#[derive(Debug, Clone)]
pub struct VcfParser {
    min_quality: f64,
}

impl Default for VcfParser {
    fn default() -> Self {
        Self::new(DEFAULT_FREEBAYES_MIN_QUALITY)
    }
}

impl VcfParser {
    /// Create a parser with the given SNP quality floor (inclusive).
    pub fn new(min_quality: f64) -> Self {
        Self { min_quality }
    }

    /// Parse a VCF file, compressed or not.
    pub fn parse_path(
        &self,
        strain: &str,
        path: impl AsRef<Path>,
    ) -> Result<StrainPositionMap, GvcfError> {
        let path = path.as_ref();
        let reader = open_text(path)?;
        self.parse_reader(strain, reader).map_err(|err| match err {
            GvcfError::Header { source, .. } => GvcfError::Header {
                name: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse VCF text.
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
        let (chrom, reference) = (fields.chrom.as_str(), fields.reference.as_str());
        let alt = fields.alt_text();
        let quality = fields.quality;

        map.observe_chromosome(chrom);

        let stats = fields.info_stats();
        let depth = stats
            .get("DP")
            .ok_or_else(|| GvcfError::InvalidField {
                line,
                field: "DP",
                value: fields.info.clone(),
            })
            .and_then(|dp| parse_integer(line, "DP", dp))?;

        let (class, length) = if depth == 0 {
            (FilterClass::Deletion, 1)
        } else if reference.len() == 1 {
            if !quality.is_some_and(|q| q >= self.min_quality) {
                return Ok(());
            }
            (FilterClass::Pass, 1)
        } else {
            (FilterClass::Insertion, alt.len() as u64)
        };

        map.insert(
            chrom,
            fields.pos,
            VariantRecord {
                chrom: Arc::from(chrom),
                ref_base: reference.to_string(),
                alt_base: alt,
                quality,
                length,
                filter_class: class,
                stats: Arc::new(stats),
            },
        );
        Ok(())
    }
}
