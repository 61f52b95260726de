//! Parallel per-strain loading.
//!
//! Every strain is parsed on its own rayon task and returns an owned
//! [`StrainPositionMap`]; results are merged sequentially once all tasks have
//! joined. A failing strain is isolated into [`BatchLoad::failures`] and never
//! affects the maps of the other strains.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::gvcf::{GvcfError, GvcfParser, DEFAULT_QUALITY_CUTOFF};
use super::io::{discover_variant_files, strain_name};
use super::types::{FilterClass, StrainPositionMap};
use super::vcf::{VcfParser, DEFAULT_FREEBAYES_MIN_QUALITY};

/// Upstream variant caller that produced the input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantCaller {
    /// Compressed gVCF with reference blocks.
    #[default]
    DeepVariant,
    /// Plain VCF with `DP` in the INFO column.
    FreeBayes,
}

impl VariantCaller {
    /// File-name marker used during discovery.
    pub fn file_marker(&self) -> &'static str {
        match self {
            VariantCaller::DeepVariant => ".gvcf",
            VariantCaller::FreeBayes => ".vcf",
        }
    }
}

/// A strain name paired with its variant file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrainInput {
    /// Strain identifier.
    pub strain: String,
    /// Variant file path.
    pub path: PathBuf,
}

impl StrainInput {
    /// Derive the strain name from the file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            strain: strain_name(&path),
            path,
        }
    }
}

/// Discover every input of the given caller kind inside `dir`.
pub fn discover_inputs(dir: &Path, caller: VariantCaller) -> Result<Vec<StrainInput>, GvcfError> {
    let files = discover_variant_files(dir, caller.file_marker())?;
    Ok(files.into_iter().map(StrainInput::from_path).collect())
}

/// A strain whose file could not be parsed.
#[derive(Debug)]
pub struct StrainFailure {
    /// Strain identifier.
    pub strain: String,
    /// Parse error.
    pub error: GvcfError,
}

/// Outcome of a batch load.
#[derive(Debug, Default)]
pub struct BatchLoad {
    /// Successfully parsed strains, keyed by name.
    pub parsed: BTreeMap<String, StrainPositionMap>,
    /// Strains that failed, in input order.
    pub failures: Vec<StrainFailure>,
}

/// Parses a batch of strains on a bounded rayon pool.
#[derive(Debug, Clone)]
pub struct BatchLoader {
    caller: VariantCaller,
    quality_cutoff: f64,
    freebayes_min_quality: f64,
    threads: usize,
}

impl Default for BatchLoader {
    fn default() -> Self {
        Self {
            caller: VariantCaller::default(),
            quality_cutoff: DEFAULT_QUALITY_CUTOFF,
            freebayes_min_quality: DEFAULT_FREEBAYES_MIN_QUALITY,
            threads: 0,
        }
    }
}

impl BatchLoader {
    /// Loader for the given caller with default thresholds.
    pub fn new(caller: VariantCaller) -> Self {
        Self {
            caller,
            ..Self::default()
        }
    }

    /// Set the gVCF SNP quality cutoff.
    pub fn with_quality_cutoff(mut self, cutoff: f64) -> Self {
        self.quality_cutoff = cutoff;
        self
    }

    /// Set the FreeBayes SNP quality floor.
    pub fn with_freebayes_min_quality(mut self, quality: f64) -> Self {
        self.freebayes_min_quality = quality;
        self
    }

    /// Set the worker count; `0` uses every available core.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Parse a single strain with the configured caller.
    pub fn load_one(&self, input: &StrainInput) -> Result<StrainPositionMap, GvcfError> {
        match self.caller {
            VariantCaller::DeepVariant => {
                GvcfParser::new(self.quality_cutoff).parse_path(&input.strain, &input.path)
            }
            VariantCaller::FreeBayes => {
                VcfParser::new(self.freebayes_min_quality).parse_path(&input.strain, &input.path)
            }
        }
    }

    /// Parse every input in parallel, then merge the results in input order.
    pub fn load(&self, inputs: &[StrainInput]) -> Result<BatchLoad, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()?;
        info!(
            strains = inputs.len(),
            threads = pool.current_num_threads(),
            caller = ?self.caller,
            "parsing variant files"
        );

        let results: Vec<(&StrainInput, Result<StrainPositionMap, GvcfError>)> =
            pool.install(|| {
                inputs
                    .par_iter()
                    .map(|input| (input, self.load_one(input)))
                    .collect()
            });

        let mut batch = BatchLoad::default();
        for (input, result) in results {
            match result {
                Ok(map) => {
                    debug!(
                        strain = %input.strain,
                        positions = map.len(),
                        best_reference = %map.best_reference,
                        "parsed strain"
                    );
                    if batch.parsed.insert(input.strain.clone(), map).is_some() {
                        warn!(strain = %input.strain, "duplicate strain name; keeping the later file");
                    }
                }
                Err(error) => {
                    warn!(strain = %input.strain, %error, "failed to parse strain");
                    batch.failures.push(StrainFailure {
                        strain: input.strain.clone(),
                        error,
                    });
                }
            }
        }
        Ok(batch)
    }
}

/// Per-strain counts of each call class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrainSummary {
    /// Positions classified as SNPs.
    pub snps: usize,
    /// Sum of insertion lengths.
    pub inserted_bases: u64,
    /// Positions covered by zero-depth blocks.
    pub deleted_positions: usize,
}

/// Count SNPs, inserted bases and deleted positions for one strain.
pub fn summarise(map: &StrainPositionMap) -> StrainSummary {
    map.iter()
        .fold(StrainSummary::default(), |mut summary, (_, _, record)| {
            match record.filter_class {
                FilterClass::Pass => summary.snps += 1,
                FilterClass::Insertion => summary.inserted_bases += record.length,
                FilterClass::Deletion => summary.deleted_positions += 1,
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn summary_counts_each_class() {
        let text = concat!(
            "##fileformat=VCFv4.2\n",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\ts1\n",
            "NC_0001\t10\t.\tA\tG,<*>\t40\tPASS\t.\tGT\t1/1\n",
            "NC_0001\t20\t.\tC\tCTT,<*>\t40\tPASS\t.\tGT\t1/1\n",
            "NC_0001\t30\t.\tA\t<*>\t0\t.\tEND=32\tGT:MIN_DP\t./.:0\n",
        );
        let map = GvcfParser::default()
            .parse_reader("s1", Cursor::new(text))
            .unwrap();

        assert_eq!(
            summarise(&map),
            StrainSummary {
                snps: 1,
                inserted_bases: 3,
                deleted_positions: 3,
            }
        );
    }

    #[test]
    fn missing_file_is_isolated_to_its_strain() {
        let inputs = vec![StrainInput::from_path("/nonexistent/ghost.gvcf.gz")];
        let batch = BatchLoader::default().with_threads(1).load(&inputs).unwrap();

        assert!(batch.parsed.is_empty());
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].strain, "ghost");
        assert!(matches!(batch.failures[0].error, GvcfError::Io { .. }));
    }

    #[test]
    fn caller_markers() {
        assert_eq!(VariantCaller::DeepVariant.file_marker(), ".gvcf");
        assert_eq!(VariantCaller::FreeBayes.file_marker(), ".vcf");
    }
}
