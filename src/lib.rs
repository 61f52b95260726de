//! # snptree
//!
//! SNP consolidation and phylogenetic ordering for bacterial strain
//! collections.
//!
//! ## Pipeline
//!
//! 1. **Parse**: every strain's gVCF (or FreeBayes VCF) is read on a rayon
//!    pool into an owned per-strain position map.
//! 2. **Aggregate**: SNP positions are merged sequentially into consolidated
//!    reference maps.
//! 3. **Classify**: defining-SNP catalogs assign strains to groups; each group
//!    unions the SNP positions of its members.
//! 4. **Filter**: dense SNP clusters, curated regions and invariant columns
//!    are removed, and one multi-FASTA alignment per group is written.
//! 5. **Report**: columns are ranked by how many strains carry them, ordered
//!    along the group's tree, annotated from GenBank and written as a table.
//!
//! ## Usage Example
//!
//! ```ignore
//! use snptree::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new("gvcfs", "out").with_dependency_dir("deps");
//! let pipeline = Pipeline::new(config)?;
//! let prepared = pipeline.prepare()?;
//! // ... build trees from the alignments ...
//! let tables = pipeline.report(&prepared)?;
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod alignment; // Group base matrices and FASTA output
pub mod annotation; // GenBank feature lookup
pub mod filter; // Window, region and invariant-column filters
pub mod genomics; // Variant file parsing and batch loading
pub mod groups; // Defining-SNP classification
pub mod pipeline; // Orchestration
pub mod positions; // SNP position aggregation
pub mod ranking; // Strain-count ranking and tree-order sort
pub mod reference; // Best-reference resolution
pub mod report; // Summary tables
pub mod tree; // Newick trees and postorder traversal
/// Python bindings for the parser and window filter.
#[cfg(feature = "python-bindings")]
pub mod python_bindings;

use std::path::PathBuf;

use thiserror::Error;

pub use alignment::DEFAULT_MIXED_FRACTION;
pub use filter::{DEFAULT_THRESHOLD, DEFAULT_WINDOW_SIZE};
pub use genomics::{
    GvcfError, GvcfParser, StrainPositionMap, VariantCaller, VariantRecord,
    DEFAULT_FREEBAYES_MIN_QUALITY, DEFAULT_QUALITY_CUTOFF,
};
pub use pipeline::{OutputFile, Pipeline, Prepared, StrainOutcome, StrainStatus};

/// Configuration of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Folder holding one variant file per strain.
    pub input_dir: PathBuf,

    /// Dependency folder with reference tables, catalogs and GenBank files.
    pub dependency_dir: Option<PathBuf>,

    /// Root of the per-group FASTA alignments. Cleared on every run.
    pub alignment_dir: PathBuf,

    /// Folder receiving summary tables.
    pub summary_dir: PathBuf,

    /// Root of the per-group trees, laid out like `alignment_dir`. Must not
    /// lie inside `alignment_dir`, which is cleared on every run.
    pub tree_dir: PathBuf,

    /// Caller that produced the inputs.
    pub caller: VariantCaller,

    /// gVCF SNP quality cutoff (exclusive).
    pub quality_cutoff: f64,

    /// FreeBayes SNP quality floor (inclusive).
    pub freebayes_min_quality: f64,

    /// Width of the density window.
    pub window_size: u64,

    /// Neighbours tolerated inside the window.
    pub threshold: usize,

    /// Allele fraction under which a call is encoded as mixed.
    pub mixed_fraction: f64,

    /// Bases per FASTA line.
    pub line_width: usize,

    /// Parser threads; `0` uses all cores.
    pub threads: usize,

    /// Apply curated filter regions.
    pub filter_regions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(".", ".")
    }
}

impl PipelineConfig {
    /// Defaults reading from `input_dir`, writing `alignments/` and
    /// `summary/` under `output_dir` and reading trees from `trees/` there.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            input_dir: input_dir.into(),
            dependency_dir: None,
            alignment_dir: output_dir.join("alignments"),
            summary_dir: output_dir.join("summary"),
            tree_dir: output_dir.join("trees"),
            caller: VariantCaller::default(),
            quality_cutoff: DEFAULT_QUALITY_CUTOFF,
            freebayes_min_quality: DEFAULT_FREEBAYES_MIN_QUALITY,
            window_size: DEFAULT_WINDOW_SIZE,
            threshold: DEFAULT_THRESHOLD,
            mixed_fraction: DEFAULT_MIXED_FRACTION,
            line_width: alignment::DEFAULT_LINE_WIDTH,
            threads: 0,
            filter_regions: true,
        }
    }

    /// Set the dependency folder.
    pub fn with_dependency_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dependency_dir = Some(dir.into());
        self
    }

    /// Set the tree folder.
    pub fn with_tree_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tree_dir = dir.into();
        self
    }

    /// Set the variant caller.
    pub fn with_caller(mut self, caller: VariantCaller) -> Self {
        self.caller = caller;
        self
    }

    /// Set the gVCF quality cutoff.
    pub fn with_quality_cutoff(mut self, cutoff: f64) -> Self {
        self.quality_cutoff = cutoff;
        self
    }

    /// Set the FreeBayes quality floor.
    pub fn with_freebayes_min_quality(mut self, quality: f64) -> Self {
        self.freebayes_min_quality = quality;
        self
    }

    /// Set the density window width.
    pub fn with_window_size(mut self, window_size: u64) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the density threshold.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the mixed-call allele fraction.
    pub fn with_mixed_fraction(mut self, fraction: f64) -> Self {
        self.mixed_fraction = fraction;
        self
    }

    /// Set the FASTA line width.
    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    /// Set the parser thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Enable or disable curated region filtering.
    pub fn with_filter_regions(mut self, enabled: bool) -> Self {
        self.filter_regions = enabled;
        self
    }

    /// Check numeric parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.quality_cutoff.is_finite() || self.quality_cutoff < 0.0 {
            return Err(ConfigError::invalid("quality_cutoff", self.quality_cutoff));
        }
        if !self.freebayes_min_quality.is_finite() || self.freebayes_min_quality < 0.0 {
            return Err(ConfigError::invalid(
                "freebayes_min_quality",
                self.freebayes_min_quality,
            ));
        }
        if self.window_size == 0 {
            return Err(ConfigError::invalid("window_size", self.window_size));
        }
        if !(self.mixed_fraction > 0.0 && self.mixed_fraction <= 1.0) {
            return Err(ConfigError::invalid("mixed_fraction", self.mixed_fraction));
        }
        if self.line_width == 0 {
            return Err(ConfigError::invalid("line_width", self.line_width));
        }
        if self.tree_dir.starts_with(&self.alignment_dir) {
            return Err(ConfigError::invalid("tree_dir", self.tree_dir.display()));
        }
        Ok(())
    }
}

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A parameter lies outside its valid range.
    #[error("invalid {field}: {value}")]
    Invalid {
        /// Parameter name.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, value: impl ToString) -> Self {
        ConfigError::Invalid {
            field,
            value: value.to_string(),
        }
    }
}

/// Errors that abort a pipeline run.
///
/// A strain whose file fails to parse does not abort the run; it is reported
/// through [`StrainStatus`] instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input discovery failed.
    #[error(transparent)]
    Input(#[from] GvcfError),

    /// A curated table could not be read.
    #[error(transparent)]
    Catalog(#[from] reference::CatalogError),

    /// A tree file could not be read.
    #[error(transparent)]
    Tree(#[from] tree::TreeError),

    /// Column order undefined for a group.
    #[error(transparent)]
    Sort(#[from] ranking::SortError),

    /// Output could not be written.
    #[error(transparent)]
    Report(#[from] report::ReportError),

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
