//! Variant file parsing.
//!
//! Turns caller output (compressed gVCF, or plain FreeBayes VCF) into one
//! [`StrainPositionMap`] per strain, classifying each position as a SNP, an
//! insertion or a zero-depth deletion.

mod gvcf;
mod io;
mod loader;
mod record;
mod types;
mod vcf;

pub use gvcf::{GvcfError, GvcfParser, DEFAULT_QUALITY_CUTOFF};
pub use io::{discover_variant_files, open_gzip, open_text, strain_name};
pub use record::GVCF_FIELD_COUNT;
pub use loader::{
    discover_inputs, summarise, BatchLoad, BatchLoader, StrainFailure, StrainInput,
    StrainSummary, VariantCaller,
};
pub use types::{FilterClass, Position, RecordStats, StrainPositionMap, VariantRecord};
pub use vcf::{VcfParser, DEFAULT_FREEBAYES_MIN_QUALITY};
