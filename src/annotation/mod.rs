//! SNP annotation from GenBank feature tables.
//!
//! A miss never fails: positions outside every usable feature get the
//! `None` sentinel in all three fields.

mod genbank;

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, warn};

pub use genbank::{location_bounds, parse_genbank, Feature, GenbankRecord};

use crate::genomics::Position;
use crate::reference::{accession_stem, CatalogError};

/// Text printed for an absent annotation field.
pub const NONE_SENTINEL: &str = "None";

/// Annotation of one SNP column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Annotation {
    /// `/locus_tag` of the covering feature.
    pub locus: Option<String>,
    /// `/gene` of the covering feature.
    pub gene: Option<String>,
    /// `/product` of the covering feature.
    pub product: Option<String>,
}

impl Annotation {
    /// True when no field is known.
    pub fn is_miss(&self) -> bool {
        self.locus.is_none() && self.gene.is_none() && self.product.is_none()
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |value: &Option<String>| value.as_deref().unwrap_or(NONE_SENTINEL).to_string();
        write!(
            f,
            "{};{};{}",
            field(&self.product),
            field(&self.gene),
            field(&self.locus)
        )
    }
}

/// Features per contig id, in file order.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    contigs: BTreeMap<String, Vec<Feature>>,
}

impl AnnotationIndex {
    /// Empty index; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add parsed records. Features of a repeated id are appended.
    pub fn extend(&mut self, records: impl IntoIterator<Item = GenbankRecord>) {
        for record in records {
            self.contigs
                .entry(record.id)
                .or_default()
                .extend(record.features);
        }
    }

    /// Index built from parsed records.
    pub fn from_records(records: impl IntoIterator<Item = GenbankRecord>) -> Self {
        let mut index = Self::new();
        index.extend(records);
        index
    }

    /// Parse every `*.gbk` file in `reference_dir`, in name order.
    pub fn load_dir(reference_dir: &Path) -> Result<Self, CatalogError> {
        let mut index = Self::new();
        let entries = match fs::read_dir(reference_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(dir = %reference_dir.display(), "annotation folder not found");
                return Ok(index);
            }
            Err(source) => {
                return Err(CatalogError::Io {
                    path: reference_dir.to_path_buf(),
                    source,
                })
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| CatalogError::Io {
                    path: reference_dir.to_path_buf(),
                    source,
                })?
                .path();
            if path.extension().is_some_and(|ext| ext == "gbk") {
                files.push(path);
            }
        }
        files.sort();

        for path in files {
            let io_error = |source: std::io::Error| CatalogError::Io {
                path: path.clone(),
                source,
            };
            let file = File::open(&path).map_err(io_error)?;
            let records = parse_genbank(BufReader::new(file)).map_err(io_error)?;
            debug!(path = %path.display(), records = records.len(), "loaded GenBank file");
            index.extend(records);
        }
        Ok(index)
    }

    /// Number of indexed contigs.
    pub fn contig_count(&self) -> usize {
        self.contigs.len()
    }

    fn features(&self, chrom: &str) -> Option<&[Feature]> {
        if let Some(features) = self.contigs.get(chrom) {
            return Some(features);
        }
        let stem = accession_stem(chrom);
        self.contigs
            .iter()
            .find(|(id, _)| accession_stem(id) == stem)
            .map(|(_, features)| features.as_slice())
    }

    /// Annotate a position on `chrom`.
    ///
    /// The last feature covering the position wins. Without a `locus_tag` or
    /// `product` the annotation is a miss; a missing `gene` alone leaves the
    /// other two fields set.
    pub fn lookup(&self, chrom: &str, position: Position) -> Annotation {
        let Some(feature) = self
            .features(chrom)
            .and_then(|features| features.iter().rev().find(|f| f.covers(position)))
        else {
            return Annotation::default();
        };
        match (&feature.locus_tag, &feature.product) {
            (Some(locus), Some(product)) => Annotation {
                locus: Some(locus.clone()),
                gene: feature.gene.clone(),
                product: Some(product.clone()),
            },
            _ => Annotation::default(),
        }
    }
}
