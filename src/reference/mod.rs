//! Best-reference resolution.
//!
//! The dependency folder carries two lookup tables:
//!
//! * `mash/species_accessions.csv` : `accession,species` pairs naming each
//!   reference FASTA and its species code.
//! * `reference_links.csv` : `reference_file,relative_path` pairs locating the
//!   folder that holds a reference's curated catalogs.
//!
//! A strain's best reference (the first contig in its variant file, e.g.
//! `NC_017250.1`) is matched by accession stem (`NC_017250`) against those
//! file names.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Relative location of the accession → species table.
pub const SPECIES_ACCESSIONS: &str = "mash/species_accessions.csv";
/// Relative location of the reference → folder table.
pub const REFERENCE_LINKS: &str = "reference_links.csv";

/// Errors raised while reading curated reference tables.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The table exists but could not be opened.
    #[error("failed to open {path}: {source}")]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The table is not valid CSV.
    #[error("failed to parse {path}: {source}")]
    Csv {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// A required column header is absent.
    #[error("{path} has no '{column}' column")]
    MissingColumn {
        /// Offending file.
        path: PathBuf,
        /// Column name.
        column: &'static str,
    },
}

impl CatalogError {
    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        CatalogError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Open a curated table, returning `None` when the file does not exist.
pub(crate) fn open_optional(path: &Path) -> Result<Option<File>, CatalogError> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CatalogError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AccessionRow {
    accession: String,
    species: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LinkRow {
    reference_file: String,
    relative_path: String,
}

fn read_headerless<T, R>(path: &Path, reader: R) -> Result<Vec<T>, CatalogError>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|err| CatalogError::csv(path, err))
}

/// Text of a contig or file name up to the first `.`.
pub fn accession_stem(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Where a strain's best reference leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// Species code (falls back to the accession stem).
    pub species: String,
    /// Consolidated reference id shared by multi-contig references.
    pub reference_id: String,
    /// Folder holding catalogs and annotation for this reference.
    pub directory: Option<PathBuf>,
}

/// Species and folder lookups loaded from a dependency directory.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    root: PathBuf,
    accessions: Vec<(String, String)>,
    links: Vec<(String, String)>,
}

impl ReferenceCatalog {
    /// Catalog with no tables; every lookup falls back to the accession stem.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load both tables from `dependency_dir`. Missing tables are tolerated.
    pub fn load(dependency_dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let root = dependency_dir.as_ref().to_path_buf();

        let accessions_path = root.join(SPECIES_ACCESSIONS);
        let accessions = match open_optional(&accessions_path)? {
            Some(file) => read_headerless::<AccessionRow, _>(&accessions_path, file)?
                .into_iter()
                .map(|row| (row.accession, row.species))
                .collect(),
            None => {
                warn!(path = %accessions_path.display(), "species accession table not found");
                Vec::new()
            }
        };

        let links_path = root.join(REFERENCE_LINKS);
        let links = match open_optional(&links_path)? {
            Some(file) => read_headerless::<LinkRow, _>(&links_path, file)?
                .into_iter()
                .map(|row| (row.reference_file, row.relative_path))
                .collect(),
            None => {
                warn!(path = %links_path.display(), "reference link table not found");
                Vec::new()
            }
        };

        debug!(
            accessions = accessions.len(),
            links = links.len(),
            "loaded reference catalog"
        );
        Ok(Self {
            root,
            accessions,
            links,
        })
    }

    /// Build a catalog from in-memory tables rooted at `root`.
    pub fn from_tables(
        root: impl Into<PathBuf>,
        accessions: Vec<(String, String)>,
        links: Vec<(String, String)>,
    ) -> Self {
        Self {
            root: root.into(),
            accessions,
            links,
        }
    }

    /// Resolve a best reference to its species, consolidated id and folder.
    ///
    /// When several rows match, the last one wins.
    pub fn resolve(&self, best_reference: &str) -> ResolvedReference {
        let stem = accession_stem(best_reference);

        let accession = self
            .accessions
            .iter()
            .filter(|(file, _)| file.contains(stem))
            .last();
        let species = match accession {
            Some((_, species)) => species.clone(),
            None => {
                warn!(best_reference, "no species code for reference; using accession stem");
                stem.to_string()
            }
        };

        let reference_id = self
            .links
            .iter()
            .filter(|(file, _)| file.contains(stem))
            .last()
            .map(|(file, _)| accession_stem(file).to_string())
            .unwrap_or_else(|| stem.to_string());

        let directory = accession.and_then(|(file, _)| {
            self.links
                .iter()
                .find(|(reference, _)| reference == file)
                .map(|(_, link)| {
                    let parent = Path::new(link).parent().unwrap_or_else(|| Path::new(""));
                    self.root.join(parent)
                })
        });
        if directory.is_none() {
            debug!(best_reference, "no dependency folder for reference");
        }

        ResolvedReference {
            species,
            reference_id,
            directory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ReferenceCatalog {
        ReferenceCatalog::from_tables(
            "/deps",
            vec![
                ("NC_017251-NC_017250.fasta".into(), "suis1".into()),
                ("NC_002945v4.fasta".into(), "af".into()),
            ],
            vec![
                (
                    "NC_017251-NC_017250.fasta".into(),
                    "Brucella/suis1/NC_017251-NC_017250.fasta".into(),
                ),
                ("NC_002945v4.fasta".into(), "Mycobacterium/af/NC_002945v4.fasta".into()),
            ],
        )
    }

    #[test]
    fn multi_contig_reference_is_consolidated() {
        let resolved = catalog().resolve("NC_017250.1");
        assert_eq!(resolved.species, "suis1");
        assert_eq!(resolved.reference_id, "NC_017251-NC_017250");
        assert_eq!(
            resolved.directory,
            Some(PathBuf::from("/deps/Brucella/suis1"))
        );
    }

    #[test]
    fn versioned_accession_matches_by_stem() {
        let resolved = catalog().resolve("NC_002945.4");
        assert_eq!(resolved.species, "af");
        assert_eq!(resolved.reference_id, "NC_002945v4");
    }

    #[test]
    fn unknown_reference_falls_back_to_stem() {
        let resolved = ReferenceCatalog::empty().resolve("NC_0001.2");
        assert_eq!(
            resolved,
            ResolvedReference {
                species: "NC_0001".into(),
                reference_id: "NC_0001".into(),
                directory: None,
            }
        );
    }

    #[test]
    fn missing_tables_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ReferenceCatalog::load(dir.path()).unwrap();
        assert_eq!(catalog.resolve("NC_0001.1").species, "NC_0001");
    }
}
