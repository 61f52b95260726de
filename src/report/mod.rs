//! Summary tables and output fingerprints.
//!
//! A summary table lays out a group's sorted SNP columns as one CSV row per
//! strain, framed by a reference row on top and an annotation row at the
//! bottom.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::alignment::GroupAlignment;
use crate::annotation::AnnotationIndex;
use crate::genomics::Position;
use crate::ranking::SortedSnps;

/// Errors raised while writing alignments and tables.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem failure.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding failure.
    #[error("failed to write table {path}: {source}")]
    Csv {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },
}

impl ReportError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Label of the first column.
pub const STRAIN_HEADER: &str = "Strain";
/// Label of the trailing annotation row.
pub const ANNOTATION_ROW: &str = "Annotation";

/// In-memory summary table of one group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SummaryTable {
    /// Species code.
    pub species: String,
    /// Group label.
    pub group: String,
    /// Header row.
    pub header: Vec<String>,
    /// Body rows, reference first and annotation last.
    pub rows: Vec<Vec<String>>,
}

impl SummaryTable {
    /// Lay out `sorted` columns of `alignment`.
    ///
    /// Strain rows follow `tree_order`; names the alignment does not hold and
    /// the reference itself are skipped. A strain without a cell shows the
    /// reference base.
    pub fn build(
        alignment: &GroupAlignment,
        sorted: &SortedSnps,
        tree_order: &[String],
        annotations: &AnnotationIndex,
    ) -> Self {
        let columns = sorted.columns();

        let mut header = Vec::with_capacity(columns.len() + 1);
        header.push(STRAIN_HEADER.to_string());
        header.extend(columns.iter().map(|(chrom, pos)| format!("{chrom}_{pos}")));

        let reference_cell = |chrom: &str, pos: Position| {
            alignment
                .reference_base(chrom, pos)
                .map(String::from)
                .unwrap_or_default()
        };

        let mut rows = Vec::with_capacity(tree_order.len() + 2);
        let mut reference_row = vec![alignment.reference_id.clone()];
        reference_row.extend(
            columns
                .iter()
                .map(|(chrom, pos)| reference_cell(chrom.as_str(), *pos)),
        );
        rows.push(reference_row);

        for strain in tree_order
            .iter()
            .filter(|strain| **strain != alignment.reference_id)
            .filter(|strain| alignment.strains.contains_key(*strain))
        {
            let mut row = vec![strain.clone()];
            row.extend(columns.iter().map(|(chrom, pos)| {
                alignment
                    .strain_base(strain, chrom, *pos)
                    .map(String::from)
                    .unwrap_or_else(|| reference_cell(chrom.as_str(), *pos))
            }));
            rows.push(row);
        }

        let mut annotation_row = vec![ANNOTATION_ROW.to_string()];
        annotation_row.extend(
            columns
                .iter()
                .map(|(chrom, pos)| annotations.lookup(chrom, *pos).to_string()),
        );
        rows.push(annotation_row);

        Self {
            species: alignment.species.clone(),
            group: alignment.group.clone(),
            header,
            rows,
        }
    }

    /// Number of SNP columns.
    pub fn column_count(&self) -> usize {
        self.header.len().saturating_sub(1)
    }

    /// Serialise as CSV.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), csv::Error> {
        let mut writer = csv::WriterBuilder::new().flexible(false).from_writer(out);
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Writes summary tables as `<root>/<species>_<group>_sorted_table.csv`.
#[derive(Debug, Clone)]
pub struct SummaryWriter {
    root: PathBuf,
}

impl SummaryWriter {
    /// Writer rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a group's table.
    pub fn path_for(&self, species: &str, group: &str) -> PathBuf {
        self.root.join(format!("{species}_{group}_sorted_table.csv"))
    }

    /// Write one table, returning its path.
    pub fn write(&self, table: &SummaryTable) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.root).map_err(|source| ReportError::io(&self.root, source))?;
        let path = self.path_for(&table.species, &table.group);
        let file = File::create(&path).map_err(|source| ReportError::io(&path, source))?;
        table
            .write_csv(BufWriter::new(file))
            .map_err(|source| ReportError::Csv {
                path: path.clone(),
                source,
            })?;
        debug!(
            path = %path.display(),
            columns = table.column_count(),
            rows = table.rows.len(),
            "wrote summary table"
        );
        Ok(path)
    }
}

/// Hex blake3 digest of a written file.
pub fn digest_file(path: &Path) -> Result<String, ReportError> {
    let bytes = fs::read(path).map_err(|source| ReportError::io(path, source))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
