use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{GroupAlignment, SequenceRow, GAP};
use crate::genomics::Position;
use crate::report::ReportError;

/// Bases per FASTA sequence line.
pub const DEFAULT_LINE_WIDTH: usize = 60;

fn write_record<W: Write>(
    out: &mut W,
    name: &str,
    row: &SequenceRow,
    columns: &[(String, Position)],
    line_width: usize,
) -> std::io::Result<()> {
    writeln!(out, ">{name}")?;
    let sequence: Vec<char> = columns
        .iter()
        .map(|(chrom, pos)| {
            row.get(chrom)
                .and_then(|bases| bases.get(pos))
                .copied()
                .unwrap_or(GAP)
        })
        .collect();
    let mut buf = [0u8; 4];
    for line in sequence.chunks(line_width.max(1)) {
        for base in line {
            out.write_all(base.encode_utf8(&mut buf).as_bytes())?;
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Write a group alignment as multi-FASTA: the reference record first, then
/// strains in name order. Cells without a call are gaps.
pub fn write_fasta<W: Write>(
    alignment: &GroupAlignment,
    out: &mut W,
    line_width: usize,
) -> std::io::Result<()> {
    let columns = alignment.columns();
    write_record(
        out,
        &alignment.reference_id,
        &alignment.reference,
        &columns,
        line_width,
    )?;
    for (strain, row) in &alignment.strains {
        write_record(out, strain, row, &columns, line_width)?;
    }
    Ok(())
}

/// Writes group alignments under `<root>/<species>/<group>/<group>_alignment.fasta`.
#[derive(Debug, Clone)]
pub struct FastaWriter {
    root: PathBuf,
    line_width: usize,
}

impl FastaWriter {
    /// Writer rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            line_width: DEFAULT_LINE_WIDTH,
        }
    }

    /// Set the sequence line width.
    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    /// Output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove any alignments left by an earlier run.
    pub fn clear(&self) -> Result<(), ReportError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ReportError::io(&self.root, source)),
        }
    }

    /// Path of a group's alignment file.
    pub fn path_for(&self, species: &str, group: &str) -> PathBuf {
        self.root
            .join(species)
            .join(group)
            .join(format!("{group}_alignment.fasta"))
    }

    /// Write one alignment, returning its path.
    pub fn write(&self, alignment: &GroupAlignment) -> Result<PathBuf, ReportError> {
        let path = self.path_for(&alignment.species, &alignment.group);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ReportError::io(parent, source))?;
        }
        let file = File::create(&path).map_err(|source| ReportError::io(&path, source))?;
        let mut out = BufWriter::new(file);
        write_fasta(alignment, &mut out, self.line_width)
            .and_then(|()| out.flush())
            .map_err(|source| ReportError::io(&path, source))?;
        debug!(
            path = %path.display(),
            strains = alignment.strains.len(),
            columns = alignment.column_count(),
            "wrote alignment"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alignment() -> GroupAlignment {
        let mut alignment = GroupAlignment {
            species: "sp".into(),
            group: "All".into(),
            reference_id: "NC_0001".into(),
            ..GroupAlignment::default()
        };
        alignment.reference.insert(
            "NC_0001".into(),
            [(5, 'A'), (9, 'C'), (12, 'T')].into_iter().collect(),
        );
        let mut row = SequenceRow::new();
        row.insert("NC_0001".into(), [(5, 'G'), (9, 'C')].into_iter().collect());
        alignment.strains.insert("s1".into(), row);
        alignment
    }

    #[test]
    fn reference_first_and_gaps_for_missing_cells() {
        let mut out = Vec::new();
        write_fasta(&alignment(), &mut out, 60).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">NC_0001\nACT\n>s1\nGC-\n");
    }

    #[test]
    fn long_sequences_wrap() {
        let mut out = Vec::new();
        write_fasta(&alignment(), &mut out, 2).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">NC_0001\nAC\nT\n>s1\nGC\n-\n");
    }

    #[test]
    fn multibyte_bases_are_written_whole() {
        let mut alignment = alignment();
        alignment
            .strains
            .get_mut("s1")
            .unwrap()
            .get_mut("NC_0001")
            .unwrap()
            .insert(12, 'Ñ');
        let mut out = Vec::new();
        write_fasta(&alignment, &mut out, 2).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">NC_0001\nAC\nT\n>s1\nGC\nÑ\n");
    }

    #[test]
    fn writer_uses_nested_layout() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FastaWriter::new(dir.path().join("alignments"));
        let path = writer.write(&alignment()).unwrap();
        assert_eq!(path, dir.path().join("alignments/sp/All/All_alignment.fasta"));
        assert!(path.is_file());
        writer.clear().unwrap();
        assert!(!path.exists());
    }
}
