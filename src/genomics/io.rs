use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use super::gvcf::GvcfError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Open a gzip-compressed text file for line reading.
pub fn open_gzip(path: &Path) -> Result<Box<dyn BufRead + Send>, GvcfError> {
    let file = File::open(path).map_err(|source| GvcfError::io(path, source))?;
    Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
}

/// Open a text file, transparently decompressing it when it carries the gzip magic bytes.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead + Send>, GvcfError> {
    let mut magic = [0u8; 2];
    let read = File::open(path)
        .and_then(|mut file| file.read(&mut magic))
        .map_err(|source| GvcfError::io(path, source))?;
    if read == 2 && magic == GZIP_MAGIC {
        return open_gzip(path);
    }
    let file = File::open(path).map_err(|source| GvcfError::io(path, source))?;
    Ok(Box::new(BufReader::new(file)))
}

/// List files in `dir` whose name contains `marker` (e.g. `.gvcf`), sorted by path.
///
/// An empty listing is an error.
pub fn discover_variant_files(
    dir: &Path,
    marker: &'static str,
) -> Result<Vec<PathBuf>, GvcfError> {
    let entries = fs::read_dir(dir).map_err(|source| GvcfError::io(dir, source))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| GvcfError::io(dir, source))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains(marker));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(GvcfError::NoInputs {
            dir: dir.to_path_buf(),
            marker,
        });
    }
    files.sort();
    Ok(files)
}

/// Strain name for a variant file: drop the final extension, then a trailing `.gvcf`.
///
/// `/data/03-1057.gvcf.gz` → `03-1057`.
pub fn strain_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_suffix(".gvcf") {
        Some(base) => base.to_string(),
        None => stem,
    }
}
