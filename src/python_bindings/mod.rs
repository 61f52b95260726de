//! Python bindings that expose the gVCF parser and window filter via PyO3.
use std::collections::BTreeSet;

use pyo3::{exceptions::PyRuntimeError, prelude::*, types::PyModule};

use crate::filter::WindowFilter;
use crate::genomics::GvcfParser;

/// Python-facing gVCF parser.
#[pyclass]
#[derive(Debug)]
pub struct PyGvcfParser {
    parser: GvcfParser,
}

#[pymethods]
impl PyGvcfParser {
    #[new]
    #[pyo3(signature = (quality_cutoff = crate::DEFAULT_QUALITY_CUTOFF))]
    /// Create a parser with the given SNP quality cutoff.
    pub fn new(quality_cutoff: f64) -> Self {
        Self {
            parser: GvcfParser::new(quality_cutoff),
        }
    }

    /// Parse one compressed gVCF.
    ///
    /// Args:
    ///     strain: Strain name attached to the records.
    ///     path: Path to the `.gvcf.gz` file.
    ///
    /// Returns:
    ///     List of `(chrom, position, class, ref, alt, length)` tuples.
    pub fn parse(
        &self,
        strain: &str,
        path: &str,
    ) -> PyResult<Vec<(String, u64, String, String, String, u64)>> {
        let map = self
            .parser
            .parse_path(strain, path)
            .map_err(|err| PyRuntimeError::new_err(err.to_string()))?;
        Ok(map
            .iter()
            .map(|(chrom, pos, record)| {
                (
                    chrom.to_string(),
                    pos,
                    record.filter_class.as_str().to_string(),
                    record.ref_base.clone(),
                    record.alt_base.clone(),
                    record.length,
                )
            })
            .collect())
    }
}

/// Apply the SNP density filter to one contig's positions.
#[pyfunction]
#[pyo3(signature = (positions, window_size = crate::DEFAULT_WINDOW_SIZE, threshold = crate::DEFAULT_THRESHOLD))]
pub fn window_filter(positions: Vec<u64>, window_size: u64, threshold: usize) -> Vec<u64> {
    let set: BTreeSet<u64> = positions.into_iter().collect();
    WindowFilter::new(window_size, threshold)
        .retain(&set)
        .into_iter()
        .collect()
}

/// Create Python module.
#[pymodule]
pub fn snptree_py(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyGvcfParser>()?;
    m.add_function(wrap_pyfunction!(window_filter, m)?)?;
    Ok(())
}
