use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::genomics::Position;
use crate::reference::{open_optional, CatalogError};

/// Curated file of defining SNPs inside a reference folder.
pub const DEFINING_SNPS_FILE: &str = "DefiningSNPsGroupDesignations.csv";

const GROUPING_COLUMN: &str = "Grouping";
const POSITION_COLUMN: &str = "Absolute position";
/// Column indexes of the optional secondary grouping pair.
const SECONDARY_COLUMNS: (usize, usize) = (3, 4);
const INVERTED_MARKER: char = '!';

/// A marker position whose SNP assigns a strain to a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefiningSnp {
    /// Group label.
    pub group: String,
    /// Reference label as written in the catalog.
    pub reference: String,
    /// 1-based marker position.
    pub position: Position,
    /// Marker carried a trailing `!`.
    pub inverted: bool,
}

impl DefiningSnp {
    /// Parse an `"{reference}-{position}"` cell, with an optional trailing `!`.
    ///
    /// Returns `None` for blank or malformed cells.
    pub fn parse(group: &str, cell: &str) -> Option<Self> {
        let mut parts = cell.trim().split('-');
        let (reference, raw) = match (parts.next(), parts.next(), parts.next()) {
            (Some(reference), Some(raw), None) => (reference, raw.trim()),
            _ => return None,
        };
        let inverted = raw.ends_with(INVERTED_MARKER);
        let position = raw.trim_end_matches(INVERTED_MARKER).parse().ok()?;
        Some(Self {
            group: group.to_string(),
            reference: reference.to_string(),
            position,
            inverted,
        })
    }
}

/// Defining SNPs per species, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefiningSnpCatalog {
    species: Vec<(String, Vec<DefiningSnp>)>,
}

impl DefiningSnpCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a marker. A group already present for the species is replaced in place.
    pub fn insert(&mut self, species: &str, snp: DefiningSnp) {
        let entries = match self.species.iter().position(|(name, _)| name == species) {
            Some(idx) => &mut self.species[idx].1,
            None => {
                self.species.push((species.to_string(), Vec::new()));
                let last = self.species.len() - 1;
                &mut self.species[last].1
            }
        };
        if snp.inverted {
            warn!(
                species,
                group = %snp.group,
                position = snp.position,
                "inverted defining SNP; membership is still presence-based"
            );
        }
        match entries.iter_mut().find(|existing| existing.group == snp.group) {
            Some(existing) => *existing = snp,
            None => entries.push(snp),
        }
    }

    /// True when the species already has catalog entries.
    pub fn contains_species(&self, species: &str) -> bool {
        self.species.iter().any(|(name, _)| name == species)
    }

    /// Markers for one species.
    pub fn species(&self, species: &str) -> &[DefiningSnp] {
        self.species
            .iter()
            .find(|(name, _)| name == species)
            .map(|(_, entries)| entries.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate `(species, marker)` in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DefiningSnp)> {
        self.species
            .iter()
            .flat_map(|(name, entries)| entries.iter().map(move |snp| (name.as_str(), snp)))
    }

    /// Number of markers across all species.
    pub fn len(&self) -> usize {
        self.species.iter().map(|(_, entries)| entries.len()).sum()
    }

    /// True when no marker is loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a species' markers from CSV text with a header row.
    pub fn read_species<R: Read>(
        &mut self,
        species: &str,
        path: &Path,
        reader: R,
    ) -> Result<(), CatalogError> {
        let mut csv = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv.headers().map_err(|err| CatalogError::csv(path, err))?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| CatalogError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name,
                })
        };
        let grouping = column(GROUPING_COLUMN)?;
        let position = column(POSITION_COLUMN)?;

        let mut primary = Vec::new();
        let mut secondary = Vec::new();
        for row in csv.records() {
            let row = row.map_err(|err| CatalogError::csv(path, err))?;
            for ((group_idx, cell_idx), sink) in [
                ((grouping, position), &mut primary),
                (SECONDARY_COLUMNS, &mut secondary),
            ] {
                let (Some(group), Some(cell)) = (row.get(group_idx), row.get(cell_idx)) else {
                    continue;
                };
                if group.is_empty() {
                    continue;
                }
                match DefiningSnp::parse(group, cell) {
                    Some(snp) => sink.push(snp),
                    None => debug!(group, cell, "skipping unparsable defining SNP"),
                }
            }
        }
        for snp in primary.into_iter().chain(secondary) {
            self.insert(species, snp);
        }
        Ok(())
    }

    /// Load a species' catalog file. Returns `false` when the file is absent.
    pub fn load_species(&mut self, species: &str, path: &Path) -> Result<bool, CatalogError> {
        match open_optional(path)? {
            Some(file) => {
                self.read_species(species, path, file)?;
                debug!(species, markers = self.species(species).len(), "loaded defining SNPs");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
