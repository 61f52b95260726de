use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::genomics::Position;
use crate::groups::{ChromPositions, GroupPositionSet, ALL_GROUP};
use crate::reference::CatalogError;

/// Folder of per-contig region sheets inside a reference folder.
pub const FILTERED_REGIONS_DIR: &str = "Filtered_Regions";

/// Parse one region cell: a position or an inclusive `start-end` range.
///
/// Decimal positions (as exported by spreadsheets) are truncated.
pub fn parse_region(cell: &str) -> Option<Vec<Position>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    match cell.split_once('-') {
        Some((start, end)) => {
            let start: Position = start.trim().parse().ok()?;
            let end: Position = end.trim().parse().ok()?;
            Some((start..=end).collect())
        }
        None => cell
            .parse::<Position>()
            .ok()
            .or_else(|| {
                cell.parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite() && *value >= 0.0)
                    .map(|value| value.trunc() as Position)
            })
            .map(|pos| vec![pos]),
    }
}

/// Curated positions to exclude, per contig and column header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRegions {
    sheets: BTreeMap<String, BTreeMap<String, BTreeSet<Position>>>,
}

impl FilterRegions {
    /// No regions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add positions under a contig sheet and column header.
    pub fn insert(&mut self, sheet: &str, header: &str, positions: impl IntoIterator<Item = Position>) {
        self.sheets
            .entry(sheet.to_string())
            .or_default()
            .entry(header.to_string())
            .or_default()
            .extend(positions);
    }

    /// True when a contig has a sheet.
    pub fn has_sheet(&self, sheet: &str) -> bool {
        self.sheets.contains_key(sheet)
    }

    /// Read one sheet from CSV text whose header row names the columns.
    pub fn read_sheet<R: Read>(
        &mut self,
        sheet: &str,
        path: &Path,
        reader: R,
    ) -> Result<(), CatalogError> {
        let mut csv = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv
            .headers()
            .map_err(|err| CatalogError::csv(path, err))?
            .clone();
        let sheet_entry = self.sheets.entry(sheet.to_string()).or_default();
        for header in headers.iter().filter(|h| !h.is_empty()) {
            sheet_entry.entry(header.to_string()).or_default();
        }
        for row in csv.records() {
            let row = row.map_err(|err| CatalogError::csv(path, err))?;
            for (header, cell) in headers.iter().zip(row.iter()) {
                if header.is_empty() || cell.is_empty() {
                    continue;
                }
                match parse_region(cell) {
                    Some(positions) => sheet_entry
                        .entry(header.to_string())
                        .or_default()
                        .extend(positions),
                    None => warn!(sheet, header, cell, "skipping unparsable filter region"),
                }
            }
        }
        Ok(())
    }

    /// Load every `*.csv` sheet in `<reference_dir>/Filtered_Regions`. A missing
    /// folder adds nothing.
    pub fn load_dir(&mut self, reference_dir: &Path) -> Result<(), CatalogError> {
        let dir = reference_dir.join(FILTERED_REGIONS_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "no filtered regions");
                return Ok(());
            }
            Err(source) => return Err(CatalogError::Io { path: dir, source }),
        };
        let mut sheets = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| CatalogError::Io {
                    path: dir.clone(),
                    source,
                })?
                .path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                sheets.push(path);
            }
        }
        sheets.sort();
        for path in sheets {
            let Some(sheet) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let file = fs::File::open(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            self.read_sheet(&sheet, &path, file)?;
            debug!(sheet, "loaded filtered regions");
        }
        Ok(())
    }

    /// Positions excluded for `group` on contig `sheet`: the union of every
    /// column whose header contains `All` or equals the group.
    pub fn excluded(&self, sheet: &str, group: &str) -> BTreeSet<Position> {
        self.sheets
            .get(sheet)
            .into_iter()
            .flat_map(|columns| columns.iter())
            .filter(|(header, _)| header.contains(ALL_GROUP) || header.as_str() == group)
            .flat_map(|(_, positions)| positions.iter().copied())
            .collect()
    }

    /// Remove excluded positions from one group.
    pub fn apply_group(&self, group: &str, positions: &ChromPositions) -> ChromPositions {
        positions
            .iter()
            .map(|(chrom, set)| {
                let excluded = self.excluded(chrom, group);
                (chrom.clone(), set.difference(&excluded).copied().collect())
            })
            .collect()
    }

    /// Remove excluded positions from every group.
    pub fn apply(&self, set: &GroupPositionSet) -> GroupPositionSet {
        set.map_positions(|_, group, entry| self.apply_group(group, &entry.positions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("524691", Some(vec![524691]); "single")]
    #[test_case("524691.0", Some(vec![524691]); "spreadsheet float")]
    #[test_case("10-12", Some(vec![10, 11, 12]); "inclusive range")]
    #[test_case("", None; "blank")]
    #[test_case("abc", None; "text")]
    fn region_cells(cell: &str, expected: Option<Vec<Position>>) {
        assert_eq!(parse_region(cell), expected);
    }

    #[test]
    fn all_columns_apply_to_every_group() {
        let text = "Bsuis1-All,Group_2\n100,300\n200-202,\n";
        let mut regions = FilterRegions::new();
        regions
            .read_sheet("NC_017250.1", Path::new("mem.csv"), text.as_bytes())
            .unwrap();

        let excluded = regions.excluded("NC_017250.1", "Group_2");
        assert_eq!(excluded.into_iter().collect::<Vec<_>>(), vec![100, 200, 201, 202, 300]);
        let excluded = regions.excluded("NC_017250.1", "Group_1");
        assert!(!excluded.contains(&300));
        assert!(regions.excluded("NC_999", "All").is_empty());
    }

    #[test]
    fn apply_group_removes_listed_positions() {
        let mut regions = FilterRegions::new();
        regions.insert("NC_0001", "All", [50]);
        let positions: ChromPositions = [("NC_0001".to_string(), [50, 60].into_iter().collect())]
            .into_iter()
            .collect();

        let filtered = regions.apply_group("G1", &positions);
        assert_eq!(filtered["NC_0001"].iter().copied().collect::<Vec<_>>(), vec![60]);
    }
}
