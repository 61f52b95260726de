use std::io::BufRead;

use crate::genomics::Position;

/// Qualifier values kept for annotation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Feature {
    /// Feature key (`gene`, `CDS`, ...).
    pub kind: String,
    /// First position covered (1-based, inclusive).
    pub start: Position,
    /// Last position covered (1-based, inclusive).
    pub end: Position,
    /// `/locus_tag`.
    pub locus_tag: Option<String>,
    /// `/gene`.
    pub gene: Option<String>,
    /// `/product`.
    pub product: Option<String>,
}

impl Feature {
    /// True when `position` lies inside the feature.
    pub fn covers(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }
}

/// One GenBank record: its versioned id and annotated features.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenbankRecord {
    /// `VERSION` accession (falls back to `ACCESSION`, then the `LOCUS` name).
    pub id: String,
    /// Features other than `source`, in file order.
    pub features: Vec<Feature>,
}

const FEATURE_INDENT: usize = 5;
const QUALIFIER_INDENT: usize = 21;

#[derive(Debug, Default)]
struct PendingFeature {
    kind: String,
    location: String,
    qualifiers: Vec<(String, String)>,
    in_location: bool,
}

impl PendingFeature {
    fn finish(self) -> Option<Feature> {
        if self.kind == "source" {
            return None;
        }
        let (start, end) = location_bounds(&self.location)?;
        let first = |key: &str| {
            self.qualifiers
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        };
        Some(Feature {
            locus_tag: first("locus_tag"),
            gene: first("gene"),
            product: first("product"),
            kind: self.kind,
            start,
            end,
        })
    }

    fn push_qualifier_line(&mut self, text: &str) {
        if let Some(rest) = text.strip_prefix('/') {
            self.in_location = false;
            let (key, value) = match rest.split_once('=') {
                Some((key, value)) => (key, value),
                None => (rest, ""),
            };
            self.qualifiers.push((key.to_string(), value.to_string()));
        } else if self.in_location {
            self.location.push_str(text);
        } else if let Some((_, value)) = self.qualifiers.last_mut() {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(text);
        }
    }
}

/// Smallest and largest integer in a location string such as
/// `complement(join(100..200,300..>400))`.
pub fn location_bounds(location: &str) -> Option<(Position, Position)> {
    location
        .split(|c: char| !c.is_ascii_digit())
        .filter_map(|digits| digits.parse::<Position>().ok())
        .fold(None, |bounds, value| match bounds {
            None => Some((value, value)),
            Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
        })
}

fn clean_value(value: &str) -> String {
    value.trim().trim_matches('"').replace("\"\"", "\"")
}

fn flush(pending: &mut Option<PendingFeature>, record: &mut GenbankRecord) {
    if let Some(feature) = pending.take().and_then(PendingFeature::finish) {
        record.features.push(feature);
    }
}

/// Parse every record of a GenBank flat file.
pub fn parse_genbank<R: BufRead>(reader: R) -> std::io::Result<Vec<GenbankRecord>> {
    let mut records = Vec::new();
    let mut record = GenbankRecord::default();
    let mut accession: Option<String> = None;
    let mut locus: Option<String> = None;
    let mut in_features = false;
    let mut pending: Option<PendingFeature> = None;

    for line in reader.lines() {
        let line = line?;
        if line.starts_with("//") {
            flush(&mut pending, &mut record);
            if record.id.is_empty() {
                record.id = accession.take().or(locus.take()).unwrap_or_default();
            }
            records.push(std::mem::take(&mut record));
            accession = None;
            locus = None;
            in_features = false;
            continue;
        }

        let first_word = || line.split_whitespace().nth(1).map(str::to_string);
        if line.starts_with("LOCUS") {
            locus = first_word();
        } else if line.starts_with("ACCESSION") {
            accession = first_word();
        } else if line.starts_with("VERSION") {
            record.id = first_word().unwrap_or_default();
        } else if line.starts_with("FEATURES") {
            in_features = true;
        } else if in_features && !line.starts_with(' ') {
            // ORIGIN, CONTIG, BASE COUNT: end of the feature table.
            flush(&mut pending, &mut record);
            in_features = false;
        } else if in_features {
            let indent = line.len() - line.trim_start().len();
            let text = line.trim();
            if indent == FEATURE_INDENT {
                flush(&mut pending, &mut record);
                let mut parts = text.splitn(2, char::is_whitespace);
                let kind = parts.next().unwrap_or_default().to_string();
                let location = parts.next().unwrap_or_default().trim().to_string();
                pending = Some(PendingFeature {
                    kind,
                    location,
                    qualifiers: Vec::new(),
                    in_location: true,
                });
            } else if indent >= QUALIFIER_INDENT {
                if let Some(feature) = pending.as_mut() {
                    feature.push_qualifier_line(text);
                }
            }
        }
    }
    flush(&mut pending, &mut record);
    if !record.features.is_empty() || !record.id.is_empty() {
        if record.id.is_empty() {
            record.id = accession.or(locus).unwrap_or_default();
        }
        records.push(record);
    }

    for record in &mut records {
        for feature in &mut record.features {
            for value in [&mut feature.locus_tag, &mut feature.gene, &mut feature.product]
                .into_iter()
                .flatten()
            {
                *value = clean_value(value);
            }
        }
    }
    Ok(records)
}
