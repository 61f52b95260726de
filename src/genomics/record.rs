use std::collections::BTreeMap;
use std::io::BufRead;

use noodles_vcf as vcf;
use noodles_vcf::variant::record::AlternateBases as _;

use super::gvcf::GvcfError;
use super::types::Position;

/// Columns of a single-sample data line.
pub const GVCF_FIELD_COUNT: usize = 10;

/// Columns before FORMAT.
const FIXED_FIELD_COUNT: usize = 8;

/// Text of one decoded data line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordFields {
    pub chrom: String,
    pub pos: Position,
    pub reference: String,
    /// ALT alleles in order; empty for `.`.
    pub alternates: Vec<String>,
    pub quality: Option<f64>,
    pub filter: String,
    pub info: String,
    pub format: String,
    pub sample: String,
}

impl RecordFields {
    /// Pull the columns out of a record, enforcing the single-sample layout.
    pub(crate) fn decode(line: usize, record: &vcf::Record) -> Result<Self, GvcfError> {
        let samples = record.samples();
        let samples: &str = samples.as_ref();
        let trailing: Vec<&str> = if samples.is_empty() {
            Vec::new()
        } else {
            samples.split('\t').collect()
        };
        let found = FIXED_FIELD_COUNT + trailing.len();
        if found != GVCF_FIELD_COUNT {
            return Err(GvcfError::FieldCount {
                line,
                expected: GVCF_FIELD_COUNT,
                found,
            });
        }

        let pos = match record.variant_start() {
            Some(Ok(position)) => position.get() as Position,
            Some(Err(source)) => {
                return Err(GvcfError::InvalidField {
                    line,
                    field: "POS",
                    value: source.to_string(),
                })
            }
            None => {
                return Err(GvcfError::InvalidField {
                    line,
                    field: "POS",
                    value: "0".to_string(),
                })
            }
        };

        let quality = match record.quality_score() {
            None => None,
            Some(Ok(score)) => Some(f64::from(score)),
            Some(Err(source)) => {
                return Err(GvcfError::InvalidField {
                    line,
                    field: "QUAL",
                    value: source.to_string(),
                })
            }
        };

        let alternates = record
            .alternate_bases()
            .iter()
            .map(|allele| allele.map(str::to_string))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|source| GvcfError::InvalidField {
                line,
                field: "ALT",
                value: source.to_string(),
            })?;

        let filters = record.filters();
        let filter: &str = filters.as_ref();
        let info = record.info();
        let info: &str = info.as_ref();

        Ok(Self {
            chrom: record.reference_sequence_name().to_string(),
            pos,
            reference: record.reference_bases().to_string(),
            alternates,
            quality,
            filter: filter.to_string(),
            info: info.to_string(),
            format: trailing[0].to_string(),
            sample: trailing[1].trim_end().to_string(),
        })
    }

    /// ALT column as written, `.` when there is no alternate allele.
    pub(crate) fn alt_text(&self) -> String {
        if self.alternates.is_empty() {
            ".".to_string()
        } else {
            self.alternates.join(",")
        }
    }

    /// FORMAT keys paired with the sample's values.
    pub(crate) fn format_stats(&self) -> BTreeMap<String, String> {
        self.format
            .split(':')
            .zip(self.sample.split(':'))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    /// INFO entries as key/value pairs; flags map to an empty value.
    pub(crate) fn info_stats(&self) -> BTreeMap<String, String> {
        self.info
            .split(';')
            .filter(|entry| !entry.is_empty() && *entry != ".")
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (entry.to_string(), String::new()),
            })
            .collect()
    }
}

/// Read the header, then hand every decoded data line to `visit` with its
/// 1-based number counted from the first line after `#CHROM`.
pub(crate) fn for_each_record<R, F>(strain: &str, reader: R, mut visit: F) -> Result<(), GvcfError>
where
    R: BufRead,
    F: FnMut(usize, RecordFields) -> Result<(), GvcfError>,
{
    let mut reader = vcf::io::Reader::new(reader);
    reader.read_header().map_err(|source| GvcfError::Header {
        name: strain.to_string(),
        source,
    })?;

    let mut record = vcf::Record::default();
    let mut line = 0;
    loop {
        line += 1;
        match reader.read_record(&mut record) {
            Ok(0) => return Ok(()),
            Ok(_) => visit(line, RecordFields::decode(line, &record)?)?,
            Err(source) => return Err(GvcfError::Record { line, source }),
        }
    }
}

/// Parse a non-negative integer sub-field.
pub(crate) fn parse_integer(line: usize, field: &'static str, value: &str) -> Result<u64, GvcfError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| GvcfError::InvalidField {
            line,
            field,
            value: value.to_string(),
        })
}
