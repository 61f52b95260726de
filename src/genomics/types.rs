use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// 1-based offset within a reference contig.
pub type Position = u64;

/// Caller-specific annotations (FORMAT/sample pairs or INFO pairs).
///
/// Shared behind an `Arc` because a single deletion block expands into one
/// record per covered position.
pub type RecordStats = Arc<BTreeMap<String, String>>;

/// Classification assigned to a parsed variant line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterClass {
    /// Single-base substitution passing the caller filter and quality cutoff.
    Pass,
    /// Passing call with an alternate allele longer than one base.
    Insertion,
    /// Zero-depth reference block (or zero-depth site).
    Deletion,
}

impl FilterClass {
    /// Label used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterClass::Pass => "PASS",
            FilterClass::Insertion => "INSERTION",
            FilterClass::Deletion => "DELETION",
        }
    }
}

impl fmt::Display for FilterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed call for one position of one strain against one contig.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    /// Reference contig identifier.
    pub chrom: Arc<str>,
    /// Reference base(s).
    pub ref_base: String,
    /// Alternate allele candidates concatenated in call order.
    pub alt_base: String,
    /// QUAL column; `None` when the caller wrote `.`.
    pub quality: Option<f64>,
    /// Span of the event.
    pub length: u64,
    /// Classification of the call.
    pub filter_class: FilterClass,
    /// Opaque caller annotations.
    pub stats: RecordStats,
}

impl VariantRecord {
    /// Look up a caller annotation by key.
    pub fn stat(&self, key: &str) -> Option<&str> {
        self.stats.get(key).map(String::as_str)
    }

    /// First alternate base, if any.
    pub fn first_alt(&self) -> Option<char> {
        self.alt_base.chars().next()
    }
}

/// All classified positions of a single strain, keyed by contig then position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrainPositionMap {
    /// Strain identifier.
    pub strain: String,
    /// First contig named in the file.
    pub best_reference: String,
    /// Every contig seen in the file.
    pub chromosomes: BTreeSet<String>,
    /// contig → position → record.
    pub records: BTreeMap<String, BTreeMap<Position, VariantRecord>>,
}

impl StrainPositionMap {
    /// Create an empty map for a strain.
    pub fn new(strain: impl Into<String>) -> Self {
        Self {
            strain: strain.into(),
            ..Self::default()
        }
    }

    /// Register a contig, keeping the first one as the best reference.
    pub(crate) fn observe_chromosome(&mut self, chrom: &str) {
        if self.best_reference.is_empty() {
            self.best_reference = chrom.to_string();
        }
        if !self.chromosomes.contains(chrom) {
            self.chromosomes.insert(chrom.to_string());
            self.records.entry(chrom.to_string()).or_default();
        }
    }

    /// Store a record, replacing any earlier call at the same position.
    pub(crate) fn insert(&mut self, chrom: &str, position: Position, record: VariantRecord) {
        self.records
            .entry(chrom.to_string())
            .or_default()
            .insert(position, record);
    }

    /// Record at a contig position.
    pub fn get(&self, chrom: &str, position: Position) -> Option<&VariantRecord> {
        self.records.get(chrom).and_then(|positions| positions.get(&position))
    }

    /// Total number of stored positions across all contigs.
    pub fn len(&self) -> usize {
        self.records.values().map(BTreeMap::len).sum()
    }

    /// True when no position was retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate `(contig, position, record)` in contig then position order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Position, &VariantRecord)> {
        self.records.iter().flat_map(|(chrom, positions)| {
            positions
                .iter()
                .map(move |(pos, record)| (chrom.as_str(), *pos, record))
        })
    }
}
