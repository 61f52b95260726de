use crate::genomics::{FilterClass, VariantRecord};

/// Allele fraction below which a call is treated as a mixed population.
pub const DEFAULT_MIXED_FRACTION: f64 = 0.8;

/// Gap written for deletions and missing cells.
pub const GAP: char = '-';

const IUPAC_CODES: [(char, &str); 12] = [
    ('R', "AG"),
    ('Y', "CT"),
    ('S', "CG"),
    ('W', "AT"),
    ('K', "GT"),
    ('M', "AC"),
    ('B', "CGT"),
    ('D', "AGT"),
    ('H', "ACT"),
    ('V', "ACG"),
    ('N', "ACGT"),
    (GAP, "-"),
];

/// Degenerate code whose component bases equal `bases` as a multiset.
pub fn iupac_code(bases: &[char]) -> Option<char> {
    let mut sorted = bases.to_vec();
    sorted.sort_unstable();
    IUPAC_CODES
        .iter()
        .find(|(_, components)| components.chars().eq(sorted.iter().copied()))
        .map(|(code, _)| *code)
}

/// Alignment character for a strain's call at one position.
///
/// Deletions become gaps. Mixed calls (first `VAF` value under
/// `mixed_fraction`, or `AC=1` for callers without `VAF`) become the IUPAC
/// code of their alleles; other calls take the first alternate base. `None`
/// means the alleles have no IUPAC code.
pub fn encode_call(record: &VariantRecord, mixed_fraction: f64) -> Option<char> {
    if record.filter_class == FilterClass::Deletion {
        return Some(GAP);
    }

    let vaf = record
        .stat("VAF")
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse::<f64>().ok());
    match vaf {
        Some(fraction) if fraction < mixed_fraction => {
            let alleles: Vec<char> = record.alt_base.chars().collect();
            iupac_code(&alleles)
        }
        Some(_) => record.first_alt(),
        None if record.stat("AC") == Some("1") => {
            let mut alleles = record.ref_base.chars().chain(record.alt_base.chars());
            match (alleles.next(), alleles.next(), alleles.next()) {
                (Some(reference), Some(alt), None) => iupac_code(&[reference, alt]),
                _ => None,
            }
        }
        None => record.first_alt(),
    }
}
