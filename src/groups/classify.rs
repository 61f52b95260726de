use std::collections::BTreeMap;

use super::catalog::DefiningSnpCatalog;
use crate::positions::StrainSnps;

/// Label every strain belongs to.
pub const ALL_GROUP: &str = "All";

/// Assign group labels to one strain.
///
/// `All` always comes first, followed by every catalog group (across all
/// species) whose marker position is among the strain's SNPs. A marker is
/// tested against each contig of the strain and appended once per contig that
/// carries it; repeated labels are kept.
pub fn groups_for_strain(snps: &StrainSnps, catalog: &DefiningSnpCatalog) -> Vec<String> {
    let mut groups = vec![ALL_GROUP.to_string()];
    for (_, marker) in catalog.iter() {
        for positions in snps.positions.values() {
            if positions.contains(&marker.position) {
                groups.push(marker.group.clone());
            }
        }
    }
    groups
}

/// Assign group labels to every strain.
pub fn determine_groups(
    strains: &BTreeMap<String, StrainSnps>,
    catalog: &DefiningSnpCatalog,
) -> BTreeMap<String, Vec<String>> {
    strains
        .iter()
        .map(|(strain, snps)| (strain.clone(), groups_for_strain(snps, catalog)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::DefiningSnp;

    fn strain(positions: &[(&str, &[u64])]) -> StrainSnps {
        StrainSnps {
            reference_id: "ref".into(),
            positions: positions
                .iter()
                .map(|(chrom, list)| (chrom.to_string(), list.to_vec()))
                .collect(),
        }
    }

    fn catalog() -> DefiningSnpCatalog {
        let mut catalog = DefiningSnpCatalog::new();
        for (species, cell, group) in [
            ("af", "NC_002945-100", "Group_1"),
            ("af", "NC_002945-300!", "Group_3"),
            ("suis1", "NC_017250-200", "Suis_A"),
        ] {
            catalog.insert(species, DefiningSnp::parse(group, cell).unwrap());
        }
        catalog
    }

    #[test]
    fn all_comes_first_then_catalog_order() {
        let snps = strain(&[("NC_002945.4", &[300, 100, 55])]);
        assert_eq!(
            groups_for_strain(&snps, &catalog()),
            vec!["All", "Group_1", "Group_3"]
        );
    }

    #[test]
    fn strain_without_markers_is_only_in_all() {
        let snps = strain(&[("NC_002945.4", &[1, 2, 3])]);
        assert_eq!(groups_for_strain(&snps, &catalog()), vec!["All"]);
    }

    #[test]
    fn marker_matches_on_any_contig() {
        let snps = strain(&[("NC_017250.1", &[200]), ("NC_017251.1", &[200])]);
        assert_eq!(
            groups_for_strain(&snps, &catalog()),
            vec!["All", "Suis_A", "Suis_A"]
        );
    }
}
