//! End-to-end orchestration.
//!
//! [`Pipeline::prepare`] runs parsing through alignment writing;
//! [`Pipeline::report`] consumes the trees built from those alignments and
//! writes the sorted, annotated summary tables.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::alignment::{AlignmentBuilder, FastaWriter, GroupAlignment};
use crate::annotation::AnnotationIndex;
use crate::filter::{remove_identical_calls, FilterRegions, WindowFilter};
use crate::genomics::{
    discover_inputs, summarise, BatchLoad, BatchLoader, StrainInput, StrainSummary,
};
use crate::groups::{determine_groups, DefiningSnpCatalog, GroupPositionSet, DEFINING_SNPS_FILE};
use crate::positions::SnpPositions;
use crate::ranking::{rank_snps, sort_snps, tree_mismatches, SortError};
use crate::reference::{accession_stem, ReferenceCatalog, ResolvedReference};
use crate::report::{digest_file, SummaryTable, SummaryWriter};
use crate::tree::{best_tree_path, read_tree_order, TreeError};
use crate::{PipelineConfig, PipelineError};

/// Result of one strain's parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrainOutcome {
    /// Parsed; call counts attached.
    Parsed(StrainSummary),
    /// Parse failed with this message.
    Failed(String),
}

/// Per-strain status line of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrainStatus {
    /// Strain identifier.
    pub strain: String,
    /// What happened.
    pub outcome: StrainOutcome,
}

impl StrainStatus {
    /// True for parsed strains.
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, StrainOutcome::Parsed(_))
    }
}

impl fmt::Display for StrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            StrainOutcome::Parsed(summary) => write!(
                f,
                "{}\tok\tsnps={}\tinserted={}\tdeleted={}",
                self.strain, summary.snps, summary.inserted_bases, summary.deleted_positions
            ),
            StrainOutcome::Failed(message) => write!(f, "{}\tfailed\t{}", self.strain, message),
        }
    }
}

/// A written artefact and its blake3 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Species code.
    pub species: String,
    /// Group label.
    pub group: String,
    /// Location on disk.
    pub path: PathBuf,
    /// Hex digest of the file contents.
    pub digest: String,
}

/// State handed from [`Pipeline::prepare`] to [`Pipeline::report`].
#[derive(Debug, Default)]
pub struct Prepared {
    /// One entry per discovered input, in discovery order.
    pub statuses: Vec<StrainStatus>,
    /// Filtered group alignments, in species then group order.
    pub alignments: Vec<GroupAlignment>,
    /// Written FASTA files.
    pub fastas: Vec<OutputFile>,
    /// species → folder holding its curated catalogs and annotation.
    pub reference_dirs: BTreeMap<String, PathBuf>,
}

impl Prepared {
    /// Strains that failed to parse.
    pub fn failures(&self) -> impl Iterator<Item = &StrainStatus> {
        self.statuses.iter().filter(|status| !status.is_ok())
    }
}

/// Runs the pipeline with one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

fn statuses(inputs: &[StrainInput], batch: &BatchLoad) -> Vec<StrainStatus> {
    inputs
        .iter()
        .filter_map(|input| {
            let outcome = match batch.failures.iter().find(|f| f.strain == input.strain) {
                Some(failure) => StrainOutcome::Failed(failure.error.to_string()),
                None => StrainOutcome::Parsed(summarise(batch.parsed.get(&input.strain)?)),
            };
            Some(StrainStatus {
                strain: input.strain.clone(),
                outcome,
            })
        })
        .collect()
}

impl Pipeline {
    /// Pipeline for a validated configuration.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn loader(&self) -> BatchLoader {
        BatchLoader::new(self.config.caller)
            .with_quality_cutoff(self.config.quality_cutoff)
            .with_freebayes_min_quality(self.config.freebayes_min_quality)
            .with_threads(self.config.threads)
    }

    fn load(&self) -> Result<(Vec<StrainInput>, BatchLoad), PipelineError> {
        let inputs = discover_inputs(&self.config.input_dir, self.config.caller)?;
        let batch = self.loader().load(&inputs)?;
        info!(
            parsed = batch.parsed.len(),
            failed = batch.failures.len(),
            "variant files parsed"
        );
        Ok((inputs, batch))
    }

    /// Parse every input and report per-strain call counts.
    pub fn summarize(&self) -> Result<Vec<StrainStatus>, PipelineError> {
        let (inputs, batch) = self.load()?;
        Ok(statuses(&inputs, &batch))
    }

    /// Parse, aggregate, classify and filter, then write one FASTA alignment
    /// per species/group.
    pub fn prepare(&self) -> Result<Prepared, PipelineError> {
        let (inputs, batch) = self.load()?;
        let statuses = statuses(&inputs, &batch);
        if batch.parsed.is_empty() {
            warn!("no strain parsed; nothing to align");
        }

        let catalog = match &self.config.dependency_dir {
            Some(dir) => ReferenceCatalog::load(dir)?,
            None => ReferenceCatalog::empty(),
        };
        let resolved: BTreeMap<&str, ResolvedReference> = batch
            .parsed
            .iter()
            .map(|(strain, map)| (strain.as_str(), catalog.resolve(&map.best_reference)))
            .collect();

        let positions = SnpPositions::aggregate(batch.parsed.values(), |map| {
            resolved
                .get(map.strain.as_str())
                .map(|reference| reference.reference_id.clone())
                .unwrap_or_else(|| accession_stem(&map.best_reference).to_string())
        });

        let mut reference_dirs = BTreeMap::new();
        for reference in resolved.values() {
            if let Some(dir) = &reference.directory {
                reference_dirs
                    .entry(reference.species.clone())
                    .or_insert_with(|| dir.clone());
            }
        }

        let mut defining = DefiningSnpCatalog::new();
        let mut regions = FilterRegions::new();
        for (species, dir) in &reference_dirs {
            if !defining.load_species(species, &dir.join(DEFINING_SNPS_FILE))? {
                info!(species = %species, "no defining SNP catalog; only the All group applies");
            }
            if self.config.filter_regions {
                regions.load_dir(dir)?;
            }
        }

        let strain_groups = determine_groups(&positions.strains, &defining);
        let groups = GroupPositionSet::build(&positions.strains, &strain_groups, |strain| {
            resolved
                .get(strain)
                .map(|reference| reference.species.clone())
                .unwrap_or_default()
        });
        let mut filtered = WindowFilter::new(self.config.window_size, self.config.threshold)
            .apply(&groups);
        if self.config.filter_regions {
            filtered = regions.apply(&filtered);
        }
        info!(groups = filtered.group_count(), "group positions filtered");

        let builder = AlignmentBuilder::new(&batch.parsed, &positions)
            .with_mixed_fraction(self.config.mixed_fraction);
        let writer =
            FastaWriter::new(&self.config.alignment_dir).with_line_width(self.config.line_width);
        writer.clear()?;

        let mut prepared = Prepared {
            statuses,
            reference_dirs,
            ..Prepared::default()
        };
        for (species, group, entry) in filtered.iter() {
            let alignment = remove_identical_calls(&builder.build(species, group, entry));
            let path = writer.write(&alignment)?;
            let digest = digest_file(&path)?;
            debug!(
                species,
                group,
                candidates = entry.len(),
                informative = alignment.column_count(),
                %digest,
                "group aligned"
            );
            prepared.fastas.push(OutputFile {
                species: species.to_string(),
                group: group.to_string(),
                path,
                digest,
            });
            prepared.alignments.push(alignment);
        }
        Ok(prepared)
    }

    /// Rank and sort each prepared group along its tree, then write the
    /// annotated summary tables.
    pub fn report(&self, prepared: &Prepared) -> Result<Vec<OutputFile>, PipelineError> {
        let tree_dir = &self.config.tree_dir;

        let mut annotations = BTreeMap::new();
        for (species, dir) in &prepared.reference_dirs {
            annotations.insert(species.as_str(), AnnotationIndex::load_dir(dir)?);
        }
        let no_annotation = AnnotationIndex::new();

        let writer = SummaryWriter::new(&self.config.summary_dir);
        let mut tables = Vec::with_capacity(prepared.alignments.len());
        for alignment in &prepared.alignments {
            let (species, group) = (alignment.species.as_str(), alignment.group.as_str());
            let tree_path = best_tree_path(tree_dir, species, group);
            let order = match read_tree_order(&tree_path) {
                Ok(order) => order,
                Err(TreeError::Io { source, .. })
                    if source.kind() == std::io::ErrorKind::NotFound =>
                {
                    warn!(species, group, path = %tree_path.display(), "tree not found");
                    return Err(SortError::UndefinedTreeOrder {
                        species: species.to_string(),
                        group: group.to_string(),
                    }
                    .into());
                }
                Err(error) => return Err(error.into()),
            };

            let (unknown, missing) = tree_mismatches(alignment, &order);
            if !unknown.is_empty() || !missing.is_empty() {
                warn!(species, group, ?unknown, ?missing, "tree and alignment disagree");
            }

            let ranking = rank_snps(alignment);
            let sorted = sort_snps(alignment, &ranking, &order)?;
            let index = annotations.get(species).unwrap_or(&no_annotation);
            let table = SummaryTable::build(alignment, &sorted, &order, index);
            let path = writer.write(&table)?;
            let digest = digest_file(&path)?;
            info!(species, group, columns = sorted.len(), %digest, "summary table written");
            tables.push(OutputFile {
                species: species.to_string(),
                group: group.to_string(),
                path,
                digest,
            });
        }
        Ok(tables)
    }

    /// [`prepare`](Self::prepare) followed by [`report`](Self::report).
    pub fn run(&self) -> Result<(Prepared, Vec<OutputFile>), PipelineError> {
        let prepared = self.prepare()?;
        let tables = self.report(&prepared)?;
        Ok((prepared, tables))
    }
}
