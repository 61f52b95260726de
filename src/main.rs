use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use snptree::{Pipeline, PipelineConfig, StrainStatus, VariantCaller};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "snptree",
    about = "Consolidate strain SNPs into group alignments and tree-ordered tables"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse strains and write one FASTA alignment per species/group.
    Align(RunArgs),
    /// Align, then rank and sort SNPs along the group trees and write tables.
    Report {
        #[command(flatten)]
        run: RunArgs,
        /// Root of `<species>/<group>/RAxML_bestTree.<species>_<group>` (default: `<output-dir>/trees`).
        #[arg(long)]
        tree_dir: Option<PathBuf>,
    },
    /// Print per-strain SNP, insertion and deletion counts.
    Summarize {
        /// Folder holding the variant files.
        input_dir: PathBuf,
        /// Caller that produced the inputs.
        #[arg(long, value_enum, default_value_t = Caller::Deepvariant)]
        caller: Caller,
        /// Parser threads (0 = all cores).
        #[arg(long, default_value_t = 0)]
        threads: usize,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Caller {
    Deepvariant,
    Freebayes,
}

impl From<Caller> for VariantCaller {
    fn from(caller: Caller) -> Self {
        match caller {
            Caller::Deepvariant => VariantCaller::DeepVariant,
            Caller::Freebayes => VariantCaller::FreeBayes,
        }
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Folder holding one variant file per strain.
    input_dir: PathBuf,
    /// Output folder (receives `alignments/` and `summary/`, holds `trees/`).
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
    /// Dependency folder with reference tables, catalogs and GenBank files.
    #[arg(short, long)]
    dependency_dir: Option<PathBuf>,
    /// Caller that produced the inputs.
    #[arg(long, value_enum, default_value_t = Caller::Deepvariant)]
    caller: Caller,
    /// gVCF SNP quality cutoff.
    #[arg(long, default_value_t = snptree::DEFAULT_QUALITY_CUTOFF)]
    quality_cutoff: f64,
    /// Density window width.
    #[arg(long, default_value_t = snptree::DEFAULT_WINDOW_SIZE)]
    window_size: u64,
    /// Neighbours tolerated inside the window.
    #[arg(long, default_value_t = snptree::DEFAULT_THRESHOLD)]
    threshold: usize,
    /// Allele fraction under which calls are encoded as mixed.
    #[arg(long, default_value_t = snptree::DEFAULT_MIXED_FRACTION)]
    mixed_fraction: f64,
    /// Skip curated filter regions.
    #[arg(long)]
    no_filter_regions: bool,
    /// Parser threads (0 = all cores).
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

impl RunArgs {
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(&self.input_dir, &self.output_dir)
            .with_caller(self.caller.into())
            .with_quality_cutoff(self.quality_cutoff)
            .with_window_size(self.window_size)
            .with_threshold(self.threshold)
            .with_mixed_fraction(self.mixed_fraction)
            .with_filter_regions(!self.no_filter_regions)
            .with_threads(self.threads);
        if let Some(dir) = &self.dependency_dir {
            config = config.with_dependency_dir(dir);
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Align(run) => run_align(&run)?,
        Commands::Report { run, tree_dir } => run_report(&run, tree_dir)?,
        Commands::Summarize {
            input_dir,
            caller,
            threads,
        } => run_summarize(input_dir, caller, threads)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "snptree=debug" } else { "snptree=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_statuses(statuses: &[StrainStatus]) {
    for status in statuses {
        println!("{status}");
    }
}

fn run_align(run: &RunArgs) -> Result<()> {
    let pipeline = Pipeline::new(run.config()).context("invalid configuration")?;
    let prepared = pipeline
        .prepare()
        .with_context(|| format!("failed to align strains from {}", run.input_dir.display()))?;

    print_statuses(&prepared.statuses);
    for fasta in &prepared.fastas {
        println!("{}\t{}", fasta.path.display(), fasta.digest);
    }
    info!(
        alignments = prepared.fastas.len(),
        failed = prepared.failures().count(),
        "alignment stage complete"
    );
    Ok(())
}

fn run_report(run: &RunArgs, tree_dir: Option<PathBuf>) -> Result<()> {
    let mut config = run.config();
    if let Some(dir) = tree_dir {
        config = config.with_tree_dir(dir);
    }
    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let (prepared, tables) = pipeline
        .run()
        .with_context(|| format!("failed to report strains from {}", run.input_dir.display()))?;

    print_statuses(&prepared.statuses);
    for table in &tables {
        println!("{}\t{}", table.path.display(), table.digest);
    }
    info!(tables = tables.len(), "report stage complete");
    Ok(())
}

fn run_summarize(input_dir: PathBuf, caller: Caller, threads: usize) -> Result<()> {
    let config = PipelineConfig::new(&input_dir, ".")
        .with_caller(caller.into())
        .with_threads(threads);
    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let statuses = pipeline
        .summarize()
        .with_context(|| format!("failed to summarise {}", input_dir.display()))?;
    print_statuses(&statuses);
    Ok(())
}
