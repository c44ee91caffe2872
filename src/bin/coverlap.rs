use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use coverlap::{BundleReader as _, KmzBundle, Pipeline, PipelineConfig, ResultEmitter};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "coverlap", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build overlap rasters, a tile manifest and jittered viewer positions from a KMZ directory.
    Build(BuildArgs),
    /// List the coverage masks and viewer placemark of a single KMZ bundle.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Directory containing `*.kmz` bundles.
    #[arg(long = "in")]
    in_dir: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Optional pipeline config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input KMZ bundle.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Optional pipeline config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_path(p)
            .with_context(|| format!("load config '{}'", p.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    let pipeline = Pipeline::new(config)?;

    let mut bundles = Vec::new();
    for path in coverlap::discover_bundles(&args.in_dir)? {
        match KmzBundle::open(&path) {
            Ok(b) => bundles.push(b),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping bundle"),
        }
    }
    tracing::info!(bundles = bundles.len(), dir = %args.in_dir.display(), "discovered bundles");

    let output = pipeline.run(&bundles);
    for skipped in &output.skipped_bundles {
        eprintln!("skipped {}: {}", skipped.bundle, skipped.error);
    }
    for failure in &output.failed_groups {
        eprintln!("failed {}: {}", failure.name, failure.error);
    }
    if output.is_empty() {
        eprintln!("nothing produced: no coverage masks or viewer placemarks found");
        return Ok(());
    }

    let emitter = ResultEmitter::new(&args.out);
    let written = emitter.emit(&output)?;
    eprintln!(
        "wrote {} overlap rasters and {} viewer positions ({} files) to {}",
        output.rasters.len(),
        output.coordinates.len(),
        written.len(),
        args.out.display()
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let bundle = KmzBundle::open(&args.in_path)?;

    let masks = bundle.list_mask_candidates(&config.naming())?;
    println!("{}: {} coverage masks", bundle.id(), masks.len());
    for m in &masks {
        println!("  {} ({} bytes)", m.name, m.bytes.len());
    }

    match bundle.viewer_placemark(&config.viewer_sentinel) {
        Ok(Some(p)) => println!(
            "viewer '{}': lat {} lon {} alt {}",
            p.name, p.latitude, p.longitude, p.altitude
        ),
        Ok(None) => println!("no viewer placemark"),
        Err(e) => println!("viewer placemark unreadable: {e}"),
    }
    Ok(())
}
