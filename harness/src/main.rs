use std::io;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;

use cseed_harness::logging::init_logging;
use cseed_harness::{CommandCanonicalizer, FilterConfig, SeedFilter, SystemCompiler};

#[derive(Parser, Debug)]
#[command(name = "cseed-filter", version, about = "Filter a directory of C seed programs in place")]
struct Args {
    /// Directory with generated seeds (C programs) to filter
    seeds: PathBuf,

    /// Path to .toml configuration for the filter
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Args::parse();
    init_logging(&cli.log_level);

    // parse config or take default
    let config = match cli.config {
        Some(ref path) => FilterConfig::load(path)?,
        None => FilterConfig::default(),
    };

    if !cli.seeds.is_dir() {
        bail!("Seed directory {} doesn't exist!", cli.seeds.display());
    }

    let compiler = SystemCompiler::new(config.compiler.clone());
    compiler.probe()?;
    let canonicalizer = CommandCanonicalizer::new(config.canonicalizer.clone());

    let filter = SeedFilter::new(config.gates.clone(), &config.extension, compiler, canonicalizer);
    let summary = filter.process_dir(&cli.seeds, &mut io::stdout().lock())?;

    info!(?summary, "done");
    eprintln!(
        "{} accepted, {} rejected, {} failed",
        summary.accepted.to_string().green(),
        summary.rejected.to_string().yellow(),
        summary.failed.to_string().red()
    );
    Ok(())
}
