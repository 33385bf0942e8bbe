use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use short_uuid::ShortUuid;
use tracing::info;

use cseed_gen::{generate_with_config, StrategyKind, SynthesisConfig};
use cseed_harness::logging::init_logging;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Strategy {
    /// Array-backed reads and writes
    Tree,
    /// File-backed reads and writes
    Flat,
}

impl From<Strategy> for StrategyKind {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Tree => StrategyKind::Tree,
            Strategy::Flat => StrategyKind::Flat,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "cseed-gen", version, about = "Synthesize C seed programs")]
struct Args {
    /// Output name; the program is written to `<NAME>.c`
    name: String,
    /// Number of functions, and the default statement budget per function
    size: usize,

    /// Path to .toml configuration for the synthesizer
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Generation strategy
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,
    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
    /// Statements per function body
    #[arg(long)]
    statements: Option<usize>,
    /// Number of programs to write; more than one adds a unique suffix
    #[arg(short = 'n', long, default_value = "1")]
    count: usize,
    /// Directory to write into
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Args::parse();
    init_logging(&cli.log_level);

    let mut config = match cli.config {
        Some(ref path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            SynthesisConfig::from_toml(&text)?
        }
        None => SynthesisConfig::default(),
    };
    config.functions = cli.size;
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy.into();
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.statements.is_some() {
        config.statements = cli.statements;
    }

    if !cli.out_dir.is_dir() {
        bail!("Output directory {} doesn't exist!", cli.out_dir.display());
    }

    for k in 0..cli.count {
        let name = if cli.count == 1 {
            cli.name.clone()
        } else {
            format!("{}_{}", cli.name, ShortUuid::generate())
        };
        let program = generate_with_config(SynthesisConfig {
            seed: config.seed.map(|s| s.wrapping_add(k as u64)),
            ..config
        })?;
        let path = program.write_to(&cli.out_dir, &name)?;
        info!(path = %path.display(), aux_files = program.aux_files.len(), "wrote program");
    }
    Ok(())
}
