use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::filter::Gates;

/// An external program invoked with fixed arguments under a time limit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl CommandConfig {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout_secs: default_timeout(),
        }
    }

    /// Syntax-only C compile with warnings off.
    pub fn compiler() -> Self {
        Self::new("gcc", &["-c", "-w", "-O0", "-fsyntax-only"])
    }

    /// Reads C on stdin and prints the reformatted source.
    pub fn canonicalizer() -> Self {
        Self::new("c_formatter_42", &[])
    }
}

/// Everything the seed filter can be tuned with. Every field has a default,
/// so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    pub gates: Gates,
    /// Extension every accepted seed carries, without the dot.
    pub extension: String,
    pub compiler: CommandConfig,
    pub canonicalizer: CommandConfig,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            gates: Gates::default(),
            extension: "c".to_string(),
            compiler: CommandConfig::compiler(),
            canonicalizer: CommandConfig::canonicalizer(),
        }
    }
}

impl FilterConfig {
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse filter configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&text)
    }
}
