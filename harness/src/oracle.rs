use std::ffi::OsString;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

use crate::config::CommandConfig;
use crate::run::run;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    Accepted,
    Rejected,
    TimedOut,
}

/// Classifies a source file as syntactically valid or not.
pub trait CompilerOracle {
    fn check(&self, path: &Path) -> Result<CompileOutcome>;
}

/// Rewrites source text into its normalized form.
pub trait Canonicalizer {
    fn canonicalize(&self, source: &str) -> Result<String>;
}

fn argv(command: &CommandConfig) -> Vec<OsString> {
    std::iter::once(&command.program)
        .chain(&command.args)
        .map(OsString::from)
        .collect()
}

/// The system C compiler, run once per candidate file.
#[derive(Debug, Clone)]
pub struct SystemCompiler {
    command: CommandConfig,
}

impl SystemCompiler {
    pub fn new(command: CommandConfig) -> Self {
        Self { command }
    }

    /// Make sure the compiler can be started at all.
    pub fn probe(&self) -> Result<()> {
        let argv = vec![OsString::from(&self.command.program), OsString::from("--version")];
        let result = run(&argv, None, self.command.timeout_secs)
            .with_context(|| format!("C compiler `{}` is not runnable", self.command.program))?;
        if !result.success {
            bail!("C compiler `{}` failed to report its version", self.command.program);
        }
        debug!(version = result.output.lines().next().unwrap_or(""), "found compiler");
        Ok(())
    }
}

impl CompilerOracle for SystemCompiler {
    fn check(&self, path: &Path) -> Result<CompileOutcome> {
        let mut argv = argv(&self.command);
        argv.push(path.as_os_str().to_owned());
        let result = run(&argv, None, self.command.timeout_secs)?;
        if !result.termination {
            return Ok(CompileOutcome::TimedOut);
        }
        if !result.success {
            debug!(path = %path.display(), diagnostics = %result.errors, "compile failed");
            return Ok(CompileOutcome::Rejected);
        }
        Ok(CompileOutcome::Accepted)
    }
}

/// An external formatter that reads source on stdin and prints the result.
#[derive(Debug, Clone)]
pub struct CommandCanonicalizer {
    command: CommandConfig,
}

impl CommandCanonicalizer {
    pub fn new(command: CommandConfig) -> Self {
        Self { command }
    }
}

impl Canonicalizer for CommandCanonicalizer {
    fn canonicalize(&self, source: &str) -> Result<String> {
        let result = run(&argv(&self.command), Some(source), self.command.timeout_secs)
            .with_context(|| format!("canonicalizer `{}` is not runnable", self.command.program))?;
        if !result.termination {
            return Err(anyhow!(
                "canonicalizer `{}` timed out after {}s",
                self.command.program,
                self.command.timeout_secs
            ));
        }
        if !result.success {
            bail!(
                "canonicalizer `{}` failed: {}",
                self.command.program,
                result.errors.trim()
            );
        }
        Ok(result.output)
    }
}
