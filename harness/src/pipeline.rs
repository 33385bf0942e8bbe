use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use similar::{ChangeTag, TextDiff};
use tracing::{debug, info, warn};

use crate::filter::{Gates, Rejection};
use crate::oracle::{Canonicalizer, CompileOutcome, CompilerOracle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Kept at `path`, now holding the canonicalized text. `length` is the
    /// character count of the original text.
    Accepted { path: PathBuf, length: usize },
    /// Deleted.
    Rejected(Rejection),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub accepted: usize,
    pub rejected: usize,
    /// Candidates whose processing hit an I/O or tool error; left on disk.
    pub failed: usize,
}

/// Filters a seed directory in place. Holds no state between candidates.
pub struct SeedFilter<O: CompilerOracle, C: Canonicalizer> {
    gates: Gates,
    extension: String,
    oracle: O,
    canonicalizer: C,
}

impl<O: CompilerOracle, C: Canonicalizer> SeedFilter<O, C> {
    pub fn new(gates: Gates, extension: &str, oracle: O, canonicalizer: C) -> Self {
        Self {
            gates,
            extension: extension.to_string(),
            oracle,
            canonicalizer,
        }
    }

    /// Classify one candidate, then keep (rename and rewrite) or delete it.
    pub fn process_file(&self, path: &Path) -> Result<Outcome> {
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let Ok(text) = String::from_utf8(bytes) else {
            return self.discard(path, Rejection::NotUtf8);
        };

        if let Err(rejection) = self.gates.check(&text) {
            return self.discard(path, rejection);
        }

        let path = self.ensure_extension(path)?;
        match self.oracle.check(&path)? {
            CompileOutcome::Accepted => {}
            CompileOutcome::Rejected => return self.discard(&path, Rejection::CompileFailed),
            CompileOutcome::TimedOut => return self.discard(&path, Rejection::CompileTimedOut),
        }

        let canonical = self.canonicalizer.canonicalize(&text)?;
        let diff = TextDiff::from_lines(&text, &canonical);
        let changed = diff
            .iter_all_changes()
            .filter(|c| c.tag() != ChangeTag::Equal)
            .count();
        debug!(path = %path.display(), changed_lines = changed, "canonicalized");
        fs::write(&path, canonical)
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok(Outcome::Accepted {
            path,
            length: text.chars().count(),
        })
    }

    /// Process every regular file in `dir`, in name order. Writes one
    /// `<file name> <length>` line to `progress` per accepted seed.
    pub fn process_dir(&self, dir: &Path, progress: &mut impl Write) -> Result<Summary> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("failed to list seed directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        candidates.sort();

        let mut summary = Summary::default();
        for path in candidates {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match self.process_file(&path) {
                Ok(Outcome::Accepted { length, .. }) => {
                    writeln!(progress, "{file_name} {length}")?;
                    info!(seed = %file_name, length, "accepted");
                    summary.accepted += 1;
                }
                Ok(Outcome::Rejected(reason)) => {
                    debug!(seed = %file_name, %reason, "rejected");
                    summary.rejected += 1;
                }
                Err(err) => {
                    warn!(seed = %file_name, error = %format!("{err:#}"), "failed to process seed");
                    summary.failed += 1;
                }
            }
        }
        Ok(summary)
    }

    fn discard(&self, path: &Path, rejection: Rejection) -> Result<Outcome> {
        fs::remove_file(path).with_context(|| format!("failed to delete {}", path.display()))?;
        Ok(Outcome::Rejected(rejection))
    }

    /// Append the canonical extension if the file does not already carry it.
    /// Never replaces an existing file; a name clash leaves `path` in place.
    fn ensure_extension(&self, path: &Path) -> Result<PathBuf> {
        if path.extension().is_some_and(|e| e == self.extension.as_str()) {
            return Ok(path.to_path_buf());
        }
        let mut renamed = OsString::from(path.as_os_str());
        renamed.push(".");
        renamed.push(&self.extension);
        let renamed = PathBuf::from(renamed);
        if renamed.exists() {
            bail!(
                "cannot rename {}: {} already exists",
                path.display(),
                renamed.display()
            );
        }
        fs::rename(path, &renamed).with_context(|| {
            format!("failed to rename {} to {}", path.display(), renamed.display())
        })?;
        Ok(renamed)
    }
}
