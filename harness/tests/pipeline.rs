use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use cseed_harness::{
    Canonicalizer, CommandConfig, CompileOutcome, CompilerOracle, Gates, Outcome, Rejection,
    SeedFilter, SystemCompiler,
};

const SEED: &str = "int main() {
    int total = 0;
    for (int i = 0; i < 10; i++) {
        if (i > 2) {
            {
                {
                    total += i;
                    break;
                }
            }
        }
    }
    return total;
}
";

/// Accepts everything, remembering which paths it was shown.
#[derive(Default)]
struct RecordingCompiler {
    seen: RefCell<Vec<PathBuf>>,
}

impl CompilerOracle for RecordingCompiler {
    fn check(&self, path: &Path) -> Result<CompileOutcome> {
        self.seen.borrow_mut().push(path.to_path_buf());
        Ok(CompileOutcome::Accepted)
    }
}

impl CompilerOracle for &RecordingCompiler {
    fn check(&self, path: &Path) -> Result<CompileOutcome> {
        <RecordingCompiler as CompilerOracle>::check(*self, path)
    }
}

struct FixedCompiler(CompileOutcome);

impl CompilerOracle for FixedCompiler {
    fn check(&self, _path: &Path) -> Result<CompileOutcome> {
        Ok(self.0)
    }
}

/// Strips leading and trailing whitespace from every line.
struct TrimLines;

impl Canonicalizer for TrimLines {
    fn canonicalize(&self, source: &str) -> Result<String> {
        let mut out: String = source
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n");
        out.push('\n');
        Ok(out)
    }
}

struct BrokenCanonicalizer;

impl Canonicalizer for BrokenCanonicalizer {
    fn canonicalize(&self, _source: &str) -> Result<String> {
        bail!("formatter crashed")
    }
}

fn filter<O: CompilerOracle, C: Canonicalizer>(oracle: O, canonicalizer: C) -> SeedFilter<O, C> {
    SeedFilter::new(Gates::default(), "c", oracle, canonicalizer)
}

#[test]
fn accepted_seed_is_renamed_and_canonicalized() {
    let dir = tempfile::tempdir().unwrap();
    let candidate = dir.path().join("seed_1");
    fs::write(&candidate, SEED).unwrap();

    let compiler = RecordingCompiler::default();
    let outcome = filter(&compiler, TrimLines).process_file(&candidate).unwrap();

    let renamed = dir.path().join("seed_1.c");
    assert_eq!(
        outcome,
        Outcome::Accepted {
            path: renamed.clone(),
            length: SEED.chars().count()
        }
    );
    // The compiler only ever sees the renamed file.
    assert_eq!(compiler.seen.borrow().as_slice(), &[renamed.clone()]);
    assert!(!candidate.exists());

    let persisted = fs::read_to_string(&renamed).unwrap();
    assert_eq!(persisted, TrimLines.canonicalize(SEED).unwrap());
    assert_ne!(persisted, SEED);
}

#[test]
fn seed_with_extension_keeps_its_name() {
    let dir = tempfile::tempdir().unwrap();
    let candidate = dir.path().join("seed.c");
    fs::write(&candidate, SEED).unwrap();

    let outcome = filter(FixedCompiler(CompileOutcome::Accepted), TrimLines)
        .process_file(&candidate)
        .unwrap();
    assert!(matches!(outcome, Outcome::Accepted { ref path, .. } if *path == candidate));
    assert!(candidate.exists());
}

#[test]
fn truncated_seed_is_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let candidate = dir.path().join("short");
    fs::write(&candidate, &SEED[..150]).unwrap();

    let compiler = RecordingCompiler::default();
    let outcome = filter(&compiler, TrimLines).process_file(&candidate).unwrap();
    assert_eq!(outcome, Outcome::Rejected(Rejection::TooShort { length: 150 }));
    assert!(!candidate.exists());
    assert!(!dir.path().join("short.c").exists());
    assert!(compiler.seen.borrow().is_empty());
}

#[test]
fn compile_failure_deletes_renamed_file() {
    let dir = tempfile::tempdir().unwrap();
    let candidate = dir.path().join("bad");
    fs::write(&candidate, SEED).unwrap();

    let outcome = filter(FixedCompiler(CompileOutcome::Rejected), TrimLines)
        .process_file(&candidate)
        .unwrap();
    assert_eq!(outcome, Outcome::Rejected(Rejection::CompileFailed));
    assert!(!candidate.exists());
    assert!(!dir.path().join("bad.c").exists());

    fs::write(&candidate, SEED).unwrap();
    let outcome = filter(FixedCompiler(CompileOutcome::TimedOut), TrimLines)
        .process_file(&candidate)
        .unwrap();
    assert_eq!(outcome, Outcome::Rejected(Rejection::CompileTimedOut));
    assert!(!dir.path().join("bad.c").exists());
}

#[test]
fn non_utf8_seed_is_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let candidate = dir.path().join("binary");
    fs::write(&candidate, [0xffu8, 0xfe, 0x00, 0x7b]).unwrap();

    let outcome = filter(FixedCompiler(CompileOutcome::Accepted), TrimLines)
        .process_file(&candidate)
        .unwrap();
    assert_eq!(outcome, Outcome::Rejected(Rejection::NotUtf8));
    assert!(!candidate.exists());
}

#[test]
fn directory_pass_reports_accepted_seeds_and_keeps_going() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a"), SEED).unwrap();
    fs::write(dir.path().join("b"), &SEED[..150]).unwrap();
    fs::write(dir.path().join("c.c"), SEED.replace("for (", "if (")).unwrap();
    fs::write(dir.path().join("d"), SEED).unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();

    let mut progress: Vec<u8> = Vec::new();
    let summary = filter(FixedCompiler(CompileOutcome::Accepted), TrimLines)
        .process_dir(dir.path(), &mut progress)
        .unwrap();

    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.rejected, 2);
    assert_eq!(summary.failed, 0);
    let length = SEED.chars().count();
    assert_eq!(
        String::from_utf8(progress).unwrap(),
        format!("a {length}\nd {length}\n")
    );

    let mut left: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    left.sort();
    assert_eq!(left, vec!["a.c", "d.c", "nested"]);
}

#[test]
fn canonicalizer_failure_is_counted_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a"), SEED).unwrap();
    fs::write(dir.path().join("b"), SEED).unwrap();

    let mut progress: Vec<u8> = Vec::new();
    let summary = filter(FixedCompiler(CompileOutcome::Accepted), BrokenCanonicalizer)
        .process_dir(dir.path(), &mut progress)
        .unwrap();
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.accepted, 0);
    assert!(progress.is_empty());
    // Left on disk untouched apart from the rename.
    assert_eq!(fs::read_to_string(dir.path().join("a.c")).unwrap(), SEED);
}

#[test]
fn rename_never_replaces_an_existing_seed() {
    let dir = tempfile::tempdir().unwrap();
    let first = format!("// first\n{SEED}");
    let second = format!("// second\n{SEED}");
    fs::write(dir.path().join("a"), &first).unwrap();
    fs::write(dir.path().join("a.c"), &second).unwrap();

    let mut progress: Vec<u8> = Vec::new();
    let summary = filter(FixedCompiler(CompileOutcome::Accepted), TrimLines)
        .process_dir(dir.path(), &mut progress)
        .unwrap();

    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.rejected, 0);
    assert_eq!(
        String::from_utf8(progress).unwrap(),
        format!("a.c {}\n", second.chars().count())
    );
    // The clashing candidate stays put and the existing seed keeps its own text.
    assert_eq!(fs::read_to_string(dir.path().join("a")).unwrap(), first);
    assert_eq!(
        fs::read_to_string(dir.path().join("a.c")).unwrap(),
        TrimLines.canonicalize(&second).unwrap()
    );
}

#[test]
fn missing_directory_is_fatal() {
    let mut progress: Vec<u8> = Vec::new();
    let result = filter(FixedCompiler(CompileOutcome::Accepted), TrimLines)
        .process_dir(Path::new("/nonexistent/cseed-corpus"), &mut progress);
    assert!(result.is_err());
}

#[test]
fn system_compiler_classifies_real_sources() {
    let compiler = SystemCompiler::new(CommandConfig::compiler());
    if compiler.probe().is_err() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.c");
    fs::write(&good, SEED).unwrap();
    let bad = dir.path().join("bad.c");
    fs::write(&bad, SEED.replace("return total;", "return total")).unwrap();

    assert_eq!(compiler.check(&good).unwrap(), CompileOutcome::Accepted);
    assert_eq!(compiler.check(&bad).unwrap(), CompileOutcome::Rejected);
}
