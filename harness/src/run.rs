use anyhow::{anyhow, Result};

use std::ffi::OsString;
use std::io;
use std::time::Duration;
use subprocess::{Popen, PopenConfig, Redirection};

/// Result of a program invocation.
#[derive(Debug)]
pub struct RunResult {
    /// Captured stdout.
    pub output: String,
    /// Captured stderr.
    pub errors: String,
    /// `true` if the program exited with status 0.
    pub success: bool,
    /// `true` if the program finished before the time limit.
    pub termination: bool,
}

/// Run `argv` for a bounded number of seconds.
///
/// # Arguments
/// - `argv`: program followed by its arguments
/// - `input`: text fed to stdin, if any
/// - `timeout`: seconds before the process is killed
///
/// # Returns
/// The captured streams and whether the program terminated and succeeded. A
/// killed process reports `termination: false` and `success: false`. Failing
/// to start the program at all is an error.
pub fn run(argv: &[OsString], input: Option<&str>, timeout: u64) -> Result<RunResult> {
    if argv.is_empty() {
        return Err(anyhow!("Cannot run an empty command line."));
    }
    let limit = Duration::from_secs(timeout);

    let mut p = Popen::create(
        argv,
        PopenConfig {
            stdin: if input.is_some() {
                Redirection::Pipe
            } else {
                Redirection::None
            },
            stdout: Redirection::Pipe,
            stderr: Redirection::Pipe,
            ..Default::default()
        },
    )?;

    // Obtain the output from the standard streams.
    let mut communicator = p
        .communicate_start(input.map(|s| s.as_bytes().to_vec()))
        .limit_time(limit);
    let (stdout, stderr, timed_out) = match communicator.read() {
        Ok((out, err)) => (out, err, false),
        Err(err) if err.error.kind() == io::ErrorKind::TimedOut => {
            (err.capture.0, err.capture.1, true)
        }
        Err(err) => return Err(err.error.into()),
    };

    let status = if timed_out {
        None
    } else {
        p.wait_timeout(limit)?
    };
    let (termination, success) = match status {
        Some(exit_status) => (true, exit_status.success()),
        None => {
            p.kill()?;
            p.wait()?;
            (false, false)
        }
    };

    let decode = |bytes: Option<Vec<u8>>| {
        bytes
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    };
    Ok(RunResult {
        output: decode(stdout),
        errors: decode(stderr),
        success,
        termination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<OsString> {
        parts.iter().map(OsString::from).collect()
    }

    #[test]
    fn empty_command_is_an_error() {
        assert!(run(&[], None, 1).is_err());
    }

    #[test]
    fn missing_program_is_an_error() {
        assert!(run(&argv(&["cseed-definitely-not-installed"]), None, 1).is_err());
    }

    #[test]
    fn stdin_round_trips_through_cat() {
        let result = run(&argv(&["cat"]), Some("int x;\n"), 5).unwrap();
        assert!(result.termination);
        assert!(result.success);
        assert_eq!(result.output, "int x;\n");
    }

    #[test]
    fn slow_program_is_killed() {
        let result = run(&argv(&["sleep", "10"]), None, 1).unwrap();
        assert!(!result.termination);
        assert!(!result.success);
    }
}
