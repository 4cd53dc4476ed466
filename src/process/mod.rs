//! External command execution
//!
//! Every subprocess the installer starts goes through [`CommandRunner`], so the
//! planner and executor can be driven by a scripted runner in tests.

#[cfg(test)]
pub mod fake;

use std::fmt;
use std::process::{Command, Stdio};

use crate::error::{Result, exec};

/// How a child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Code(i32),
    /// Killed by the given signal number
    Signal(i32),
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Code(code) => write!(f, "exit code {code}"),
            ExitOutcome::Signal(sig) => write!(f, "killed by signal {sig}"),
        }
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: ExitOutcome,
    /// stdout followed by stderr
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == ExitOutcome::Code(0)
    }

    pub fn code(&self) -> Option<i32> {
        match self.status {
            ExitOutcome::Code(code) => Some(code),
            ExitOutcome::Signal(_) => None,
        }
    }

    pub fn interrupted(&self) -> bool {
        matches!(self.status, ExitOutcome::Signal(_))
    }
}

/// Capability to run external programs
///
/// `run` only fails when the program cannot be started at all; a non-zero exit
/// is reported through [`CommandOutput::status`].
pub trait CommandRunner {
    fn run(&self, argv: &[String]) -> Result<CommandOutput>;
}

/// Runs commands on the real host, blocking until they finish
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        let cmdline = join_cmdline(argv);
        let Some((program, args)) = argv.split_first() else {
            return Err(exec::spawn_failed(cmdline, "empty command line"));
        };

        tracing::info!("$ {}", cmdline);

        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .output()
            .map_err(|e| exec::spawn_failed(&cmdline, e.to_string()))?;

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));

        for line in output.lines() {
            tracing::debug!("  {}", line);
        }

        let status = match out.status.code() {
            Some(code) => ExitOutcome::Code(code),
            None => ExitOutcome::Signal(signal_of(&out.status)),
        };
        tracing::debug!("`{}` finished with {}", cmdline, status);

        Ok(CommandOutput { status, output })
    }
}

#[cfg(unix)]
fn signal_of(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(0)
}

#[cfg(not(unix))]
fn signal_of(_status: &std::process::ExitStatus) -> i32 {
    0
}

/// Build an owned argv from string slices
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts.into_iter().map(|s| s.as_ref().to_string()).collect()
}

/// Options whose values never appear in a displayed command line
const SECRET_OPTIONS: &[&str] = &["--admin-password="];

/// Join a command line for display, quoting only the parts a shell would split
pub fn join_cmdline<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|part| redact(part.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn redact(part: &str) -> String {
    match SECRET_OPTIONS.iter().find(|opt| part.starts_with(**opt)) {
        Some(opt) => format!("{opt}********"),
        None => quote(part),
    }
}

fn quote(part: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "-_./=:,+@%^|[]{}<>~".contains(c);

    if !part.is_empty() && part.chars().all(safe) {
        part.to_string()
    } else {
        format!("'{}'", part.replace('\'', r"'\''"))
    }
}
