//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - install: Install command arguments
//! - detect: Detect command arguments
//! - completions: Completions command arguments
//!
//! All configuration comes from flags; there are no environment variables
//! or configuration files, so a run is fully described by its command line.

use clap::builder::{Styles, styling::AnsiColor};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod detect;
pub mod install;

pub use completions::CompletionsArgs;
pub use detect::DetectArgs;
pub use install::InstallArgs;

use crate::host::DetectOptions;

/// rbinstall - Review Board installer
///
/// Detects the host, installs the system packages Review Board needs, creates a
/// Python environment for it and configures a web server.
#[derive(Parser, Debug)]
#[command(
    name = "rbinstall",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Install Review Board and everything it needs on this machine",
    long_about = "rbinstall detects the Linux distribution or macOS release, selects the native \
                  package manager, installs build dependencies, creates a Python virtual environment \
                  for Review Board and renders a web server configuration. Re-running it after a \
                  failure continues where the previous run stopped.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  rbinstall install                          \x1b[90m# Install the latest release\x1b[0m\n   \
                  rbinstall install --dry-run                \x1b[90m# Show the plan without changing anything\x1b[0m\n   \
                  rbinstall install --app-version 7.0.2 -y   \x1b[90m# Install a specific version without prompting\x1b[0m\n   \
                  rbinstall install --skip-optional          \x1b[90m# Only required features\x1b[0m\n   \
                  rbinstall detect --json                    \x1b[90m# Print the detected host as JSON\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Show more detail (-v, -vv, -vvv)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(flatten)]
    pub host: HostOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Fingerprint overrides, for testing against hosts other than this one
#[derive(Args, Debug, Default, Clone)]
pub struct HostOverrides {
    /// Treat the host as this operating system (linux, macos)
    #[arg(long, global = true, hide = true, value_name = "SYSTEM")]
    pub force_system: Option<String>,

    /// Treat the host as this CPU architecture
    #[arg(long, global = true, hide = true, value_name = "ARCH")]
    pub force_arch: Option<String>,

    /// Read the distribution from this os-release file
    #[arg(long, global = true, hide = true, value_name = "PATH")]
    pub os_release_file: Option<PathBuf>,
}

impl HostOverrides {
    pub fn detect_options(&self, python: &str) -> DetectOptions {
        let mut options = DetectOptions {
            system: self.force_system.clone(),
            arch: self.force_arch.clone(),
            python: python.to_string(),
            ..DetectOptions::default()
        };
        if let Some(path) = &self.os_release_file {
            options.os_release_files = vec![path.clone()];
            options.lsb_release_file = path.clone();
        }
        options
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install Review Board
    Install(Box<InstallArgs>),

    /// Show the detected host and package manager
    Detect(DetectArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_detect() {
        let cli = Cli::try_parse_from(["rbinstall", "detect", "--json"]).unwrap();
        match cli.command {
            Commands::Detect(args) => assert!(args.json),
            _ => panic!("Expected Detect command"),
        }
    }

    #[test]
    fn test_cli_parsing_version() {
        let cli = Cli::try_parse_from(["rbinstall", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from(["rbinstall", "-vv", "--no-color", "detect"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_color);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["rbinstall", "-q", "-v", "detect"]).is_err());
    }

    #[test]
    fn test_hidden_host_overrides() {
        let cli = Cli::try_parse_from([
            "rbinstall",
            "detect",
            "--force-system",
            "linux",
            "--force-arch",
            "aarch64",
            "--os-release-file",
            "/tmp/os-release",
        ])
        .unwrap();

        let options = cli.host.detect_options("python3.11");
        assert_eq!(options.system.as_deref(), Some("linux"));
        assert_eq!(options.arch.as_deref(), Some("aarch64"));
        assert_eq!(options.os_release_files, vec![PathBuf::from("/tmp/os-release")]);
        assert_eq!(options.python, "python3.11");
    }

    #[test]
    fn test_default_detect_options() {
        let options = HostOverrides::default().detect_options("python3");
        assert_eq!(options.os_release_files.len(), 2);
        assert!(options.system.is_none());
    }

    #[test]
    fn test_cli_parsing_completions() {
        let cli = Cli::try_parse_from(["rbinstall", "completions", "bash"]).unwrap();
        match cli.command {
            Commands::Completions(args) => {
                assert_eq!(args.shell, "bash");
            }
            _ => panic!("Expected Completions command"),
        }
    }
}
