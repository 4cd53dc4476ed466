//! rbinstall - Review Board installer
//!
//! Fingerprints the host, maps it to a plan of package manager, Python and
//! web server steps, and executes that plan. Re-running after a failure is
//! the supported recovery path.

use clap::Parser;

mod cli;
mod commands;
mod environment;
mod error;
mod executor;
mod hash;
mod host;
mod logging;
mod plan;
mod process;
mod pypi;
mod registry;
mod site;
mod ui;
mod version;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let color = !cli.no_color && console::colors_enabled();
    if !color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
    logging::init(cli.verbose, cli.quiet, color);

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(&cli.host, cli.quiet, *args),
        Commands::Detect(args) => commands::detect::run(&cli.host, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if let Some(help) = miette::Diagnostic::help(&e) {
            eprintln!("  {}", help);
        }
        std::process::exit(e.exit_code());
    }
}
