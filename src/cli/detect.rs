use clap::Parser;

use crate::host::DEFAULT_PYTHON;

/// Arguments for the detect command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Show the detected host:\n    rbinstall detect\n\n\
                   Machine-readable output:\n    rbinstall detect --json")]
pub struct DetectArgs {
    /// Print the profile as JSON
    #[arg(long)]
    pub json: bool,

    /// Python interpreter to inspect
    #[arg(long, value_name = "PYTHON", default_value = DEFAULT_PYTHON)]
    pub python: String,
}
