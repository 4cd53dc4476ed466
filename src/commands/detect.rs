//! Detect command
//!
//! Prints the host profile and the package manager that would be used. An
//! unsupported distribution is reported, not treated as an error.

use serde::Serialize;

use crate::cli::{DetectArgs, HostOverrides};
use crate::error::Result;
use crate::host::{self, HostProfile};
use crate::process::SystemRunner;
use crate::registry::{ManagerId, PackageManagerRegistry};
use crate::ui::display;

#[derive(Serialize)]
struct DetectOutput<'a> {
    #[serde(flatten)]
    profile: &'a HostProfile,
    package_manager: Option<ManagerId>,
}

pub fn run(overrides: &HostOverrides, args: DetectArgs) -> Result<()> {
    let profile = host::detect(&overrides.detect_options(&args.python), &SystemRunner)?;
    let registry = PackageManagerRegistry::default();
    let manager = registry.select(&profile).ok();

    if args.json {
        let output = DetectOutput {
            profile: &profile,
            package_manager: manager.map(|m| m.id()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    display::display_profile(&profile, manager.map(|m| m.spec));
    if manager.is_none() {
        println!("  {}", console::Style::new().yellow().apply_to("No supported package manager"));
    }

    Ok(())
}
