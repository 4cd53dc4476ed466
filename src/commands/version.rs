//! Version command implementation

use crate::error::Result;
use crate::plan::addons::default_addons;
use crate::plan::features::default_features;
use crate::plan::requirements::APP_PACKAGE;
use crate::pypi::DEFAULT_INDEX_URL;
use crate::registry::default_managers;

/// Run version command
pub fn run() -> Result<()> {
    for line in lines() {
        println!("{line}");
    }
    Ok(())
}

fn lines() -> Vec<String> {
    let managers: Vec<&str> = default_managers().iter().map(|m| m.binary).collect();
    let features: Vec<&str> = default_features().iter().map(|f| f.id).collect();
    let addons: Vec<&str> = default_addons().iter().map(|a| a.package).collect();

    vec![
        format!("rbinstall {}", env!("CARGO_PKG_VERSION")),
        String::new(),
        "Installs:".to_string(),
        format!("  Application: {APP_PACKAGE}"),
        format!("  Add-ons: {}", addons.join(", ")),
        format!("  Features: {}", features.join(", ")),
        format!("  Package managers: {}", managers.join(", ")),
        format!("  Package index: {DEFAULT_INDEX_URL}"),
        String::new(),
        "Build info:".to_string(),
        format!("  Target: {}-{}", std::env::consts::OS, std::env::consts::ARCH),
        format!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" }),
    ]
}
