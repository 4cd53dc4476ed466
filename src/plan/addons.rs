//! Extension packages installed next to the application
//!
//! Each add-on becomes one optional pip step after the application and its
//! feature support, so a failing extension never blocks the site itself.

use super::requirements::AppVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addon {
    pub id: &'static str,
    /// Distribution name on the package index
    pub package: &'static str,
    pub label: &'static str,
    pub version: AppVersion,
}

impl Addon {
    fn new(id: &'static str, package: &'static str, label: &'static str) -> Self {
        Self {
            id,
            package,
            label,
            version: AppVersion::Latest,
        }
    }

    pub fn requirement(&self) -> String {
        self.version.requirement(self.package, &[])
    }
}

pub const POWERPACK: &str = "powerpack";
pub const REVIEWBOT_EXTENSION: &str = "reviewbot-extension";
pub const REVIEWBOT_WORKER: &str = "reviewbot-worker";

pub fn default_addons() -> Vec<Addon> {
    vec![
        Addon::new(POWERPACK, "ReviewBoardPowerPack", "Power Pack"),
        Addon::new(REVIEWBOT_EXTENSION, "reviewbot-extension", "Review Bot extension"),
        Addon::new(REVIEWBOT_WORKER, "reviewbot-worker", "Review Bot worker"),
    ]
}
