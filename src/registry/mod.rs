//! Package manager registry
//!
//! This module provides:
//! - Deterministic manager selection for a [`HostProfile`]
//! - Canonical package name translation for the selected manager
//!
//! Selection walks managers in ascending priority and returns the first whose
//! platform list matches. An unknown distribution matches nothing.

pub mod catalog;
pub mod managers;
pub mod matching;

pub use catalog::{PackageCatalog, Translation, default_catalog};
pub use managers::{ManagerId, PackageManagerSpec, default_managers};
pub use matching::PlatformMatch;

use crate::error::{Result, host as host_error};
use crate::host::HostProfile;

/// Registry of supported package managers and the package catalog
pub struct PackageManagerRegistry {
    managers: Vec<PackageManagerSpec>,
    catalog: PackageCatalog,
}

impl PackageManagerRegistry {
    /// Create a registry; managers are ordered by priority, ties keep their given order
    pub fn new(mut managers: Vec<PackageManagerSpec>, catalog: PackageCatalog) -> Self {
        managers.sort_by_key(|m| m.priority);
        Self { managers, catalog }
    }

    /// Select the package manager for `profile`
    pub fn select<'a>(&'a self, profile: &'a HostProfile) -> Result<SelectedManager<'a>> {
        let spec = self
            .managers
            .iter()
            .find(|m| m.detects(profile))
            .ok_or_else(|| host_error::no_package_manager(profile.to_string()))?;

        tracing::debug!("Selected package manager {} for {}", spec.name, profile);

        Ok(SelectedManager {
            spec,
            catalog: &self.catalog,
            profile,
        })
    }
}

impl Default for PackageManagerRegistry {
    fn default() -> Self {
        Self::new(default_managers(), default_catalog())
    }
}

/// A manager bound to the profile it was selected for
#[derive(Clone, Copy)]
pub struct SelectedManager<'a> {
    pub spec: &'a PackageManagerSpec,
    catalog: &'a PackageCatalog,
    profile: &'a HostProfile,
}

impl SelectedManager<'_> {
    pub fn id(&self) -> ManagerId {
        self.spec.id
    }

    /// Translate a canonical package name
    pub fn translate(&self, canonical: &str) -> Result<Translation> {
        let translation = self.catalog.translate(self.spec.id, self.profile, canonical)?;
        tracing::trace!("{} -> {:?} ({})", canonical, translation, self.spec.id);
        Ok(translation)
    }

    /// Catalog description of a canonical package
    pub fn describe(&self, canonical: &str) -> Option<&'static str> {
        self.catalog.get(canonical).map(|p| p.description)
    }
}
