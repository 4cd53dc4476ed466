//! Platform predicates
//!
//! A [`PlatformMatch`] is plain data: every field left unset matches anything.

use std::fmt;

use crate::host::{Arch, HostProfile, OsFamily};
use crate::version::VersionMatch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformMatch {
    pub os: Option<OsFamily>,
    /// Exact distribution ids
    pub ids: Vec<&'static str>,
    /// Matched against the id and every `ID_LIKE` entry
    pub families: Vec<&'static str>,
    pub version: VersionMatch,
    pub archs: Vec<Arch>,
}

impl PlatformMatch {
    /// Matches every host
    pub fn any() -> Self {
        Self {
            os: None,
            ids: Vec::new(),
            families: Vec::new(),
            version: VersionMatch::Any,
            archs: Vec::new(),
        }
    }

    pub fn linux() -> Self {
        Self {
            os: Some(OsFamily::Linux),
            ..Self::any()
        }
    }

    pub fn macos() -> Self {
        Self {
            os: Some(OsFamily::MacOs),
            ..Self::any()
        }
    }

    /// Linux distributions with one of the given ids
    pub fn distro(ids: &[&'static str]) -> Self {
        Self {
            ids: ids.to_vec(),
            ..Self::linux()
        }
    }

    /// Linux distributions whose id or `ID_LIKE` contains one of `families`
    pub fn family(families: &[&'static str]) -> Self {
        Self {
            families: families.to_vec(),
            ..Self::linux()
        }
    }

    #[must_use]
    pub fn version(mut self, version: VersionMatch) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn arch(mut self, arch: Arch) -> Self {
        self.archs.push(arch);
        self
    }

    pub fn matches(&self, profile: &HostProfile) -> bool {
        if self.os.is_some_and(|os| os != profile.os_family) {
            return false;
        }
        if !self.ids.is_empty() && !self.ids.iter().any(|id| *id == profile.distro_id) {
            return false;
        }
        if !self.families.is_empty()
            && !profile
                .families()
                .any(|f| self.families.iter().any(|fam| *fam == f))
        {
            return false;
        }
        if !self.archs.is_empty() && !self.archs.contains(&profile.architecture) {
            return false;
        }
        self.version.matches(&profile.distro_version)
    }
}

impl fmt::Display for PlatformMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(os) = self.os {
            parts.push(os.to_string());
        }
        if !self.ids.is_empty() {
            parts.push(self.ids.join("/"));
        }
        if !self.families.is_empty() {
            parts.push(format!("like {}", self.families.join("/")));
        }
        if self.version != VersionMatch::Any {
            parts.push(self.version.to_string());
        }
        for arch in &self.archs {
            parts.push(arch.to_string());
        }
        if parts.is_empty() {
            f.write_str("any platform")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}
