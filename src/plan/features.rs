//! Feature catalog
//!
//! Which features are required and which are optional is data here, not a
//! property of the packages. An optional feature is dropped, with a note, when
//! its platform gate fails or any of its system packages is unavailable.

use super::Requirement;
use crate::host::{Arch, HostProfile};
use crate::registry::PlatformMatch;
use crate::version::Version;

#[derive(Debug, Clone)]
pub struct Feature {
    pub id: &'static str,
    pub description: &'static str,
    pub requirement: Requirement,
    /// Canonical system package names
    pub system_packages: Vec<&'static str>,
    /// Extras of the application package (`ReviewBoard[mysql]`)
    pub extras: Vec<&'static str>,
    /// Hosts the feature can be installed on; empty means all
    pub platforms: Vec<PlatformMatch>,
    pub min_app_version: Option<Version>,
}

impl Feature {
    pub fn required(id: &'static str, description: &'static str) -> Self {
        Self {
            id,
            description,
            requirement: Requirement::Required,
            system_packages: Vec::new(),
            extras: Vec::new(),
            platforms: Vec::new(),
            min_app_version: None,
        }
    }

    pub fn optional(id: &'static str, description: &'static str) -> Self {
        Self {
            requirement: Requirement::Optional,
            ..Self::required(id, description)
        }
    }

    #[must_use]
    pub fn system(mut self, packages: &[&'static str]) -> Self {
        self.system_packages.extend_from_slice(packages);
        self
    }

    #[must_use]
    pub fn extras(mut self, extras: &[&'static str]) -> Self {
        self.extras.extend_from_slice(extras);
        self
    }

    #[must_use]
    pub fn only_on(mut self, platform: PlatformMatch) -> Self {
        self.platforms.push(platform);
        self
    }

    #[must_use]
    pub fn since(mut self, app_version: &str) -> Self {
        self.min_app_version = Some(Version::parse(app_version));
        self
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }

    pub fn available_on(&self, profile: &HostProfile) -> bool {
        self.platforms.is_empty() || self.platforms.iter().any(|p| p.matches(profile))
    }
}

pub fn default_features() -> Vec<Feature> {
    vec![
        Feature::required("core", "Compilers and libraries needed to build Review Board").system(&[
            "build-tools",
            "python-dev",
            "python-venv",
            "libffi-dev",
            "openssl-dev",
            "libxml2-dev",
            "libxslt-dev",
            "libjpeg-dev",
            "patch",
            "perl",
            "pkg-config",
        ]),
        Feature::required("git", "Git repository support").system(&["git"]),
        Feature::optional("saml", "SAML single sign-on")
            .system(&["xmlsec-dev"])
            .extras(&["saml"])
            .since("6.0"),
        Feature::optional("mysql", "MySQL and MariaDB database support")
            .system(&["mysql-client-dev"])
            .extras(&["mysql"]),
        Feature::optional("postgres", "PostgreSQL database support").extras(&["postgres"]),
        Feature::optional("memcached", "Local memcached server").system(&["memcached"]),
        Feature::optional("subversion", "Subversion repository support").system(&["subversion"]),
        Feature::optional("cvs", "CVS repository support").system(&["cvs"]),
        Feature::optional("mercurial", "Mercurial repository support").extras(&["mercurial"]),
        Feature::optional("perforce", "Perforce repository support")
            .extras(&["p4"])
            .only_on(PlatformMatch::linux().arch(Arch::X86_64))
            .only_on(PlatformMatch::macos()),
        Feature::optional("ldap", "LDAP authentication").extras(&["ldap"]),
        Feature::optional("storages", "Amazon S3 and OpenStack Swift file storage")
            .extras(&["s3", "swift"]),
    ]
}

/// Ids of the default features, for validating `--without`
pub fn feature_ids(features: &[Feature]) -> Vec<&'static str> {
    features.iter().map(|f| f.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(id: &str) -> Feature {
        default_features().into_iter().find(|f| f.id == id).unwrap()
    }

    #[test]
    fn test_core_and_git_are_required() {
        let required: Vec<_> = default_features()
            .into_iter()
            .filter(Feature::is_required)
            .map(|f| f.id)
            .collect();
        assert_eq!(required, vec!["core", "git"]);
    }

    #[test]
    fn test_perforce_platforms() {
        let perforce = feature("perforce");
        assert!(perforce.available_on(&HostProfile::linux("ubuntu", "22.04", Arch::X86_64)));
        assert!(!perforce.available_on(&HostProfile::linux("ubuntu", "22.04", Arch::Aarch64)));
        assert!(perforce.available_on(&HostProfile::macos("14.4", Arch::Aarch64)));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids = feature_ids(&default_features());
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }
}
