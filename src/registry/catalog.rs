//! Canonical package names and their per-manager translations
//!
//! A canonical name (`python-dev`) maps to a concrete package list for each
//! manager. Platform-specific overrides are checked in insertion order before
//! the manager's default. [`Translation::Builtin`] is an explicit "provided by
//! the base system" marker; a package with no entry at all for a manager is an
//! error, never a silent omission.

use std::collections::BTreeMap;

use super::managers::ManagerId;
use super::matching::PlatformMatch;
use crate::error::{Result, plan as plan_error};
use crate::host::HostProfile;
use crate::version::VersionMatch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Concrete package names to install
    Packages(Vec<String>),
    /// Already provided by the base system; nothing to install
    Builtin,
    /// No equivalent on this platform
    Unavailable,
}

fn packages(names: &[&str]) -> Translation {
    Translation::Packages(names.iter().map(|n| (*n).to_string()).collect())
}

#[derive(Debug, Clone)]
struct Override {
    manager: ManagerId,
    when: PlatformMatch,
    translation: Translation,
}

/// One canonical package and every known translation of it
#[derive(Debug, Clone)]
pub struct CanonicalPackage {
    pub name: &'static str,
    pub description: &'static str,
    overrides: Vec<Override>,
    defaults: BTreeMap<ManagerId, Translation>,
}

impl CanonicalPackage {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            overrides: Vec::new(),
            defaults: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn on(mut self, manager: ManagerId, names: &[&str]) -> Self {
        self.defaults.insert(manager, packages(names));
        self
    }

    #[must_use]
    pub fn builtin_on(mut self, manager: ManagerId) -> Self {
        self.defaults.insert(manager, Translation::Builtin);
        self
    }

    #[must_use]
    pub fn unavailable_on(mut self, manager: ManagerId) -> Self {
        self.defaults.insert(manager, Translation::Unavailable);
        self
    }

    /// Platform-specific translation, checked before the manager default
    #[must_use]
    pub fn on_platform(mut self, manager: ManagerId, when: PlatformMatch, translation: Translation) -> Self {
        self.overrides.push(Override {
            manager,
            when,
            translation,
        });
        self
    }

    pub fn translate(&self, manager: ManagerId, profile: &HostProfile) -> Option<&Translation> {
        self.overrides
            .iter()
            .find(|o| o.manager == manager && o.when.matches(profile))
            .map(|o| &o.translation)
            .or_else(|| self.defaults.get(&manager))
    }
}

/// Lookup table of canonical packages
#[derive(Debug, Clone, Default)]
pub struct PackageCatalog {
    packages: BTreeMap<&'static str, CanonicalPackage>,
}

impl PackageCatalog {
    pub fn new(packages: Vec<CanonicalPackage>) -> Self {
        Self {
            packages: packages.into_iter().map(|p| (p.name, p)).collect(),
        }
    }

    /// Add or replace a canonical package
    #[cfg(test)]
    #[must_use]
    pub fn with(mut self, package: CanonicalPackage) -> Self {
        self.packages.insert(package.name, package);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CanonicalPackage> {
        self.packages.get(name)
    }

    #[cfg(test)]
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.packages.keys().copied()
    }

    /// Translate `name` for `manager` on `profile`
    pub fn translate(&self, manager: ManagerId, profile: &HostProfile, name: &str) -> Result<Translation> {
        self.get(name)
            .and_then(|p| p.translate(manager, profile))
            .cloned()
            .ok_or_else(|| plan_error::not_catalogued(name, manager.as_str()))
    }
}

/// Built-in translations, following each distribution's package naming
pub fn default_catalog() -> PackageCatalog {
    use ManagerId::{Apt, Brew, Dnf, Pacman, Yum, Zypper};

    let rpm_xmlsec = packages(&["xmlsec1-devel", "xmlsec1-openssl-devel"]);

    PackageCatalog::new(vec![
        CanonicalPackage::new("build-tools", "C/C++ compiler toolchain")
            .on(Apt, &["build-essential"])
            .on(Dnf, &["gcc", "gcc-c++", "make", "libtool-ltdl-devel"])
            .on(Yum, &["gcc", "gcc-c++", "make", "libtool-ltdl-devel"])
            .on(Pacman, &["base-devel"])
            .on(Zypper, &["gcc-c++", "make"])
            .builtin_on(Brew),
        CanonicalPackage::new("python-dev", "Python 3 development headers")
            .on(Apt, &["python3-dev"])
            .on(Dnf, &["python3-devel"])
            .on(Yum, &["python3-devel"])
            .builtin_on(Pacman)
            .on(Zypper, &["python3-devel"])
            .builtin_on(Brew),
        CanonicalPackage::new("python-venv", "Python 3 venv module")
            .on(Apt, &["python3-venv", "python3-pip"])
            .builtin_on(Dnf)
            .builtin_on(Yum)
            .builtin_on(Pacman)
            .builtin_on(Zypper)
            .builtin_on(Brew),
        CanonicalPackage::new("libffi-dev", "libffi development files")
            .on(Apt, &["libffi-dev"])
            .on(Dnf, &["libffi-devel"])
            .on(Yum, &["libffi-devel"])
            .on(Pacman, &["libffi"])
            .on(Zypper, &["libffi-devel"])
            .builtin_on(Brew),
        CanonicalPackage::new("openssl-dev", "OpenSSL development files")
            .on(Apt, &["libssl-dev"])
            .on(Dnf, &["openssl-devel"])
            .on(Yum, &["openssl-devel"])
            .on(Pacman, &["openssl"])
            .on(Zypper, &["libopenssl-devel"])
            .builtin_on(Brew),
        CanonicalPackage::new("libxml2-dev", "libxml2 development files")
            .on(Apt, &["libxml2-dev"])
            .on(Dnf, &["libxml2-devel"])
            .on(Yum, &["libxml2-devel"])
            .on(Pacman, &["libxml2"])
            .on(Zypper, &["libxml2-devel"])
            .builtin_on(Brew),
        CanonicalPackage::new("libxslt-dev", "libxslt development files")
            .on(Apt, &["libxslt1-dev"])
            .on(Dnf, &["libxslt-devel"])
            .on(Yum, &["libxslt-devel"])
            .on(Pacman, &["libxslt"])
            .on(Zypper, &["libxslt-devel"])
            .builtin_on(Brew),
        CanonicalPackage::new("libjpeg-dev", "JPEG library development files")
            .on(Apt, &["libjpeg-dev"])
            .builtin_on(Dnf)
            .builtin_on(Yum)
            .builtin_on(Pacman)
            .builtin_on(Zypper)
            .builtin_on(Brew),
        CanonicalPackage::new("patch", "patch utility")
            .on(Apt, &["patch"])
            .on(Dnf, &["patch"])
            .on(Yum, &["patch"])
            .builtin_on(Pacman)
            .on(Zypper, &["patch"])
            .builtin_on(Brew),
        CanonicalPackage::new("perl", "Perl interpreter")
            .builtin_on(Apt)
            .on(Dnf, &["perl"])
            .on(Yum, &["perl"])
            .on(Pacman, &["perl"])
            .builtin_on(Zypper)
            .builtin_on(Brew),
        CanonicalPackage::new("pkg-config", "pkg-config")
            .on(Apt, &["pkg-config"])
            .on(Dnf, &["pkgconf-pkg-config"])
            .on(Yum, &["pkgconfig"])
            .builtin_on(Pacman)
            .on(Zypper, &["pkg-config"])
            .on(Brew, &["pkg-config"]),
        CanonicalPackage::new("git", "Git client")
            .on(Apt, &["git"])
            .on(Dnf, &["git"])
            .on(Yum, &["git"])
            .on(Pacman, &["git"])
            .on(Zypper, &["git"])
            .on(Brew, &["git"]),
        CanonicalPackage::new("xmlsec-dev", "xmlsec1 development files for SAML")
            .on(Apt, &["libxmlsec1-dev", "libxmlsec1-openssl"])
            .on_platform(
                Dnf,
                PlatformMatch::distro(&["centos", "rhel", "rocky", "almalinux"])
                    .version(VersionMatch::at_least("9")),
                rpm_xmlsec.clone(),
            )
            .on_platform(Dnf, PlatformMatch::distro(&["fedora"]), rpm_xmlsec)
            .unavailable_on(Dnf)
            .unavailable_on(Yum)
            .on(Pacman, &["xmlsec"])
            .on(Zypper, &["xmlsec1-devel", "xmlsec1-openssl-devel"])
            .unavailable_on(Brew),
        CanonicalPackage::new("mysql-client-dev", "MySQL client library")
            .on_platform(Apt, PlatformMatch::distro(&["ubuntu"]), packages(&["libmysqlclient-dev"]))
            .on(Apt, &["libmariadb-dev"])
            .on(Dnf, &["mariadb-connector-c-devel"])
            .on(Yum, &["mariadb-devel"])
            .on(Pacman, &["mariadb-libs"])
            .on(Zypper, &["libmariadb-devel"])
            .on(Brew, &["mysql"]),
        CanonicalPackage::new("memcached", "memcached server")
            .on(Apt, &["memcached"])
            .on(Dnf, &["memcached"])
            .on(Yum, &["memcached"])
            .on(Pacman, &["memcached"])
            .on(Zypper, &["memcached"])
            .on(Brew, &["memcached"]),
        CanonicalPackage::new("subversion", "Subversion client and bindings")
            .on(Apt, &["subversion", "libsvn-dev"])
            .on(Dnf, &["subversion", "subversion-devel"])
            .on(Yum, &["subversion", "subversion-devel"])
            .on(Pacman, &["subversion"])
            .on(Zypper, &["subversion", "subversion-devel"])
            .on(Brew, &["subversion"]),
        CanonicalPackage::new("cvs", "CVS client")
            .on(Apt, &["cvs"])
            .on_platform(
                Dnf,
                PlatformMatch::distro(&["rhel", "almalinux"]).version(VersionMatch::below("9")),
                Translation::Unavailable,
            )
            .on(Dnf, &["cvs"])
            .on(Yum, &["cvs"])
            .on(Pacman, &["cvs"])
            .on(Zypper, &["cvs"])
            .on(Brew, &["cvs"]),
    ])
}
