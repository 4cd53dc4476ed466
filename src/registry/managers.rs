//! Package manager definitions
//!
//! Each manager is plain data: which platforms it handles and the argv
//! templates for installing, querying and adding repositories.

use std::fmt;

use serde::Serialize;

use super::matching::PlatformMatch;
use crate::host::HostProfile;
use crate::process::CommandOutput;
use crate::version::VersionMatch;

/// Placeholder replaced by the repository URL in repository templates
const URL: &str = "{url}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerId {
    Apt,
    Dnf,
    Yum,
    Pacman,
    Zypper,
    Brew,
}

impl ManagerId {
    pub fn as_str(self) -> &'static str {
        match self {
            ManagerId::Apt => "apt",
            ManagerId::Dnf => "dnf",
            ManagerId::Yum => "yum",
            ManagerId::Pacman => "pacman",
            ManagerId::Zypper => "zypper",
            ManagerId::Brew => "brew",
        }
    }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A system package manager and the hosts it is selected for
#[derive(Debug, Clone)]
pub struct PackageManagerSpec {
    pub id: ManagerId,
    pub name: &'static str,
    /// Program that must be on `PATH` before anything is executed
    pub binary: &'static str,
    /// Lower wins when several managers match a host
    pub priority: u8,
    pub supports: Vec<PlatformMatch>,
    install: Vec<&'static str>,
    query: Vec<&'static str>,
    query_expect: Option<&'static str>,
    add_repository: Option<Vec<&'static str>>,
    repository_check: Option<Vec<&'static str>>,
}

impl PackageManagerSpec {
    pub fn new(id: ManagerId, name: &'static str, binary: &'static str, priority: u8) -> Self {
        Self {
            id,
            name,
            binary,
            priority,
            supports: Vec::new(),
            install: Vec::new(),
            query: Vec::new(),
            query_expect: None,
            add_repository: None,
            repository_check: None,
        }
    }

    #[must_use]
    pub fn supports(mut self, platform: PlatformMatch) -> Self {
        self.supports.push(platform);
        self
    }

    #[must_use]
    pub fn with_install(mut self, argv: &[&'static str]) -> Self {
        self.install = argv.to_vec();
        self
    }

    /// Query argv prefix; the package name is appended. A zero exit means installed.
    #[must_use]
    pub fn with_query(mut self, argv: &[&'static str]) -> Self {
        self.query = argv.to_vec();
        self
    }

    /// Additionally require the query to print exactly `expect`
    #[must_use]
    pub fn with_query_expect(mut self, expect: &'static str) -> Self {
        self.query_expect = Some(expect);
        self
    }

    /// Add-repository template; `{url}` is substituted. `check` exits zero when already added.
    #[must_use]
    pub fn with_add_repository(mut self, argv: &[&'static str], check: &[&'static str]) -> Self {
        self.add_repository = Some(argv.to_vec());
        self.repository_check = Some(check.to_vec());
        self
    }

    pub fn detects(&self, profile: &HostProfile) -> bool {
        self.supports.iter().any(|m| m.matches(profile))
    }

    pub fn install_command(&self, packages: &[String]) -> Vec<String> {
        self.install
            .iter()
            .map(|s| (*s).to_string())
            .chain(packages.iter().cloned())
            .collect()
    }

    pub fn query_command(&self, package: &str) -> Vec<String> {
        self.query
            .iter()
            .map(|s| (*s).to_string())
            .chain(std::iter::once(package.to_string()))
            .collect()
    }

    /// Interpret the output of [`query_command`](Self::query_command)
    pub fn is_installed(&self, output: &CommandOutput) -> bool {
        output.success()
            && self
                .query_expect
                .is_none_or(|expect| output.output.trim() == expect)
    }

    pub fn add_repository_command(&self, url: &str) -> Option<Vec<String>> {
        self.add_repository.as_ref().map(|t| substitute(t, url))
    }

    pub fn repository_check_command(&self, url: &str) -> Option<Vec<String>> {
        self.repository_check.as_ref().map(|t| substitute(t, url))
    }
}

fn substitute(template: &[&str], url: &str) -> Vec<String> {
    template.iter().map(|part| part.replace(URL, url)).collect()
}

/// The built-in managers with their explicitly enumerated platforms
pub fn default_managers() -> Vec<PackageManagerSpec> {
    vec![
        PackageManagerSpec::new(ManagerId::Apt, "APT", "apt-get", 10)
            .supports(PlatformMatch::distro(&["debian"]).version(VersionMatch::at_least("10")))
            .supports(PlatformMatch::distro(&["ubuntu"]).version(VersionMatch::at_least("20.04")))
            .with_install(&["env", "DEBIAN_FRONTEND=noninteractive", "apt-get", "install", "-y"])
            .with_query(&["dpkg-query", "-W", "--showformat=${db:Status-Status}"])
            .with_query_expect("installed")
            .with_add_repository(
                &["add-apt-repository", "-y", URL],
                &["grep", "-rqsF", URL, "/etc/apt/sources.list", "/etc/apt/sources.list.d"],
            ),
        PackageManagerSpec::new(ManagerId::Dnf, "DNF", "dnf", 20)
            .supports(PlatformMatch::distro(&["centos"]).version(VersionMatch::at_least("9")))
            .supports(PlatformMatch::distro(&["fedora"]).version(VersionMatch::at_least("36")))
            .supports(
                PlatformMatch::distro(&["rhel", "rocky", "almalinux"])
                    .version(VersionMatch::at_least("8")),
            )
            .supports(PlatformMatch::distro(&["amzn"]).version(VersionMatch::at_least("2023")))
            .with_install(&["dnf", "install", "-y"])
            .with_query(&["rpm", "-q"])
            .with_add_repository(
                &["dnf", "config-manager", "--add-repo", URL],
                &["grep", "-rqsF", URL, "/etc/yum.repos.d"],
            ),
        PackageManagerSpec::new(ManagerId::Yum, "Yum", "yum", 30)
            .supports(PlatformMatch::distro(&["amzn"]).version(VersionMatch::Major(2)))
            .with_install(&["yum", "install", "-y"])
            .with_query(&["rpm", "-q"])
            .with_add_repository(
                &["yum-config-manager", "--add-repo", URL],
                &["grep", "-rqsF", URL, "/etc/yum.repos.d"],
            ),
        PackageManagerSpec::new(ManagerId::Pacman, "Pacman", "pacman", 40)
            .supports(PlatformMatch::distro(&["arch"]))
            .with_install(&["pacman", "-S", "--noconfirm", "--needed"])
            .with_query(&["pacman", "-Q"]),
        PackageManagerSpec::new(ManagerId::Zypper, "Zypper", "zypper", 50)
            .supports(PlatformMatch::distro(&["opensuse-leap", "sles"]).version(VersionMatch::at_least("15")))
            .supports(PlatformMatch::distro(&["opensuse-tumbleweed"]))
            .with_install(&["zypper", "--non-interactive", "install"])
            .with_query(&["rpm", "-q"])
            .with_add_repository(
                &["zypper", "--non-interactive", "addrepo", "--refresh", URL, "rbinstall-mirror"],
                &["zypper", "repos", "rbinstall-mirror"],
            ),
        PackageManagerSpec::new(ManagerId::Brew, "Homebrew", "brew", 90)
            .supports(PlatformMatch::macos().version(VersionMatch::at_least("11")))
            .with_install(&["brew", "install"])
            .with_query(&["brew", "list", "--versions"]),
    ]
}
