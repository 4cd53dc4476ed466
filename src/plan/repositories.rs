//! Per-distribution repository and toolchain setup
//!
//! Some distributions need extra repositories (CRB, EPEL, CodeReady Builder)
//! or package groups before the build dependencies can be installed. Every
//! setup whose platform matches contributes its steps, in table order.

use super::{PlannedStep, RepositorySpec, Step};
use crate::host::{Arch, HostProfile};
use crate::process::argv;
use crate::registry::PlatformMatch;
use crate::version::VersionMatch;

const EPEL_RELEASE_URL: &str = "https://dl.fedoraproject.org/pub/epel/epel-release-latest-{major}.noarch.rpm";

/// Setup steps for one group of platforms
pub struct PlatformSetup {
    pub when: PlatformMatch,
    pub steps: Vec<PlannedStep>,
}

impl PlatformSetup {
    fn new(when: PlatformMatch) -> Self {
        Self {
            when,
            steps: Vec::new(),
        }
    }

    fn enable(mut self, name: &str, id: &str, command: &[&str], check: &[&str]) -> Self {
        self.steps.push(PlannedStep::required(name, repository(id, command, check)));
        self
    }

    fn enable_optional(mut self, name: &str, id: &str, command: &[&str], check: &[&str]) -> Self {
        self.steps.push(PlannedStep::optional(name, repository(id, command, check)));
        self
    }

    fn run(mut self, name: &str, command: &[&str]) -> Self {
        self.steps
            .push(PlannedStep::required(name, Step::RunCommand(argv(command))));
        self
    }
}

fn repository(id: &str, command: &[&str], check: &[&str]) -> Step {
    Step::EnableRepository(RepositorySpec {
        id: id.to_string(),
        command: argv(command),
        check: (!check.is_empty()).then(|| argv(check)),
    })
}

fn dnf_plugins(setup: PlatformSetup) -> PlatformSetup {
    setup.enable(
        "Install DNF plugins",
        "dnf-plugins-core",
        &["dnf", "install", "-y", "dnf-plugins-core"],
        &["rpm", "-q", "dnf-plugins-core"],
    )
}

fn crb(setup: PlatformSetup) -> PlatformSetup {
    setup.enable(
        "Enable CRB repository",
        "crb",
        &["dnf", "config-manager", "--set-enabled", "crb"],
        &["sh", "-c", "dnf repolist --enabled | grep -q '^crb'"],
    )
}

fn epel(setup: PlatformSetup, packages: &[&str]) -> PlatformSetup {
    let mut command = vec!["dnf", "install", "-y"];
    command.extend_from_slice(packages);
    setup.enable("Enable EPEL repository", "epel", &command, &["rpm", "-q", "epel-release"])
}

fn rhel(major: &str, version: VersionMatch, arch: &Arch) -> PlatformSetup {
    let codeready = format!("codeready-builder-for-rhel-{major}-{arch}-rpms");
    let codeready_check = format!("subscription-manager repos --list-enabled | grep -q {codeready}");
    let epel_url = EPEL_RELEASE_URL.replace("{major}", major);

    PlatformSetup::new(PlatformMatch::distro(&["rhel"]).version(version).arch(arch.clone()))
        .enable_optional(
            "Enable CodeReady Builder repository",
            "codeready-builder",
            &["subscription-manager", "repos", "--enable", &codeready],
            &["sh", "-c", &codeready_check],
        )
        .enable(
            "Enable EPEL repository",
            "epel",
            &["dnf", "install", "-y", &epel_url],
            &["rpm", "-q", "epel-release"],
        )
}

/// The built-in setup table
pub fn default_setups() -> Vec<PlatformSetup> {
    let mut setups = vec![
        PlatformSetup::new(PlatformMatch::distro(&["amzn"]).version(VersionMatch::Major(2))).run(
            "Install Development Tools group",
            &["yum", "groupinstall", "-y", "Development Tools"],
        ),
        epel(
            crb(dnf_plugins(PlatformSetup::new(PlatformMatch::distro(&["centos"])))),
            &["epel-release", "epel-next-release"],
        ),
        PlatformSetup::new(PlatformMatch::family(&["opensuse"])).run(
            "Install devel_basis pattern",
            &["zypper", "--non-interactive", "install", "-t", "pattern", "devel_basis"],
        ),
        epel(
            dnf_plugins(PlatformSetup::new(
                PlatformMatch::distro(&["rocky", "almalinux"]).version(VersionMatch::Major(8)),
            )),
            &["epel-release"],
        ),
        epel(
            crb(dnf_plugins(PlatformSetup::new(
                PlatformMatch::distro(&["rocky", "almalinux"]).version(VersionMatch::at_least("9")),
            ))),
            &["epel-release"],
        ),
    ];

    for arch in [Arch::X86_64, Arch::Aarch64] {
        setups.push(rhel("8", VersionMatch::Major(8), &arch));
        setups.push(rhel("9", VersionMatch::at_least("9"), &arch));
    }

    setups
}

/// Setup steps for `profile`, in table order
pub fn setup_steps(profile: &HostProfile) -> Vec<PlannedStep> {
    default_setups()
        .into_iter()
        .filter(|s| s.when.matches(profile))
        .flat_map(|s| s.steps)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(profile: &HostProfile) -> Vec<String> {
        setup_steps(profile).into_iter().map(|s| s.name).collect()
    }

    #[test]
    fn test_ubuntu_needs_nothing() {
        assert!(setup_steps(&HostProfile::linux("ubuntu", "22.04", Arch::X86_64)).is_empty());
    }

    #[test]
    fn test_rocky_9_enables_crb_once() {
        let steps = names(&HostProfile::linux("rocky", "9.3", Arch::X86_64));
        assert_eq!(
            steps,
            vec!["Install DNF plugins", "Enable CRB repository", "Enable EPEL repository"]
        );
    }

    #[test]
    fn test_rhel_uses_architecture_specific_repository() {
        let steps = setup_steps(&HostProfile::linux("rhel", "9.3", Arch::Aarch64));
        assert_eq!(steps.len(), 2);
        assert!(!steps[0].is_required());
        match &steps[0].step {
            Step::EnableRepository(repo) => {
                assert!(repo.command.contains(&"codeready-builder-for-rhel-9-aarch64-rpms".to_string()));
            }
            other => panic!("unexpected step {other:?}"),
        }
        match &steps[1].step {
            Step::EnableRepository(repo) => {
                assert!(repo.command[3].ends_with("epel-release-latest-9.noarch.rpm"));
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_opensuse_family() {
        let leap = HostProfile::linux("opensuse-leap", "15.5", Arch::X86_64).with_like(&["suse", "opensuse"]);
        assert_eq!(names(&leap), vec!["Install devel_basis pattern"]);
    }

    #[test]
    fn test_amazon_linux_2_group_install() {
        let steps = setup_steps(&HostProfile::linux("amzn", "2", Arch::X86_64));
        assert_eq!(
            steps[0].step,
            Step::RunCommand(argv(["yum", "groupinstall", "-y", "Development Tools"]))
        );
        assert!(setup_steps(&HostProfile::linux("amzn", "2023", Arch::X86_64)).is_empty());
    }
}
