//! Turns a host profile, package manager and requirements into an [`InstallPlan`]
//!
//! Everything that can make a plan impossible is checked here, so a failing
//! build never leaves the host partially modified.

use std::collections::BTreeSet;

use super::features::{Feature, feature_ids};
use super::repositories::setup_steps;
use super::requirements::AppRequirements;
use super::{InstallPlan, PlannedStep, RepositorySpec, Step};
use crate::error::{Result, plan as plan_error};
use crate::host::HostProfile;
use crate::registry::{SelectedManager, Translation};
use crate::site;

/// Repository id used for `--system-repo-url`
const MIRROR_REPOSITORY: &str = "system-mirror";

/// A feature that survived gating, with its packages translated
struct Resolved<'f> {
    feature: &'f Feature,
    system: Vec<String>,
}

/// Build the installation plan
///
/// Fails before returning a plan when a required package has no equivalent on
/// `profile`, when `without` names an unknown feature, or when a mirror is
/// requested for a manager that cannot add repositories.
pub fn build(
    profile: &HostProfile,
    manager: &SelectedManager<'_>,
    requirements: &AppRequirements,
) -> Result<InstallPlan> {
    let ids = feature_ids(&requirements.features);
    if let Some(unknown) = requirements
        .without
        .iter()
        .find(|w| !ids.iter().any(|id| *id == w.as_str()))
    {
        return Err(plan_error::unknown_feature(unknown, &ids));
    }

    let mut steps = Vec::new();
    if let Some(url) = &requirements.system_repo_url {
        let command = manager
            .spec
            .add_repository_command(url)
            .ok_or_else(|| plan_error::repository_not_supported(manager.spec.name))?;
        steps.push(PlannedStep::required(
            "Enable system package mirror",
            Step::EnableRepository(RepositorySpec {
                id: MIRROR_REPOSITORY.to_string(),
                command,
                check: manager.spec.repository_check_command(url),
            }),
        ));
    }

    let mut notes = Vec::new();
    if requirements.skip_optional {
        notes.push("Optional features skipped (--skip-optional)".to_string());
    }

    let (resolved, missing) = resolve_features(profile, manager, requirements, &mut notes)?;
    if !missing.is_empty() {
        return Err(plan_error::unsatisfiable(missing, profile.to_string()));
    }

    steps.extend(setup_steps(profile));

    let mut seen = BTreeSet::new();
    let core: Vec<String> = resolved
        .iter()
        .filter(|r| r.feature.is_required())
        .flat_map(|r| r.system.iter().cloned())
        .filter(|p| seen.insert(p.clone()))
        .collect();
    if !core.is_empty() {
        steps.push(PlannedStep::required(
            "Install system packages",
            Step::InstallSystemPackages { packages: core },
        ));
    }

    for r in resolved.iter().filter(|r| !r.feature.is_required()) {
        let packages: Vec<String> = r
            .system
            .iter()
            .filter(|p| seen.insert((*p).clone()))
            .cloned()
            .collect();
        if !packages.is_empty() {
            steps.push(
                PlannedStep::optional(
                    format!("Install {} system packages", r.feature.id),
                    Step::InstallSystemPackages { packages },
                )
                .for_feature(r.feature.id),
            );
        }
    }

    let environment = requirements.environment.clone();
    steps.push(PlannedStep::required(
        "Create Python environment",
        Step::CreateRuntimeEnvironment {
            path: environment.clone(),
            python: requirements.python.clone(),
            index_url: requirements.index_url.clone(),
        },
    ));

    let install = |packages: Vec<String>| Step::InstallAppPackages {
        environment: environment.clone(),
        packages,
        extra_index_url: requirements.extra_index_url.clone(),
    };

    if !requirements.packaging.is_empty() {
        steps.push(PlannedStep::required(
            "Install Python packaging tools",
            install(requirements.packaging.clone()),
        ));
    }

    let required_extras: Vec<&'static str> = resolved
        .iter()
        .filter(|r| r.feature.is_required())
        .flat_map(|r| r.feature.extras.iter().copied())
        .collect();
    let mut app = vec![requirements.version.requirement(&requirements.package, &required_extras)];
    if let Some(site) = &requirements.site {
        app.extend(site.server.app_packages().iter().map(|p| (*p).to_string()));
    }
    steps.push(PlannedStep::required(
        format!("Install {}", requirements.package),
        install(dedup(app)),
    ));

    for r in resolved.iter().filter(|r| !r.feature.is_required() && !r.feature.extras.is_empty()) {
        let package = requirements.version.requirement(&requirements.package, &r.feature.extras);
        steps.push(
            PlannedStep::optional(format!("Install {} support", r.feature.id), install(vec![package]))
                .for_feature(r.feature.id),
        );
    }

    if !requirements.skip_optional {
        for addon in &requirements.addons {
            steps.push(PlannedStep::optional(
                format!("Install {}", addon.label),
                install(vec![addon.requirement()]),
            ));
        }
    }

    if let Some(options) = &requirements.site {
        steps.extend(site::plan_steps(&requirements.environment, options));
    }

    tracing::debug!("Planned {} steps with {} notes", steps.len(), notes.len());

    Ok(InstallPlan {
        manager: manager.spec.clone(),
        steps,
        notes,
    })
}

/// Gate and translate every selected feature
///
/// Returns the surviving features and the unavailable packages (or gated
/// feature ids) that make required features impossible.
fn resolve_features<'f>(
    profile: &HostProfile,
    manager: &SelectedManager<'_>,
    requirements: &'f AppRequirements,
    notes: &mut Vec<String>,
) -> Result<(Vec<Resolved<'f>>, Vec<String>)> {
    let mut resolved = Vec::new();
    let mut missing = Vec::new();

    for feature in &requirements.features {
        let required = feature.is_required();
        if !required && requirements.skip_optional {
            continue;
        }
        if !required && requirements.without.iter().any(|w| w == feature.id) {
            notes.push(format!("Feature '{}' disabled with --without", feature.id));
            continue;
        }

        let gate = if !feature.available_on(profile) {
            Some(format!("not supported on {profile}"))
        } else {
            feature
                .min_app_version
                .as_ref()
                .filter(|min| !requirements.version.may_reach(min))
                .map(|min| format!("requires {} {} or newer", requirements.package, min))
        };
        if let Some(reason) = gate {
            if required {
                missing.push(feature.id.to_string());
            } else {
                tracing::info!("Dropping optional feature {}: {}", feature.id, reason);
                notes.push(format!(
                    "Optional feature '{}' ({}) {}",
                    feature.id, feature.description, reason
                ));
            }
            continue;
        }

        let mut system = Vec::new();
        let mut unavailable = Vec::new();
        for canonical in &feature.system_packages {
            match manager.translate(canonical)? {
                Translation::Packages(names) => system.extend(names),
                Translation::Builtin => {}
                Translation::Unavailable => unavailable.push((*canonical).to_string()),
            }
        }

        if unavailable.is_empty() {
            resolved.push(Resolved { feature, system });
        } else if required {
            missing.extend(unavailable);
        } else {
            tracing::info!(
                "Dropping optional feature {}: {} unavailable",
                feature.id,
                unavailable.join(", ")
            );
            let described: Vec<String> = unavailable
                .iter()
                .map(|name| match manager.describe(name) {
                    Some(description) => format!("{name} ({description})"),
                    None => name.clone(),
                })
                .collect();
            notes.push(format!(
                "Optional feature '{}' ({}) is unavailable on {}: no package for {}",
                feature.id,
                feature.description,
                profile,
                described.join(", ")
            ));
        }
    }

    Ok((resolved, dedup(missing)))
}

/// Remove duplicates, keeping the first occurrence
fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InstallerError;
    use crate::host::Arch;
    use crate::plan::AppVersion;
    use crate::registry::catalog::CanonicalPackage;
    use crate::registry::{ManagerId, PackageManagerRegistry, default_catalog, default_managers};
    use crate::version::Version;
    use crate::site::{ServerKind, SiteOptions};

    fn ubuntu() -> HostProfile {
        HostProfile::linux("ubuntu", "22.04", Arch::X86_64).with_like(&["debian"])
    }

    fn plan_for(profile: &HostProfile, requirements: &AppRequirements) -> Result<InstallPlan> {
        let registry = PackageManagerRegistry::default();
        let manager = registry.select(profile)?;
        build(profile, &manager, requirements)
    }

    fn system_packages(plan: &InstallPlan) -> Vec<String> {
        plan.steps
            .iter()
            .filter_map(|s| match &s.step {
                Step::InstallSystemPackages { packages } => Some(packages.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn position(plan: &InstallPlan, kind: &str) -> Vec<usize> {
        plan.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.step.kind() == kind)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_ubuntu_plan_uses_apt_names() {
        let plan = plan_for(&ubuntu(), &AppRequirements::new("/opt/reviewboard")).unwrap();
        assert_eq!(plan.manager.id, ManagerId::Apt);

        let packages = system_packages(&plan);
        assert!(packages.contains(&"python3-dev".to_string()));
        assert!(packages.contains(&"libmysqlclient-dev".to_string()));
        assert!(packages.contains(&"libxmlsec1-dev".to_string()));
        assert!(plan.notes.is_empty(), "unexpected notes: {:?}", plan.notes);

        assert!(
            plan.commands()
                .iter()
                .any(|c| c.starts_with("env DEBIAN_FRONTEND=noninteractive apt-get install -y build-essential"))
        );
    }

    #[test]
    fn test_step_ordering() {
        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements.site = Some(SiteOptions::new("/var/www/reviewboard", ServerKind::Nginx));
        let profile = HostProfile::linux("rocky", "9.3", Arch::X86_64);
        let plan = plan_for(&profile, &requirements).unwrap();

        let repos = position(&plan, "repository");
        let system = position(&plan, "system-packages");
        let env = position(&plan, "environment");
        let app = position(&plan, "app-packages");
        let create = position(&plan, "site-install");
        let site = position(&plan, "site-config");

        assert!(!repos.is_empty() && !system.is_empty() && !site.is_empty());
        assert!(repos.iter().max() < system.iter().min());
        assert!(system.iter().max() < env.iter().min());
        assert_eq!(env.len(), 1);
        assert!(env[0] < *app.iter().min().unwrap());
        assert_eq!(create.len(), 1);
        assert!(app.iter().max() < create.iter().min());
        assert!(create[0] < *site.iter().min().unwrap());
        assert_eq!(site.last(), Some(&(plan.len() - 1)));
    }

    #[test]
    fn test_required_unavailable_package_fails() {
        let registry = PackageManagerRegistry::new(
            default_managers(),
            default_catalog().with(CanonicalPackage::new("foo", "Foo library").unavailable_on(ManagerId::Apt)),
        );
        let profile = ubuntu();
        let manager = registry.select(&profile).unwrap();

        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements
            .features
            .push(Feature::required("foo", "Foo support").system(&["foo"]));

        let err = build(&profile, &manager, &requirements).unwrap_err();
        match err {
            InstallerError::UnsatisfiableRequirements { packages, profile } => {
                assert_eq!(packages, vec!["foo".to_string()]);
                assert!(profile.contains("ubuntu") || profile.contains("Ubuntu"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_optional_unavailable_package_degrades() {
        let profile = HostProfile::linux("rhel", "8.9", Arch::X86_64);
        let plan = plan_for(&profile, &AppRequirements::new("/opt/reviewboard")).unwrap();

        assert!(plan.steps.iter().all(|s| s.feature.as_deref() != Some("saml")));
        assert!(
            plan.notes
                .iter()
                .any(|n| n.contains("'saml'") && n.contains("xmlsec-dev (xmlsec1 development files for SAML)"))
        );
    }

    #[test]
    fn test_app_version_gate() {
        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements.version = "5.0.7".parse().unwrap();
        let plan = plan_for(&ubuntu(), &requirements).unwrap();

        assert!(!system_packages(&plan).contains(&"libxmlsec1-dev".to_string()));
        assert!(plan.notes.iter().any(|n| n.contains("requires ReviewBoard 6.0")));
        assert!(plan.commands().iter().any(|c| c.ends_with("ReviewBoard==5.0.7")));
    }

    #[test]
    fn test_app_version_gate_pads_release() {
        for selector in ["6", "<=6", "==6.*", ">=5,<7"] {
            let mut requirements = AppRequirements::new("/opt/reviewboard");
            requirements.version = selector.parse().unwrap();
            let plan = plan_for(&ubuntu(), &requirements).unwrap();
            assert!(
                system_packages(&plan).contains(&"libxmlsec1-dev".to_string()),
                "saml dropped for {selector}: {:?}",
                plan.notes
            );
        }

        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements.version = "~=5.0".parse().unwrap();
        let plan = plan_for(&ubuntu(), &requirements).unwrap();
        assert!(plan.steps.iter().all(|s| s.feature.as_deref() != Some("saml")));
        assert!(plan.notes.iter().any(|n| n.contains("'saml' (SAML single sign-on)")));
    }

    #[test]
    fn test_skip_optional_and_without() {
        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements.skip_optional = true;
        let plan = plan_for(&ubuntu(), &requirements).unwrap();
        assert!(plan.steps.iter().all(PlannedStep::is_required));
        assert!(!plan.commands().iter().any(|c| c.contains("ReviewBoardPowerPack")));

        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements.without = vec!["mysql".to_string()];
        let plan = plan_for(&ubuntu(), &requirements).unwrap();
        assert!(!system_packages(&plan).contains(&"libmysqlclient-dev".to_string()));
        assert!(plan.steps.iter().any(|s| s.feature.as_deref() == Some("saml")));
    }

    #[test]
    fn test_unknown_feature_is_rejected() {
        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements.without = vec!["sso".to_string()];
        let err = plan_for(&ubuntu(), &requirements).unwrap_err();
        assert!(matches!(err, InstallerError::UnknownFeature { .. }));
    }

    #[test]
    fn test_mirror_repository() {
        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements.system_repo_url = Some("http://mirror.example.com/ubuntu".to_string());
        let plan = plan_for(&ubuntu(), &requirements).unwrap();
        match &plan.steps[0].step {
            Step::EnableRepository(repo) => {
                assert_eq!(repo.id, MIRROR_REPOSITORY);
                assert!(repo.command.contains(&"http://mirror.example.com/ubuntu".to_string()));
                assert!(repo.check.is_some());
            }
            other => panic!("unexpected first step {other:?}"),
        }

        let arch = HostProfile::linux("arch", "", Arch::X86_64);
        let err = plan_for(&arch, &requirements).unwrap_err();
        assert!(matches!(err, InstallerError::RepositoryNotSupported { .. }));
    }

    #[test]
    fn test_packages_are_deduplicated() {
        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements
            .features
            .push(Feature::optional("extra-git", "Duplicate git").system(&["git", "patch"]));
        let plan = plan_for(&ubuntu(), &requirements).unwrap();

        let packages = system_packages(&plan);
        let unique: BTreeSet<_> = packages.iter().collect();
        assert_eq!(packages.len(), unique.len());
        assert!(plan.steps.iter().all(|s| s.feature.as_deref() != Some("extra-git")));
    }

    #[test]
    fn test_standalone_site_adds_gunicorn() {
        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements.site = Some(SiteOptions::new("/var/www/reviewboard", ServerKind::Standalone));
        let plan = plan_for(&ubuntu(), &requirements).unwrap();

        let app = plan
            .steps
            .iter()
            .find(|s| s.name == "Install ReviewBoard")
            .unwrap();
        match &app.step {
            Step::InstallAppPackages { packages, .. } => {
                assert_eq!(packages, &vec!["ReviewBoard".to_string(), "gunicorn".to_string()]);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_addons_follow_feature_support() {
        let mut requirements = AppRequirements::new("/opt/reviewboard");
        requirements.addons[0].version = AppVersion::Exact(Version::parse("6.1"));
        requirements.addons.retain(|a| a.id != "reviewbot-worker");
        let plan = plan_for(&ubuntu(), &requirements).unwrap();

        let names: Vec<&str> = plan.steps.iter().map(|s| s.name.as_str()).collect();
        let powerpack = names.iter().position(|n| *n == "Install Power Pack").unwrap();
        let extension = names.iter().position(|n| *n == "Install Review Bot extension").unwrap();
        let storages = names.iter().position(|n| *n == "Install storages support").unwrap();
        assert!(storages < powerpack && powerpack < extension);
        assert!(!plan.steps[powerpack].is_required());
        assert!(!names.contains(&"Install Review Bot worker"));
        assert!(plan.commands()[powerpack].ends_with("ReviewBoardPowerPack==6.1"));
    }

    #[test]
    fn test_packaging_step_builds_lxml_from_source() {
        let plan = plan_for(&ubuntu(), &AppRequirements::new("/opt/reviewboard")).unwrap();
        let packaging = plan
            .steps
            .iter()
            .position(|s| s.name == "Install Python packaging tools")
            .unwrap();
        assert!(plan.steps[packaging].is_required());
        assert!(plan.commands()[packaging].ends_with("pip setuptools wheel --no-binary lxml lxml"));
    }

    #[test]
    fn test_every_supported_platform_builds() {
        let platforms = [
            HostProfile::linux("debian", "10", Arch::X86_64),
            HostProfile::linux("debian", "12", Arch::X86_64),
            HostProfile::linux("ubuntu", "20.04", Arch::X86_64),
            HostProfile::linux("ubuntu", "24.04", Arch::X86_64),
            HostProfile::linux("centos", "9", Arch::X86_64),
            HostProfile::linux("fedora", "36", Arch::X86_64),
            HostProfile::linux("fedora", "40", Arch::X86_64),
            HostProfile::linux("rhel", "8.9", Arch::X86_64),
            HostProfile::linux("rhel", "9.3", Arch::X86_64),
            HostProfile::linux("rocky", "8.9", Arch::X86_64),
            HostProfile::linux("rocky", "9.3", Arch::X86_64),
            HostProfile::linux("almalinux", "8.9", Arch::X86_64),
            HostProfile::linux("almalinux", "9.3", Arch::X86_64),
            HostProfile::linux("amzn", "2", Arch::X86_64),
            HostProfile::linux("amzn", "2023", Arch::X86_64),
            HostProfile::linux("arch", "", Arch::X86_64),
            HostProfile::linux("opensuse-leap", "15.5", Arch::X86_64),
            HostProfile::linux("opensuse-tumbleweed", "20240101", Arch::X86_64),
            HostProfile::linux("sles", "15.5", Arch::X86_64),
            HostProfile::macos("11.7", Arch::X86_64),
            HostProfile::macos("14.4", Arch::X86_64),
        ];

        for base in platforms {
            for arch in [Arch::X86_64, Arch::Aarch64] {
                let mut profile = base.clone();
                profile.architecture = arch;
                let mut requirements = AppRequirements::new("/opt/reviewboard");
                requirements.site = Some(SiteOptions::new("/var/www/reviewboard", ServerKind::Nginx));

                let plan = plan_for(&profile, &requirements)
                    .unwrap_or_else(|e| panic!("no plan for {profile}: {e}"));
                assert!(plan.steps.iter().any(|s| s.name == "Install system packages"), "{profile}");
                assert!(plan.steps.iter().any(|s| s.name == "Install ReviewBoard"), "{profile}");
                assert_eq!(
                    plan.steps.iter().filter(|s| s.feature.as_deref() == Some("perforce")).count(),
                    usize::from(profile.architecture == Arch::X86_64 || profile.distro_id == "macos"),
                    "{profile}"
                );
            }
        }
    }
}
