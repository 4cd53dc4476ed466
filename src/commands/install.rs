//! Install command
//!
//! Detects the host, pins compatible releases, builds the plan, asks for
//! confirmation and executes it. Everything that can rule the installation
//! out happens before the first command that changes the host.

use inquire::{Confirm, Password, PasswordDisplayMode};

use crate::cli::{HostOverrides, InstallArgs};
use crate::error::{InstallerError, Result, host as host_error};
use crate::executor::Executor;
use crate::host;
use crate::plan::{self, AppRequirements, InstallPlan};
use crate::process::SystemRunner;
use crate::pypi::{self, PypiClient};
use crate::registry::{PackageManagerRegistry, PackageManagerSpec};
use crate::site::{self, ServerLookup, SiteOptions, SystemLookup};
use crate::ui::display;
use crate::ui::{InteractiveProgressReporter, ProgressReporter, SilentProgressReporter};

/// Translate command-line arguments into plan requirements
pub fn requirements(args: &InstallArgs, lookup: &dyn ServerLookup) -> Result<AppRequirements> {
    let mut requirements = AppRequirements::new(&args.install_path);
    requirements.version = args.app_version.clone();
    requirements.addons.retain_mut(|addon| match args.addon_version(addon.id) {
        Some(version) => {
            addon.version = version.clone();
            true
        }
        None => false,
    });
    requirements.without = args.without.clone();
    requirements.skip_optional = args.skip_optional;
    requirements.python = args.python.clone();
    requirements.index_url = args.index_url.clone();
    requirements.extra_index_url = args.extra_index_url.clone();
    requirements.system_repo_url = args.system_repo_url.clone();

    if !args.no_site {
        let server = site::select_server(args.server, lookup)?;
        let mut options = SiteOptions::new(&args.sitedir_path, server);
        options.domain = args.domain.clone();
        options.port = args.port;
        options.admin_user = args.admin_user.clone();
        options.admin_email = args.admin_email.clone();
        options.admin_password = args.admin_password.clone();
        requirements.site = Some(options);
    }

    Ok(requirements)
}

/// The package manager must be runnable before anything is executed
fn preflight(manager: &PackageManagerSpec) -> Result<()> {
    let path = which::which(manager.binary).map_err(|_| host_error::manager_missing(manager.binary))?;
    tracing::debug!("Using {} at {}", manager.binary, path.display());
    Ok(())
}

fn confirm(steps: usize) -> Result<()> {
    if !console::user_attended() {
        return Err(InstallerError::NonInteractiveTerminal);
    }

    let proceed = Confirm::new(&format!("Run these {steps} steps?"))
        .with_default(true)
        .with_help_message("Press Enter to confirm, or 'n' to cancel")
        .prompt()?;

    if !proceed {
        return Err(InstallerError::Aborted);
    }
    Ok(())
}

/// Make sure a new site has an administrator password before anything runs
fn admin_password(plan: &mut InstallPlan, noinput: bool) -> Result<()> {
    let Some(install) = plan.site_install_mut() else {
        return Ok(());
    };
    if install.is_installed() || !install.needs_password() {
        return Ok(());
    }
    if noinput {
        return Err(InstallerError::MissingAdminPassword);
    }

    let password = Password::new("Password for the site administrator:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    if password.is_empty() {
        return Err(InstallerError::MissingAdminPassword);
    }
    install.set_password(&password);
    Ok(())
}

pub fn run(overrides: &HostOverrides, quiet: bool, args: InstallArgs) -> Result<()> {
    let runner = SystemRunner;
    let profile = host::detect(&overrides.detect_options(&args.python), &runner)?;
    let registry = PackageManagerRegistry::default();
    let manager = registry.select(&profile)?;

    if !quiet {
        display::display_profile(&profile, Some(manager.spec));
    }

    if !args.dry_run {
        preflight(manager.spec)?;
    }

    let mut requirements = requirements(&args, &SystemLookup)?;
    let version_notes = if args.skip_version_check {
        Vec::new()
    } else {
        let index = PypiClient::new(&args.pypi_url)?;
        let python = profile.python.as_ref().map(|p| &p.version);
        pypi::pin_versions(&index, python, &mut requirements)?
    };

    let mut plan = plan::build(&profile, &manager, &requirements)?;
    plan.notes.extend(version_notes);

    if !quiet || args.dry_run {
        display::display_plan(&plan);
    }

    if args.dry_run {
        println!();
        println!("Dry run: nothing was changed.");
        return Ok(());
    }

    if !args.noinput {
        confirm(plan.len())?;
    }
    admin_password(&mut plan, args.noinput)?;

    let mut reporter: Box<dyn ProgressReporter> = if quiet {
        Box::new(SilentProgressReporter)
    } else {
        Box::new(InteractiveProgressReporter::new())
    };
    let report = Executor::new(&runner, reporter.as_mut()).run(&plan);

    if quiet {
        display::display_failure(&report);
    } else {
        display::display_report(&report);
    }

    report.into_result().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::host::{Arch, HostProfile};
    use crate::plan::AppVersion;
    use crate::plan::addons::REVIEWBOT_WORKER;
    use crate::registry::PackageManagerRegistry;
    use crate::site::ServerKind;
    use clap::Parser;
    use tempfile::TempDir;
    use std::path::{Path, PathBuf};

    struct NoServers;

    impl ServerLookup for NoServers {
        fn path_exists(&self, _path: &Path) -> bool {
            false
        }

        fn find_program(&self, _name: &str) -> Option<PathBuf> {
            None
        }
    }

    fn install_args(args: &[&str]) -> InstallArgs {
        let mut argv = vec!["rbinstall", "install"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Install(args) => *args,
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_requirements_from_flags() {
        let args = install_args(&[
            "--app-version",
            ">=7,<8",
            "--install-path",
            "/srv/rb",
            "--extra-index-url",
            "https://extra.example.com",
            "--domain",
            "reviews.example.com",
        ]);
        let requirements = requirements(&args, &NoServers).unwrap();

        assert_eq!(requirements.version.to_string(), ">=7,<8");
        assert_eq!(requirements.environment, PathBuf::from("/srv/rb"));
        assert_eq!(requirements.extra_index_url.as_deref(), Some("https://extra.example.com"));

        let site = requirements.site.unwrap();
        assert_eq!(site.server, ServerKind::Standalone);
        assert_eq!(site.domain, "reviews.example.com");
        assert_eq!(site.port(), 8080);
    }

    #[test]
    fn test_addon_flags() {
        let args = install_args(&[
            "--no-install-powerpack",
            "--no-install-reviewbot-extension",
            "--reviewbot-worker-version",
            "4.0",
        ]);
        let requirements = requirements(&args, &NoServers).unwrap();

        assert_eq!(requirements.addons.len(), 1);
        assert_eq!(requirements.addons[0].id, REVIEWBOT_WORKER);
        assert_eq!(requirements.addons[0].version, "4.0".parse::<AppVersion>().unwrap());
    }

    #[test]
    fn test_admin_options_reach_the_site() {
        let args = install_args(&["--admin-user", "root", "--admin-password", "s3cret"]);
        let site = requirements(&args, &NoServers).unwrap().site.unwrap();
        assert_eq!(site.admin_user, "root");
        assert_eq!(site.admin_email(), "root@localhost");
        assert_eq!(site.admin_password.as_deref(), Some("s3cret"));
    }

    fn site_plan(temp: &TempDir, args: &[&str]) -> InstallPlan {
        let mut argv = vec!["--sitedir-path", temp.path().to_str().unwrap()];
        argv.extend_from_slice(args);
        let requirements = requirements(&install_args(&argv), &NoServers).unwrap();
        let profile = HostProfile::linux("debian", "12", Arch::X86_64);
        let registry = PackageManagerRegistry::default();
        let manager = registry.select(&profile).unwrap();
        plan::build(&profile, &manager, &requirements).unwrap()
    }

    #[test]
    fn test_missing_admin_password_without_input() {
        let temp = TempDir::new().unwrap();
        let mut plan = site_plan(&temp, &[]);
        let err = admin_password(&mut plan, true).unwrap_err();
        assert!(matches!(err, InstallerError::MissingAdminPassword));

        let mut plan = site_plan(&temp, &["--admin-password", "s3cret"]);
        assert!(admin_password(&mut plan, true).is_ok());
        assert!(!plan.site_install_mut().unwrap().needs_password());
    }

    #[test]
    fn test_existing_site_needs_no_password() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("conf")).unwrap();
        std::fs::write(temp.path().join(crate::site::SETTINGS_LOCAL), "").unwrap();
        let mut plan = site_plan(&temp, &[]);
        assert!(admin_password(&mut plan, true).is_ok());
    }

    #[test]
    fn test_no_site() {
        let args = install_args(&["--no-site"]);
        assert!(requirements(&args, &NoServers).unwrap().site.is_none());
    }

    #[test]
    fn test_unavailable_server_fails_before_planning() {
        let args = install_args(&["--server", "nginx"]);
        let err = requirements(&args, &NoServers).unwrap_err();
        assert!(matches!(err, InstallerError::SiteConfiguration { .. }));
    }
}
