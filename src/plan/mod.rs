//! Installation plans
//!
//! A plan is the ordered list of steps [`build`] derives from the host profile,
//! the selected package manager and the application requirements. Steps are
//! plain data; the executor interprets them.

pub mod addons;
pub mod builder;
pub mod features;
pub mod repositories;
pub mod requirements;

pub use builder::build;
pub use requirements::{AppRequirements, AppVersion};

use std::fmt;
use std::path::PathBuf;

use crate::environment;
use crate::process::join_cmdline;
use crate::registry::PackageManagerSpec;
use crate::site::{SiteInstall, SiteRender};

/// Whether a step failure halts the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Required => f.write_str("required"),
            Requirement::Optional => f.write_str("optional"),
        }
    }
}

/// A package repository to enable before installing packages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySpec {
    pub id: String,
    pub command: Vec<String>,
    /// Exits zero when the repository is already enabled
    pub check: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    EnableRepository(RepositorySpec),
    InstallSystemPackages {
        packages: Vec<String>,
    },
    CreateRuntimeEnvironment {
        path: PathBuf,
        python: String,
        index_url: Option<String>,
    },
    InstallAppPackages {
        environment: PathBuf,
        packages: Vec<String>,
        extra_index_url: Option<String>,
    },
    /// `rb-site install`, skipped once the site has its settings file
    CreateSite(SiteInstall),
    RenderSiteConfig(SiteRender),
    RunCommand(Vec<String>),
}

impl Step {
    /// Short kind label used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Step::EnableRepository(_) => "repository",
            Step::InstallSystemPackages { .. } => "system-packages",
            Step::CreateRuntimeEnvironment { .. } => "environment",
            Step::InstallAppPackages { .. } => "app-packages",
            Step::CreateSite(_) => "site-install",
            Step::RenderSiteConfig(_) => "site-config",
            Step::RunCommand(_) => "command",
        }
    }

    /// Human-readable action: the command line, or the file to be written
    pub fn describe(&self, manager: &PackageManagerSpec) -> String {
        match self {
            Step::EnableRepository(repo) => join_cmdline(&repo.command),
            Step::InstallSystemPackages { packages } => {
                join_cmdline(&manager.install_command(packages))
            }
            Step::CreateRuntimeEnvironment { path, python, .. } => {
                join_cmdline(&environment::create_command(path, python))
            }
            Step::InstallAppPackages {
                environment: env,
                packages,
                extra_index_url,
            } => join_cmdline(&environment::pip_install_command(
                &environment::RuntimeEnvironment::at(env),
                packages,
                extra_index_url.as_deref(),
            )),
            Step::CreateSite(install) => join_cmdline(&install.command),
            Step::RenderSiteConfig(render) => {
                format!("write {} ({})", render.target.display(), render.template)
            }
            Step::RunCommand(argv) => join_cmdline(argv),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub name: String,
    pub step: Step,
    pub requirement: Requirement,
    /// Feature this step was planned for, if any
    pub feature: Option<String>,
}

impl PlannedStep {
    pub fn required(name: impl Into<String>, step: Step) -> Self {
        Self {
            name: name.into(),
            step,
            requirement: Requirement::Required,
            feature: None,
        }
    }

    pub fn optional(name: impl Into<String>, step: Step) -> Self {
        Self {
            name: name.into(),
            step,
            requirement: Requirement::Optional,
            feature: None,
        }
    }

    #[must_use]
    pub fn for_feature(mut self, feature: &str) -> Self {
        self.feature = Some(feature.to_string());
        self
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }
}

/// Ordered steps plus the notes recorded while planning
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub manager: PackageManagerSpec,
    pub steps: Vec<PlannedStep>,
    /// Degraded optional features and other decisions worth showing the user
    pub notes: Vec<String>,
}

impl InstallPlan {
    /// The actions the plan would take, in order
    pub fn commands(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| s.step.describe(&self.manager))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The `rb-site install` step, if the plan creates a site
    pub fn site_install_mut(&mut self) -> Option<&mut SiteInstall> {
        self.steps.iter_mut().find_map(|s| match &mut s.step {
            Step::CreateSite(install) => Some(install),
            _ => None,
        })
    }
}
