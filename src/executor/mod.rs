//! Plan execution
//!
//! Steps run strictly in order, one subprocess at a time. A failed required
//! step halts the run; a failed optional step is recorded as skipped and the
//! run continues. A child killed by a signal always halts the run. Nothing is
//! rolled back: every step is a no-op when its effect is already present, so
//! re-running the installer is the recovery path.

mod report;

pub use report::{InstallReport, StepResult, StepStatus};

use crate::environment::{EnvironmentBuilder, RuntimeEnvironment};
use crate::error::{InstallerError, Result, exec};
use crate::plan::{InstallPlan, PlannedStep, RepositorySpec, Step};
use crate::process::{CommandOutput, CommandRunner, join_cmdline};
use crate::registry::PackageManagerSpec;
use crate::site::{self, SiteInstall};
use crate::ui::ProgressReporter;

/// What a successful step did
#[derive(Debug, Default)]
struct Outcome {
    changed: bool,
    exit_code: Option<i32>,
    output: String,
}

impl Outcome {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed(changed: bool) -> Self {
        Self {
            changed,
            ..Self::default()
        }
    }
}

/// Why a step failed
#[derive(Debug)]
struct Failure {
    error: InstallerError,
    exit_code: Option<i32>,
}

impl From<InstallerError> for Failure {
    fn from(error: InstallerError) -> Self {
        Self {
            error,
            exit_code: None,
        }
    }
}

type StepOutcome = std::result::Result<Outcome, Failure>;

/// Runs an [`InstallPlan`] against a [`CommandRunner`]
pub struct Executor<'a> {
    runner: &'a dyn CommandRunner,
    reporter: &'a mut dyn ProgressReporter,
}

impl<'a> Executor<'a> {
    pub fn new(runner: &'a dyn CommandRunner, reporter: &'a mut dyn ProgressReporter) -> Self {
        Self { runner, reporter }
    }

    /// Execute every step of `plan`, stopping at the first fatal failure
    pub fn run(&mut self, plan: &InstallPlan) -> InstallReport {
        let total = plan.len();
        self.reporter.start(total);

        let mut results = Vec::with_capacity(total);
        let mut fatal = None;

        for (index, planned) in plan.steps.iter().enumerate() {
            self.reporter.step_started(index, &planned.name);
            tracing::info!("[{}/{}] {} ({})", index + 1, total, planned.name, planned.step.kind());

            let (result, error) = match self.execute(&plan.manager, &planned.step) {
                Ok(outcome) => (StepResult::succeeded(index, planned, outcome), None),
                Err(failure) => self.classify(index, planned, failure),
            };

            self.reporter.step_finished(index, result.status);
            results.push(result);

            if error.is_some() {
                fatal = error;
                break;
            }
        }

        if fatal.is_some() {
            self.reporter.abandon();
        } else {
            self.reporter.finish();
        }

        InstallReport {
            results,
            notes: plan.notes.clone(),
            fatal,
        }
    }

    fn classify(
        &self,
        index: usize,
        planned: &PlannedStep,
        failure: Failure,
    ) -> (StepResult, Option<InstallerError>) {
        let interrupted = matches!(failure.error, InstallerError::Interrupted { .. });

        if planned.is_required() || interrupted {
            tracing::error!("Step '{}' failed: {}", planned.name, failure.error);
            let result = StepResult::failed(index, planned, StepStatus::Failed, &failure);
            (result, Some(failure.error))
        } else {
            tracing::warn!(
                "Optional step '{}' failed, continuing: {}",
                planned.name,
                failure.error
            );
            (StepResult::failed(index, planned, StepStatus::Skipped, &failure), None)
        }
    }

    fn execute(&self, manager: &PackageManagerSpec, step: &Step) -> StepOutcome {
        match step {
            Step::EnableRepository(repo) => self.enable_repository(repo),
            Step::InstallSystemPackages { packages } => self.install_system_packages(manager, packages),
            Step::CreateRuntimeEnvironment {
                path,
                python,
                index_url,
            } => {
                let (_, changed) =
                    EnvironmentBuilder::new(self.runner).create(path, python, index_url.as_deref())?;
                Ok(Outcome::changed(changed))
            }
            Step::InstallAppPackages {
                environment,
                packages,
                extra_index_url,
            } => {
                let env = RuntimeEnvironment::at(environment);
                let changed = EnvironmentBuilder::new(self.runner).install(
                    &env,
                    packages,
                    extra_index_url.as_deref(),
                )?;
                Ok(Outcome::changed(changed))
            }
            Step::CreateSite(install) => self.create_site(install),
            Step::RenderSiteConfig(render) => Ok(Outcome::changed(site::render(render)?)),
            Step::RunCommand(argv) => self.run_checked(argv),
        }
    }

    fn enable_repository(&self, repo: &RepositorySpec) -> StepOutcome {
        if let Some(check) = &repo.check {
            let out = self.run_query(check)?;
            if out.success() {
                tracing::debug!("Repository {} is already enabled", repo.id);
                return Ok(Outcome::unchanged());
            }
        }
        self.run_checked(&repo.command)
    }

    fn create_site(&self, install: &SiteInstall) -> StepOutcome {
        if install.is_installed() {
            tracing::debug!("{} already exists", install.settings().display());
            return Ok(Outcome::unchanged());
        }

        let outcome = self.run_checked(&install.command)?;
        if !install.is_installed() {
            return Err(exec::site_configuration(format!(
                "rb-site install did not create {}",
                install.settings().display()
            ))
            .into());
        }
        Ok(outcome)
    }

    fn install_system_packages(&self, manager: &PackageManagerSpec, packages: &[String]) -> StepOutcome {
        let mut missing = Vec::new();
        for package in packages {
            let out = self.run_query(&manager.query_command(package))?;
            if manager.is_installed(&out) {
                tracing::debug!("{} is already installed", package);
            } else {
                missing.push(package.clone());
            }
        }

        if missing.is_empty() {
            return Ok(Outcome::unchanged());
        }

        tracing::info!("Installing {}", missing.join(" "));
        self.run_checked(&manager.install_command(&missing))
    }

    /// Run a read-only command; only an interrupt is an error
    fn run_query(&self, argv: &[String]) -> Result<CommandOutput> {
        let out = self.runner.run(argv)?;
        if out.interrupted() {
            return Err(exec::interrupted(join_cmdline(argv)));
        }
        Ok(out)
    }

    /// Run a command that must exit zero
    fn run_checked(&self, argv: &[String]) -> StepOutcome {
        let out = self.run_query(argv)?;
        if !out.success() {
            return Err(Failure {
                exit_code: out.code(),
                error: exec::step_failed(join_cmdline(argv), out.status.to_string(), out.output),
            });
        }

        Ok(Outcome {
            changed: true,
            exit_code: out.code(),
            output: out.output,
        })
    }
}

impl StepResult {
    fn succeeded(index: usize, planned: &PlannedStep, outcome: Outcome) -> Self {
        Self {
            index,
            name: planned.name.clone(),
            requirement: planned.requirement,
            status: StepStatus::Succeeded,
            changed: outcome.changed,
            exit_code: outcome.exit_code,
            output: outcome.output,
            error_detail: None,
        }
    }

    fn failed(index: usize, planned: &PlannedStep, status: StepStatus, failure: &Failure) -> Self {
        Self {
            index,
            name: planned.name.clone(),
            requirement: planned.requirement,
            status,
            changed: false,
            exit_code: failure.exit_code,
            output: failure.error.output().unwrap_or_default().to_string(),
            error_detail: Some(failure.error.to_string()),
        }
    }
}
