//! Per-step results and the aggregated report

use std::fmt;

use crate::error::{InstallerError, Result};
use crate::plan::Requirement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    /// An optional step failed; the run continued
    Skipped,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Succeeded => f.write_str("succeeded"),
            StepStatus::Skipped => f.write_str("skipped"),
            StepStatus::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepResult {
    /// Position in the plan
    pub index: usize,
    pub name: String,
    pub requirement: Requirement,
    pub status: StepStatus,
    /// Whether the step modified the host
    pub changed: bool,
    pub exit_code: Option<i32>,
    /// Captured output of the failing command, or of the last command run
    pub output: String,
    pub error_detail: Option<String>,
}

/// Outcome of running a plan
#[derive(Debug)]
pub struct InstallReport {
    pub results: Vec<StepResult>,
    /// Notes carried over from planning
    pub notes: Vec<String>,
    /// The error that halted execution
    pub fatal: Option<InstallerError>,
}

impl InstallReport {
    /// No step failed and nothing halted the run
    pub fn succeeded(&self) -> bool {
        self.fatal.is_none() && self.results.iter().all(|r| r.status != StepStatus::Failed)
    }

    /// Optional steps that failed and were skipped
    pub fn warnings(&self) -> Vec<&StepResult> {
        self.results
            .iter()
            .filter(|r| r.status == StepStatus::Skipped)
            .collect()
    }

    pub fn failed_step(&self) -> Option<&StepResult> {
        self.results.iter().find(|r| r.status == StepStatus::Failed)
    }

    pub fn changed(&self) -> usize {
        self.results.iter().filter(|r| r.changed).count()
    }

    /// The fatal error, if any, otherwise the report itself
    pub fn into_result(mut self) -> Result<Self> {
        match self.fatal.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::exec;

    fn result(index: usize, status: StepStatus, changed: bool) -> StepResult {
        StepResult {
            index,
            name: format!("step {index}"),
            requirement: Requirement::Required,
            status,
            changed,
            exit_code: Some(0),
            output: String::new(),
            error_detail: None,
        }
    }

    #[test]
    fn test_report_summaries() {
        let report = InstallReport {
            results: vec![
                result(0, StepStatus::Succeeded, true),
                result(1, StepStatus::Skipped, false),
                result(2, StepStatus::Succeeded, false),
            ],
            notes: Vec::new(),
            fatal: None,
        };

        assert!(report.succeeded());
        assert_eq!(report.warnings().len(), 1);
        assert_eq!(report.changed(), 1);
        assert!(report.failed_step().is_none());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_into_result_returns_fatal_error() {
        let report = InstallReport {
            results: vec![result(0, StepStatus::Failed, false)],
            notes: Vec::new(),
            fatal: Some(exec::step_failed("yum install -y gcc", "exit code 1", "")),
        };

        assert!(!report.succeeded());
        assert_eq!(report.failed_step().map(|r| r.index), Some(0));
        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("yum install -y gcc"));
    }
}
