//! UI/Progress presentation layer
//!
//! This module handles:
//! - Progress reporting while the executor runs plan steps
//! - Interactive progress bars using indicatif
//! - Silent progress for quiet mode and tests
//!
//! All progress reporting goes through the ProgressReporter trait, allowing
//! different implementations based on command-line flags (e.g., --quiet).

pub mod display;

use indicatif::{ProgressBar, ProgressStyle};

use crate::executor::StepStatus;

/// Progress reporter trait for plan execution
pub trait ProgressReporter: Send + Sync {
    /// Called once before the first step
    fn start(&mut self, total_steps: usize);

    fn step_started(&mut self, index: usize, name: &str);

    fn step_finished(&mut self, index: usize, status: StepStatus);

    /// Every step ran
    fn finish(&mut self);

    /// Execution halted on a fatal error
    fn abandon(&mut self);
}

/// Interactive progress reporter with a visual progress bar
pub struct InteractiveProgressReporter {
    step_pb: ProgressBar,
}

impl InteractiveProgressReporter {
    pub fn new() -> Self {
        let step_style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let step_pb = ProgressBar::new(0);
        step_pb.set_style(step_style);

        Self { step_pb }
    }
}

impl Default for InteractiveProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for InteractiveProgressReporter {
    fn start(&mut self, total_steps: usize) {
        self.step_pb.set_length(total_steps as u64);
        self.step_pb.set_position(0);
    }

    fn step_started(&mut self, _index: usize, name: &str) {
        self.step_pb.set_message(name.to_string());
    }

    fn step_finished(&mut self, _index: usize, status: StepStatus) {
        if status == StepStatus::Skipped {
            self.step_pb.println(format!("  skipped: {}", self.step_pb.message()));
        }
        self.step_pb.inc(1);
    }

    fn finish(&mut self) {
        self.step_pb.finish_with_message("done");
    }

    fn abandon(&mut self) {
        self.step_pb.abandon();
    }
}

/// Silent progress reporter
///
/// Used with --quiet and in tests.
#[derive(Default)]
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn start(&mut self, _total_steps: usize) {}

    fn step_started(&mut self, _index: usize, _name: &str) {}

    fn step_finished(&mut self, _index: usize, _status: StepStatus) {}

    fn finish(&mut self) {}

    fn abandon(&mut self) {}
}
