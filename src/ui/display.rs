//! Console output for profiles, plans and reports

use std::io::{self, Write};

use console::Style;

use crate::executor::InstallReport;
use crate::host::HostProfile;
use crate::plan::{InstallPlan, Requirement};
use crate::registry::PackageManagerSpec;

fn label(text: &str) -> console::StyledObject<&str> {
    Style::new().bold().apply_to(text)
}

/// Print the detected host and the package manager chosen for it
pub fn display_profile(profile: &HostProfile, manager: Option<&PackageManagerSpec>) {
    println!("{}", Style::new().bold().green().apply_to("Host"));
    println!("  {} {}", label("System:"), profile.os_family);
    if let Some(name) = &profile.distro_name {
        println!("  {} {}", label("Distribution:"), name);
    }
    println!("  {} {}", label("ID:"), profile.distro_id);
    if !profile.distro_version.is_empty() {
        println!("  {} {}", label("Version:"), profile.distro_version);
    }
    println!("  {} {}", label("Architecture:"), profile.architecture);
    match &profile.python {
        Some(python) => println!(
            "  {} {} ({})",
            label("Python:"),
            python.version,
            python.executable.display()
        ),
        None => println!("  {} {}", label("Python:"), Style::new().dim().apply_to("not found")),
    }
    if let Some(manager) = manager {
        println!(
            "  {} {} ({})",
            label("Package manager:"),
            Style::new().cyan().apply_to(manager.name),
            manager.binary
        );
    }
}

/// Print every planned step with the action it will take
pub fn display_plan(plan: &InstallPlan) {
    println!();
    println!(
        "{} {}",
        Style::new().bold().green().apply_to("Installation plan"),
        Style::new().dim().apply_to(format!("({} steps)", plan.len()))
    );
    if plan.is_empty() {
        println!("  Nothing to do.");
    }

    for (index, (planned, command)) in plan.steps.iter().zip(plan.commands()).enumerate() {
        let tag = match planned.requirement {
            Requirement::Required => String::new(),
            Requirement::Optional => format!(" {}", Style::new().dim().apply_to("[optional]")),
        };
        println!(
            "  {:>2}. {}{}",
            index + 1,
            Style::new().bold().apply_to(&planned.name),
            tag
        );
        println!("      {}", Style::new().cyan().apply_to(command));
    }

    display_notes(&plan.notes);
}

fn display_notes(notes: &[String]) {
    if notes.is_empty() {
        return;
    }
    println!();
    for note in notes {
        println!("{} {}", Style::new().yellow().apply_to("note:"), note);
    }
}

/// Print the outcome of a finished run
pub fn display_report(report: &InstallReport) {
    let warnings = report.warnings();

    println!();
    for result in &warnings {
        println!(
            "{} {} step '{}' skipped: {}",
            Style::new().yellow().bold().apply_to("warning:"),
            result.requirement,
            result.name,
            result.error_detail.as_deref().unwrap_or("failed")
        );
    }

    if report.succeeded() {
        println!(
            "{} {} steps, {} changed, {} skipped",
            Style::new().green().bold().apply_to("Installation complete:"),
            report.results.len(),
            report.changed(),
            warnings.len()
        );
        display_notes(&report.notes);
    } else {
        display_failure(report);
    }
}

/// Print the failing step, its output and how to recover
pub fn display_failure(report: &InstallReport) {
    // Nothing useful is left to do if stderr is gone
    write_failure(&mut io::stderr().lock(), report).ok();
}

fn write_failure(out: &mut impl Write, report: &InstallReport) -> io::Result<()> {
    let Some(failed) = report.failed_step() else {
        return Ok(());
    };

    let exit = failed
        .exit_code
        .map(|code| format!(", exit code {code}"))
        .unwrap_or_default();
    writeln!(
        out,
        "{} step {} ({}){}",
        Style::new().red().bold().apply_to("Failed:"),
        failed.index + 1,
        Style::new().bold().apply_to(&failed.name),
        exit
    )?;
    if let Some(detail) = &failed.error_detail {
        writeln!(out, "  {detail}")?;
    }

    if !failed.output.trim().is_empty() {
        writeln!(out, "{}", Style::new().bold().apply_to("Command output:"))?;
        for line in failed.output.lines() {
            writeln!(out, "  {line}")?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "{}",
        Style::new()
            .yellow()
            .apply_to("Fix the problem above and re-run the installer. Completed steps are detected and skipped.")
    )
}
