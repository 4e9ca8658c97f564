use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use owo_colors::OwoColorize;
use tracing::debug;

use mincheck_check::{CheckSettings, Checker, Diagnostic, Manifest, Report, Severity};

use crate::cli::OutputFormat;
use crate::commands::{ExitStatus, pluralize};
use crate::printer::Printer;

/// Check the constraints files against the requirements files.
pub(crate) fn check(
    requirements: &[PathBuf],
    constraints: &[PathBuf],
    settings: CheckSettings,
    output_format: OutputFormat,
    printer: Printer,
) -> Result<ExitStatus> {
    if requirements.is_empty() {
        bail!(
            "No requirements files given; pass them as arguments or set `requirements` in `mincheck.toml`"
        );
    }
    if constraints.is_empty() {
        debug!("No constraints files given; only `-c` includes are checked");
    }

    let manifest = Manifest::from_files(requirements, constraints)?;
    debug!(
        "Checking {} against {} in {}",
        pluralize(manifest.requirements.len(), "requirement", "requirements"),
        pluralize(manifest.constraints.len(), "constraint", "constraints"),
        pluralize(settings.environments.len(), "environment", "environments"),
    );

    let report = Checker::new(settings).check(&manifest)?;

    match output_format {
        OutputFormat::Text => write_text(&report, printer)?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            writeln!(printer.stdout(), "{json}")?;
            // Keep stdout parseable; the summary goes to stderr.
            let summary = format!("Checked {}", checked(&report));
            writeln!(printer.stderr(), "{}", summary.dimmed())?;
        }
    }

    if report.is_success() {
        Ok(ExitStatus::Success)
    } else {
        Ok(ExitStatus::Failure)
    }
}

fn write_text(report: &Report, printer: Printer) -> Result<()> {
    let mut stdout = printer.stdout();

    for diagnostic in &report.diagnostics {
        write_diagnostic(diagnostic, report.environments.len(), &mut stdout)?;
        writeln!(stdout)?;
    }

    let counts = report.counts();
    let checked = checked(report);
    if counts.errors == 0 && counts.warnings == 0 {
        writeln!(
            stdout,
            "{} Checked {checked}",
            "All checks passed.".green().bold()
        )?;
    } else {
        let mut found = Vec::new();
        if counts.errors > 0 {
            found.push(pluralize(counts.errors, "error", "errors"));
        }
        if counts.warnings > 0 {
            found.push(pluralize(counts.warnings, "warning", "warnings"));
        }
        let summary = format!("Found {}.", found.join(" and "));
        if report.is_success() {
            writeln!(stdout, "{} Checked {checked}", summary.yellow().bold())?;
        } else {
            writeln!(stdout, "{} Checked {checked}", summary.red().bold())?;
        }
    }
    Ok(())
}

/// What a check covered, e.g. `5 requirements and 5 constraints in 18 environments`.
fn checked(report: &Report) -> String {
    format!(
        "{} and {} in {}",
        pluralize(report.requirements, "requirement", "requirements"),
        pluralize(report.constraints, "constraint", "constraints"),
        pluralize(report.environments.len(), "environment", "environments"),
    )
}

fn write_diagnostic(
    diagnostic: &Diagnostic,
    total_environments: usize,
    mut stdout: impl Write,
) -> std::fmt::Result {
    let label = format!("{}[{}]", diagnostic.severity, diagnostic.rule);
    match diagnostic.severity {
        Severity::Error => write!(stdout, "{}", label.red().bold())?,
        Severity::Warning => write!(stdout, "{}", label.yellow().bold())?,
        Severity::Ignore => write!(stdout, "{label}")?,
    }
    writeln!(stdout, "{} {}", ":".bold(), diagnostic.message)?;

    if let Some(origin) = &diagnostic.requirement {
        writeln!(stdout, "  {} {origin}", "requirement:".dimmed())?;
    }
    for origin in &diagnostic.constraints {
        writeln!(stdout, "  {} {origin}", "constraint:".dimmed())?;
    }
    if diagnostic.environments.len() == total_environments {
        writeln!(
            stdout,
            "  {} all {total_environments}",
            "environments:".dimmed()
        )?;
    } else {
        writeln!(
            stdout,
            "  {} {}",
            "environments:".dimmed(),
            diagnostic.environments.iter().join(", ")
        )?;
    }
    Ok(())
}
