use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;

use mincheck_check::{Entry, Manifest, Role, TargetEnvironment};
use mincheck_requirements_txt::{Origin, ParsedOptions, RequirementsTxt};

use crate::cli::OutputFormat;
use crate::commands::{ExitStatus, pluralize};
use crate::printer::Printer;

#[derive(Debug, Serialize)]
struct ShownEntry {
    name: String,
    specification: String,
    marker: Option<String>,
    origin: Origin,
}

impl From<&Entry> for ShownEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            name: entry.name.to_string(),
            specification: entry.specification(),
            marker: entry.marker(),
            origin: entry.origin.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ShownTarget {
    target: String,
    origin: Origin,
}

#[derive(Debug, Serialize)]
struct ShowReport {
    environment: TargetEnvironment,
    requirements: Vec<ShownEntry>,
    constraints: Vec<ShownEntry>,
    editables: Vec<ShownTarget>,
    unnamed: Vec<ShownTarget>,
    options: ParsedOptions,
}

/// List the entries of requirements files that apply in one environment.
pub(crate) fn show(
    files: &[PathBuf],
    environment: TargetEnvironment,
    output_format: OutputFormat,
    printer: Printer,
) -> Result<ExitStatus> {
    let mut manifest = Manifest::default();
    let mut editables = Vec::new();
    let mut unnamed = Vec::new();
    let mut options = ParsedOptions::default();

    for file in files {
        let requirements_txt = RequirementsTxt::parse(file)?;
        editables.extend(requirements_txt.editables.iter().map(|entry| ShownTarget {
            target: entry.target.clone(),
            origin: entry.origin.clone(),
        }));
        unnamed.extend(requirements_txt.unnamed.iter().map(|entry| ShownTarget {
            target: entry.target.clone(),
            origin: entry.origin.clone(),
        }));
        options.update_from(requirements_txt.options.clone());
        manifest.add(requirements_txt, Role::Requirements);
    }

    let active = manifest.active(&environment)?;
    let report = ShowReport {
        environment,
        requirements: active.requirements.into_iter().map(Into::into).collect(),
        constraints: active.constraints.into_iter().map(Into::into).collect(),
        editables,
        unnamed,
        options,
    };

    match output_format {
        OutputFormat::Text => write_text(&report, printer)?,
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize entries")?;
            writeln!(printer.stdout(), "{json}")?;
        }
    }

    Ok(ExitStatus::Success)
}

fn write_text(report: &ShowReport, printer: Printer) -> std::fmt::Result {
    let mut stdout = printer.stdout();

    for (title, entries) in [
        ("Requirements", &report.requirements),
        ("Constraints", &report.constraints),
    ] {
        writeln!(
            stdout,
            "{} for {} ({}):",
            title.bold(),
            report.environment.cyan(),
            pluralize(entries.len(), "entry", "entries")
        )?;
        for entry in entries {
            match &entry.marker {
                Some(marker) => writeln!(
                    stdout,
                    "  {} ; {} {}",
                    entry.specification,
                    marker.dimmed(),
                    format!("({})", entry.origin).dimmed()
                )?,
                None => writeln!(
                    stdout,
                    "  {} {}",
                    entry.specification,
                    format!("({})", entry.origin).dimmed()
                )?,
            }
        }
    }

    for (title, targets) in [
        ("Editables", &report.editables),
        ("Unnamed requirements", &report.unnamed),
    ] {
        if targets.is_empty() {
            continue;
        }
        writeln!(stdout, "{} (not checked):", title.bold())?;
        for target in targets {
            writeln!(
                stdout,
                "  {} {}",
                target.target,
                format!("({})", target.origin).dimmed()
            )?;
        }
    }

    if let Some(index_url) = &report.options.index_url {
        writeln!(stdout, "{} {index_url}", "Index URL:".bold())?;
    }
    for url in &report.options.extra_index_urls {
        writeln!(stdout, "{} {url}", "Extra index URL:".bold())?;
    }
    for link in &report.options.find_links {
        writeln!(stdout, "{} {link}", "Find links:".bold())?;
    }
    Ok(())
}
