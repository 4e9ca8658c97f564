use std::collections::BTreeMap;

use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, debug_span, trace};

use mincheck_normalize::PackageName;
use mincheck_requirements_txt::Origin;

use crate::bounds::Pin;
use crate::environment::{EnvironmentError, EnvironmentMatrix, TargetEnvironment};
use crate::manifest::{Entry, Manifest};
use crate::report::{Diagnostic, Report};
use crate::rules::{Rule, RuleSeverities, Severity};

/// Everything that decides what a check reports.
#[derive(Debug, Clone, Default)]
pub struct CheckSettings {
    pub environments: EnvironmentMatrix,
    pub rules: RuleSeverities,
    /// Packages skipped by every rule.
    pub ignore: Vec<PackageName>,
    /// Fail on warnings, too.
    pub strict: bool,
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}

/// Checks that the constraints of a manifest are consistent with its requirements.
#[derive(Debug)]
pub struct Checker {
    settings: CheckSettings,
    ignore: FxHashSet<PackageName>,
}

impl Checker {
    pub fn new(settings: CheckSettings) -> Self {
        let ignore = settings.ignore.iter().cloned().collect();
        Self { settings, ignore }
    }

    /// Evaluate every rule in every environment of the matrix.
    pub fn check(&self, manifest: &Manifest) -> Result<Report, CheckError> {
        let mut findings = Findings::default();

        for environment in self.settings.environments.iter() {
            let _span = debug_span!("environment", %environment).entered();
            let markers = environment.markers()?;
            let active = manifest.active_for_markers(&markers);
            debug!(
                "{} active requirements and {} active constraints",
                active.requirements.len(),
                active.constraints.len()
            );

            let mut packages: BTreeMap<&PackageName, Package> = BTreeMap::new();
            for entry in active.requirements {
                let package = packages.entry(&entry.name).or_default();
                package.requirements.push(entry);
            }
            for entry in active.constraints {
                let package = packages.entry(&entry.name).or_default();
                package.constraints.push(entry);
            }

            for (name, package) in packages {
                if self.ignore.contains(name) {
                    trace!("Skipping ignored package `{name}`");
                    continue;
                }
                self.check_package(manifest, name, &package, environment, &mut findings);
            }
        }

        Ok(Report::new(
            findings.diagnostics,
            self.settings.environments.iter().collect(),
            manifest.requirements.len(),
            manifest.constraints.len(),
            self.settings.strict,
        ))
    }

    fn check_package(
        &self,
        manifest: &Manifest,
        name: &PackageName,
        package: &Package,
        environment: TargetEnvironment,
        findings: &mut Findings,
    ) {
        let mut emit = |rule: Rule,
                        requirement: Option<&Origin>,
                        constraints: &[&Entry],
                        message: String| {
            let severity = self.settings.rules.get(rule);
            if !self.settings.rules.is_enabled(rule) {
                return;
            }
            findings.add(Finding {
                rule,
                severity,
                package: name,
                requirement,
                constraints: constraints.iter().map(|entry| &entry.origin).collect(),
                message,
                environment,
            });
        };

        for constraint in package.constraints.iter().copied() {
            if constraint.pin() == Pin::Unpinned {
                emit(
                    Rule::UnpinnedConstraint,
                    None,
                    &[constraint],
                    format!(
                        "`{}` does not pin a version with `==` or `>=`",
                        constraint.specification()
                    ),
                );
            }
            if !manifest.is_required(name) {
                emit(
                    Rule::UnusedPin,
                    None,
                    &[constraint],
                    format!("`{name}` is constrained, but no requirements file names it"),
                );
            }
        }

        if package.requirements.is_empty() {
            return;
        }

        if package.constraints.is_empty() {
            for requirement in &package.requirements {
                if let Some(floor) = requirement.floor() {
                    emit(
                        Rule::MissingPin,
                        Some(&requirement.origin),
                        &[],
                        format!(
                            "`{name}` has floor `{floor}` in `{}`, but no constraint pins it",
                            requirement.specification()
                        ),
                    );
                }
            }
            return;
        }

        let pins: Vec<Pin> = package
            .constraints
            .iter()
            .map(|constraint| constraint.pin())
            .filter(|pin| *pin != Pin::Unpinned)
            .unique()
            .collect();

        let pin = match pins.as_slice() {
            [] => return,
            [pin] => pin,
            _ => {
                let pinned = package
                    .constraints
                    .iter()
                    .copied()
                    .filter(|constraint| constraint.pin() != Pin::Unpinned)
                    .collect::<Vec<_>>();
                emit(
                    Rule::ConflictingPins,
                    None,
                    &pinned,
                    format!(
                        "`{name}` is pinned to more than one version: {}",
                        pins.iter().map(|pin| format!("`{pin}`")).join(", ")
                    ),
                );
                return;
            }
        };
        let Some(version) = pin.version() else {
            return;
        };
        let pinned = package
            .constraints
            .iter()
            .copied()
            .filter(|constraint| constraint.pin() == *pin)
            .collect::<Vec<_>>();

        for requirement in &package.requirements {
            let floor = requirement.floor();
            if let Some(floor) = &floor {
                if !floor.admits(version) {
                    emit(
                        Rule::BelowFloor,
                        Some(&requirement.origin),
                        &pinned,
                        format!(
                            "`{name}{pin}` is below the minimum version `{floor}` of `{}`",
                            requirement.specification()
                        ),
                    );
                    continue;
                }
            }
            if let Pin::Exact(version) = pin {
                if let Some(specifiers) = requirement.specifiers() {
                    if !specifiers.contains(version) {
                        emit(
                            Rule::ExcludedPin,
                            Some(&requirement.origin),
                            &pinned,
                            format!(
                                "`{name}{pin}` is not allowed by `{}`",
                                requirement.specification()
                            ),
                        );
                    }
                }
            }
        }
    }
}

/// The active entries of one package in one environment.
#[derive(Debug, Default)]
struct Package<'a> {
    requirements: Vec<&'a Entry>,
    constraints: Vec<&'a Entry>,
}

/// A diagnostic found in a single environment.
struct Finding<'a> {
    rule: Rule,
    severity: Severity,
    package: &'a PackageName,
    requirement: Option<&'a Origin>,
    constraints: Vec<&'a Origin>,
    message: String,
    environment: TargetEnvironment,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FindingKey {
    rule: Rule,
    package: PackageName,
    requirement: Option<Origin>,
    constraints: Vec<Origin>,
    message: String,
}

/// Diagnostics in the order they were first found, merged across environments.
#[derive(Debug, Default)]
struct Findings {
    diagnostics: Vec<Diagnostic>,
    index: FxHashMap<FindingKey, usize>,
}

impl Findings {
    fn add(&mut self, finding: Finding<'_>) {
        let key = FindingKey {
            rule: finding.rule,
            package: finding.package.clone(),
            requirement: finding.requirement.cloned(),
            constraints: finding.constraints.into_iter().cloned().collect(),
            message: finding.message,
        };
        if let Some(&index) = self.index.get(&key) {
            let diagnostic = &mut self.diagnostics[index];
            diagnostic.environments.push(finding.environment);
            return;
        }
        self.index.insert(key.clone(), self.diagnostics.len());
        self.diagnostics.push(Diagnostic {
            rule: key.rule,
            severity: finding.severity,
            package: key.package,
            message: key.message,
            requirement: key.requirement,
            constraints: key.constraints,
            environments: vec![finding.environment],
        });
    }
}
