use std::path::{Path, PathBuf};

use serde::Deserialize;

use mincheck_check::{Platform, PythonVersion, Rule, RuleSeverities, Severity};
use mincheck_normalize::PackageName;

/// A `pyproject.toml` with an (optional) `[tool.mincheck]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PyProjectToml {
    pub(crate) tool: Option<Tools>,
}

/// A `[tool]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Tools {
    pub(crate) mincheck: Option<Options>,
}

/// A `mincheck.toml` file, or a `[tool.mincheck]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
    /// The requirements files to check, e.g. `requirements.txt`.
    pub requirements: Option<Vec<PathBuf>>,
    /// The constraints files whose pins are checked against the requirements, e.g.
    /// `minimum-constraints.txt`.
    pub constraints: Option<Vec<PathBuf>>,
    /// The Python versions environment markers are evaluated for.
    pub python_versions: Option<Vec<PythonVersion>>,
    /// The platforms environment markers are evaluated for.
    pub platforms: Option<Vec<Platform>>,
    /// Packages skipped by every rule.
    pub ignore: Option<Vec<PackageName>>,
    /// Fail on warnings, too.
    pub strict: Option<bool>,
    /// Per-rule severities.
    pub rules: Option<RulesOptions>,
}

impl Options {
    /// Resolve the file paths in the options relative to the given root directory.
    #[must_use]
    pub fn relative_to(self, root: &Path) -> Self {
        let resolve = |paths: Vec<PathBuf>| -> Vec<PathBuf> {
            paths.into_iter().map(|path| root.join(path)).collect()
        };
        Self {
            requirements: self.requirements.map(resolve),
            constraints: self.constraints.map(resolve),
            ..self
        }
    }
}

/// The `[rules]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RulesOptions {
    pub below_floor: Option<Severity>,
    pub excluded_pin: Option<Severity>,
    pub missing_pin: Option<Severity>,
    pub conflicting_pins: Option<Severity>,
    pub unpinned_constraint: Option<Severity>,
    pub unused_pin: Option<Severity>,
}

impl RulesOptions {
    pub fn get(&self, rule: Rule) -> Option<Severity> {
        match rule {
            Rule::BelowFloor => self.below_floor,
            Rule::ExcludedPin => self.excluded_pin,
            Rule::MissingPin => self.missing_pin,
            Rule::ConflictingPins => self.conflicting_pins,
            Rule::UnpinnedConstraint => self.unpinned_constraint,
            Rule::UnusedPin => self.unused_pin,
        }
    }

    /// The configured severities, falling back to each rule's default.
    pub fn severities(&self) -> RuleSeverities {
        let mut severities = RuleSeverities::default();
        for rule in Rule::ALL {
            if let Some(severity) = self.get(rule) {
                severities.set(rule, severity);
            }
        }
        severities
    }
}
