use std::cmp::Reverse;

use serde::Serialize;

use mincheck_normalize::PackageName;
use mincheck_requirements_txt::Origin;

use crate::environment::TargetEnvironment;
use crate::rules::{Rule, Severity};

/// A finding of one rule for one package, merged across the environments where it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub rule: Rule,
    pub severity: Severity,
    pub package: PackageName,
    pub message: String,
    /// The requirement the finding is about, if any.
    pub requirement: Option<Origin>,
    /// The constraints involved, in file order.
    pub constraints: Vec<Origin>,
    pub environments: Vec<TargetEnvironment>,
}

impl Diagnostic {
    /// The first origin the diagnostic points at.
    pub fn origin(&self) -> Option<&Origin> {
        self.requirement
            .as_ref()
            .or_else(|| self.constraints.first())
    }

    fn sort_key(&self) -> (Reverse<Severity>, &PackageName, Rule, Option<&Origin>, &str) {
        (
            Reverse(self.severity),
            &self.package,
            self.rule,
            self.origin(),
            &self.message,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub errors: usize,
    pub warnings: usize,
}

/// The outcome of checking a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
    /// Every environment that was checked.
    pub environments: Vec<TargetEnvironment>,
    /// The number of named requirements.
    pub requirements: usize,
    /// The number of named constraints.
    pub constraints: usize,
    /// Whether warnings fail the check.
    pub strict: bool,
}

impl Report {
    pub(crate) fn new(
        mut diagnostics: Vec<Diagnostic>,
        environments: Vec<TargetEnvironment>,
        requirements: usize,
        constraints: usize,
        strict: bool,
    ) -> Self {
        diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self {
            diagnostics,
            environments,
            requirements,
            constraints,
            strict,
        }
    }

    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for diagnostic in &self.diagnostics {
            match diagnostic.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Ignore => {}
            }
        }
        counts
    }

    pub fn has_errors(&self) -> bool {
        self.counts().errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.counts().warnings > 0
    }

    /// Returns `true` if the check passes: no errors, and no warnings in strict mode.
    pub fn is_success(&self) -> bool {
        let counts = self.counts();
        counts.errors == 0 && !(self.strict && counts.warnings > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::str::FromStr;

    use mincheck_normalize::PackageName;
    use mincheck_requirements_txt::Origin;

    use crate::environment::{Platform, PythonVersion, TargetEnvironment};
    use crate::rules::{Rule, Severity};

    use super::{Diagnostic, Report};

    fn diagnostic(rule: Rule, severity: Severity, package: &str, line: usize) -> Diagnostic {
        Diagnostic {
            rule,
            severity,
            package: PackageName::from_str(package).unwrap(),
            message: format!("{package} at {line}"),
            requirement: Some(Origin {
                path: PathBuf::from("requirements.txt"),
                line,
            }),
            constraints: Vec::new(),
            environments: vec![py312_linux()],
        }
    }

    fn py312_linux() -> TargetEnvironment {
        TargetEnvironment::new(PythonVersion::new(3, 12), Platform::Linux)
    }

    #[test]
    fn sorted_by_severity_then_package() {
        let report = Report::new(
            vec![
                diagnostic(Rule::MissingPin, Severity::Warning, "ply", 3),
                diagnostic(Rule::BelowFloor, Severity::Error, "six", 2),
                diagnostic(Rule::BelowFloor, Severity::Error, "pyyaml", 5),
                diagnostic(Rule::ExcludedPin, Severity::Error, "pyyaml", 1),
            ],
            Vec::new(),
            4,
            3,
            false,
        );
        let order: Vec<(&str, Rule)> = report
            .diagnostics
            .iter()
            .map(|diagnostic| (diagnostic.package.as_str(), diagnostic.rule))
            .collect();
        assert_eq!(
            order,
            [
                ("pyyaml", Rule::BelowFloor),
                ("pyyaml", Rule::ExcludedPin),
                ("six", Rule::BelowFloor),
                ("ply", Rule::MissingPin),
            ]
        );
        assert_eq!(report.counts().errors, 3);
        assert_eq!(report.counts().warnings, 1);
        assert!(!report.is_success());
    }

    #[test]
    fn strict_fails_on_warnings() {
        let diagnostics = vec![diagnostic(Rule::MissingPin, Severity::Warning, "ply", 3)];
        let lenient = Report::new(diagnostics.clone(), Vec::new(), 1, 0, false);
        assert!(lenient.has_warnings());
        assert!(!lenient.has_errors());
        assert!(lenient.is_success());

        let strict = Report::new(diagnostics, Vec::new(), 1, 0, true);
        assert!(!strict.is_success());
    }

    #[test]
    fn json_field_names() {
        let report = Report::new(
            vec![diagnostic(Rule::BelowFloor, Severity::Error, "PyYAML", 7)],
            vec![py312_linux()],
            1,
            1,
            false,
        );
        let value = serde_json::to_value(&report).unwrap();
        let diagnostic = &value["diagnostics"][0];
        assert_eq!(diagnostic["rule"], "below-floor");
        assert_eq!(diagnostic["severity"], "error");
        assert_eq!(diagnostic["package"], "pyyaml");
        assert_eq!(diagnostic["requirement"]["line"], 7);
        assert_eq!(diagnostic["environments"][0], "py3.12-linux");
        assert_eq!(value["environments"][0], "py3.12-linux");
        assert_eq!(value["strict"], false);
    }
}
