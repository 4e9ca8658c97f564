use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A consistency rule between requirements and constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    /// A pin is lower than the floor of a requirement.
    BelowFloor,
    /// An exact pin does not satisfy a requirement's specifiers.
    ExcludedPin,
    /// A requirement with a floor has no constraint.
    MissingPin,
    /// A package is pinned to more than one version.
    ConflictingPins,
    /// A constraint that is neither `==V` nor `>=V`.
    UnpinnedConstraint,
    /// A constraint for a package no requirement names.
    UnusedPin,
}

impl Rule {
    pub const ALL: [Self; 6] = [
        Self::BelowFloor,
        Self::ExcludedPin,
        Self::MissingPin,
        Self::ConflictingPins,
        Self::UnpinnedConstraint,
        Self::UnusedPin,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::BelowFloor => "below-floor",
            Self::ExcludedPin => "excluded-pin",
            Self::MissingPin => "missing-pin",
            Self::ConflictingPins => "conflicting-pins",
            Self::UnpinnedConstraint => "unpinned-constraint",
            Self::UnusedPin => "unused-pin",
        }
    }

    /// The severity used when none is configured.
    pub fn default_severity(self) -> Severity {
        match self {
            Self::BelowFloor | Self::ExcludedPin | Self::ConflictingPins => Severity::Error,
            Self::MissingPin | Self::UnpinnedConstraint => Severity::Warning,
            Self::UnusedPin => Severity::Ignore,
        }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Rule {
    type Err = UnknownRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rule| rule.code() == s)
            .ok_or_else(|| UnknownRuleError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown rule `{0}`")]
pub struct UnknownRuleError(String);

/// How a rule's findings are reported; ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Severity {
    /// The rule is not evaluated.
    Ignore,
    #[default]
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ignore => f.write_str("ignore"),
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// The configured severity of every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSeverities {
    below_floor: Severity,
    excluded_pin: Severity,
    missing_pin: Severity,
    conflicting_pins: Severity,
    unpinned_constraint: Severity,
    unused_pin: Severity,
}

impl RuleSeverities {
    pub fn get(&self, rule: Rule) -> Severity {
        match rule {
            Rule::BelowFloor => self.below_floor,
            Rule::ExcludedPin => self.excluded_pin,
            Rule::MissingPin => self.missing_pin,
            Rule::ConflictingPins => self.conflicting_pins,
            Rule::UnpinnedConstraint => self.unpinned_constraint,
            Rule::UnusedPin => self.unused_pin,
        }
    }

    pub fn set(&mut self, rule: Rule, severity: Severity) {
        let slot = match rule {
            Rule::BelowFloor => &mut self.below_floor,
            Rule::ExcludedPin => &mut self.excluded_pin,
            Rule::MissingPin => &mut self.missing_pin,
            Rule::ConflictingPins => &mut self.conflicting_pins,
            Rule::UnpinnedConstraint => &mut self.unpinned_constraint,
            Rule::UnusedPin => &mut self.unused_pin,
        };
        *slot = severity;
    }

    /// Returns `true` if the rule produces diagnostics.
    pub fn is_enabled(&self, rule: Rule) -> bool {
        self.get(rule) != Severity::Ignore
    }
}

impl Default for RuleSeverities {
    fn default() -> Self {
        Self {
            below_floor: Rule::BelowFloor.default_severity(),
            excluded_pin: Rule::ExcludedPin.default_severity(),
            missing_pin: Rule::MissingPin.default_severity(),
            conflicting_pins: Rule::ConflictingPins.default_severity(),
            unpinned_constraint: Rule::UnpinnedConstraint.default_severity(),
            unused_pin: Rule::UnusedPin.default_severity(),
        }
    }
}
