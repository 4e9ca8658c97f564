//! Checks that a minimum-constraints file agrees with the requirements it pins.
//!
//! Every requirement and constraint is evaluated against a matrix of target environments, so
//! that entries scoped by environment markers only meet where their markers both hold.

pub use bounds::{Floor, Pin};
pub use checker::{CheckError, CheckSettings, Checker};
pub use environment::{
    EnvironmentError, EnvironmentMatrix, Platform, PythonVersion, TargetEnvironment,
};
pub use manifest::{ActiveManifest, Entry, Manifest, ManifestError, Role};
pub use report::{Counts, Diagnostic, Report};
pub use rules::{Rule, RuleSeverities, Severity, UnknownRuleError};

mod bounds;
mod checker;
mod environment;
mod manifest;
mod report;
mod rules;
