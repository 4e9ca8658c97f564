use crate::{Options, RulesOptions};

pub trait Combine {
    /// Combine two values, preferring the values in `self`.
    ///
    /// Scalars and lists in `self` replace those in `other`; tables are combined key by key.
    #[must_use]
    fn combine(self, other: Self) -> Self;
}

impl Combine for Option<Options> {
    fn combine(self, other: Option<Options>) -> Option<Options> {
        match (self, other) {
            (Some(a), Some(b)) => Some(a.combine(b)),
            (a, b) => a.or(b),
        }
    }
}

impl Combine for Options {
    fn combine(self, other: Options) -> Options {
        Options {
            requirements: self.requirements.or(other.requirements),
            constraints: self.constraints.or(other.constraints),
            python_versions: self.python_versions.or(other.python_versions),
            platforms: self.platforms.or(other.platforms),
            ignore: self.ignore.or(other.ignore),
            strict: self.strict.or(other.strict),
            rules: self.rules.combine(other.rules),
        }
    }
}

impl Combine for Option<RulesOptions> {
    fn combine(self, other: Option<RulesOptions>) -> Option<RulesOptions> {
        match (self, other) {
            (Some(a), Some(b)) => Some(a.combine(b)),
            (a, b) => a.or(b),
        }
    }
}

impl Combine for RulesOptions {
    fn combine(self, other: RulesOptions) -> RulesOptions {
        RulesOptions {
            below_floor: self.below_floor.or(other.below_floor),
            excluded_pin: self.excluded_pin.or(other.excluded_pin),
            missing_pin: self.missing_pin.or(other.missing_pin),
            conflicting_pins: self.conflicting_pins.or(other.conflicting_pins),
            unpinned_constraint: self.unpinned_constraint.or(other.unpinned_constraint),
            unused_pin: self.unused_pin.or(other.unused_pin),
        }
    }
}
