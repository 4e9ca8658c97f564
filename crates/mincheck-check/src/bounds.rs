use std::fmt::{Display, Formatter};

use pep508_rs::pep440_rs::{Operator, Version, VersionSpecifiers};
use pep508_rs::{Requirement, VersionOrUrl};

/// The lowest version a set of specifiers admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Floor {
    pub version: Version,
    pub inclusive: bool,
}

impl Floor {
    /// Compute the highest lower bound across `specifiers`, if any specifier has one.
    ///
    /// When two bounds share a version, the exclusive one (`>V`) is the higher.
    pub fn from_specifiers(specifiers: &VersionSpecifiers) -> Option<Self> {
        specifiers
            .iter()
            .filter_map(|specifier| {
                let version = specifier.version().clone();
                match specifier.operator() {
                    Operator::GreaterThanEqual
                    | Operator::Equal
                    | Operator::ExactEqual
                    | Operator::TildeEqual
                    | Operator::EqualStar => Some(Self {
                        version,
                        inclusive: true,
                    }),
                    Operator::GreaterThan => Some(Self {
                        version,
                        inclusive: false,
                    }),
                    Operator::LessThan
                    | Operator::LessThanEqual
                    | Operator::NotEqual
                    | Operator::NotEqualStar => None,
                }
            })
            .max_by(|a, b| {
                a.version
                    .cmp(&b.version)
                    .then_with(|| b.inclusive.cmp(&a.inclusive))
            })
    }

    /// Compute the floor of a requirement; requirements with a URL or without specifiers have
    /// none.
    pub fn from_requirement(requirement: &Requirement) -> Option<Self> {
        match &requirement.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => Self::from_specifiers(specifiers),
            Some(VersionOrUrl::Url(_)) | None => None,
        }
    }

    /// Returns `true` if `version` is at or above the floor.
    pub fn admits(&self, version: &Version) -> bool {
        if self.inclusive {
            *version >= self.version
        } else {
            *version > self.version
        }
    }
}

impl Display for Floor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.inclusive {
            write!(f, ">={}", self.version)
        } else {
            write!(f, ">{}", self.version)
        }
    }
}

/// The version a constraints file entry fixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pin {
    /// `==V` or `===V`
    Exact(Version),
    /// `>=V`
    Minimum(Version),
    /// Anything else: a URL, no specifier, a range or a wildcard.
    Unpinned,
}

impl Pin {
    pub fn from_requirement(requirement: &Requirement) -> Self {
        let Some(VersionOrUrl::VersionSpecifier(specifiers)) = &requirement.version_or_url else {
            return Self::Unpinned;
        };
        let [specifier] = &specifiers[..] else {
            return Self::Unpinned;
        };
        match specifier.operator() {
            Operator::Equal | Operator::ExactEqual => Self::Exact(specifier.version().clone()),
            Operator::GreaterThanEqual => Self::Minimum(specifier.version().clone()),
            _ => Self::Unpinned,
        }
    }

    pub fn version(&self) -> Option<&Version> {
        match self {
            Self::Exact(version) | Self::Minimum(version) => Some(version),
            Self::Unpinned => None,
        }
    }
}

impl Display for Pin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(version) => write!(f, "=={version}"),
            Self::Minimum(version) => write!(f, ">={version}"),
            Self::Unpinned => f.write_str("(unpinned)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pep508_rs::Requirement;
    use pep508_rs::pep440_rs::{Version, VersionSpecifiers};
    use test_case::test_case;

    use super::{Floor, Pin};

    fn floor(specifiers: &str) -> Option<String> {
        let specifiers = VersionSpecifiers::from_str(specifiers).unwrap();
        Floor::from_specifiers(&specifiers).map(|floor| floor.to_string())
    }

    fn pin(requirement: &str) -> Pin {
        let requirement: Requirement = requirement.parse().unwrap();
        Pin::from_requirement(&requirement)
    }

    #[test_case(">=1.0.0", Some(">=1.0.0"))]
    #[test_case(">1.0", Some(">1.0"))]
    #[test_case("==2.1", Some(">=2.1"))]
    #[test_case("~=3.4.1", Some(">=3.4.1"))]
    #[test_case("==1.2.*", Some(">=1.2"))]
    #[test_case(">=1.0,<2.0", Some(">=1.0"))]
    #[test_case(">=1.0,>=1.5,!=1.6", Some(">=1.5"))]
    #[test_case(">=1.5,>1.5", Some(">1.5"))]
    #[test_case("<2.0", None)]
    #[test_case("!=1.0", None)]
    fn floors(specifiers: &str, expected: Option<&str>) {
        assert_eq!(floor(specifiers).as_deref(), expected);
    }

    #[test]
    fn admits() {
        let inclusive = Floor {
            version: Version::from_str("1.5").unwrap(),
            inclusive: true,
        };
        let exclusive = Floor {
            version: Version::from_str("1.5").unwrap(),
            inclusive: false,
        };
        let at = Version::from_str("1.5.0").unwrap();
        let below = Version::from_str("1.4.9").unwrap();
        assert!(inclusive.admits(&at));
        assert!(!inclusive.admits(&below));
        assert!(!exclusive.admits(&at));
        assert!(exclusive.admits(&Version::from_str("1.5.1").unwrap()));
    }

    #[test]
    fn floor_of_url_requirement() {
        let requirement: Requirement =
            "foo @ https://example.org/foo-1.0-py3-none-any.whl".parse().unwrap();
        assert_eq!(Floor::from_requirement(&requirement), None);
        assert_eq!(Pin::from_requirement(&requirement), Pin::Unpinned);
    }

    #[test]
    fn pins() {
        let version = Version::from_str("1.16.0").unwrap();
        assert_eq!(pin("six==1.16.0"), Pin::Exact(version.clone()));
        assert_eq!(pin("six===1.16.0"), Pin::Exact(version.clone()));
        assert_eq!(pin("six>=1.16.0"), Pin::Minimum(version));
        assert_eq!(pin("six==1.16.*"), Pin::Unpinned);
        assert_eq!(pin("six>=1.16,<2"), Pin::Unpinned);
        assert_eq!(pin("six"), Pin::Unpinned);
        assert_eq!(pin("six==1.16.0").to_string(), "==1.16.0");
    }
}
