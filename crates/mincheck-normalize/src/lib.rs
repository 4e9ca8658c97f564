use std::error::Error;
use std::fmt::{Display, Formatter};

pub use package_name::PackageName;

mod package_name;

/// Validate and normalize a package name.
///
/// Lowercases ASCII letters and collapses every run of `-`, `_` and `.` into a single `-`.
pub(crate) fn validate_and_normalize(name: impl AsRef<str>) -> Result<String, InvalidNameError> {
    let name = name.as_ref();
    let mut normalized = String::with_capacity(name.len());

    let mut last = None;
    for char in name.bytes() {
        match char {
            b'A'..=b'Z' => {
                normalized.push(char.to_ascii_lowercase() as char);
            }
            b'a'..=b'z' | b'0'..=b'9' => {
                normalized.push(char as char);
            }
            b'-' | b'_' | b'.' => {
                match last {
                    // Names can't start with punctuation.
                    None => return Err(InvalidNameError(name.to_string())),
                    Some(b'-' | b'_' | b'.') => {}
                    Some(_) => normalized.push('-'),
                }
            }
            _ => return Err(InvalidNameError(name.to_string())),
        }
        last = Some(char);
    }

    // Names can't end with punctuation, and can't be empty.
    if matches!(last, None | Some(b'-' | b'_' | b'.')) {
        return Err(InvalidNameError(name.to_string()));
    }

    Ok(normalized)
}

/// Returns `true` if the name is already normalized.
fn is_normalized(name: &str) -> bool {
    let mut last = None;
    for char in name.bytes() {
        match char {
            b'a'..=b'z' | b'0'..=b'9' => {}
            b'-' => {
                if matches!(last, None | Some(b'-')) {
                    return false;
                }
            }
            _ => return false,
        }
        last = Some(char);
    }
    matches!(last, Some(c) if c != b'-')
}

/// Invalid [`crate::PackageName`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidNameError(String);

impl InvalidNameError {
    /// Returns the invalid name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for InvalidNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Not a valid package name: \"{}\". Names must start and end with a letter or \
            digit and may only contain -, _, ., and alphanumeric characters.",
            self.0
        )
    }
}

impl Error for InvalidNameError {}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("friendly-bard", "friendly-bard")]
    #[test_case("Friendly-Bard", "friendly-bard")]
    #[test_case("FRIENDLY-BARD", "friendly-bard")]
    #[test_case("friendly.bard", "friendly-bard")]
    #[test_case("friendly_bard", "friendly-bard")]
    #[test_case("friendly--bard", "friendly-bard")]
    #[test_case("FrIeNdLy-._.-bArD", "friendly-bard")]
    #[test_case("PyYAML", "pyyaml")]
    #[test_case("zope.interface", "zope-interface")]
    fn normalize(input: &str, expected: &str) {
        assert_eq!(validate_and_normalize(input).unwrap(), expected);
        assert!(is_normalized(expected));
    }

    #[test_case("")]
    #[test_case("-bard")]
    #[test_case("bard_")]
    #[test_case("friendly bard")]
    #[test_case("friendly@bard")]
    fn invalid(input: &str) {
        let err = validate_and_normalize(input).unwrap_err();
        assert_eq!(err.as_str(), input);
    }

    #[test]
    fn unnormalized() {
        assert!(!is_normalized("PyYAML"));
        assert!(!is_normalized("zope.interface"));
        assert!(!is_normalized("a--b"));
        assert!(!is_normalized(""));
    }
}
