use std::ops::Deref;
use std::path::{Path, PathBuf};

use mincheck_warnings::warn_user;

pub use crate::combine::*;
pub use crate::settings::*;

mod combine;
mod settings;

/// The [`Options`] as loaded from a configuration file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemOptions(Options);

impl FilesystemOptions {
    /// Convert the [`FilesystemOptions`] into [`Options`].
    pub fn into_options(self) -> Options {
        self.0
    }
}

impl Deref for FilesystemOptions {
    type Target = Options;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FilesystemOptions {
    /// Find the [`FilesystemOptions`] for the given path.
    ///
    /// The search starts at the given path and goes up the directory tree until a
    /// `mincheck.toml` file or a `pyproject.toml` file with a `[tool.mincheck]` table is found.
    pub fn find(path: &Path) -> Result<Option<Self>, Error> {
        for ancestor in path.ancestors() {
            match Self::from_directory(ancestor) {
                Ok(Some(options)) => {
                    return Ok(Some(options));
                }
                Ok(None) => {
                    // Continue traversing the directory tree.
                }
                Err(Error::PyprojectToml(path, err)) => {
                    // If we see an invalid `pyproject.toml`, warn but continue.
                    warn_user!(
                        "Failed to parse `{}` during settings discovery:\n{}",
                        path.display().cyan(),
                        textwrap::indent(&err.to_string(), "  ")
                    );
                }
                Err(err) => {
                    return Err(err);
                }
            }
        }
        Ok(None)
    }

    /// Load a [`FilesystemOptions`] from a directory, preferring a `mincheck.toml` file over a
    /// `pyproject.toml` file.
    pub fn from_directory(dir: &Path) -> Result<Option<Self>, Error> {
        // Read a `mincheck.toml` file in the current directory.
        let path = dir.join("mincheck.toml");
        match fs_err::read_to_string(&path) {
            Ok(content) => {
                let options = toml::from_str::<Options>(&content)
                    .map_err(|err| Error::MincheckToml(path.clone(), Box::new(err)))?
                    .relative_to(&std::path::absolute(dir)?);

                tracing::debug!("Found configuration at `{}`", path.display());
                return Ok(Some(Self(options)));
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        // Read a `pyproject.toml` file in the current directory.
        let path = dir.join("pyproject.toml");
        match fs_err::read_to_string(&path) {
            Ok(content) => {
                // Parse, but skip any `pyproject.toml` that doesn't have a `[tool.mincheck]`
                // section.
                let pyproject: PyProjectToml = toml::from_str(&content)
                    .map_err(|err| Error::PyprojectToml(path.clone(), Box::new(err)))?;
                let Some(tool) = pyproject.tool else {
                    tracing::debug!(
                        "Skipping `pyproject.toml` in `{}` (no `[tool]` section)",
                        dir.display()
                    );
                    return Ok(None);
                };
                let Some(options) = tool.mincheck else {
                    tracing::debug!(
                        "Skipping `pyproject.toml` in `{}` (no `[tool.mincheck]` section)",
                        dir.display()
                    );
                    return Ok(None);
                };

                let options = options.relative_to(&std::path::absolute(dir)?);

                tracing::debug!("Found configuration at `{}`", path.display());
                return Ok(Some(Self(options)));
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        Ok(None)
    }

    /// Load a [`FilesystemOptions`] from a `mincheck.toml` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        tracing::debug!("Reading configuration from: `{}`", path.display());

        Ok(Self(read_file(path)?))
    }
}

impl From<Options> for FilesystemOptions {
    fn from(options: Options) -> Self {
        Self(options)
    }
}

/// Load [`Options`] from a `mincheck.toml` file.
fn read_file(path: &Path) -> Result<Options, Error> {
    let content = fs_err::read_to_string(path)?;
    let options = toml::from_str::<Options>(&content)
        .map_err(|err| Error::MincheckToml(path.to_path_buf(), Box::new(err)))?;
    let options = if let Some(parent) = std::path::absolute(path)?.parent() {
        options.relative_to(parent)
    } else {
        options
    };
    Ok(options)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to parse: `{}`", _0.display())]
    PyprojectToml(PathBuf, #[source] Box<toml::de::Error>),

    #[error("Failed to parse: `{}`", _0.display())]
    MincheckToml(PathBuf, #[source] Box<toml::de::Error>),
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use fs_err as fs;
    use indoc::indoc;
    use tempfile::tempdir;

    use mincheck_check::{Platform, PythonVersion, Rule, Severity};
    use mincheck_normalize::PackageName;

    use super::{Combine, Error, FilesystemOptions, Options, RulesOptions};

    #[test]
    fn mincheck_toml() {
        let dir = tempdir().unwrap();
        let root = std::path::absolute(dir.path()).unwrap();
        fs::write(
            root.join("mincheck.toml"),
            indoc! {r#"
                requirements = ["requirements.txt", "dev-requirements.txt"]
                constraints = ["minimum-constraints.txt"]
                python-versions = ["3.8", "3.12"]
                platforms = ["linux", "win32"]
                ignore = ["Setuptools"]
                strict = true

                [rules]
                missing-pin = "error"
                unused-pin = "warning"
            "#},
        )
        .unwrap();

        let options = FilesystemOptions::find(&root).unwrap().unwrap();
        let requirements = [
            root.join("requirements.txt"),
            root.join("dev-requirements.txt"),
        ];
        assert_eq!(
            options.requirements.as_deref(),
            Some(requirements.as_slice())
        );
        assert_eq!(
            options.python_versions.as_deref(),
            Some([PythonVersion::new(3, 8), PythonVersion::new(3, 12)].as_slice())
        );
        assert_eq!(
            options.platforms.as_deref(),
            Some([Platform::Linux, Platform::Windows].as_slice())
        );
        assert_eq!(
            options.ignore.as_deref(),
            Some([PackageName::from_str("setuptools").unwrap()].as_slice())
        );
        assert_eq!(options.strict, Some(true));

        let severities = options.rules.unwrap().severities();
        assert_eq!(severities.get(Rule::MissingPin), Severity::Error);
        assert_eq!(severities.get(Rule::UnusedPin), Severity::Warning);
        assert_eq!(severities.get(Rule::BelowFloor), Severity::Error);
    }

    #[test]
    fn pyproject_toml_in_ancestor() {
        let dir = tempdir().unwrap();
        let root = std::path::absolute(dir.path()).unwrap();
        fs::write(
            root.join("pyproject.toml"),
            indoc! {r#"
                [project]
                name = "pywbem"

                [tool.mincheck]
                constraints = ["minimum-constraints.txt"]
            "#},
        )
        .unwrap();
        let nested = root.join("docs").join("notebooks");
        fs::create_dir_all(&nested).unwrap();

        let options = FilesystemOptions::find(&nested).unwrap().unwrap();
        assert_eq!(
            options.constraints.as_deref(),
            Some([root.join("minimum-constraints.txt")].as_slice())
        );
        assert_eq!(options.requirements, None);
    }

    #[test]
    fn pyproject_toml_without_table_is_skipped() {
        let dir = tempdir().unwrap();
        let root = std::path::absolute(dir.path()).unwrap();
        fs::write(
            root.join("pyproject.toml"),
            "[tool.black]\nline-length = 80\n",
        )
        .unwrap();
        assert_eq!(FilesystemOptions::from_directory(&root).unwrap(), None);
    }

    #[test]
    fn mincheck_toml_wins_over_pyproject_toml() {
        let dir = tempdir().unwrap();
        let root = std::path::absolute(dir.path()).unwrap();
        fs::write(root.join("mincheck.toml"), "strict = true\n").unwrap();
        fs::write(
            root.join("pyproject.toml"),
            "[tool.mincheck]\nstrict = false\n",
        )
        .unwrap();
        let options = FilesystemOptions::from_directory(&root).unwrap().unwrap();
        assert_eq!(options.strict, Some(true));
    }

    #[test]
    fn invalid_pyproject_toml_is_skipped() {
        let dir = tempdir().unwrap();
        let root = std::path::absolute(dir.path()).unwrap();
        fs::write(root.join("pyproject.toml"), "[tool.mincheck\n").unwrap();
        assert!(matches!(
            FilesystemOptions::from_directory(&root),
            Err(Error::PyprojectToml(..))
        ));
        // Discovery warns and moves on to the parent directories.
        assert!(FilesystemOptions::find(&root).is_ok());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let root = std::path::absolute(dir.path()).unwrap();
        fs::write(root.join("mincheck.toml"), "requirement = [\"a.txt\"]\n").unwrap();
        let err = FilesystemOptions::from_directory(&root).unwrap_err();
        assert!(matches!(err, Error::MincheckToml(..)));
        assert!(
            std::error::Error::source(&err)
                .unwrap()
                .to_string()
                .contains("unknown field `requirement`")
        );

        fs::write(
            root.join("mincheck.toml"),
            "[rules]\nbelow-floor = \"fatal\"\n",
        )
        .unwrap();
        assert!(FilesystemOptions::from_directory(&root).is_err());
    }

    #[test]
    fn config_file_paths_are_relative_to_file() {
        let dir = tempdir().unwrap();
        let root = std::path::absolute(dir.path()).unwrap();
        fs::create_dir_all(root.join("ci")).unwrap();
        fs::write(
            root.join("ci").join("lowest.toml"),
            "requirements = [\"../requirements.txt\"]\n",
        )
        .unwrap();
        let options = FilesystemOptions::from_file(root.join("ci").join("lowest.toml")).unwrap();
        assert_eq!(
            options.requirements.as_deref(),
            Some([root.join("ci").join("../requirements.txt")].as_slice())
        );
    }

    #[test]
    fn combine_prefers_self_and_merges_rules() {
        let cli = Options {
            strict: Some(false),
            rules: Some(RulesOptions {
                missing_pin: Some(Severity::Ignore),
                ..RulesOptions::default()
            }),
            ..Options::default()
        };
        let file = Options {
            strict: Some(true),
            ignore: Some(vec![PackageName::from_str("pip").unwrap()]),
            rules: Some(RulesOptions {
                missing_pin: Some(Severity::Error),
                unused_pin: Some(Severity::Warning),
                ..RulesOptions::default()
            }),
            ..Options::default()
        };
        let combined = cli.combine(file);
        assert_eq!(combined.strict, Some(false));
        assert_eq!(combined.ignore.map(|ignore| ignore.len()), Some(1));
        let rules = combined.rules.unwrap();
        assert_eq!(rules.missing_pin, Some(Severity::Ignore));
        assert_eq!(rules.unused_pin, Some(Severity::Warning));
        assert_eq!(rules.below_floor, None);
    }
}
