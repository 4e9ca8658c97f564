use std::path::Path;

use thiserror::Error;
use tracing::debug;

use mincheck_normalize::PackageName;
use mincheck_requirements_txt::{
    Origin, RequirementEntry, RequirementsTxt, RequirementsTxtFileError,
};
use pep508_rs::pep440_rs::VersionSpecifiers;
use pep508_rs::{MarkerEnvironment, Requirement, VersionOrUrl};

use crate::bounds::{Floor, Pin};
use crate::environment::{EnvironmentError, TargetEnvironment};

/// How a file passed to mincheck is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Named entries are requirements, entries reached through `-c` are constraints.
    Requirements,
    /// Every named entry is a constraint.
    Constraints,
}

/// A named requirement or constraint, with the file and line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: PackageName,
    pub requirement: Requirement,
    pub origin: Origin,
}

impl From<RequirementEntry> for Entry {
    fn from(entry: RequirementEntry) -> Self {
        let RequirementEntry {
            requirement,
            origin,
            ..
        } = entry;
        Self {
            name: PackageName::from(&requirement.name),
            requirement,
            origin,
        }
    }
}

impl Entry {
    /// The version specifiers, if the entry has any.
    pub fn specifiers(&self) -> Option<&VersionSpecifiers> {
        match &self.requirement.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => Some(specifiers),
            Some(VersionOrUrl::Url(_)) | None => None,
        }
    }

    pub fn floor(&self) -> Option<Floor> {
        Floor::from_requirement(&self.requirement)
    }

    pub fn pin(&self) -> Pin {
        Pin::from_requirement(&self.requirement)
    }

    /// The environment marker as written, normalized; `None` when the entry always applies.
    pub fn marker(&self) -> Option<String> {
        self.requirement.marker.try_to_string()
    }

    /// The requirement without its marker, e.g. `pyyaml>=5.3.1` or `foo @ https://...`.
    pub fn specification(&self) -> String {
        match &self.requirement.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => {
                format!("{}{specifiers}", self.name)
            }
            Some(VersionOrUrl::Url(url)) => format!("{} @ {url}", self.name),
            None => self.name.to_string(),
        }
    }

    fn is_active(&self, markers: &MarkerEnvironment) -> bool {
        self.requirement.marker.evaluate(markers, &[])
    }
}

/// The flattened requirements and constraints of all input files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub requirements: Vec<Entry>,
    pub constraints: Vec<Entry>,
}

impl Manifest {
    /// Parse requirements files and constraints files, following their includes.
    pub fn from_files(
        requirements: &[impl AsRef<Path>],
        constraints: &[impl AsRef<Path>],
    ) -> Result<Self, ManifestError> {
        let mut manifest = Self::default();
        for path in requirements {
            debug!("Reading requirements from `{}`", path.as_ref().display());
            manifest.add(RequirementsTxt::parse(path)?, Role::Requirements);
        }
        for path in constraints {
            debug!("Reading constraints from `{}`", path.as_ref().display());
            manifest.add(RequirementsTxt::parse(path)?, Role::Constraints);
        }
        Ok(manifest)
    }

    /// Add a parsed file in the given role.
    pub fn add(&mut self, requirements_txt: RequirementsTxt, role: Role) {
        let RequirementsTxt {
            requirements,
            constraints,
            editables,
            unnamed,
            options: _,
        } = requirements_txt;

        for editable in editables {
            debug!(
                "Skipping editable `{}` at {}",
                editable.target, editable.origin
            );
        }
        for entry in unnamed {
            debug!(
                "Skipping unnamed requirement `{}` at {}",
                entry.target, entry.origin
            );
        }

        let named = match role {
            Role::Requirements => &mut self.requirements,
            Role::Constraints => &mut self.constraints,
        };
        named.extend(requirements.into_iter().map(Entry::from));
        self.constraints
            .extend(constraints.into_iter().map(Entry::from));
    }

    /// Returns `true` if any requirement names the package, in any environment.
    pub fn is_required(&self, name: &PackageName) -> bool {
        self.requirements.iter().any(|entry| entry.name == *name)
    }

    /// The entries whose markers hold in the given environment.
    pub fn active(
        &self,
        environment: &TargetEnvironment,
    ) -> Result<ActiveManifest<'_>, EnvironmentError> {
        Ok(self.active_for_markers(&environment.markers()?))
    }

    pub(crate) fn active_for_markers(&self, markers: &MarkerEnvironment) -> ActiveManifest<'_> {
        ActiveManifest {
            requirements: self
                .requirements
                .iter()
                .filter(|entry| entry.is_active(markers))
                .collect(),
            constraints: self
                .constraints
                .iter()
                .filter(|entry| entry.is_active(markers))
                .collect(),
        }
    }
}

/// The part of a [`Manifest`] that applies in one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveManifest<'a> {
    pub requirements: Vec<&'a Entry>,
    pub constraints: Vec<&'a Entry>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(transparent)]
    RequirementsTxt(#[from] RequirementsTxtFileError),
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use fs_err as fs;
    use indoc::indoc;
    use tempfile::tempdir;

    use mincheck_normalize::PackageName;
    use mincheck_requirements_txt::RequirementsTxt;

    use crate::environment::{Platform, PythonVersion, TargetEnvironment};

    use super::{Manifest, Role};

    fn names(entries: &[&super::Entry]) -> Vec<String> {
        entries.iter().map(|entry| entry.name.to_string()).collect()
    }

    #[test]
    fn roles_and_includes() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("requirements.txt"),
            indoc! {"
                -c constraints-inline.txt
                PyYAML>=5.3.1
                -e ./local
            "},
        )
        .unwrap();
        fs::write(dir.path().join("constraints-inline.txt"), "six==1.16.0\n").unwrap();
        fs::write(
            dir.path().join("minimum-constraints.txt"),
            indoc! {"
                pyyaml==5.3.1
                requests @ https://example.org/requests-2.0-py3-none-any.whl
            "},
        )
        .unwrap();

        let manifest = Manifest::from_files(
            &[dir.path().join("requirements.txt")],
            &[dir.path().join("minimum-constraints.txt")],
        )
        .unwrap();

        let requirements: Vec<&str> = manifest
            .requirements
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        let constraints: Vec<&str> = manifest
            .constraints
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(requirements, ["pyyaml"]);
        assert_eq!(constraints, ["six", "pyyaml", "requests"]);
        assert_eq!(manifest.requirements[0].specification(), "pyyaml>=5.3.1");
        let pyyaml = PackageName::from_str("PyYAML").unwrap();
        let six = PackageName::from_str("six").unwrap();
        assert!(manifest.is_required(&pyyaml));
        assert!(!manifest.is_required(&six));
    }

    #[test]
    fn active_follows_markers() {
        let requirements = RequirementsTxt::parse_str(
            indoc! {"
                PyYAML>=5.3.1; python_version <= '3.11'
                PyYAML>=6.0.2; python_version >= '3.12'
                pywin32>=303; sys_platform == 'win32'
                nocasedict>=1.0.0
            "},
            "requirements.txt",
        )
        .unwrap();
        let mut manifest = Manifest::default();
        manifest.add(requirements, Role::Requirements);

        let py311_windows = TargetEnvironment::new(PythonVersion::new(3, 11), Platform::Windows);
        let active = manifest.active(&py311_windows).unwrap();
        assert_eq!(
            names(&active.requirements),
            ["pyyaml", "pywin32", "nocasedict"]
        );
        assert_eq!(active.requirements[0].origin.line, 1);

        let py312_linux = TargetEnvironment::new(PythonVersion::new(3, 12), Platform::Linux);
        let active = manifest.active(&py312_linux).unwrap();
        assert_eq!(names(&active.requirements), ["pyyaml", "nocasedict"]);
        assert_eq!(active.requirements[0].origin.line, 2);
        assert!(active.requirements[0].marker().is_some());
        assert_eq!(active.requirements[1].marker(), None);
    }

    #[test]
    fn constraints_file_includes_are_constraints() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("minimum-constraints.txt"),
            indoc! {"
                -c other.txt
                -r x.txt
                nocasedict==1.0.0
            "},
        )
        .unwrap();
        fs::write(dir.path().join("other.txt"), "ply==3.10\n").unwrap();
        fs::write(dir.path().join("x.txt"), "PyYAML==5.3.1\n").unwrap();

        let files = [dir.path().join("minimum-constraints.txt")];
        let manifest = Manifest::from_files(&[] as &[&str], &files).unwrap();

        assert!(manifest.requirements.is_empty());
        let mut constraints: Vec<&str> = manifest
            .constraints
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        constraints.sort_unstable();
        assert_eq!(constraints, ["nocasedict", "ply", "pyyaml"]);
        let ply = manifest
            .constraints
            .iter()
            .find(|entry| entry.name.as_str() == "ply")
            .unwrap();
        assert!(ply.origin.path.ends_with("other.txt"), "{}", ply.origin);
    }

    #[test]
    fn missing_file() {
        let dir = tempdir().unwrap();
        let err =
            Manifest::from_files(&[dir.path().join("missing.txt")], &[] as &[&str]).unwrap_err();
        assert!(err.to_string().contains("missing.txt"), "{err}");
    }
}
