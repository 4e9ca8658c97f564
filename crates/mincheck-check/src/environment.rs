use std::fmt::{Display, Formatter};
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use pep508_rs::pep440_rs::VersionParseError;
use pep508_rs::{MarkerEnvironment, MarkerEnvironmentBuilder};

/// An operating system family that environment markers can distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Platform {
    /// `sys_platform == 'linux'`
    Linux,
    /// `sys_platform == 'win32'`
    #[serde(alias = "win32")]
    #[cfg_attr(feature = "clap", value(alias = "win32"))]
    Windows,
    /// `sys_platform == 'darwin'`
    #[serde(alias = "darwin")]
    #[cfg_attr(feature = "clap", value(alias = "darwin"))]
    Macos,
}

impl Platform {
    pub const ALL: [Self; 3] = [Self::Linux, Self::Windows, Self::Macos];

    /// The platform mincheck is running on, falling back to Linux on other systems.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else {
            Self::Linux
        }
    }

    pub fn sys_platform(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "win32",
            Self::Macos => "darwin",
        }
    }

    pub fn platform_system(self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Windows => "Windows",
            Self::Macos => "Darwin",
        }
    }

    pub fn os_name(self) -> &'static str {
        match self {
            Self::Linux | Self::Macos => "posix",
            Self::Windows => "nt",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Macos => "macos",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "windows" | "win32" => Ok(Self::Windows),
            "macos" | "darwin" => Ok(Self::Macos),
            _ => Err(EnvironmentError::InvalidPlatform(s.to_string())),
        }
    }
}

/// A Python version as it appears in a target environment, e.g. `3.12` or `3.12.4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PythonVersion {
    major: u64,
    minor: u64,
    patch: Option<u64>,
}

impl PythonVersion {
    pub const fn new(major: u64, minor: u64) -> Self {
        Self {
            major,
            minor,
            patch: None,
        }
    }

    /// The `python_version` marker value, i.e. `major.minor`.
    pub fn python_version(self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// The `python_full_version` marker value; a missing patch version is taken as `0`.
    pub fn python_full_version(self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch.unwrap_or(0))
    }
}

impl Display for PythonVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{patch}", self.major, self.minor),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

impl FromStr for PythonVersion {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EnvironmentError::InvalidPythonVersion(s.to_string());
        let parts: Vec<u64> = s
            .trim()
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<_, _>>()?;
        match parts.as_slice() {
            [major, minor] => Ok(Self {
                major: *major,
                minor: *minor,
                patch: None,
            }),
            [major, minor, patch] => Ok(Self {
                major: *major,
                minor: *minor,
                patch: Some(*patch),
            }),
            _ => Err(invalid()),
        }
    }
}

impl Serialize for PythonVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PythonVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// One combination of Python version and platform to evaluate markers against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetEnvironment {
    pub python: PythonVersion,
    pub platform: Platform,
}

impl TargetEnvironment {
    pub fn new(python: PythonVersion, platform: Platform) -> Self {
        Self { python, platform }
    }

    /// Build the PEP 508 marker environment for this target, assuming CPython on x86-64.
    pub fn markers(&self) -> Result<MarkerEnvironment, EnvironmentError> {
        let python_version = self.python.python_version();
        let python_full_version = self.python.python_full_version();
        MarkerEnvironment::try_from(MarkerEnvironmentBuilder {
            implementation_name: "cpython",
            implementation_version: &python_full_version,
            os_name: self.platform.os_name(),
            platform_machine: "x86_64",
            platform_python_implementation: "CPython",
            platform_release: "",
            platform_system: self.platform.platform_system(),
            platform_version: "",
            python_full_version: &python_full_version,
            python_version: &python_version,
            sys_platform: self.platform.sys_platform(),
        })
        .map_err(|err| EnvironmentError::Markers(*self, err))
    }
}

impl Display for TargetEnvironment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "py{}-{}", self.python, self.platform)
    }
}

impl Serialize for TargetEnvironment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The Python versions and platforms every check is run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentMatrix {
    python_versions: Vec<PythonVersion>,
    platforms: Vec<Platform>,
}

impl EnvironmentMatrix {
    /// The Python versions checked when none are configured.
    pub const DEFAULT_PYTHON_VERSIONS: [PythonVersion; 6] = [
        PythonVersion::new(3, 8),
        PythonVersion::new(3, 9),
        PythonVersion::new(3, 10),
        PythonVersion::new(3, 11),
        PythonVersion::new(3, 12),
        PythonVersion::new(3, 13),
    ];

    /// Create a matrix, dropping duplicates while keeping the given order.
    pub fn new(
        python_versions: Vec<PythonVersion>,
        platforms: Vec<Platform>,
    ) -> Result<Self, EnvironmentError> {
        if python_versions.is_empty() {
            return Err(EnvironmentError::NoPythonVersions);
        }
        if platforms.is_empty() {
            return Err(EnvironmentError::NoPlatforms);
        }
        Ok(Self {
            python_versions: python_versions.into_iter().unique().collect(),
            platforms: platforms.into_iter().unique().collect(),
        })
    }

    /// All environments, ordered by Python version, then platform.
    pub fn iter(&self) -> impl Iterator<Item = TargetEnvironment> + '_ {
        self.python_versions.iter().flat_map(|python| {
            self.platforms
                .iter()
                .map(|platform| TargetEnvironment::new(*python, *platform))
        })
    }

    pub fn len(&self) -> usize {
        self.python_versions.len() * self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EnvironmentMatrix {
    fn default() -> Self {
        Self {
            python_versions: Self::DEFAULT_PYTHON_VERSIONS.to_vec(),
            platforms: Platform::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Invalid Python version `{0}`: expected `major.minor` or `major.minor.patch`")]
    InvalidPythonVersion(String),
    #[error("Invalid platform `{0}`: expected one of `linux`, `windows` or `macos`")]
    InvalidPlatform(String),
    #[error("At least one Python version is required")]
    NoPythonVersions,
    #[error("At least one platform is required")]
    NoPlatforms,
    #[error("Failed to build the marker environment for `{0}`")]
    Markers(TargetEnvironment, #[source] VersionParseError),
}
