use std::path::PathBuf;

use mincheck_check::{
    CheckSettings, EnvironmentError, EnvironmentMatrix, Platform, TargetEnvironment,
};
use mincheck_settings::{Combine, FilesystemOptions, Options};

use crate::cli::{CheckArgs, ColorChoice, GlobalArgs, OutputFormat, ShowArgs, flag};

/// The resolved global settings to use for any invocation of the CLI.
#[derive(Debug, Clone)]
pub(crate) struct GlobalSettings {
    pub(crate) quiet: bool,
    pub(crate) verbose: u8,
    pub(crate) color: ColorChoice,
}

impl GlobalSettings {
    pub(crate) fn resolve(args: &GlobalArgs) -> Self {
        Self {
            quiet: args.quiet,
            verbose: args.verbose,
            color: args.color,
        }
    }
}

/// The resolved settings to use for a `check` invocation.
#[derive(Debug, Clone)]
pub(crate) struct CheckCommandSettings {
    pub(crate) requirements: Vec<PathBuf>,
    pub(crate) constraints: Vec<PathBuf>,
    pub(crate) settings: CheckSettings,
    pub(crate) output_format: OutputFormat,
}

impl CheckCommandSettings {
    /// Resolve the [`CheckCommandSettings`] from the CLI and filesystem configuration.
    pub(crate) fn resolve(
        args: CheckArgs,
        filesystem: Option<FilesystemOptions>,
    ) -> Result<Self, EnvironmentError> {
        let CheckArgs {
            requirements,
            constraints,
            python_versions,
            platforms,
            ignore,
            strict,
            no_strict,
            output_format,
        } = args;

        let cli = Options {
            requirements: non_empty(requirements),
            constraints: non_empty(constraints),
            python_versions: non_empty(python_versions),
            platforms: non_empty(platforms),
            ignore: non_empty(ignore),
            strict: flag(strict, no_strict),
            rules: None,
        };
        let Options {
            requirements,
            constraints,
            python_versions,
            platforms,
            ignore,
            strict,
            rules,
        } = cli.combine(
            filesystem
                .map(FilesystemOptions::into_options)
                .unwrap_or_default(),
        );

        let environments = EnvironmentMatrix::new(
            python_versions.unwrap_or_else(|| EnvironmentMatrix::DEFAULT_PYTHON_VERSIONS.to_vec()),
            platforms.unwrap_or_else(|| Platform::ALL.to_vec()),
        )?;

        Ok(Self {
            requirements: requirements.unwrap_or_default(),
            constraints: constraints.unwrap_or_default(),
            settings: CheckSettings {
                environments,
                rules: rules.unwrap_or_default().severities(),
                ignore: ignore.unwrap_or_default(),
                strict: strict.unwrap_or(false),
            },
            output_format,
        })
    }
}

/// The resolved settings to use for a `show` invocation.
#[derive(Debug, Clone)]
pub(crate) struct ShowSettings {
    pub(crate) files: Vec<PathBuf>,
    pub(crate) environment: TargetEnvironment,
    pub(crate) output_format: OutputFormat,
}

impl ShowSettings {
    pub(crate) fn resolve(args: ShowArgs) -> Self {
        let ShowArgs {
            files,
            python_version,
            platform,
            output_format,
        } = args;
        Self {
            files,
            environment: TargetEnvironment::new(
                python_version,
                platform.unwrap_or_else(Platform::current),
            ),
            output_format,
        }
    }
}

/// Treat an empty list of command-line values as unset.
fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}
