use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use mincheck_check::{Platform, PythonVersion};
use mincheck_normalize::PackageName;
use mincheck_static::EnvVars;

#[derive(Parser)]
#[command(name = "mincheck", author, version, about)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    #[command(flatten)]
    pub(crate) global_args: GlobalArgs,
}

#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Global options")]
pub(crate) struct GlobalArgs {
    /// Do not print any output.
    #[arg(global = true, long, short, conflicts_with = "verbose")]
    pub(crate) quiet: bool,

    /// Use verbose output.
    ///
    /// Repeat (`-vv`) to show a tree of spans with timings.
    #[arg(global = true, action = ArgAction::Count, long, short, conflicts_with = "quiet")]
    pub(crate) verbose: u8,

    /// Control colors in output.
    #[arg(global = true, long, value_enum, default_value = "auto")]
    pub(crate) color: ColorChoice,

    /// The path to a `mincheck.toml` file to use for configuration.
    ///
    /// Disables discovery of `mincheck.toml` and `pyproject.toml` files.
    #[arg(global = true, long, env = EnvVars::MINCHECK_CONFIG_FILE)]
    pub(crate) config_file: Option<PathBuf>,

    /// Avoid discovering configuration files (`mincheck.toml`, `pyproject.toml`).
    #[arg(
        global = true,
        long,
        env = EnvVars::MINCHECK_NO_CONFIG,
        value_parser = BoolishValueParser::new(),
    )]
    pub(crate) no_config: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub(crate) enum ColorChoice {
    /// Enables colored output only when the output is going to a terminal or TTY with support.
    Auto,

    /// Enables colored output regardless of the detected environment.
    Always,

    /// Disables colored output.
    Never,
}

impl From<ColorChoice> for anstream::ColorChoice {
    fn from(value: ColorChoice) -> Self {
        match value {
            ColorChoice::Auto => Self::Auto,
            ColorChoice::Always => Self::Always,
            ColorChoice::Never => Self::Never,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable diagnostics.
    #[default]
    Text,
    /// The full report as JSON.
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Check that the constraints files pin every requirement at or above its minimum version.
    Check(CheckArgs),
    /// List the requirements and constraints that apply in one environment.
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct CheckArgs {
    /// The requirements files to check, e.g. `requirements.txt`.
    ///
    /// Replaces the `requirements` from the configuration file.
    #[arg(value_name = "REQUIREMENTS")]
    pub(crate) requirements: Vec<PathBuf>,

    /// A constraints file whose pins are checked, e.g. `minimum-constraints.txt`.
    ///
    /// Replaces the `constraints` from the configuration file.
    #[arg(long, short, value_name = "CONSTRAINTS")]
    pub(crate) constraints: Vec<PathBuf>,

    /// A Python version to evaluate environment markers for, e.g. `3.8`.
    ///
    /// Defaults to 3.8 through 3.13.
    #[arg(long = "python-version", value_name = "VERSION")]
    pub(crate) python_versions: Vec<PythonVersion>,

    /// A platform to evaluate environment markers for.
    ///
    /// Defaults to all platforms.
    #[arg(long = "platform", value_enum, value_name = "PLATFORM")]
    pub(crate) platforms: Vec<Platform>,

    /// A package to skip in every rule.
    #[arg(long, value_name = "PACKAGE")]
    pub(crate) ignore: Vec<PackageName>,

    /// Fail when any warning is reported.
    #[arg(
        long,
        env = EnvVars::MINCHECK_STRICT,
        value_parser = BoolishValueParser::new()
    )]
    pub(crate) strict: bool,

    /// Pass even when warnings are reported; takes precedence over `--strict`.
    #[arg(long, hide = true)]
    pub(crate) no_strict: bool,

    /// The format in which to print the report.
    #[arg(long, value_enum, env = EnvVars::MINCHECK_OUTPUT_FORMAT, default_value_t)]
    pub(crate) output_format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ShowArgs {
    /// The requirements files to read.
    #[arg(required = true, value_name = "FILE")]
    pub(crate) files: Vec<PathBuf>,

    /// The Python version to evaluate environment markers for.
    #[arg(long, default_value = "3.12")]
    pub(crate) python_version: PythonVersion,

    /// The platform to evaluate environment markers for; defaults to the current platform.
    #[arg(long, value_enum)]
    pub(crate) platform: Option<Platform>,

    /// The format in which to print the entries.
    #[arg(long, value_enum, env = EnvVars::MINCHECK_OUTPUT_FORMAT, default_value_t)]
    pub(crate) output_format: OutputFormat,
}

/// Resolve a pair of `--flag` and `--no-flag` arguments; an explicit `--no-flag` wins.
pub(crate) fn flag(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (_, true) => Some(false),
        (true, false) => Some(true),
        (false, false) => None,
    }
}
