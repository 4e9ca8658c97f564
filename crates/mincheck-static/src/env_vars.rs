/// Declares all environment variables used throughout `mincheck` and its crates.
pub struct EnvVars;

impl EnvVars {
    /// Equivalent to the `--config-file` command-line argument. Expects a path to a
    /// `mincheck.toml` file to use for configuration.
    pub const MINCHECK_CONFIG_FILE: &'static str = "MINCHECK_CONFIG_FILE";

    /// Equivalent to the `--no-config` command-line argument. If set, mincheck will not read
    /// any configuration files from the current directory or its parents.
    pub const MINCHECK_NO_CONFIG: &'static str = "MINCHECK_NO_CONFIG";

    /// Equivalent to the `--strict` command-line argument.
    pub const MINCHECK_STRICT: &'static str = "MINCHECK_STRICT";

    /// Equivalent to the `--output-format` command-line argument.
    pub const MINCHECK_OUTPUT_FORMAT: &'static str = "MINCHECK_OUTPUT_FORMAT";

    /// Disables line wrapping of warnings and error chains.
    pub const MINCHECK_NO_WRAP: &'static str = "MINCHECK_NO_WRAP";

    /// The terminal width used to wrap warnings and error chains.
    pub const COLUMNS: &'static str = "COLUMNS";

    /// Disables colored output.
    ///
    /// See [no-color.org](https://no-color.org).
    pub const NO_COLOR: &'static str = "NO_COLOR";

    /// Standard `RUST_LOG` environment variable.
    pub const RUST_LOG: &'static str = "RUST_LOG";
}
