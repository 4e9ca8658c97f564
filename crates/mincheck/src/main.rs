use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use mincheck_settings::FilesystemOptions;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::commands::ExitStatus;
use crate::printer::{Printer, Stderr};
use crate::settings::{CheckCommandSettings, GlobalSettings, ShowSettings};

mod cli;
mod commands;
mod logging;
mod printer;
mod settings;

/// Load the configuration file, unless disabled.
///
/// An explicit `--config-file` skips discovery.
fn load_configuration(args: &GlobalArgs) -> Result<Option<FilesystemOptions>> {
    if let Some(config_file) = &args.config_file {
        return Ok(Some(FilesystemOptions::from_file(config_file)?));
    }
    if args.no_config {
        debug!("Skipping configuration discovery (`--no-config`)");
        return Ok(None);
    }
    Ok(FilesystemOptions::find(&std::env::current_dir()?)?)
}

fn run() -> Result<ExitStatus> {
    let cli = Cli::parse();
    let globals = GlobalSettings::resolve(&cli.global_args);

    // Configure the `tracing` crate, which controls internal logging.
    logging::setup_logging(logging::Level::from_verbosity(globals.verbose))?;

    // Configure the `Printer`, which controls user-facing output in the CLI.
    let printer = if globals.quiet {
        Printer::Quiet
    } else if globals.verbose > 0 {
        Printer::Verbose
    } else {
        Printer::Default
    };

    // Configure the `warn!` macros, which control user-facing warnings in the CLI.
    if globals.quiet {
        mincheck_warnings::disable();
    } else {
        mincheck_warnings::enable();
    }

    anstream::ColorChoice::write_global(globals.color.into());

    match cli.command {
        Commands::Check(args) => {
            let filesystem = load_configuration(&cli.global_args)?;
            let args = CheckCommandSettings::resolve(args, filesystem)?;
            commands::check(
                &args.requirements,
                &args.constraints,
                args.settings,
                args.output_format,
                printer,
            )
        }
        Commands::Show(args) => {
            let args = ShowSettings::resolve(args);
            commands::show(&args.files, args.environment, args.output_format, printer)
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(status) => status.into(),
        Err(err) => {
            // Errors are shown even with `--quiet`.
            mincheck_warnings::write_error_chain(&*err, Stderr::Enabled).ok();
            ExitStatus::Error.into()
        }
    }
}
