//! Command-line front-end for the plugbox plugin host.
//!
//! The runtime parses arguments, loads layered configuration, initialises
//! telemetry, discovers plugin packages and then executes a single command.
//! It is driven from the binary entrypoint and from tests, where the
//! configuration loader and IO streams can be substituted.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use plugbox_config::{Config, HostPaths};
use plugbox_plugins::{PackageStore, PluginManager, ScriptCompiler};
use plugbox_sandbox::{OperationBudget, Sandbox, SandboxProfile};

mod cli;
mod commands;
mod config;
mod errors;
pub mod telemetry;

use cli::Cli;
use config::{command_arguments, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;

#[cfg(test)]
mod tests;

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: keep in sync with the fields of `plugbox_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--packages-dir",
    "--work-dir",
    "--data-dir",
    "--package-extension",
    "--log-filter",
    "--log-format",
    "--max-operations",
];

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    match try_run(args, stdout, loader) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn try_run<I, W, L>(raw_args: I, stdout: &mut W, loader: &L) -> Result<(), AppError>
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = raw_args.into_iter().collect();
    let split = split_config_arguments(&args);
    let cli = Cli::try_parse_from(command_arguments(&args, &split)).map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    telemetry::initialise(&config)?;

    let manager = build_manager(&config)?;
    manager.load_all_metadata()?;
    commands::execute(cli.command, &manager, stdout)
}

/// Builds a plugin manager over the configured directories and budget.
pub(crate) fn build_manager(config: &Config) -> Result<PluginManager, AppError> {
    let paths = HostPaths::from_config(config)?;
    let store = PackageStore::new(
        paths.packages_dir(),
        paths.work_dir(),
        config.package_extension.as_str(),
    );
    let profile = SandboxProfile::new()
        .with_operation_budget(OperationBudget::bounded(config.max_operations));
    let manager = PluginManager::builder(store, paths.data_dir())
        .compiler(ScriptCompiler::new(Sandbox::new(profile)))
        .build()?;
    tracing::debug!(
        target: "plugbox_cli",
        packages = %paths.packages_dir().display(),
        max_operations = config.max_operations,
        "plugin manager ready"
    );
    Ok(manager)
}
