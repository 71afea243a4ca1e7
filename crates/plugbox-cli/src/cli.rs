//! CLI argument definitions for the plugbox host.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

/// Command-line interface for managing and running plugin packages.
#[derive(Parser, Debug)]
#[command(name = "plugbox", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// The operation to perform.
    #[command(subcommand)]
    pub(crate) command: PluginCommand,
}

/// Operations exposed by the CLI.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub(crate) enum PluginCommand {
    /// Lists every discovered plugin without compiling any code.
    List,
    /// Loads a plugin's code and lists its function keys with parameters.
    Functions {
        /// Identifier of the plugin.
        id: String,
    },
    /// Invokes a registered function key.
    Invoke {
        /// Identifier of the plugin.
        id: String,
        /// Function key to run.
        key: String,
        /// Named argument as `name=value`; values parse as JSON and fall back
        /// to plain strings.
        #[arg(long = "arg", value_name = "NAME=VALUE", value_parser = parse_argument)]
        arguments: Vec<(String, Value)>,
    },
    /// Enables a plugin and persists the flag into its package.
    Enable {
        /// Identifier of the plugin.
        id: String,
    },
    /// Disables a plugin and persists the flag into its package.
    Disable {
        /// Identifier of the plugin.
        id: String,
    },
    /// Copies a package archive into the packages directory and registers it.
    Import {
        /// Path of the archive to import.
        archive: PathBuf,
    },
}

/// Parses a `name=value` argument pair.
pub(crate) fn parse_argument(raw: &str) -> Result<(String, Value), String> {
    let Some((raw_name, value)) = raw.split_once('=') else {
        return Err(format!("expected NAME=VALUE, got '{raw}'"));
    };
    let name = raw_name.trim();
    if name.is_empty() {
        return Err(format!("argument name must not be empty in '{raw}'"));
    }
    let parsed = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((name.to_owned(), parsed))
}
