//! Shared configuration for plugbox hosts.
//!
//! Configuration is layered by `ortho_config`: built-in defaults are
//! overridden by a configuration file (`--config-path` or
//! `PLUGBOX_CONFIG_PATH`), then by `PLUGBOX_*` environment variables, then by
//! command-line flags.

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod paths;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_OPERATIONS, DEFAULT_PACKAGE_EXTENSION, default_data_dir,
    default_log_filter, default_log_filter_string, default_log_format, default_max_operations,
    default_package_extension, default_packages_dir, default_work_dir,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use paths::{HostPaths, PathsError};

/// Resolved host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PLUGBOX")]
pub struct Config {
    /// Directory scanned for plugin packages.
    #[serde(default = "default_packages_dir")]
    #[ortho_config(default = default_packages_dir())]
    pub packages_dir: Utf8PathBuf,
    /// Root under which each plugin is extracted into `<work_dir>/<id>`.
    #[serde(default = "default_work_dir")]
    #[ortho_config(default = default_work_dir())]
    pub work_dir: Utf8PathBuf,
    /// Directory holding persisted per-plugin settings.
    #[serde(default = "default_data_dir")]
    #[ortho_config(default = default_data_dir())]
    pub data_dir: Utf8PathBuf,
    /// File extension identifying plugin packages, without the dot.
    #[serde(default = "default_package_extension")]
    #[ortho_config(default = default_package_extension())]
    pub package_extension: String,
    /// Tracing filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Script operations allowed per plugin call; `0` disables the bound.
    #[serde(default = "default_max_operations")]
    #[ortho_config(default = default_max_operations())]
    pub max_operations: u64,
}

impl Config {
    /// Returns the tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            packages_dir: default_packages_dir(),
            work_dir: default_work_dir(),
            data_dir: default_data_dir(),
            package_extension: default_package_extension(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            max_operations: default_max_operations(),
        }
    }
}
