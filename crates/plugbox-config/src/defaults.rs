use std::env;

use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Default extension of plugin package archives.
pub const DEFAULT_PACKAGE_EXTENSION: &str = "plug";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default number of script operations allowed per plugin call.
pub const DEFAULT_MAX_OPERATIONS: u64 = 5_000_000;

const APPLICATION_DIR: &str = "plugbox";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned package extension used where allocation is required.
pub fn default_package_extension() -> String {
    DEFAULT_PACKAGE_EXTENSION.to_string()
}

/// Default per-call operation budget for plugin scripts.
pub fn default_max_operations() -> u64 {
    DEFAULT_MAX_OPERATIONS
}

/// Directory scanned for plugin packages.
pub fn default_packages_dir() -> Utf8PathBuf {
    data_base_directory().join("packages")
}

/// Root of the per-plugin extraction directories.
///
/// Extraction is ephemeral, so it lives below the temporary directory.
pub fn default_work_dir() -> Utf8PathBuf {
    temp_base_directory().join(APPLICATION_DIR).join("work")
}

/// Directory holding persisted per-plugin settings.
pub fn default_data_dir() -> Utf8PathBuf {
    data_base_directory()
}

fn data_base_directory() -> Utf8PathBuf {
    dirs::data_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .map_or_else(
            || temp_base_directory().join(APPLICATION_DIR).join("data"),
            |dir| dir.join(APPLICATION_DIR),
        )
}

fn temp_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
