//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use plugbox_config::PathsError;
use plugbox_plugins::PluginError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to prepare host directories: {0}")]
    Paths(#[from] PathsError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error("failed to serialise output: {0}")]
    Serialise(serde_json::Error),
    #[error("failed to write output: {0}")]
    Emit(io::Error),
}
