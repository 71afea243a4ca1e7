//! Domain errors raised by plugin operations.
//!
//! Every failure is local to one plugin (or one call), so each variant names
//! the plugin or archive it concerns. I/O errors are held in `Arc` so the
//! enum stays `Clone`.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::compiler::Diagnostics;
use crate::security::Violation;

/// Errors arising from plugin operations.
#[derive(Debug, Clone, Error)]
pub enum PluginError {
    /// A package archive could not be read or is corrupt.
    #[error("package '{}' is unreadable: {message}", archive.display())]
    Package {
        /// Archive that failed.
        archive: PathBuf,
        /// Human-readable failure description.
        message: String,
    },

    /// A descriptor document is missing or malformed.
    #[error("invalid descriptor in '{origin}': {message}")]
    Descriptor {
        /// Archive or document the descriptor came from.
        origin: String,
        /// Description of the format failure.
        message: String,
    },

    /// The security policy refused an operation.
    #[error("security violation in plugin '{plugin}': {violation}")]
    SecurityViolation {
        /// Plugin identifier.
        plugin: String,
        /// What the policy matched.
        violation: Violation,
    },

    /// The plugin source failed to compile.
    #[error("plugin '{plugin}' failed to compile: {diagnostics}")]
    Compilation {
        /// Plugin identifier.
        plugin: String,
        /// Ordered compiler findings.
        diagnostics: Diagnostics,
    },

    /// The compiled plugin could not be instantiated or registered.
    #[error("plugin '{plugin}' failed to activate: {message}")]
    Activation {
        /// Plugin identifier.
        plugin: String,
        /// Description of the activation failure.
        message: String,
    },

    /// Plugin logic failed while serving an invocation.
    #[error("plugin '{plugin}' faulted in '{function}': {message}")]
    InvocationFault {
        /// Plugin identifier.
        plugin: String,
        /// Function key that was invoked.
        function: String,
        /// Description of the fault.
        message: String,
    },

    /// Invocation arguments did not satisfy the declared parameters.
    #[error("invalid arguments for '{function}' in plugin '{plugin}': {message}")]
    InvalidArguments {
        /// Plugin identifier.
        plugin: String,
        /// Function key that was invoked.
        function: String,
        /// Description of the mismatch.
        message: String,
    },

    /// No plugin with the identifier is registered.
    #[error("plugin '{id}' not found in registry")]
    NotFound {
        /// Identifier that was looked up.
        id: String,
    },

    /// The plugin is disabled and refuses invocations.
    #[error("plugin '{id}' is disabled")]
    Disabled {
        /// Identifier of the disabled plugin.
        id: String,
    },

    /// A filesystem operation failed.
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// State could not be written back to its backing store.
    #[error("failed to persist state for '{plugin}': {message}")]
    Persistence {
        /// Plugin identifier.
        plugin: String,
        /// Description of the persistence failure.
        message: String,
    },

    /// The security policy itself could not be built.
    #[error("invalid security policy: {message}")]
    Policy {
        /// Description of the policy failure.
        message: String,
    },
}

impl PluginError {
    /// Wraps an I/O error raised while accessing `path`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Returns the plugin identifier the error concerns, when it names one.
    #[must_use]
    pub fn plugin(&self) -> Option<&str> {
        match self {
            Self::SecurityViolation { plugin, .. }
            | Self::Compilation { plugin, .. }
            | Self::Activation { plugin, .. }
            | Self::InvocationFault { plugin, .. }
            | Self::InvalidArguments { plugin, .. }
            | Self::Persistence { plugin, .. } => Some(plugin.as_str()),
            Self::NotFound { id } | Self::Disabled { id } => Some(id.as_str()),
            Self::Package { .. } | Self::Descriptor { .. } | Self::Io { .. } | Self::Policy { .. } => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests;
