//! Domain errors raised by the sandbox wrapper.

use thiserror::Error;

/// Errors raised while assembling a sandbox.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    /// A host module name is not a valid script identifier.
    #[error("host module name '{name}' is not a valid identifier")]
    InvalidModuleName {
        /// Rejected module name.
        name: String,
    },

    /// A host module with the same name is already registered.
    #[error("host module '{name}' is already registered")]
    DuplicateModule {
        /// Name of the conflicting module.
        name: String,
    },
}
