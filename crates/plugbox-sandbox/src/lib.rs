//! Script sandboxing for plugbox plugins.
//!
//! The `plugbox-sandbox` crate wraps the [`rhai`] scripting engine with policy
//! defaults suited to running untrusted plugin code in-process. Callers
//! describe the limits a script must respect using a [`SandboxProfile`], then
//! obtain configured engines from a [`Sandbox`].
//!
//! The sandbox is restrictive by default:
//! - Every script call runs under a finite operation budget.
//! - Call depth, expression depth and container sizes are bounded.
//! - `eval` is disabled so scripts cannot compile new code at runtime.
//! - No filesystem, process or network functions exist. Scripts can only
//!   reach the [`HostModules`] the host registers.
//! - `print` and `debug` output is routed to `tracing` instead of stdout.
//!
//! ```
//! use plugbox_sandbox::{OperationBudget, Sandbox, SandboxProfile};
//!
//! let profile = SandboxProfile::new().with_operation_budget(OperationBudget::bounded(10_000));
//! let sandbox = Sandbox::new(profile);
//! let engine = sandbox.engine();
//! let value: i64 = engine.eval("40 + 2").expect("script evaluates");
//! assert_eq!(value, 42);
//! ```

mod error;
mod host;
mod profile;
mod sandbox;

#[cfg(test)]
mod tests;

pub use error::SandboxError;
pub use host::{HOST_MODULE_NAME, HostModules};
pub use profile::{OperationBudget, SandboxProfile};
pub use sandbox::Sandbox;
