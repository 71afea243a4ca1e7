//! Host-provided script modules.
//!
//! Scripts cannot reach the outside world on their own. Everything a plugin
//! may call beyond the core language is registered here as a named static
//! module, so the set of reachable host functions is explicit.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rhai::{Engine, EvalAltResult, ImmutableString, Module};

use crate::error::SandboxError;

/// Name of the default host module (`host::log("...")`).
pub const HOST_MODULE_NAME: &str = "host";

/// Tracing target for output produced by plugin scripts.
pub(crate) const SCRIPT_TARGET: &str = "plugbox_sandbox::script";

/// Named modules exposed to every sandboxed engine.
#[derive(Debug, Clone, Default)]
pub struct HostModules {
    modules: BTreeMap<String, Module>,
}

impl HostModules {
    /// Creates an empty module set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a module set holding the default `host` module.
    ///
    /// The `host` module offers `log(text)`, `warn(text)` and `now_millis()`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut modules = BTreeMap::new();
        modules.insert(HOST_MODULE_NAME.to_owned(), default_host_module());
        Self { modules }
    }

    /// Registers an additional module under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::InvalidModuleName`] when `name` is not an
    /// identifier and [`SandboxError::DuplicateModule`] when it is taken.
    pub fn insert(&mut self, name: impl Into<String>, module: Module) -> Result<(), SandboxError> {
        let module_name = name.into();
        if !is_identifier(&module_name) {
            return Err(SandboxError::InvalidModuleName { name: module_name });
        }
        if self.modules.contains_key(&module_name) {
            return Err(SandboxError::DuplicateModule { name: module_name });
        }
        self.modules.insert(module_name, module);
        Ok(())
    }

    /// Returns true when a module with `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Iterates over the registered module names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub(crate) fn register_into(&self, engine: &mut Engine) {
        for (name, module) in &self.modules {
            engine.register_static_module(name.as_str(), module.clone().into());
        }
    }
}

fn default_host_module() -> Module {
    let mut module = Module::new();
    let _ = module.set_native_fn(
        "log",
        |message: ImmutableString| -> Result<(), Box<EvalAltResult>> {
            tracing::info!(target: SCRIPT_TARGET, "{message}");
            Ok(())
        },
    );
    let _ = module.set_native_fn(
        "warn",
        |message: ImmutableString| -> Result<(), Box<EvalAltResult>> {
            tracing::warn!(target: SCRIPT_TARGET, "{message}");
            Ok(())
        },
    );
    let _ = module.set_native_fn("now_millis", || -> Result<i64, Box<EvalAltResult>> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        Ok(i64::try_from(millis).unwrap_or(i64::MAX))
    });
    module
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
