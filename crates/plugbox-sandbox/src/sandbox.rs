//! Engine construction built on top of `rhai`.

use rhai::Engine;

use crate::host::{HostModules, SCRIPT_TARGET};
use crate::profile::SandboxProfile;

/// Produces script engines confined by a [`SandboxProfile`].
#[derive(Debug, Clone)]
pub struct Sandbox {
    profile: SandboxProfile,
    host: HostModules,
}

impl Sandbox {
    /// Creates a sandbox with the supplied profile and the default host modules.
    #[must_use]
    pub fn new(profile: SandboxProfile) -> Self {
        Self {
            profile,
            host: HostModules::with_defaults(),
        }
    }

    /// Replaces the host module set.
    #[must_use]
    pub fn with_host_modules(mut self, host: HostModules) -> Self {
        self.host = host;
        self
    }

    /// Returns the active profile.
    #[must_use]
    pub const fn profile(&self) -> &SandboxProfile {
        &self.profile
    }

    /// Returns the host modules registered into every engine.
    #[must_use]
    pub const fn host_modules(&self) -> &HostModules {
        &self.host
    }

    /// Builds a fresh engine with the profile limits applied.
    ///
    /// Each call returns an independent engine so callers can attach their
    /// own module resolver without affecting other plugins.
    #[must_use]
    pub fn engine(&self) -> Engine {
        let mut engine = Engine::new();
        let profile = &self.profile;
        let (expr_depth, function_expr_depth) = profile.max_expr_depths();
        let (string_size, array_size, map_size) = profile.container_limits();

        engine
            .set_max_operations(profile.operation_budget().limit())
            .set_max_call_levels(profile.max_call_levels())
            .set_max_expr_depths(expr_depth, function_expr_depth)
            .set_max_string_size(string_size)
            .set_max_array_size(array_size)
            .set_max_map_size(map_size)
            .set_max_modules(profile.max_modules())
            .set_strict_variables(profile.strict_variables());

        for symbol in profile.disabled_symbols() {
            engine.disable_symbol(symbol);
        }

        engine.on_print(|text| tracing::info!(target: SCRIPT_TARGET, "{text}"));
        engine.on_debug(|text, source, position| {
            tracing::debug!(
                target: SCRIPT_TARGET,
                source = source.unwrap_or_default(),
                position = %position,
                "{text}"
            );
        });

        self.host.register_into(&mut engine);
        engine
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new(SandboxProfile::default())
    }
}
