//! Runtime-to-host notifications for plugin lifecycle events.

use std::sync::Arc;

use crate::descriptor::{PluginDescriptor, PluginId};
use crate::error::PluginError;

const EVENTS_TARGET: &str = "plugbox_plugins::events";

/// Observer trait used to surface plugin lifecycle events to the host.
pub trait PluginObserver: Send + Sync {
    /// Invoked after a package's metadata has been loaded.
    fn plugin_discovered(&self, descriptor: &PluginDescriptor);

    /// Invoked after a plugin's code has been compiled and activated.
    fn code_loaded(&self, id: &PluginId);

    /// Invoked when code loading fails.
    fn load_failed(&self, id: &PluginId, error: &PluginError);

    /// Invoked after a plugin is enabled or disabled.
    fn status_changed(&self, id: &PluginId, enabled: bool);
}

impl<T> PluginObserver for Arc<T>
where
    T: PluginObserver + ?Sized,
{
    fn plugin_discovered(&self, descriptor: &PluginDescriptor) {
        (**self).plugin_discovered(descriptor);
    }

    fn code_loaded(&self, id: &PluginId) {
        (**self).code_loaded(id);
    }

    fn load_failed(&self, id: &PluginId, error: &PluginError) {
        (**self).load_failed(id, error);
    }

    fn status_changed(&self, id: &PluginId, enabled: bool) {
        (**self).status_changed(id, enabled);
    }
}

/// Default observer that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredEventReporter;

impl StructuredEventReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PluginObserver for StructuredEventReporter {
    fn plugin_discovered(&self, descriptor: &PluginDescriptor) {
        tracing::info!(
            target: EVENTS_TARGET,
            event = "plugin_discovered",
            plugin = %descriptor.id(),
            key = descriptor.key(),
            version = descriptor.version(),
            enabled = descriptor.is_enabled(),
            "plugin discovered"
        );
    }

    fn code_loaded(&self, id: &PluginId) {
        tracing::info!(
            target: EVENTS_TARGET,
            event = "code_loaded",
            plugin = %id,
            "plugin code loaded"
        );
    }

    fn load_failed(&self, id: &PluginId, error: &PluginError) {
        tracing::error!(
            target: EVENTS_TARGET,
            event = "load_failed",
            plugin = %id,
            error = %error,
            "plugin code failed to load"
        );
    }

    fn status_changed(&self, id: &PluginId, enabled: bool) {
        tracing::info!(
            target: EVENTS_TARGET,
            event = "status_changed",
            plugin = %id,
            enabled,
            "plugin status changed"
        );
    }
}
