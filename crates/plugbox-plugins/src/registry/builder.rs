//! Construction of [`PluginManager`] instances.

use std::path::PathBuf;
use std::sync::Arc;

use super::PluginManager;
use crate::compiler::{ScriptCompiler, SourceCompiler};
use crate::error::PluginError;
use crate::events::{PluginObserver, StructuredEventReporter};
use crate::package::PackageStore;
use crate::security::SecurityAnalyzer;

/// Collects the collaborators of a [`PluginManager`].
///
/// Defaults: [`ScriptCompiler::default`], the default security policy and a
/// [`StructuredEventReporter`] as the only observer.
pub struct PluginManagerBuilder {
    store: PackageStore,
    data_dir: PathBuf,
    compiler: Option<Arc<dyn SourceCompiler>>,
    analyzer: Option<SecurityAnalyzer>,
    observers: Vec<Arc<dyn PluginObserver>>,
}

impl PluginManagerBuilder {
    pub(super) fn new(store: PackageStore, data_dir: PathBuf) -> Self {
        Self {
            store,
            data_dir,
            compiler: None,
            analyzer: None,
            observers: vec![Arc::new(StructuredEventReporter::new())],
        }
    }

    /// Replaces the compiler.
    #[must_use]
    pub fn compiler(mut self, compiler: impl SourceCompiler + 'static) -> Self {
        self.compiler = Some(Arc::new(compiler));
        self
    }

    /// Replaces the compiler with a shared one.
    #[must_use]
    pub fn shared_compiler(mut self, compiler: Arc<dyn SourceCompiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    /// Replaces the security policy.
    #[must_use]
    pub fn analyzer(mut self, analyzer: SecurityAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Adds an observer notified of lifecycle events.
    #[must_use]
    pub fn observer(mut self, observer: impl PluginObserver + 'static) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Builds the manager.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Policy`] when the default security policy
    /// cannot be built.
    pub fn build(self) -> Result<PluginManager, PluginError> {
        let analyzer = match self.analyzer {
            Some(analyzer) => analyzer,
            None => SecurityAnalyzer::new()?,
        };
        let compiler = self
            .compiler
            .unwrap_or_else(|| Arc::new(ScriptCompiler::default()));
        Ok(PluginManager::from_parts(
            self.store,
            self.data_dir,
            compiler,
            analyzer,
            self.observers,
        ))
    }
}

impl std::fmt::Debug for PluginManagerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManagerBuilder")
            .field("store", &self.store)
            .field("data_dir", &self.data_dir)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
