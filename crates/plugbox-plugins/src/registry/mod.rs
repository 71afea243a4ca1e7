//! The plugin manager: registry, two-phase loading and invocation.
//!
//! Plugins are registered in `MetadataOnly` by [`PluginManager::load_all_metadata`]
//! and move to `CodeLoaded` the first time their code is needed. The move is
//! one-way and idempotent. Each plugin slot carries its own locks so that
//! loading, persistence and invocation of one plugin never block another.

mod arguments;
mod builder;
mod sources;

use std::collections::BTreeMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::activator::{self, ParameterInfo, PluginArgs, PluginInstance};
use crate::compiler::SourceCompiler;
use crate::descriptor::{
    IconDescriptor, IdOrigin, PluginDescriptor, PluginId, StyleDescriptor, parse_descriptor,
    parse_icons, parse_style,
};
use crate::error::PluginError;
use crate::events::PluginObserver;
use crate::package::PackageStore;
use crate::security::SecurityAnalyzer;
use crate::settings::PluginSettings;

pub use self::builder::PluginManagerBuilder;

const REGISTRY_TARGET: &str = "plugbox_plugins::registry";
const DEFAULT_STYLE_ENTRY: &str = "style.json";

/// Load stage of a registered plugin.
#[derive(Debug, Clone)]
pub enum PluginStage {
    /// Metadata is known; no code has been compiled.
    MetadataOnly,
    /// Code is compiled and the instance is active.
    CodeLoaded(Arc<PluginInstance>),
}

impl PluginStage {
    /// Returns true once code has been loaded.
    #[must_use]
    pub const fn is_code_loaded(&self) -> bool {
        matches!(self, Self::CodeLoaded(_))
    }

    fn instance(&self) -> Option<Arc<PluginInstance>> {
        match self {
            Self::MetadataOnly => None,
            Self::CodeLoaded(instance) => Some(Arc::clone(instance)),
        }
    }
}

/// Everything the registry knows about one plugin.
#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    archive: PathBuf,
    working_dir: PathBuf,
    descriptor_entry: String,
    style_entry: Option<String>,
    descriptor: PluginDescriptor,
    icons: IconDescriptor,
    style: StyleDescriptor,
    stage: PluginStage,
    load_failure: Option<String>,
}

impl LoadedPlugin {
    /// Returns the archive the plugin was loaded from.
    #[must_use]
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// Returns the extraction working directory.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Returns the descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Returns the icon map.
    #[must_use]
    pub const fn icons(&self) -> &IconDescriptor {
        &self.icons
    }

    /// Returns the style sheet.
    #[must_use]
    pub const fn style(&self) -> &StyleDescriptor {
        &self.style
    }

    /// Returns the load stage.
    #[must_use]
    pub const fn stage(&self) -> &PluginStage {
        &self.stage
    }

    /// Returns the message of the last failed code load, if any.
    #[must_use]
    pub fn load_failure(&self) -> Option<&str> {
        self.load_failure.as_deref()
    }
}

struct PluginSlot {
    state: RwLock<LoadedPlugin>,
    load_gate: Mutex<()>,
    persist: Mutex<()>,
    settings: PluginSettings,
}

/// Metadata read from one archive before it is registered.
struct PackageMetadata {
    descriptor: PluginDescriptor,
    origin: IdOrigin,
    descriptor_entry: String,
    style_entry: Option<String>,
    icons: IconDescriptor,
    style: StyleDescriptor,
}

struct ManagerInner {
    store: PackageStore,
    data_dir: PathBuf,
    compiler: Arc<dyn SourceCompiler>,
    analyzer: SecurityAnalyzer,
    observers: Vec<Arc<dyn PluginObserver>>,
    plugins: RwLock<BTreeMap<PluginId, Arc<PluginSlot>>>,
    registration: Mutex<()>,
}

/// Registry and façade over every plugin package.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone)]
pub struct PluginManager {
    inner: Arc<ManagerInner>,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("store", &self.inner.store)
            .field("plugins", &self.inner.plugins.read().len())
            .finish_non_exhaustive()
    }
}

impl PluginManager {
    /// Starts building a manager over `store`, keeping settings in
    /// `data_dir`.
    #[must_use]
    pub fn builder(store: PackageStore, data_dir: impl Into<PathBuf>) -> PluginManagerBuilder {
        PluginManagerBuilder::new(store, data_dir.into())
    }

    fn from_parts(
        store: PackageStore,
        data_dir: PathBuf,
        compiler: Arc<dyn SourceCompiler>,
        analyzer: SecurityAnalyzer,
        observers: Vec<Arc<dyn PluginObserver>>,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                store,
                data_dir,
                compiler,
                analyzer,
                observers,
                plugins: RwLock::new(BTreeMap::new()),
                registration: Mutex::new(()),
            }),
        }
    }

    /// Returns the package store.
    #[must_use]
    pub fn store(&self) -> &PackageStore {
        &self.inner.store
    }

    /// Discovers every package and registers its metadata without compiling.
    ///
    /// Packages that cannot be read or parsed are logged and skipped.
    /// Plugins whose code is already loaded are left untouched; plugins still
    /// in `MetadataOnly` are refreshed from their archive.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Io`] when the packages directory cannot be
    /// listed.
    pub fn load_all_metadata(&self) -> Result<Vec<PluginId>, PluginError> {
        let archives = self.inner.store.discover()?;
        let mut discovered = Vec::with_capacity(archives.len());
        for archive in archives {
            match self.load_metadata(&archive) {
                Ok(Some(id)) => discovered.push(id),
                Ok(None) => {}
                Err(error) => tracing::error!(
                    target: REGISTRY_TARGET,
                    archive = %archive.display(),
                    error = %error,
                    "skipping package"
                ),
            }
        }
        tracing::info!(
            target: REGISTRY_TARGET,
            plugins = discovered.len(),
            "plugin metadata loaded"
        );
        Ok(discovered)
    }

    /// Loads the metadata of a single archive.
    ///
    /// Refreshes are serialised by the registration lock. A slot already
    /// registered for the archive keeps its persist and load locks while the
    /// archive is read, so a concurrent [`Self::set_enabled`] cannot be
    /// overwritten by a stale descriptor. An archive whose generated id was
    /// never persisted keeps the id it was first registered under.
    ///
    /// Returns `None` when the archive carries no plugin descriptor.
    fn load_metadata(&self, archive: &Path) -> Result<Option<PluginId>, PluginError> {
        let _registration = self.inner.registration.lock();
        let current = self.slot_for_archive(archive);
        let _persist = current.as_ref().map(|(_, slot)| slot.persist.lock());
        let _gate = current.as_ref().map(|(_, slot)| slot.load_gate.lock());

        let Some(mut metadata) = self.read_metadata(archive)? else {
            tracing::info!(
                target: REGISTRY_TARGET,
                archive = %archive.display(),
                "package has no plugin descriptor; skipped"
            );
            return Ok(None);
        };

        if let Some((current_id, slot)) = &current {
            if slot.state.read().stage.is_code_loaded() {
                tracing::debug!(
                    target: REGISTRY_TARGET,
                    plugin = %current_id,
                    "code already loaded; metadata left untouched"
                );
                return Ok(Some(current_id.clone()));
            }
            if metadata.origin == IdOrigin::Generated {
                metadata.descriptor = metadata.descriptor.with_id(current_id.clone());
            }
        }

        let id = metadata.descriptor.id().clone();
        let owner_archive = self
            .inner
            .plugins
            .read()
            .get(&id)
            .map(|slot| slot.state.read().archive.clone());
        if let Some(owner) = owner_archive.filter(|path| path != archive) {
            return Err(PluginError::Package {
                archive: archive.to_path_buf(),
                message: format!(
                    "plugin id '{id}' is already provided by '{}'",
                    owner.display()
                ),
            });
        }

        if metadata.origin == IdOrigin::Generated {
            self.persist_generated_id(archive, &metadata.descriptor_entry, &metadata.descriptor);
        }
        let working_dir = self.inner.store.extract(archive, &id)?;

        let loaded = LoadedPlugin {
            archive: archive.to_path_buf(),
            working_dir,
            descriptor_entry: metadata.descriptor_entry,
            style_entry: metadata.style_entry,
            descriptor: metadata.descriptor,
            icons: metadata.icons,
            style: metadata.style,
            stage: PluginStage::MetadataOnly,
            load_failure: None,
        };
        match &current {
            Some((current_id, slot)) if *current_id == id => {
                *slot.state.write() = loaded.clone();
            }
            _ => {
                let slot = Arc::new(PluginSlot {
                    state: RwLock::new(loaded.clone()),
                    load_gate: Mutex::new(()),
                    persist: Mutex::new(()),
                    settings: PluginSettings::new(&self.inner.data_dir, &id),
                });
                let mut plugins = self.inner.plugins.write();
                if let Some((previous, _)) = &current {
                    tracing::info!(
                        target: REGISTRY_TARGET,
                        previous = %previous,
                        plugin = %id,
                        "archive now declares a different plugin id"
                    );
                    plugins.remove(previous);
                }
                plugins.insert(id.clone(), slot);
            }
        }

        self.notify(|observer| observer.plugin_discovered(&loaded.descriptor));
        Ok(Some(id))
    }

    fn read_metadata(&self, archive: &Path) -> Result<Option<PackageMetadata>, PluginError> {
        let package = self.inner.store.open(archive)?;
        let Some(descriptor_entry) = package.descriptor() else {
            return Ok(None);
        };
        let (descriptor, origin) = parse_descriptor(descriptor_entry.contents())?;
        let icons = package
            .icons()
            .map(|entry| parse_icons(entry.contents()))
            .transpose()?
            .unwrap_or_default();
        let style = package
            .style()
            .map(|entry| parse_style(entry.contents()))
            .transpose()?
            .unwrap_or_default();
        Ok(Some(PackageMetadata {
            descriptor,
            origin,
            descriptor_entry: descriptor_entry.name().to_owned(),
            style_entry: package.style().map(|entry| entry.name().to_owned()),
            icons,
            style,
        }))
    }

    fn slot_for_archive(&self, archive: &Path) -> Option<(PluginId, Arc<PluginSlot>)> {
        self.inner
            .plugins
            .read()
            .iter()
            .find(|(_, slot)| slot.state.read().archive == archive)
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
    }

    fn persist_generated_id(&self, archive: &Path, entry: &str, descriptor: &PluginDescriptor) {
        let written = descriptor.to_json().and_then(|json| {
            self.inner
                .store
                .rewrite_entry(archive, entry, json.as_bytes())
        });
        match written {
            Ok(()) => tracing::info!(
                target: REGISTRY_TARGET,
                plugin = %descriptor.id(),
                archive = %archive.display(),
                "assigned plugin id"
            ),
            Err(error) => tracing::warn!(
                target: REGISTRY_TARGET,
                plugin = %descriptor.id(),
                error = %error,
                "generated plugin id could not be persisted"
            ),
        }
    }

    /// Compiles and activates the plugin's code.
    ///
    /// Succeeds immediately when the code is already loaded. Concurrent
    /// callers for the same plugin compile once; later callers wait and then
    /// observe the loaded state. A failure leaves the plugin in
    /// `MetadataOnly` and records the failure message.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids, or the security,
    /// compilation, activation or I/O error that stopped the load.
    pub fn load_code(&self, id: &PluginId) -> Result<(), PluginError> {
        let slot = self.slot(id)?;
        let _gate = slot.load_gate.lock();
        let (descriptor, archive, working_dir) = {
            let state = slot.state.read();
            if state.stage.is_code_loaded() {
                return Ok(());
            }
            (
                state.descriptor.clone(),
                state.archive.clone(),
                state.working_dir.clone(),
            )
        };

        match self.build_instance(&descriptor, &archive, &working_dir) {
            Ok(instance) => {
                {
                    let mut state = slot.state.write();
                    state.stage = PluginStage::CodeLoaded(Arc::new(instance));
                    state.load_failure = None;
                }
                self.notify(|observer| observer.code_loaded(id));
                Ok(())
            }
            Err(error) => {
                slot.state.write().load_failure = Some(error.to_string());
                self.notify(|observer| observer.load_failed(id, &error));
                Err(error)
            }
        }
    }

    fn build_instance(
        &self,
        descriptor: &PluginDescriptor,
        archive: &Path,
        working_dir: &Path,
    ) -> Result<PluginInstance, PluginError> {
        let id = descriptor.id();
        let unit = sources::read_unit(descriptor, archive, working_dir)?;
        self.inner.analyzer.check_sources(id.as_str(), unit.sources())?;

        let module = self
            .inner
            .compiler
            .compile(&unit)
            .map_err(|diagnostics| PluginError::Compilation {
                plugin: id.to_string(),
                diagnostics,
            })?;
        for warning in module.diagnostics().iter() {
            tracing::warn!(
                target: REGISTRY_TARGET,
                plugin = %id,
                diagnostic = %warning,
                "compiler warning"
            );
        }
        activator::activate(id, module, descriptor.class_name())
    }

    /// Runs [`Self::load_code`] on a named worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Activation`] when the thread cannot be spawned.
    pub fn load_code_in_background(
        &self,
        id: &PluginId,
    ) -> Result<JoinHandle<Result<(), PluginError>>, PluginError> {
        let manager = self.clone();
        let plugin = id.clone();
        thread::Builder::new()
            .name(format!("plugbox-load-{id}"))
            .spawn(move || manager.load_code(&plugin))
            .map_err(|error| PluginError::Activation {
                plugin: id.to_string(),
                message: format!("could not start loader thread: {error}"),
            })
    }

    /// Invokes the function published as `key`.
    ///
    /// Disabled plugins are refused before any code is touched. Code is
    /// loaded on first use. Declared defaults are filled in and required
    /// parameters enforced before the call. Plugin panics are caught.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Disabled`], [`PluginError::NotFound`],
    /// [`PluginError::SecurityViolation`] for unregistered keys,
    /// [`PluginError::InvalidArguments`], [`PluginError::InvocationFault`],
    /// or any error raised by loading code.
    pub fn invoke(
        &self,
        id: &PluginId,
        key: &str,
        args: PluginArgs,
    ) -> Result<Value, PluginError> {
        let slot = self.slot(id)?;
        if !slot.state.read().descriptor.is_enabled() {
            tracing::warn!(
                target: REGISTRY_TARGET,
                plugin = %id,
                function = key,
                "invocation of disabled plugin refused"
            );
            return Err(PluginError::Disabled { id: id.to_string() });
        }

        let loaded = slot.state.read().stage.instance();
        let instance = match loaded {
            Some(instance) => instance,
            None => {
                self.load_code(id)?;
                slot.state
                    .read()
                    .stage
                    .instance()
                    .ok_or_else(|| PluginError::NotFound { id: id.to_string() })?
            }
        };

        self.inner
            .analyzer
            .check_invocation(id.as_str(), instance.functions(), key)?;
        let prepared = arguments::prepare(id, key, instance.parameters(key), args)?;

        tracing::debug!(target: REGISTRY_TARGET, plugin = %id, function = key, "invoking");
        panic::catch_unwind(AssertUnwindSafe(|| instance.run(key, &prepared))).unwrap_or_else(
            |payload| {
                let message = arguments::panic_message(payload.as_ref());
                tracing::error!(
                    target: REGISTRY_TARGET,
                    plugin = %id,
                    function = key,
                    panic = %message,
                    "plugin panicked"
                );
                Err(PluginError::InvocationFault {
                    plugin: id.to_string(),
                    function: key.to_owned(),
                    message,
                })
            },
        )
    }

    /// Enables or disables a plugin and persists the flag.
    ///
    /// The descriptor is rewritten in the archive and then in the working
    /// directory. The in-memory flag follows the archive: it changes once the
    /// archive is rewritten, even if the working copy then fails. Code is
    /// neither loaded nor unloaded.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids, or the error that
    /// stopped persistence. When the archive could not be rewritten the
    /// in-memory flag is unchanged.
    pub fn set_enabled(&self, id: &PluginId, enabled: bool) -> Result<(), PluginError> {
        let slot = self.slot(id)?;
        let _persist = slot.persist.lock();
        let (archive, working_dir, entry, updated) = {
            let state = slot.state.read();
            (
                state.archive.clone(),
                state.working_dir.clone(),
                state.descriptor_entry.clone(),
                state.descriptor.clone().with_enabled(enabled),
            )
        };

        let json = updated.to_json()?;
        self.inner
            .store
            .rewrite_entry(&archive, &entry, json.as_bytes())?;
        slot.state.write().descriptor = updated;
        self.notify(|observer| observer.status_changed(id, enabled));

        write_working_copy(&working_dir, &entry, json.as_bytes())
    }

    /// Replaces a plugin's style sheet and persists it like the descriptor.
    ///
    /// As with [`Self::set_enabled`], the in-memory style follows the archive.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Descriptor`] for invalid styles,
    /// [`PluginError::NotFound`] for unknown ids, or the persistence error.
    pub fn save_style(&self, id: &PluginId, style: StyleDescriptor) -> Result<(), PluginError> {
        style.validate()?;
        let slot = self.slot(id)?;
        let _persist = slot.persist.lock();
        let (archive, working_dir, entry) = {
            let state = slot.state.read();
            (
                state.archive.clone(),
                state.working_dir.clone(),
                state
                    .style_entry
                    .clone()
                    .unwrap_or_else(|| DEFAULT_STYLE_ENTRY.to_owned()),
            )
        };

        let json = style.to_json()?;
        self.inner
            .store
            .rewrite_entry(&archive, &entry, json.as_bytes())?;
        {
            let mut state = slot.state.write();
            state.style = style;
            state.style_entry = Some(entry.clone());
        }

        write_working_copy(&working_dir, &entry, json.as_bytes())
    }

    /// Returns the function keys in registration order; empty until code is
    /// loaded.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids.
    pub fn list_function_keys(&self, id: &PluginId) -> Result<Vec<String>, PluginError> {
        let slot = self.slot(id)?;
        let keys = slot
            .state
            .read()
            .stage
            .instance()
            .map(|instance| instance.functions().keys().map(str::to_owned).collect())
            .unwrap_or_default();
        Ok(keys)
    }

    /// Returns the parameters declared for `key`; empty until code is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids.
    pub fn parameters(&self, id: &PluginId, key: &str) -> Result<Vec<ParameterInfo>, PluginError> {
        let slot = self.slot(id)?;
        let parameters = slot
            .state
            .read()
            .stage
            .instance()
            .map(|instance| instance.parameters(key).to_vec())
            .unwrap_or_default();
        Ok(parameters)
    }

    /// Returns a snapshot of everything known about a plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids.
    pub fn plugin(&self, id: &PluginId) -> Result<LoadedPlugin, PluginError> {
        Ok(self.slot(id)?.state.read().clone())
    }

    /// Returns the descriptor of a plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids.
    pub fn descriptor(&self, id: &PluginId) -> Result<PluginDescriptor, PluginError> {
        Ok(self.slot(id)?.state.read().descriptor.clone())
    }

    /// Returns every registered descriptor, ordered by id.
    #[must_use]
    pub fn descriptors(&self) -> Vec<PluginDescriptor> {
        self.inner
            .plugins
            .read()
            .values()
            .map(|slot| slot.state.read().descriptor.clone())
            .collect()
    }

    /// Returns the registered ids in order.
    #[must_use]
    pub fn plugin_ids(&self) -> Vec<PluginId> {
        self.inner.plugins.read().keys().cloned().collect()
    }

    /// Returns the icon map of a plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids.
    pub fn icons(&self, id: &PluginId) -> Result<IconDescriptor, PluginError> {
        Ok(self.slot(id)?.state.read().icons.clone())
    }

    /// Resolves an icon name to a file inside the plugin's working directory.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids.
    pub fn icon_path(&self, id: &PluginId, name: &str) -> Result<Option<PathBuf>, PluginError> {
        let slot = self.slot(id)?;
        let state = slot.state.read();
        Ok(state.icons.resolve(name, &state.working_dir))
    }

    /// Returns the style sheet of a plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids.
    pub fn style(&self, id: &PluginId) -> Result<StyleDescriptor, PluginError> {
        Ok(self.slot(id)?.state.read().style.clone())
    }

    /// Returns true once the plugin's code is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids.
    pub fn is_code_loaded(&self, id: &PluginId) -> Result<bool, PluginError> {
        Ok(self.slot(id)?.state.read().stage.is_code_loaded())
    }

    /// Returns the message of the last failed code load.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids.
    pub fn load_failure(&self, id: &PluginId) -> Result<Option<String>, PluginError> {
        Ok(self.slot(id)?.state.read().load_failure.clone())
    }

    /// Returns the settings store of a plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids.
    pub fn settings(&self, id: &PluginId) -> Result<PluginSettings, PluginError> {
        Ok(self.slot(id)?.settings.clone())
    }

    /// Copies an archive into the packages directory and registers it.
    ///
    /// Returns `None` when the archive carries no plugin descriptor.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the copy or the metadata load.
    pub fn import_package(&self, source: &Path) -> Result<Option<PluginId>, PluginError> {
        let archive = self.inner.store.import(source)?;
        self.load_metadata(&archive)
    }

    /// Unregisters a plugin, dropping its instance and deleting its archive
    /// and working directory. Settings are kept.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown ids and
    /// [`PluginError::Io`] when files cannot be deleted.
    pub fn remove(&self, id: &PluginId) -> Result<(), PluginError> {
        let _registration = self.inner.registration.lock();
        let slot = self
            .inner
            .plugins
            .write()
            .remove(id)
            .ok_or_else(|| PluginError::NotFound { id: id.to_string() })?;
        let _persist = slot.persist.lock();
        let _gate = slot.load_gate.lock();
        let archive = {
            let mut state = slot.state.write();
            state.stage = PluginStage::MetadataOnly;
            state.archive.clone()
        };
        self.inner.store.remove(&archive, id)?;
        tracing::info!(target: REGISTRY_TARGET, plugin = %id, "plugin removed");
        Ok(())
    }

    fn slot(&self, id: &PluginId) -> Result<Arc<PluginSlot>, PluginError> {
        self.inner
            .plugins
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| PluginError::NotFound { id: id.to_string() })
    }

    fn notify(&self, event: impl Fn(&dyn PluginObserver)) {
        for observer in &self.inner.observers {
            event(observer.as_ref());
        }
    }
}

fn write_working_copy(
    working_dir: &Path,
    entry: &str,
    contents: &[u8],
) -> Result<(), PluginError> {
    let copy = working_dir.join(entry);
    if let Some(parent) = copy.parent() {
        fs::create_dir_all(parent).map_err(|error| PluginError::io(parent, error))?;
    }
    fs::write(&copy, contents).map_err(|error| PluginError::io(&copy, error))
}
