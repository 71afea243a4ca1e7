//! Plugin package runtime for plugbox.
//!
//! The `plugbox-plugins` crate discovers plugin packages (zip archives with a
//! `.plug` extension), parses their descriptors, and runs their embedded
//! [Rhai](https://rhai.rs) source inside a sandboxed engine. Host code drives
//! everything through [`PluginManager`].
//!
//! # Architecture
//!
//! Loading happens in two phases. [`PluginManager::load_all_metadata`] reads
//! every package's descriptor, icon map and style sheet without compiling
//! anything. Code is compiled and activated only when a plugin is first
//! needed, either explicitly through [`PluginManager::load_code`] or lazily by
//! [`PluginManager::invoke`].
//!
//! Two security gates guard execution. The static gate scans source text for
//! forbidden API patterns before compilation; the dynamic gate refuses any
//! invocation of a function key the plugin did not register. The sandbox
//! engine itself exposes no filesystem, process or network functions.
//!
//! # Example
//!
//! ```rust,no_run
//! use plugbox_plugins::{PackageStore, PluginArgs, PluginManager};
//!
//! let store = PackageStore::new("/var/lib/plugbox/packages", "/tmp/plugbox", "plug");
//! let manager = PluginManager::builder(store, "/var/lib/plugbox/data")
//!     .build()
//!     .expect("default policy builds");
//!
//! for id in manager.load_all_metadata().expect("packages directory is readable") {
//!     let keys = manager.list_function_keys(&id).expect("plugin is registered");
//!     assert!(keys.is_empty(), "code is not loaded yet");
//!     let _ = manager.invoke(&id, "greet", PluginArgs::new());
//! }
//! ```

pub mod activator;
pub mod compiler;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod package;
pub mod registry;
pub mod security;
pub mod settings;

#[cfg(test)]
mod tests;

pub use self::activator::{
    FunctionTable, ParameterCatalog, ParameterInfo, ParameterType, PluginArgs, PluginCapability,
    PluginInstance, ScriptPlugin,
};
pub use self::compiler::{
    CompilationUnit, CompiledModule, Diagnostic, DiagnosticSeverity, Diagnostics, LibrarySource,
    ScriptCompiler, SourceCompiler,
};
pub use self::descriptor::{
    Argb, ColorParseError, IconDescriptor, PluginDescriptor, PluginId, StyleDescriptor, StyleKind,
};
pub use self::error::PluginError;
pub use self::events::{PluginObserver, StructuredEventReporter};
pub use self::package::{PackageArchive, PackageStore};
pub use self::registry::{LoadedPlugin, PluginManager, PluginManagerBuilder, PluginStage};
pub use self::security::{ForbiddenPattern, PatternCategory, SecurityAnalyzer, Violation};
pub use self::settings::PluginSettings;
