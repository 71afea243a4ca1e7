//! Package fixtures shared by unit and behaviour tests.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use tempfile::TempDir;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::compiler::{CompilationUnit, CompiledModule, Diagnostics, ScriptCompiler, SourceCompiler};
use crate::events::PluginObserver;
use crate::package::PackageStore;
use crate::registry::PluginManager;

/// Source of the canonical demo plugin.
pub(crate) const DEMO_SOURCE: &str = r#"
fn Demo() {
    #{ greeting: "Hello", calls: 0 }
}

fn register() {
    ["greet"]
}

fn describe_parameters() {
    #{
        greet: [
            #{
                name: "name",
                displayName: "Name",
                description: "Who to greet",
                "type": "string",
                defaultValue: "world",
                required: false
            }
        ]
    }
}

fn greet(args) {
    this.calls += 1;
    `${this.greeting}, ${args.name}!`
}
"#;

/// Builds zip packages entry by entry.
#[derive(Debug, Default)]
pub(crate) struct PackageBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl PackageBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Starts from the demo package: `plugin.json` plus `Demo.rhai`.
    pub(crate) fn demo(id: &str) -> Self {
        Self::new()
            .descriptor(json!({
                "id": id,
                "key": "demo",
                "name": "Demo",
                "className": "Demo",
                "version": "1.0.0",
                "codeFilePath": "./Demo.rhai",
            }))
            .entry("Demo.rhai", DEMO_SOURCE)
    }

    pub(crate) fn entry(mut self, name: &str, contents: impl AsRef<[u8]>) -> Self {
        self.entries
            .push((name.to_owned(), contents.as_ref().to_vec()));
        self
    }

    pub(crate) fn descriptor(self, descriptor: Value) -> Self {
        self.entry("plugin.json", descriptor.to_string())
    }

    /// Replaces the contents of an entry added earlier.
    pub(crate) fn replace(mut self, name: &str, contents: impl AsRef<[u8]>) -> Self {
        for (entry_name, entry_contents) in &mut self.entries {
            if entry_name == name {
                *entry_contents = contents.as_ref().to_vec();
            }
        }
        self
    }

    pub(crate) fn write_to(&self, path: &Path) -> PathBuf {
        let file = File::create(path).expect("create package");
        let mut writer = ZipWriter::new(file);
        for (name, contents) in &self.entries {
            writer
                .start_file(name.as_str(), SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(contents).expect("write entry");
        }
        writer.finish().expect("finish package");
        path.to_path_buf()
    }
}

/// Reads an entry of a package as text.
pub(crate) fn read_entry(archive: &Path, name: &str) -> Option<String> {
    let mut zip = ZipArchive::new(File::open(archive).expect("open package")).expect("read zip");
    let mut file = zip.by_name(name).ok()?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).expect("read entry");
    Some(contents)
}

/// Lists entry names of a package in archive order.
pub(crate) fn entry_names(archive: &Path) -> Vec<String> {
    let mut zip = ZipArchive::new(File::open(archive).expect("open package")).expect("read zip");
    (0..zip.len())
        .map(|index| {
            zip.by_index_raw(index)
                .expect("read entry")
                .name()
                .to_owned()
        })
        .collect()
}

/// Script compiler that counts how often it runs.
#[derive(Debug, Clone, Default)]
pub(crate) struct CountingCompiler {
    inner: ScriptCompiler,
    calls: Arc<AtomicUsize>,
}

impl CountingCompiler {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SourceCompiler for CountingCompiler {
    fn compile(&self, unit: &CompilationUnit) -> Result<CompiledModule, Diagnostics> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.compile(unit)
    }
}

/// A manager over temporary packages, work and data directories.
pub(crate) struct TestHost {
    dir: TempDir,
    pub(crate) compiler: CountingCompiler,
    pub(crate) manager: PluginManager,
}

impl TestHost {
    pub(crate) fn new() -> Self {
        Self::build(None)
    }

    pub(crate) fn with_observer(observer: Arc<dyn PluginObserver>) -> Self {
        Self::build(Some(observer))
    }

    fn build(observer: Option<Arc<dyn PluginObserver>>) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let compiler = CountingCompiler::default();
        let manager = Self::manager_in(dir.path(), compiler.clone(), observer);
        Self {
            dir,
            compiler,
            manager,
        }
    }

    fn manager_in(
        root: &Path,
        compiler: CountingCompiler,
        observer: Option<Arc<dyn PluginObserver>>,
    ) -> PluginManager {
        let store = PackageStore::new(root.join("packages"), root.join("work"), "plug");
        let mut builder = PluginManager::builder(store, root.join("data")).compiler(compiler);
        if let Some(observer) = observer {
            builder = builder.observer(observer);
        }
        builder.build().expect("manager builds")
    }

    /// A second manager over the same directories, as after a restart.
    pub(crate) fn restart(&self) -> PluginManager {
        Self::manager_in(self.dir.path(), CountingCompiler::default(), None)
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn packages_dir(&self) -> PathBuf {
        self.dir.path().join("packages")
    }

    /// Writes a package into the packages directory.
    pub(crate) fn install(&self, file_name: &str, package: &PackageBuilder) -> PathBuf {
        let directory = self.packages_dir();
        std::fs::create_dir_all(&directory).expect("create packages dir");
        package.write_to(&directory.join(file_name))
    }
}
