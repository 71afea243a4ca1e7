//! Unit tests for the package store.

use std::fs;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::tests::support::{PackageBuilder, entry_names, read_entry};

struct Workspace {
    _temp: TempDir,
    store: PackageStore,
    packages: PathBuf,
    work: PathBuf,
}

#[fixture]
fn workspace() -> Workspace {
    let temp = TempDir::new().expect("temp dir");
    let packages = temp.path().join("packages");
    let work = temp.path().join("work");
    fs::create_dir_all(&packages).expect("packages dir");
    Workspace {
        store: PackageStore::new(&packages, &work, "plug"),
        _temp: temp,
        packages,
        work,
    }
}

fn id(value: &str) -> PluginId {
    PluginId::new(value).expect("valid id")
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[rstest]
#[case("plugin.json", EntryKind::Descriptor)]
#[case("meta/MyPlugin.JSON", EntryKind::Descriptor)]
#[case("plugin_icons.json", EntryKind::Icons)]
#[case("icons.json", EntryKind::Icons)]
#[case("plugin-style.json", EntryKind::Style)]
#[case("Demo.rhai", EntryKind::Source)]
#[case("lib/helpers.RHAI", EntryKind::Source)]
#[case("plugin.txt", EntryKind::Other)]
#[case("readme.json", EntryKind::Other)]
#[case("images/plugin.png", EntryKind::Other)]
fn classifies_entries(#[case] name: &str, #[case] expected: EntryKind) {
    assert_eq!(EntryKind::classify(name), expected);
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[rstest]
fn discover_filters_by_extension(workspace: Workspace) {
    PackageBuilder::demo("b").write_to(&workspace.packages.join("b.plug"));
    PackageBuilder::demo("a").write_to(&workspace.packages.join("a.PLUG"));
    fs::write(workspace.packages.join("notes.txt"), "ignored").expect("write");
    fs::create_dir(workspace.packages.join("dir.plug")).expect("mkdir");

    let archives = workspace.store.discover().expect("discover");
    let names: Vec<_> = archives
        .iter()
        .filter_map(|path| path.file_name()?.to_str())
        .collect();
    assert_eq!(names, vec!["a.PLUG", "b.plug"]);
}

#[test]
fn discover_creates_missing_directory() {
    let temp = TempDir::new().expect("temp dir");
    let packages = temp.path().join("missing");
    let store = PackageStore::new(&packages, temp.path().join("work"), ".plug");

    let archives = store.discover().expect("discover");
    assert!(archives.is_empty());
    assert!(packages.is_dir());
}

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

#[rstest]
fn open_reads_documents_and_sources(workspace: Workspace) {
    let path = PackageBuilder::demo("demo")
        .entry("icons.json", r#"{ "main": "main.png" }"#)
        .entry("style.json", r#"{ "width": 10 }"#)
        .entry("second-plugin.json", "{}")
        .entry("lib/helpers.rhai", "fn shout(x) { x }")
        .write_to(&workspace.packages.join("demo.plug"));

    let archive = workspace.store.open(&path).expect("open");
    let descriptor = archive.descriptor().expect("descriptor entry");
    assert_eq!(descriptor.name(), "plugin.json");
    assert!(descriptor.contents().contains("\"className\":\"Demo\""));
    assert_eq!(archive.icons().map(PackageEntry::name), Some("icons.json"));
    assert_eq!(archive.style().map(PackageEntry::name), Some("style.json"));
    assert_eq!(archive.sources(), ["Demo.rhai", "lib/helpers.rhai"]);
    assert_eq!(archive.path(), path.as_path());
}

#[rstest]
fn open_tolerates_missing_descriptor(workspace: Workspace) {
    let path = PackageBuilder::new()
        .entry("Demo.rhai", "fn Demo() {}")
        .write_to(&workspace.packages.join("bare.plug"));

    let archive = workspace.store.open(&path).expect("open");
    assert!(archive.descriptor().is_none());
    assert!(archive.icons().is_none());
    assert!(archive.style().is_none());
}

#[rstest]
fn open_rejects_corrupt_archive(workspace: Workspace) {
    let path = workspace.packages.join("corrupt.plug");
    fs::write(&path, b"definitely not a zip").expect("write");

    let error = workspace.store.open(&path).expect_err("corrupt archive");
    assert!(matches!(error, PluginError::Package { .. }));
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[rstest]
fn extract_recreates_working_directory(workspace: Workspace) {
    let path = PackageBuilder::demo("demo").write_to(&workspace.packages.join("demo.plug"));
    let plugin = id("demo");

    let first = workspace.store.extract(&path, &plugin).expect("extract");
    assert_eq!(first, workspace.work.join("demo"));
    fs::write(first.join("stale.txt"), "left over").expect("write stale");

    let second = workspace.store.extract(&path, &plugin).expect("re-extract");
    assert_eq!(first, second);
    assert!(second.join("Demo.rhai").is_file());
    assert!(second.join("plugin.json").is_file());
    assert!(!second.join("stale.txt").exists());
}

#[rstest]
fn extract_rejects_escaping_entries(workspace: Workspace) {
    let path = PackageBuilder::new()
        .entry("../escape.txt", "outside")
        .write_to(&workspace.packages.join("evil.plug"));

    let result = workspace.store.extract(&path, &id("evil"));
    assert!(result.is_err(), "escaping entry must be refused");
    assert!(!workspace.work.join("escape.txt").exists());
}

// ---------------------------------------------------------------------------
// Write-back, import and removal
// ---------------------------------------------------------------------------

#[rstest]
fn rewrite_entry_replaces_in_place(workspace: Workspace) {
    let path = PackageBuilder::demo("demo")
        .entry("style.json", "{}")
        .write_to(&workspace.packages.join("demo.plug"));

    workspace
        .store
        .rewrite_entry(&path, "plugin.json", br#"{"id":"demo","className":"Demo"}"#)
        .expect("rewrite");

    assert_eq!(
        entry_names(&path),
        vec!["plugin.json", "Demo.rhai", "style.json"]
    );
    assert_eq!(
        read_entry(&path, "plugin.json").as_deref(),
        Some(r#"{"id":"demo","className":"Demo"}"#)
    );
    assert!(
        read_entry(&path, "Demo.rhai")
            .expect("source survives")
            .contains("fn register()")
    );
}

#[rstest]
fn rewrite_entry_appends_missing_entry(workspace: Workspace) {
    let path = PackageBuilder::demo("demo").write_to(&workspace.packages.join("demo.plug"));

    workspace
        .store
        .rewrite_entry(&path, "style.json", br#"{"topmost":true}"#)
        .expect("rewrite");

    assert_eq!(
        entry_names(&path),
        vec!["plugin.json", "Demo.rhai", "style.json"]
    );
    let archive = workspace.store.open(&path).expect("reopen");
    assert_eq!(
        archive.style().map(PackageEntry::contents),
        Some(r#"{"topmost":true}"#)
    );
}

#[rstest]
fn import_copies_into_packages_dir(workspace: Workspace) {
    let outside = TempDir::new().expect("temp dir");
    let source = PackageBuilder::demo("demo").write_to(&outside.path().join("demo.plug"));

    let imported = workspace.store.import(&source).expect("import");
    assert_eq!(imported, workspace.packages.join("demo.plug"));
    assert!(imported.is_file());
}

#[rstest]
fn import_rejects_other_extensions(workspace: Workspace) {
    let outside = TempDir::new().expect("temp dir");
    let source = PackageBuilder::demo("demo").write_to(&outside.path().join("demo.zip"));

    let error = workspace.store.import(&source).expect_err("wrong extension");
    assert!(matches!(error, PluginError::Package { .. }));
}

#[rstest]
fn remove_deletes_archive_and_working_directory(workspace: Workspace) {
    let path = PackageBuilder::demo("demo").write_to(&workspace.packages.join("demo.plug"));
    let plugin = id("demo");
    let directory = workspace.store.extract(&path, &plugin).expect("extract");

    workspace.store.remove(&path, &plugin).expect("remove");
    assert!(!path.exists());
    assert!(!directory.exists());

    workspace
        .store
        .remove(&path, &plugin)
        .expect("removing twice is harmless");
}
