//! Collecting plugin sources from an extracted working directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::compiler::{CompilationUnit, LibrarySource};
use crate::descriptor::{PluginDescriptor, SOURCE_EXTENSION};
use crate::error::PluginError;

/// Builds the compilation unit for `descriptor` from its working directory.
///
/// The primary source is the root-level file named after the class (matched
/// ignoring ASCII case). Every other source file anywhere in the tree is a
/// library importable by its file stem.
pub(super) fn read_unit(
    descriptor: &PluginDescriptor,
    archive: &Path,
    working_dir: &Path,
) -> Result<CompilationUnit, PluginError> {
    let mut files = Vec::new();
    collect(working_dir, working_dir, &mut files)?;
    files.sort();

    let expected = descriptor.source_file_name();
    let primary = files
        .iter()
        .position(|(relative, _)| relative.eq_ignore_ascii_case(&expected))
        .ok_or_else(|| PluginError::Package {
            archive: archive.to_path_buf(),
            message: format!("source file '{expected}' is missing"),
        })?;
    let (primary_name, primary_path) = files.remove(primary);
    let unit = CompilationUnit::new(primary_name, read(&primary_path)?);

    let libraries = files
        .into_iter()
        .map(|(relative, path)| {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_owned();
            read(&path).map(|source| LibrarySource::new(name, relative, source))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(unit.with_libraries(libraries))
}

fn collect(
    root: &Path,
    directory: &Path,
    files: &mut Vec<(String, PathBuf)>,
) -> Result<(), PluginError> {
    let entries = fs::read_dir(directory).map_err(|error| PluginError::io(directory, error))?;
    for entry in entries {
        let path = entry
            .map_err(|error| PluginError::io(directory, error))?
            .path();
        if path.is_dir() {
            collect(root, &path, files)?;
            continue;
        }
        let is_source = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case(SOURCE_EXTENSION));
        if !is_source {
            continue;
        }
        if let Ok(suffix) = path.strip_prefix(root) {
            let relative = suffix
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push((relative, path));
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, PluginError> {
    fs::read_to_string(path).map_err(|error| PluginError::io(path, error))
}
