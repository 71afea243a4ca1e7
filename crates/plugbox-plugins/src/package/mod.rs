//! Package archive discovery, extraction and write-back.
//!
//! Packages are zip archives with a configurable extension. Each one is
//! unpacked into `<work_root>/<plugin id>`, which is wiped and recreated on
//! every extraction so files from a previous version never survive a
//! re-import. JSON documents are written back into the archive through a
//! sibling temporary file that atomically replaces the original.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

use crate::descriptor::{PluginId, SOURCE_EXTENSION};
use crate::error::PluginError;

const PACKAGE_TARGET: &str = "plugbox_plugins::package";

/// A JSON document read from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    name: String,
    contents: String,
}

impl PackageEntry {
    /// Returns the archive entry name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the document text.
    #[must_use]
    pub fn contents(&self) -> &str {
        self.contents.as_str()
    }
}

/// Role of an archive entry, decided by its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Plugin descriptor document.
    Descriptor,
    /// Icon map document.
    Icons,
    /// Style document.
    Style,
    /// Script source.
    Source,
    /// Anything else (images, data files).
    Other,
}

impl EntryKind {
    /// Classifies an entry by the final component of its name.
    ///
    /// JSON names containing `icon` are icon maps, otherwise `style` marks a
    /// style sheet, otherwise `plugin` marks the descriptor. Matching ignores
    /// ASCII case.
    #[must_use]
    pub fn classify(entry_name: &str) -> Self {
        let file_name = entry_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(entry_name)
            .to_ascii_lowercase();
        if let Some(stem) = file_name.strip_suffix(".json") {
            if stem.contains("icon") {
                Self::Icons
            } else if stem.contains("style") {
                Self::Style
            } else if stem.contains("plugin") {
                Self::Descriptor
            } else {
                Self::Other
            }
        } else if file_name
            .rsplit_once('.')
            .is_some_and(|(_, extension)| extension == SOURCE_EXTENSION)
        {
            Self::Source
        } else {
            Self::Other
        }
    }
}

/// Table of contents of one package archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArchive {
    path: PathBuf,
    descriptor: Option<PackageEntry>,
    icons: Option<PackageEntry>,
    style: Option<PackageEntry>,
    sources: Vec<String>,
}

impl PackageArchive {
    /// Returns the archive path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the plugin descriptor document, if present.
    #[must_use]
    pub const fn descriptor(&self) -> Option<&PackageEntry> {
        self.descriptor.as_ref()
    }

    /// Returns the icon map document, if present.
    #[must_use]
    pub const fn icons(&self) -> Option<&PackageEntry> {
        self.icons.as_ref()
    }

    /// Returns the style document, if present.
    #[must_use]
    pub const fn style(&self) -> Option<&PackageEntry> {
        self.style.as_ref()
    }

    /// Returns the names of the script entries in archive order.
    #[must_use]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

/// Reads packages from one directory and extracts them below a work root.
#[derive(Debug, Clone)]
pub struct PackageStore {
    packages_dir: PathBuf,
    work_root: PathBuf,
    extension: String,
}

impl PackageStore {
    /// Creates a store over `packages_dir`, extracting below `work_root`.
    ///
    /// `extension` is compared without its leading dot and ignoring case.
    #[must_use]
    pub fn new(
        packages_dir: impl Into<PathBuf>,
        work_root: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            packages_dir: packages_dir.into(),
            work_root: work_root.into(),
            extension: extension.into().trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    /// Returns the directory scanned for packages.
    #[must_use]
    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }

    /// Returns the working directory used for `id`.
    #[must_use]
    pub fn working_dir(&self, id: &PluginId) -> PathBuf {
        self.work_root.join(id.as_str())
    }

    /// Lists the package archives in the packages directory, sorted by path.
    ///
    /// A missing directory is created and yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Io`] when the directory cannot be created or
    /// read.
    pub fn discover(&self) -> Result<Vec<PathBuf>, PluginError> {
        fs::create_dir_all(&self.packages_dir)
            .map_err(|error| PluginError::io(&self.packages_dir, error))?;
        let entries = fs::read_dir(&self.packages_dir)
            .map_err(|error| PluginError::io(&self.packages_dir, error))?;

        let mut archives = Vec::new();
        for listed in entries {
            let path = listed
                .map_err(|error| PluginError::io(&self.packages_dir, error))?
                .path();
            if path.is_file() && self.has_package_extension(&path) {
                archives.push(path);
            }
        }
        archives.sort();
        tracing::debug!(
            target: PACKAGE_TARGET,
            directory = %self.packages_dir.display(),
            count = archives.len(),
            "discovered package archives"
        );
        Ok(archives)
    }

    fn has_package_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case(&self.extension))
    }

    /// Reads the entry table of an archive and its JSON documents.
    ///
    /// When several entries share a role, the first in archive order wins.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Package`] when the archive is unreadable or a
    /// JSON document is not UTF-8.
    pub fn open(&self, archive_path: &Path) -> Result<PackageArchive, PluginError> {
        let mut archive = open_zip(archive_path)?;
        let mut package = PackageArchive {
            path: archive_path.to_path_buf(),
            descriptor: None,
            icons: None,
            style: None,
            sources: Vec::new(),
        };

        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|error| package_error(archive_path, &error))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_owned();
            let slot = match EntryKind::classify(&name) {
                EntryKind::Descriptor => &mut package.descriptor,
                EntryKind::Icons => &mut package.icons,
                EntryKind::Style => &mut package.style,
                EntryKind::Source => {
                    package.sources.push(name);
                    continue;
                }
                EntryKind::Other => continue,
            };
            if slot.is_some() {
                continue;
            }
            let mut contents = String::new();
            file.read_to_string(&mut contents)
                .map_err(|error| PluginError::Package {
                    archive: archive_path.to_path_buf(),
                    message: format!("entry '{name}' is not readable text: {error}"),
                })?;
            *slot = Some(PackageEntry { name, contents });
        }

        Ok(package)
    }

    /// Unpacks an archive into the working directory for `id`.
    ///
    /// Any previous working directory for the same id is deleted first.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Io`] when the directory cannot be replaced or
    /// written, and [`PluginError::Package`] when the archive is corrupt or
    /// holds entries that would escape the directory.
    pub fn extract(&self, archive_path: &Path, id: &PluginId) -> Result<PathBuf, PluginError> {
        let target = self.working_dir(id);
        remove_dir_if_present(&target)?;
        fs::create_dir_all(&target).map_err(|error| PluginError::io(&target, error))?;

        let mut archive = open_zip(archive_path)?;
        archive.extract(&target).map_err(|error| match error {
            ZipError::Io(source) => PluginError::io(&target, source),
            other => package_error(archive_path, &other),
        })?;

        tracing::debug!(
            target: PACKAGE_TARGET,
            archive = %archive_path.display(),
            directory = %target.display(),
            "extracted package"
        );
        Ok(target)
    }

    /// Replaces (or appends) one entry of an archive.
    ///
    /// Every other entry is copied without recompression into a sibling
    /// temporary file, which then atomically replaces the archive.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Package`] when the archive cannot be read or
    /// rewritten and [`PluginError::Io`] when the replacement cannot be
    /// persisted.
    pub fn rewrite_entry(
        &self,
        archive_path: &Path,
        entry_name: &str,
        contents: &[u8],
    ) -> Result<(), PluginError> {
        let parent = archive_path.parent().unwrap_or_else(|| Path::new("."));
        let temporary =
            NamedTempFile::new_in(parent).map_err(|error| PluginError::io(parent, error))?;

        let rewritten = {
            let mut source = open_zip(archive_path)?;
            let mut writer = ZipWriter::new(temporary);
            let mut replaced = false;

            for index in 0..source.len() {
                let file = source
                    .by_index_raw(index)
                    .map_err(|error| package_error(archive_path, &error))?;
                if file.name() == entry_name {
                    drop(file);
                    write_entry(&mut writer, entry_name, contents)
                        .map_err(|error| package_error(archive_path, &error))?;
                    replaced = true;
                } else {
                    writer
                        .raw_copy_file(file)
                        .map_err(|error| package_error(archive_path, &error))?;
                }
            }
            if !replaced {
                write_entry(&mut writer, entry_name, contents)
                    .map_err(|error| package_error(archive_path, &error))?;
            }
            writer
                .finish()
                .map_err(|error| package_error(archive_path, &error))?
        };

        rewritten
            .persist(archive_path)
            .map_err(|error| PluginError::io(archive_path, error.error))?;
        tracing::debug!(
            target: PACKAGE_TARGET,
            archive = %archive_path.display(),
            entry = entry_name,
            "rewrote archive entry"
        );
        Ok(())
    }

    /// Copies an external archive into the packages directory.
    ///
    /// An existing package with the same file name is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Package`] when the file does not carry the
    /// package extension and [`PluginError::Io`] when copying fails.
    pub fn import(&self, source: &Path) -> Result<PathBuf, PluginError> {
        let file_name = source
            .file_name()
            .filter(|_| self.has_package_extension(source))
            .ok_or_else(|| PluginError::Package {
                archive: source.to_path_buf(),
                message: format!("expected a '.{}' package", self.extension),
            })?;
        fs::create_dir_all(&self.packages_dir)
            .map_err(|error| PluginError::io(&self.packages_dir, error))?;
        let destination = self.packages_dir.join(file_name);
        fs::copy(source, &destination).map_err(|error| PluginError::io(source, error))?;
        Ok(destination)
    }

    /// Deletes an archive and the working directory of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Io`] when either cannot be removed.
    pub fn remove(&self, archive_path: &Path, id: &PluginId) -> Result<(), PluginError> {
        match fs::remove_file(archive_path) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(PluginError::io(archive_path, error)),
        }
        remove_dir_if_present(&self.working_dir(id))
    }
}

fn open_zip(archive_path: &Path) -> Result<ZipArchive<File>, PluginError> {
    let file = File::open(archive_path).map_err(|error| PluginError::Package {
        archive: archive_path.to_path_buf(),
        message: error.to_string(),
    })?;
    ZipArchive::new(file).map_err(|error| package_error(archive_path, &error))
}

fn write_entry<W: Write + io::Seek>(
    writer: &mut ZipWriter<W>,
    name: &str,
    contents: &[u8],
) -> Result<(), ZipError> {
    writer.start_file(name, SimpleFileOptions::default())?;
    writer.write_all(contents)?;
    Ok(())
}

fn remove_dir_if_present(path: &Path) -> Result<(), PluginError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(PluginError::io(path, error)),
    }
}

fn package_error(archive_path: &Path, error: &ZipError) -> PluginError {
    PluginError::Package {
        archive: archive_path.to_path_buf(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests;
