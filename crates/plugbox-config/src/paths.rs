//! Derives the host directories shared by the runtime and its front-ends.
//!
//! Packages, extraction roots and persisted settings live in separate
//! directories so the extraction root can be wiped without touching user
//! data. Every directory is created eagerly so later failures point at the
//! operation that failed rather than at a missing parent.

use std::fs;
use std::path::{Path, PathBuf};

use camino::Utf8Path;
use thiserror::Error;

use crate::Config;

/// Canonical host directories derived from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    packages_dir: PathBuf,
    work_dir: PathBuf,
    data_dir: PathBuf,
}

impl HostPaths {
    /// Derives and creates the host directories from the configuration.
    pub fn from_config(config: &Config) -> Result<Self, PathsError> {
        Ok(Self {
            packages_dir: prepare(&config.packages_dir)?,
            work_dir: prepare(&config.work_dir)?,
            data_dir: prepare(&config.data_dir)?,
        })
    }

    /// Directory scanned for plugin packages.
    pub fn packages_dir(&self) -> &Path {
        self.packages_dir.as_path()
    }

    /// Root of the per-plugin extraction directories.
    pub fn work_dir(&self) -> &Path {
        self.work_dir.as_path()
    }

    /// Directory holding persisted settings.
    pub fn data_dir(&self) -> &Path {
        self.data_dir.as_path()
    }
}

fn prepare(path: &Utf8Path) -> Result<PathBuf, PathsError> {
    if path.as_str().is_empty() {
        return Err(PathsError::EmptyPath);
    }
    let directory = path.as_std_path().to_path_buf();
    fs::create_dir_all(&directory).map_err(|source| PathsError::CreateDirectory {
        path: directory.clone(),
        source,
    })?;
    Ok(directory)
}

/// Errors raised while deriving host directories.
#[derive(Debug, Error)]
pub enum PathsError {
    /// A configured directory was empty.
    #[error("configured directory path must not be empty")]
    EmptyPath,
    /// Creating a directory failed.
    #[error("failed to prepare directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
