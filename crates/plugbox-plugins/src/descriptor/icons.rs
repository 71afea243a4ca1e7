//! Icon map documents.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// Mapping from logical icon name to a path inside the extracted package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconDescriptor {
    entries: BTreeMap<String, String>,
}

/// Parses an icon map document.
///
/// # Errors
///
/// Returns [`PluginError::Descriptor`] when the document is not a JSON
/// object of strings.
pub fn parse_icons(json: &str) -> Result<IconDescriptor, PluginError> {
    serde_json::from_str(json).map_err(|error| PluginError::Descriptor {
        origin: String::from("icon map"),
        message: error.to_string(),
    })
}

impl IconDescriptor {
    /// Returns the package-relative path registered for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Iterates over the icon names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of icons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no icons are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves `name` below `root`, refusing paths that leave it.
    #[must_use]
    pub fn resolve(&self, name: &str, root: &Path) -> Option<PathBuf> {
        let relative = Path::new(self.get(name)?);
        let mut resolved = root.to_path_buf();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(resolved)
    }
}
