//! Descriptor documents carried inside a plugin package.
//!
//! A package holds up to three independent JSON documents: the plugin
//! descriptor (identity and code location), an icon map and a style sheet.
//! Only the plugin descriptor is mandatory. Parsing is strict about the
//! descriptor's invariants so that a package that loads here can always be
//! activated by class name later.

mod color;
mod icons;
mod style;

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PluginError;

pub use self::color::{Argb, ColorParseError};
pub use self::icons::{IconDescriptor, parse_icons};
pub use self::style::{StyleDescriptor, parse_style};

/// File extension of plugin sources.
pub const SOURCE_EXTENSION: &str = "rhai";

const DESCRIPTOR_ORIGIN: &str = "plugin descriptor";

/// Stable identifier of a plugin.
///
/// The identifier keys the plugin's working directory and settings file, so
/// it is restricted to a single safe path component.
///
/// # Example
///
/// ```
/// use plugbox_plugins::PluginId;
///
/// let id = PluginId::new("weather-card").expect("valid id");
/// assert_eq!(id.as_str(), "weather-card");
/// assert!(PluginId::new("../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginId(String);

impl PluginId {
    /// Validates and wraps an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Descriptor`] when the value is empty, is `.` or
    /// `..`, or contains characters outside ASCII alphanumerics, `-`, `_`
    /// and `.`.
    pub fn new(value: impl Into<String>) -> Result<Self, PluginError> {
        let candidate = value.into();
        if is_safe_component(&candidate) {
            Ok(Self(candidate))
        } else {
            Err(descriptor_error(format!(
                "id '{candidate}' is not a safe path component"
            )))
        }
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PluginId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for PluginId {
    type Error = PluginError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PluginId> for String {
    fn from(id: PluginId) -> Self {
        id.0
    }
}

fn is_safe_component(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Presentation surface a plugin asks the host for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleKind {
    /// Compact card.
    #[default]
    CardView,
    /// Expanded card with detail content.
    DetailedView,
    /// Free-floating window.
    FloatingWindow,
}

/// Whether a descriptor's identifier was declared or generated while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdOrigin {
    /// The document carried a valid identifier.
    Declared,
    /// The identifier was absent or blank and has been generated; the
    /// descriptor must be persisted to keep it stable.
    Generated,
}

/// Identity and code location of one plugin.
///
/// # Example
///
/// ```
/// use plugbox_plugins::descriptor::{IdOrigin, parse_descriptor};
///
/// let json = r#"{ "id": "demo", "name": "Demo", "className": "Demo" }"#;
/// let (descriptor, origin) = parse_descriptor(json).expect("valid descriptor");
/// assert_eq!(origin, IdOrigin::Declared);
/// assert_eq!(descriptor.code_file_path(), "./Demo.rhai");
/// assert!(descriptor.is_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    id: PluginId,
    key: String,
    name: String,
    class_name: String,
    version: String,
    description: String,
    author: String,
    style_kind: StyleKind,
    is_enabled: bool,
    code_file_path: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDescriptor {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    name: Option<String>,
    class_name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    style_kind: StyleKind,
    #[serde(default = "enabled_by_default")]
    is_enabled: bool,
    #[serde(default)]
    code_file_path: Option<String>,
}

const fn enabled_by_default() -> bool {
    true
}

/// Parses a plugin descriptor document.
///
/// A blank or missing `id` is replaced with a generated one and reported as
/// [`IdOrigin::Generated`]. A missing `key` or `codeFilePath` is derived
/// from the class name. A declared `key` must equal the class name ignoring
/// ASCII case, and a declared `codeFilePath` must name `{className}.rhai`.
///
/// # Errors
///
/// Returns [`PluginError::Descriptor`] when the JSON is malformed, the class
/// name is not an identifier, the id is unsafe, or the key or code path does
/// not match the class name.
pub fn parse_descriptor(json: &str) -> Result<(PluginDescriptor, IdOrigin), PluginError> {
    let raw: RawDescriptor =
        serde_json::from_str(json).map_err(|error| descriptor_error(error.to_string()))?;

    let class_name = raw.class_name.trim().to_owned();
    if !is_identifier(&class_name) {
        return Err(descriptor_error(format!(
            "className '{class_name}' is not an identifier"
        )));
    }

    let (id, origin) = match raw.id.as_deref().map(str::trim) {
        Some(declared) if !declared.is_empty() => (PluginId::new(declared)?, IdOrigin::Declared),
        _ => (PluginId::generate(), IdOrigin::Generated),
    };

    let expected_path = code_file_path_for(&class_name);
    let code_file_path = match raw.code_file_path {
        None => expected_path,
        Some(declared) if declared.trim().is_empty() => expected_path,
        Some(declared) => {
            if !same_code_path(&declared, &expected_path) {
                return Err(descriptor_error(format!(
                    "codeFilePath '{declared}' does not match className '{class_name}'"
                )));
            }
            expected_path
        }
    };

    let key = non_blank_or(raw.key, &class_name);
    if !key.eq_ignore_ascii_case(&class_name) {
        return Err(descriptor_error(format!(
            "key '{key}' does not name className '{class_name}'"
        )));
    }
    let name = non_blank_or(raw.name, &class_name);

    Ok((
        PluginDescriptor {
            id,
            key,
            name,
            class_name,
            version: raw.version,
            description: raw.description,
            author: raw.author,
            style_kind: raw.style_kind,
            is_enabled: raw.is_enabled,
            code_file_path,
        },
        origin,
    ))
}

fn non_blank_or(value: Option<String>, fallback: &str) -> String {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| fallback.to_owned())
}

fn code_file_path_for(class_name: &str) -> String {
    format!("./{class_name}.{SOURCE_EXTENSION}")
}

fn same_code_path(declared: &str, expected: &str) -> bool {
    let normalise = |path: &str| {
        let trimmed = path.trim().replace('\\', "/");
        trimmed
            .strip_prefix("./")
            .map_or_else(|| trimmed.clone(), str::to_owned)
    };
    normalise(declared).eq_ignore_ascii_case(&normalise(expected))
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn descriptor_error(message: String) -> PluginError {
    PluginError::Descriptor {
        origin: DESCRIPTOR_ORIGIN.to_owned(),
        message,
    }
}

impl PluginDescriptor {
    /// Returns the stable identifier.
    #[must_use]
    pub const fn id(&self) -> &PluginId {
        &self.id
    }

    /// Returns the plugin key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the script type the activator constructs.
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.class_name.as_str()
    }

    /// Returns the declared version.
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Returns the free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the author.
    #[must_use]
    pub fn author(&self) -> &str {
        self.author.as_str()
    }

    /// Returns the requested presentation surface.
    #[must_use]
    pub const fn style_kind(&self) -> StyleKind {
        self.style_kind
    }

    /// Returns true when the plugin accepts invocations.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Returns the archive-relative path of the primary source.
    #[must_use]
    pub fn code_file_path(&self) -> &str {
        self.code_file_path.as_str()
    }

    /// Returns the primary source file name relative to the package root.
    #[must_use]
    pub fn source_file_name(&self) -> String {
        format!("{}.{SOURCE_EXTENSION}", self.class_name)
    }

    /// Returns a copy with the enabled flag replaced.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = enabled;
        self
    }

    pub(crate) fn with_id(mut self, id: PluginId) -> Self {
        self.id = id;
        self
    }

    /// Renders the descriptor as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Persistence`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, PluginError> {
        serde_json::to_string_pretty(self).map_err(|error| PluginError::Persistence {
            plugin: self.id.to_string(),
            message: error.to_string(),
        })
    }
}
