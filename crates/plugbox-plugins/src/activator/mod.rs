//! Turning compiled modules into live plugin instances.
//!
//! Every plugin is driven through [`PluginCapability`]. Script plugins are
//! located once by class name: a zero-parameter function whose name matches
//! the descriptor's `className` (ignoring ASCII case) acts as the
//! constructor, and its return value becomes the instance state bound to
//! `this` for every later call.

mod script;

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compiler::CompiledModule;
use crate::descriptor::PluginId;
use crate::error::PluginError;

pub use self::script::ScriptPlugin;

const ACTIVATOR_TARGET: &str = "plugbox_plugins::activator";

/// Named arguments passed to a plugin function.
pub type PluginArgs = serde_json::Map<String, Value>;

/// Parameter descriptions keyed by function key.
pub type ParameterCatalog = BTreeMap<String, Vec<ParameterInfo>>;

/// Ordered set of function keys and the script functions that serve them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionTable {
    entries: Vec<(String, String)>,
}

impl FunctionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key`, served by `target`. Returns `false` if the key exists.
    #[must_use]
    pub fn insert(&mut self, key: impl Into<String>, target: impl Into<String>) -> bool {
        let owned = key.into();
        if self.contains(&owned) {
            return false;
        }
        self.entries.push((owned, target.into()));
        true
    }

    /// Returns true when `key` is published.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    /// Returns the function serving `key`.
    #[must_use]
    pub fn target(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, target)| target.as_str())
    }

    /// Iterates over the keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Value type a parameter expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// Text.
    String,
    /// Whole number.
    Integer,
    /// Any number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// No constraint.
    #[default]
    Any,
}

impl ParameterType {
    /// Returns true when `value` is acceptable for this type.
    ///
    /// `null` is accepted by every type.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _) | (_, Value::Null) => true,
            (Self::String, Value::String(_)) | (Self::Boolean, Value::Bool(_)) => true,
            (Self::Integer, Value::Number(number)) => number.is_i64() || number.is_u64(),
            (Self::Number, Value::Number(_)) => true,
            _ => false,
        }
    }
}

/// Description of one invocation parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterInfo {
    /// Argument name.
    pub name: String,
    /// Label shown to users.
    pub display_name: String,
    /// Help text.
    pub description: String,
    /// Expected value type.
    #[serde(rename = "type")]
    pub kind: ParameterType,
    /// Value used when the argument is omitted.
    pub default_value: Option<Value>,
    /// Whether the argument must be supplied when no default exists.
    pub required: bool,
}

/// Behaviour every activated plugin provides.
///
/// Script plugins implement this through [`ScriptPlugin`]; hosts may
/// register native implementations directly.
pub trait PluginCapability: Send {
    /// Runs the plugin's registration hook and returns its function table.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Activation`] when the hook is missing, fails or
    /// names unknown functions.
    fn register(&mut self) -> Result<FunctionTable, PluginError>;

    /// Runs the function published as `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvocationFault`] when plugin logic fails.
    fn run(&mut self, key: &str, args: &PluginArgs) -> Result<Value, PluginError>;

    /// Returns parameter descriptions, or `None` when the plugin offers none.
    ///
    /// # Errors
    ///
    /// Returns an error when the description hook fails or is malformed.
    fn describe_parameters(&mut self) -> Result<Option<ParameterCatalog>, PluginError>;
}

/// An activated plugin: its capability plus what it published.
///
/// Calls into the capability are serialised, so one instance never runs two
/// functions at once.
pub struct PluginInstance {
    capability: Mutex<Box<dyn PluginCapability>>,
    functions: FunctionTable,
    parameters: ParameterCatalog,
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("functions", &self.functions)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl PluginInstance {
    /// Registers a capability and harvests its parameter descriptions.
    ///
    /// A failing or malformed description hook is logged and replaced with
    /// an empty catalog.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by [`PluginCapability::register`].
    pub fn activate(
        id: &PluginId,
        mut capability: Box<dyn PluginCapability>,
    ) -> Result<Self, PluginError> {
        let functions = capability.register()?;
        let parameters = match capability.describe_parameters() {
            Ok(Some(catalog)) => catalog,
            Ok(None) => ParameterCatalog::new(),
            Err(error) => {
                tracing::warn!(
                    target: ACTIVATOR_TARGET,
                    plugin = %id,
                    error = %error,
                    "parameter descriptions unavailable; using none"
                );
                ParameterCatalog::new()
            }
        };
        for key in parameters.keys().filter(|key| !functions.contains(key)) {
            tracing::warn!(
                target: ACTIVATOR_TARGET,
                plugin = %id,
                function = %key,
                "parameters described for an unregistered function"
            );
        }
        tracing::debug!(
            target: ACTIVATOR_TARGET,
            plugin = %id,
            functions = functions.len(),
            "plugin activated"
        );
        Ok(Self {
            capability: Mutex::new(capability),
            functions,
            parameters,
        })
    }

    /// Returns the published function table.
    #[must_use]
    pub const fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Returns the parameters described for `key`.
    #[must_use]
    pub fn parameters(&self, key: &str) -> &[ParameterInfo] {
        self.parameters.get(key).map_or(&[], Vec::as_slice)
    }

    /// Runs `key`, waiting for any call already in progress.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by [`PluginCapability::run`].
    pub fn run(&self, key: &str, args: &PluginArgs) -> Result<Value, PluginError> {
        self.capability.lock().run(key, args)
    }
}

/// Constructs the script type `class_name` from `module` and activates it.
///
/// # Errors
///
/// Returns [`PluginError::Activation`] when the type is missing, its
/// constructor fails, or registration fails.
pub fn activate(
    id: &PluginId,
    module: CompiledModule,
    class_name: &str,
) -> Result<PluginInstance, PluginError> {
    let plugin = ScriptPlugin::construct(id, module, class_name)?;
    PluginInstance::activate(id, Box::new(plugin))
}

#[cfg(test)]
mod tests;
