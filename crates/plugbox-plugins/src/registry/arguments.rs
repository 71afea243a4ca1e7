//! Argument preparation against declared parameters.

use std::any::Any;

use crate::activator::{ParameterInfo, PluginArgs};
use crate::descriptor::PluginId;
use crate::error::PluginError;

/// Fills declared defaults and rejects missing or mistyped arguments.
///
/// Arguments that no parameter declares are passed through unchanged.
pub(super) fn prepare(
    id: &PluginId,
    key: &str,
    parameters: &[ParameterInfo],
    mut args: PluginArgs,
) -> Result<PluginArgs, PluginError> {
    let invalid = |message: String| PluginError::InvalidArguments {
        plugin: id.to_string(),
        function: key.to_owned(),
        message,
    };

    for parameter in parameters {
        match args.get(&parameter.name) {
            Some(value) if !value.is_null() => {
                if !parameter.kind.accepts(value) {
                    return Err(invalid(format!(
                        "parameter '{}' expects {:?}, got {value}",
                        parameter.name, parameter.kind
                    )));
                }
            }
            _ => match &parameter.default_value {
                Some(default) => {
                    args.insert(parameter.name.clone(), default.clone());
                }
                None if parameter.required => {
                    return Err(invalid(format!(
                        "missing required parameter '{}'",
                        parameter.name
                    )));
                }
                None => {}
            },
        }
    }
    Ok(args)
}

/// Extracts a readable message from a caught panic payload.
pub(super) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("plugin panicked"))
}
