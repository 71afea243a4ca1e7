//! Executes parsed CLI commands against a plugin manager.
//!
//! Every command writes one JSON document per line to stdout.

use std::io::Write;

use plugbox_plugins::{ParameterInfo, PluginArgs, PluginId, PluginManager};
use serde::Serialize;
use serde_json::json;

use crate::AppError;
use crate::cli::PluginCommand;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionListing {
    key: String,
    parameters: Vec<ParameterInfo>,
}

pub(crate) fn execute<W>(
    command: PluginCommand,
    manager: &PluginManager,
    stdout: &mut W,
) -> Result<(), AppError>
where
    W: Write,
{
    match command {
        PluginCommand::List => {
            for plugin in manager.descriptors() {
                let loaded = manager.is_code_loaded(plugin.id())?;
                emit(stdout, &json!({ "plugin": plugin, "codeLoaded": loaded }))?;
            }
            Ok(())
        }
        PluginCommand::Functions { id } => {
            let plugin = PluginId::new(id)?;
            manager.load_code(&plugin)?;
            for key in manager.list_function_keys(&plugin)? {
                let parameters = manager.parameters(&plugin, &key)?;
                emit(stdout, &FunctionListing { key, parameters })?;
            }
            Ok(())
        }
        PluginCommand::Invoke { id, key, arguments } => {
            let plugin = PluginId::new(id)?;
            let args: PluginArgs = arguments.into_iter().collect();
            let result = manager.invoke(&plugin, &key, args)?;
            emit(stdout, &result)
        }
        PluginCommand::Enable { id } => set_enabled(manager, id, true, stdout),
        PluginCommand::Disable { id } => set_enabled(manager, id, false, stdout),
        PluginCommand::Import { archive } => {
            let imported = manager.import_package(&archive)?;
            let id = imported.as_ref().map(PluginId::as_str);
            emit(stdout, &json!({ "imported": id }))
        }
    }
}

fn set_enabled<W: Write>(
    manager: &PluginManager,
    id: String,
    enabled: bool,
    stdout: &mut W,
) -> Result<(), AppError> {
    let plugin = PluginId::new(id)?;
    manager.set_enabled(&plugin, enabled)?;
    emit(stdout, &json!({ "id": plugin.as_str(), "enabled": enabled }))
}

fn emit<W: Write, T: Serialize + ?Sized>(stdout: &mut W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer(&mut *stdout, value).map_err(AppError::Serialise)?;
    stdout.write_all(b"\n").map_err(AppError::Emit)?;
    stdout.flush().map_err(AppError::Emit)
}

