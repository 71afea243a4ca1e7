//! [`PluginCapability`] implementation backed by a compiled Rhai script.

use rhai::{AST, Array, CallFnOptions, Dynamic, Engine, EvalAltResult, Map, Scope};
use serde_json::Value;

use super::{FunctionTable, ParameterCatalog, PluginArgs, PluginCapability};
use crate::compiler::CompiledModule;
use crate::descriptor::PluginId;
use crate::error::PluginError;

const REGISTER_HOOK: &str = "register";
const DESCRIBE_HOOK: &str = "describe_parameters";

/// A constructed script plugin.
///
/// `state` is the value returned by the constructor and is bound to `this`
/// for the registration hook and every function call.
///
/// Every call first evaluates the script's top-level statements, which is
/// what binds `import` aliases for function bodies. Top-level code should
/// therefore be limited to imports and constants; it runs again on each
/// call and counts against that call's operation budget.
pub struct ScriptPlugin {
    id: PluginId,
    engine: Engine,
    ast: AST,
    state: Dynamic,
    functions: FunctionTable,
}

impl std::fmt::Debug for ScriptPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptPlugin")
            .field("id", &self.id)
            .field("functions", &self.functions)
            .finish_non_exhaustive()
    }
}

impl ScriptPlugin {
    /// Finds the constructor for `class_name` and runs it.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Activation`] when no zero-parameter function
    /// named after the class exists or the constructor fails.
    pub fn construct(
        id: &PluginId,
        module: CompiledModule,
        class_name: &str,
    ) -> Result<Self, PluginError> {
        let (engine, ast) = module.into_parts();
        let constructor = ast
            .iter_functions()
            .find(|function| {
                function.params.is_empty() && function.name.eq_ignore_ascii_case(class_name)
            })
            .map(|function| function.name.to_owned())
            .ok_or_else(|| {
                activation_error(id, format!("type '{class_name}' is not defined by the source"))
            })?;

        let constructed: Dynamic = engine
            .call_fn_with_options(call_options(), &mut Scope::new(), &ast, &constructor, ())
            .map_err(|error| {
                activation_error(id, format!("constructor '{constructor}' failed: {error}"))
            })?;
        let state = if constructed.is_unit() {
            Dynamic::from_map(Map::new())
        } else {
            constructed
        };

        Ok(Self {
            id: id.clone(),
            engine,
            ast,
            state,
            functions: FunctionTable::new(),
        })
    }

    fn has_function(&self, name: &str, arity: usize) -> bool {
        self.ast
            .iter_functions()
            .any(|function| function.name == name && function.params.len() == arity)
    }

    fn call_bound(
        &mut self,
        name: &str,
        args: impl rhai::FuncArgs,
    ) -> Result<Dynamic, Box<EvalAltResult>> {
        let options = call_options().bind_this_ptr(&mut self.state);
        self.engine
            .call_fn_with_options(options, &mut Scope::new(), &self.ast, name, args)
    }

    fn bind(
        &self,
        table: &mut FunctionTable,
        key: String,
        target: String,
    ) -> Result<(), PluginError> {
        if !self.has_function(&target, 1) {
            return Err(activation_error(
                &self.id,
                format!("key '{key}' names '{target}', which is not a one-parameter function"),
            ));
        }
        if !table.insert(key.as_str(), target) {
            return Err(activation_error(
                &self.id,
                format!("key '{key}' is registered more than once"),
            ));
        }
        Ok(())
    }
}

impl PluginCapability for ScriptPlugin {
    fn register(&mut self) -> Result<FunctionTable, PluginError> {
        if !self.has_function(REGISTER_HOOK, 0) {
            return Err(activation_error(&self.id, "missing register() hook"));
        }
        let returned = self
            .call_bound(REGISTER_HOOK, ())
            .map_err(|error| activation_error(&self.id, format!("register() failed: {error}")))?;

        let type_name = returned.type_name();
        let pairs: Vec<(String, String)> = if let Some(keys) = returned.clone().try_cast::<Array>()
        {
            keys.into_iter()
                .map(|key| text(&self.id, key).map(|key| (key.clone(), key)))
                .collect::<Result<_, _>>()?
        } else if let Some(entries) = returned.try_cast::<Map>() {
            entries
                .into_iter()
                .map(|(key, target)| {
                    text(&self.id, target).map(|target| (key.to_string(), target))
                })
                .collect::<Result<_, _>>()?
        } else {
            return Err(activation_error(
                &self.id,
                format!("register() must return an array or a map, not {type_name}"),
            ));
        };

        let mut table = FunctionTable::new();
        for (key, target) in pairs {
            self.bind(&mut table, key, target)?;
        }

        self.functions = table.clone();
        Ok(table)
    }

    fn run(&mut self, key: &str, args: &PluginArgs) -> Result<Value, PluginError> {
        let plugin = self.id.to_string();
        let fault = |message: String| PluginError::InvocationFault {
            plugin: plugin.clone(),
            function: key.to_owned(),
            message,
        };
        let Some(target) = self.functions.target(key).map(str::to_owned) else {
            return Err(fault(String::from("function is not registered")));
        };
        let argument = rhai::serde::to_dynamic(args).map_err(|error| fault(error.to_string()))?;

        let result = self
            .call_bound(&target, (argument,))
            .map_err(|error| fault(describe_fault(&error)))?;
        rhai::serde::from_dynamic::<Value>(&result)
            .map_err(|error| fault(format!("result is not representable: {error}")))
    }

    fn describe_parameters(&mut self) -> Result<Option<ParameterCatalog>, PluginError> {
        if !self.has_function(DESCRIBE_HOOK, 0) {
            return Ok(None);
        }
        let described = self.call_bound(DESCRIBE_HOOK, ()).map_err(|error| {
            activation_error(&self.id, format!("describe_parameters() failed: {error}"))
        })?;
        rhai::serde::from_dynamic::<ParameterCatalog>(&described)
            .map(Some)
            .map_err(|error| {
                activation_error(
                    &self.id,
                    format!("describe_parameters() returned a malformed catalog: {error}"),
                )
            })
    }
}

fn call_options<'t>() -> CallFnOptions<'t> {
    CallFnOptions::new().eval_ast(true).rewind_scope(true)
}

fn text(id: &PluginId, value: Dynamic) -> Result<String, PluginError> {
    value
        .into_immutable_string()
        .map(|text| text.to_string())
        .map_err(|type_name| {
            activation_error(id, format!("register() entries must be strings, not {type_name}"))
        })
}

fn describe_fault(error: &EvalAltResult) -> String {
    match error.unwrap_inner() {
        EvalAltResult::ErrorTooManyOperations(_) => String::from("operation budget exhausted"),
        other => other.to_string(),
    }
}

fn activation_error(id: &PluginId, message: impl Into<String>) -> PluginError {
    PluginError::Activation {
        plugin: id.to_string(),
        message: message.into(),
    }
}
