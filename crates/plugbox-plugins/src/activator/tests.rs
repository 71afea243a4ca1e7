//! Unit tests for plugin activation.

use plugbox_sandbox::{OperationBudget, Sandbox, SandboxProfile};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::compiler::{CompilationUnit, LibrarySource, ScriptCompiler, SourceCompiler};
use crate::tests::support::DEMO_SOURCE;

#[fixture]
fn id() -> PluginId {
    PluginId::new("demo").expect("valid id")
}

fn compile(source: &str) -> CompiledModule {
    ScriptCompiler::default()
        .compile(&CompilationUnit::new("Demo.rhai", source))
        .expect("source compiles")
}

fn activation_message(result: Result<PluginInstance, PluginError>) -> String {
    match result {
        Err(PluginError::Activation { message, .. }) => message,
        other => panic!("expected activation error, got {other:?}"),
    }
}

fn args(value: serde_json::Value) -> PluginArgs {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("arguments must be an object, got {other}"),
    }
}

#[rstest]
fn demo_plugin_registers_and_runs(id: PluginId) {
    let instance = activate(&id, compile(DEMO_SOURCE), "Demo").expect("demo activates");

    assert_eq!(instance.functions().keys().collect::<Vec<_>>(), vec!["greet"]);
    let greeting = instance
        .run("greet", &args(json!({ "name": "Ada" })))
        .expect("greet runs");
    assert_eq!(greeting, json!("Hello, Ada!"));
}

#[rstest]
fn parameters_are_harvested(id: PluginId) {
    let instance = activate(&id, compile(DEMO_SOURCE), "Demo").expect("demo activates");

    let parameters = instance.parameters("greet");
    assert_eq!(parameters.len(), 1);
    let name = &parameters[0];
    assert_eq!(name.name, "name");
    assert_eq!(name.display_name, "Name");
    assert_eq!(name.kind, ParameterType::String);
    assert_eq!(name.default_value, Some(json!("world")));
    assert!(!name.required);
    assert!(instance.parameters("unknown").is_empty());
}

#[rstest]
fn instance_state_persists_between_calls(id: PluginId) {
    let source = r#"
        fn Counter() { #{ count: 0 } }
        fn register() { #{ bump: "increment" } }
        fn increment(args) { this.count += args.by; this.count }
    "#;
    let instance = activate(&id, compile(source), "Counter").expect("counter activates");

    assert_eq!(instance.functions().target("bump"), Some("increment"));
    instance.run("bump", &args(json!({ "by": 2 }))).expect("first call");
    let total = instance.run("bump", &args(json!({ "by": 3 }))).expect("second call");
    assert_eq!(total, json!(5));
}

#[rstest]
fn top_level_imports_are_bound_for_every_hook(id: PluginId) {
    let source = r#"
        import "names" as names;
        fn Demo() { #{ calls: 0, prefix: names::prefix() } }
        fn register() { [names::key()] }
        fn describe_parameters() { names::catalog() }
        fn greet(args) { this.calls += 1; `${this.prefix}${args.name} #${this.calls}` }
    "#;
    let library = r#"
        fn prefix() { "Hello, " }
        fn key() { "greet" }
        fn catalog() { #{ greet: [#{ name: "name", "type": "string" }] } }
    "#;
    let unit = CompilationUnit::new("Demo.rhai", source)
        .with_libraries([LibrarySource::new("names", "lib/names.rhai", library)]);
    let module = ScriptCompiler::default()
        .compile(&unit)
        .expect("source compiles with library");
    let instance = activate(&id, module, "Demo").expect("demo activates");

    assert_eq!(instance.functions().keys().collect::<Vec<_>>(), vec!["greet"]);
    assert_eq!(instance.parameters("greet").len(), 1);
    let name = args(json!({ "name": "Ada" }));
    assert_eq!(instance.run("greet", &name).expect("first call"), json!("Hello, Ada #1"));
    assert_eq!(instance.run("greet", &name).expect("second call"), json!("Hello, Ada #2"));
}

#[rstest]
fn constructor_lookup_ignores_ascii_case(id: PluginId) {
    let source = "fn demo() { () }\nfn register() { [] }";
    let instance = activate(&id, compile(source), "Demo").expect("activates");
    assert!(instance.functions().is_empty());
}

#[rstest]
#[case::missing_type("fn register() { [] }", "not defined")]
#[case::constructor_with_params("fn Demo(x) { x }\nfn register() { [] }", "not defined")]
#[case::constructor_throws("fn Demo() { throw \"boom\"; }\nfn register() { [] }", "constructor")]
#[case::missing_hook("fn Demo() { #{} }", "missing register()")]
#[case::throwing_hook("fn Demo() { #{} }\nfn register() { throw \"no\"; }", "register() failed")]
#[case::unknown_target("fn Demo() { #{} }\nfn register() { [\"ghost\"] }", "ghost")]
#[case::wrong_arity("fn Demo() { #{} }\nfn register() { [\"go\"] }\nfn go() { 1 }", "go")]
#[case::duplicate_key(
    "fn Demo() { #{} }\nfn register() { [\"go\", \"go\"] }\nfn go(a) { 1 }",
    "more than once"
)]
#[case::not_a_list("fn Demo() { #{} }\nfn register() { 42 }", "array or a map")]
#[case::non_string_key("fn Demo() { #{} }\nfn register() { [1] }", "strings")]
fn activation_failures(id: PluginId, #[case] source: &str, #[case] fragment: &str) {
    let message = activation_message(activate(&id, compile(source), "Demo"));
    assert!(
        message.contains(fragment),
        "'{message}' should mention '{fragment}'"
    );
}

#[rstest]
fn malformed_parameter_descriptions_are_ignored(id: PluginId) {
    let source = "fn Demo() { #{} }\nfn register() { [\"go\"] }\nfn go(a) { 1 }\n\
                  fn describe_parameters() { 7 }";
    let instance = activate(&id, compile(source), "Demo").expect("activates regardless");
    assert!(instance.parameters("go").is_empty());
}

#[rstest]
fn script_errors_become_invocation_faults(id: PluginId) {
    let source = "fn Demo() { #{} }\nfn register() { [\"fail\"] }\nfn fail(a) { throw \"bad input\"; }";
    let instance = activate(&id, compile(source), "Demo").expect("activates");

    let error = instance
        .run("fail", &PluginArgs::new())
        .expect_err("script throws");
    match error {
        PluginError::InvocationFault {
            function, message, ..
        } => {
            assert_eq!(function, "fail");
            assert!(message.contains("bad input"), "unexpected message {message}");
        }
        other => panic!("expected invocation fault, got {other:?}"),
    }
}

#[rstest]
fn operation_budget_bounds_invocations(id: PluginId) {
    let sandbox = Sandbox::new(
        SandboxProfile::new().with_operation_budget(OperationBudget::bounded(1_000)),
    );
    let source = "fn Demo() { #{} }\nfn register() { [\"spin\"] }\nfn spin(a) { let n = 0; loop { n += 1; } }";
    let module = ScriptCompiler::new(sandbox)
        .compile(&CompilationUnit::new("Demo.rhai", source))
        .expect("source compiles");
    let instance = activate(&id, module, "Demo").expect("activates");

    let error = instance
        .run("spin", &PluginArgs::new())
        .expect_err("budget is exhausted");
    assert!(
        matches!(error, PluginError::InvocationFault { ref message, .. } if message == "operation budget exhausted"),
        "unexpected error {error:?}"
    );
}

#[test]
fn function_table_preserves_registration_order() {
    let mut table = FunctionTable::new();
    assert!(table.insert("b", "beta"));
    assert!(table.insert("a", "alpha"));
    assert!(!table.insert("b", "other"));

    assert_eq!(table.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(table.target("b"), Some("beta"));
    assert_eq!(table.len(), 2);
}

#[rstest]
#[case(ParameterType::String, json!("x"), true)]
#[case(ParameterType::String, json!(1), false)]
#[case(ParameterType::Integer, json!(3), true)]
#[case(ParameterType::Integer, json!(3.5), false)]
#[case(ParameterType::Number, json!(3.5), true)]
#[case(ParameterType::Boolean, json!(true), true)]
#[case(ParameterType::Boolean, json!("true"), false)]
#[case(ParameterType::Any, json!({"nested": []}), true)]
#[case(ParameterType::Integer, json!(null), true)]
fn parameter_types_accept_matching_values(
    #[case] kind: ParameterType,
    #[case] value: serde_json::Value,
    #[case] accepted: bool,
) {
    assert_eq!(kind.accepts(&value), accepted);
}

struct NativeEcho;

impl PluginCapability for NativeEcho {
    fn register(&mut self) -> Result<FunctionTable, PluginError> {
        let mut table = FunctionTable::new();
        let _ = table.insert("echo", "echo");
        Ok(table)
    }

    fn run(&mut self, _key: &str, args: &PluginArgs) -> Result<Value, PluginError> {
        Ok(Value::Object(args.clone()))
    }

    fn describe_parameters(&mut self) -> Result<Option<ParameterCatalog>, PluginError> {
        Err(PluginError::Activation {
            plugin: String::from("native"),
            message: String::from("no descriptions"),
        })
    }
}

#[rstest]
fn native_capabilities_activate(id: PluginId) {
    let instance = PluginInstance::activate(&id, Box::new(NativeEcho)).expect("activates");
    let echoed = instance
        .run("echo", &args(json!({ "k": 1 })))
        .expect("echo runs");
    assert_eq!(echoed, json!({ "k": 1 }));
    assert!(instance.parameters("echo").is_empty());
}
