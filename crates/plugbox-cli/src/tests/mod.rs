//! Unit and behaviour tests for the CLI runtime.

use std::process::ExitCode;

use rstest::rstest;
use serde_json::{Value, json};

use crate::cli::parse_argument;

mod behaviour;
mod support;

use self::support::CliHarness;

#[rstest]
#[case("name=Ada", "name", json!("Ada"))]
#[case("count=3", "count", json!(3))]
#[case("flag=true", "flag", json!(true))]
#[case("quoted=\"3\"", "quoted", json!("3"))]
#[case(" padded =x=y", "padded", json!("x=y"))]
fn parses_named_arguments(#[case] raw: &str, #[case] name: &str, #[case] value: Value) {
    let parsed = parse_argument(raw).expect("argument parses");
    assert_eq!(parsed, (name.to_owned(), value));
}

#[rstest]
#[case("missing-separator")]
#[case("=value")]
fn rejects_malformed_arguments(#[case] raw: &str) {
    assert!(parse_argument(raw).is_err());
}

#[test]
fn list_reports_plugins_without_loading_code() {
    let mut harness = CliHarness::new();
    harness.install_greeter("greeter");

    assert_eq!(harness.run(&["list"]), ExitCode::SUCCESS);
    let lines = harness.stdout_lines();
    assert_eq!(lines.len(), 1);
    let first = lines.first().expect("one plugin listed");
    assert_eq!(first["plugin"]["id"], json!("greeter"));
    assert_eq!(first["plugin"]["isEnabled"], json!(true));
    assert_eq!(first["codeLoaded"], json!(false));
}

#[test]
fn functions_lists_keys_with_parameters() {
    let mut harness = CliHarness::new();
    harness.install_greeter("greeter");

    assert_eq!(harness.run(&["functions", "greeter"]), ExitCode::SUCCESS);
    let lines = harness.stdout_lines();
    let keys: Vec<&Value> = lines.iter().map(|line| &line["key"]).collect();
    assert_eq!(keys, vec![&json!("greet"), &json!("add")]);
    let add = lines.get(1).expect("add listed");
    assert_eq!(add["parameters"][0]["name"], json!("left"));
    assert_eq!(add["parameters"][0]["required"], json!(true));
}

#[test]
fn invoke_passes_typed_arguments() {
    let mut harness = CliHarness::new();
    harness.install_greeter("greeter");

    let exit = harness.run(&["invoke", "greeter", "add", "--arg", "left=2", "--arg", "right=40"]);
    assert_eq!(exit, ExitCode::SUCCESS, "stderr: {}", harness.stderr_text());
    assert_eq!(harness.stdout_text(), "42\n");
}

#[test]
fn invoke_applies_parameter_defaults() {
    let mut harness = CliHarness::new();
    harness.install_greeter("greeter");

    assert_eq!(harness.run(&["invoke", "greeter", "greet"]), ExitCode::SUCCESS);
    assert_eq!(harness.stdout_text(), "\"Hello, world!\"\n");
}

#[test]
fn invoke_reports_missing_required_arguments() {
    let mut harness = CliHarness::new();
    harness.install_greeter("greeter");

    let exit = harness.run(&["invoke", "greeter", "add", "--arg", "left=1"]);
    assert_eq!(exit, ExitCode::FAILURE);
    assert!(harness.stdout.is_empty());
    assert!(
        harness.stderr_text().contains("right"),
        "stderr should name the missing argument: {}",
        harness.stderr_text()
    );
}

#[test]
fn unknown_plugin_fails() {
    let mut harness = CliHarness::new();

    assert_eq!(harness.run(&["invoke", "ghost", "greet"]), ExitCode::FAILURE);
    assert!(harness.stderr_text().contains("ghost"));
}

#[test]
fn disable_persists_across_runs() {
    let mut harness = CliHarness::new();
    harness.install_greeter("greeter");

    assert_eq!(harness.run(&["disable", "greeter"]), ExitCode::SUCCESS);
    assert_eq!(
        harness.stdout_lines(),
        vec![json!({ "id": "greeter", "enabled": false })]
    );

    assert_eq!(harness.run(&["invoke", "greeter", "greet"]), ExitCode::FAILURE);
    assert!(harness.stderr_text().contains("disabled"));

    assert_eq!(harness.run(&["enable", "greeter"]), ExitCode::SUCCESS);
    assert_eq!(harness.run(&["invoke", "greeter", "greet"]), ExitCode::SUCCESS);
}

#[test]
fn import_copies_and_registers_the_archive() {
    let mut harness = CliHarness::new();
    let outside = harness.root().join("downloads").join("greeter.plug");
    harness.write_greeter(&outside, "imported");

    let archive = outside.to_str().expect("utf-8 path");
    assert_eq!(harness.run(&["import", archive]), ExitCode::SUCCESS);
    assert_eq!(harness.stdout_lines(), vec![json!({ "imported": "imported" })]);
    assert!(harness.packages_dir().join("greeter.plug").is_file());

    assert_eq!(harness.run(&["list"]), ExitCode::SUCCESS);
    assert_eq!(harness.stdout_lines().len(), 1);
}

#[test]
fn help_is_written_to_stdout() {
    let mut harness = CliHarness::new();

    assert_eq!(harness.run(&["--help"]), ExitCode::SUCCESS);
    assert!(harness.stdout_text().contains("invoke"));
    assert!(harness.stderr.is_empty());
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let mut harness = CliHarness::new();

    assert_eq!(harness.run(&[]), ExitCode::FAILURE);
    assert!(harness.stderr_text().contains("Usage"));
}
