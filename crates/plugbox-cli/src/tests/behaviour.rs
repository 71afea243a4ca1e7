//! Behaviour-driven tests for the CLI commands.

use std::cell::RefCell;
use std::process::ExitCode;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

use super::support::CliHarness;

#[fixture]
fn world() -> RefCell<CliHarness> {
    RefCell::new(CliHarness::new())
}

#[given("an installed greeter package {id}")]
fn given_greeter(world: &RefCell<CliHarness>, id: String) {
    world.borrow().install_greeter(id.trim_matches('"'));
}

#[when("the operator runs {command}")]
fn when_operator_runs(world: &RefCell<CliHarness>, command: String) {
    let tokens: Vec<&str> = command.trim_matches('"').split_whitespace().collect();
    world.borrow_mut().run(&tokens);
}

#[then("the printed result is the text {text}")]
fn then_printed_text(world: &RefCell<CliHarness>, text: String) {
    let expected = format!("{}\n", Value::String(text.trim_matches('"').to_owned()));
    assert_eq!(world.borrow().stdout_text(), expected);
}

#[then("stderr contains {snippet}")]
fn then_stderr_contains(world: &RefCell<CliHarness>, snippet: String) {
    let harness = world.borrow();
    let stderr = harness.stderr_text();
    let needle = snippet.trim_matches('"');
    assert!(
        stderr.contains(needle),
        "stderr {stderr:?} did not contain {needle:?}"
    );
}

#[then("the CLI succeeds")]
fn then_success(world: &RefCell<CliHarness>) {
    assert_eq!(world.borrow().exit_code, Some(ExitCode::SUCCESS));
}

#[then("the CLI fails")]
fn then_failure(world: &RefCell<CliHarness>) {
    assert_eq!(world.borrow().exit_code, Some(ExitCode::FAILURE));
}

#[scenario(
    path = "tests/features/plugbox_cli.feature",
    name = "Invoking a function prints its JSON result"
)]
fn invoking_prints_result(world: RefCell<CliHarness>) {
    drop(world);
}

#[scenario(
    path = "tests/features/plugbox_cli.feature",
    name = "Unregistered function keys are refused"
)]
fn unregistered_keys_refused(world: RefCell<CliHarness>) {
    drop(world);
}

#[scenario(
    path = "tests/features/plugbox_cli.feature",
    name = "Disabled plugins refuse invocation"
)]
fn disabled_plugins_refuse_invocation(world: RefCell<CliHarness>) {
    drop(world);
}

#[scenario(
    path = "tests/features/plugbox_cli.feature",
    name = "Type mismatches are reported before the plugin runs"
)]
fn type_mismatches_reported(world: RefCell<CliHarness>) {
    drop(world);
}
