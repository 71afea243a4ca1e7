//! Unit tests for plugin error types.

use std::path::PathBuf;

use rstest::rstest;

use super::*;
use crate::compiler::{Diagnostic, DiagnosticSeverity};

#[test]
fn not_found_error_message_includes_id() {
    let error = PluginError::NotFound { id: "demo".into() };
    let message = error.to_string();
    assert!(message.contains("demo"), "expected id in message: {message}");
    assert!(
        message.contains("not found"),
        "expected 'not found' in message: {message}"
    );
}

#[test]
fn security_violation_names_the_pattern() {
    let error = PluginError::SecurityViolation {
        plugin: "demo".into(),
        violation: Violation::ForbiddenPatterns {
            patterns: vec!["Process.Start".into()],
            files: vec!["Demo.rhai".into()],
        },
    };
    let message = error.to_string();
    assert!(
        message.contains("Process.Start"),
        "expected pattern in message: {message}"
    );
    assert!(
        message.contains("Demo.rhai"),
        "expected file in message: {message}"
    );
}

#[test]
fn compilation_error_summarises_diagnostics() {
    let diagnostics = Diagnostics::from(vec![Diagnostic::new(
        DiagnosticSeverity::Error,
        "expecting ';'",
    )]);
    let error = PluginError::Compilation {
        plugin: "demo".into(),
        diagnostics,
    };
    let message = error.to_string();
    assert!(
        message.contains("expecting ';'"),
        "expected diagnostic in message: {message}"
    );
}

#[rstest]
#[case::disabled(PluginError::Disabled { id: "demo".into() }, Some("demo"))]
#[case::fault(
    PluginError::InvocationFault {
        plugin: "demo".into(),
        function: "greet".into(),
        message: "boom".into(),
    },
    Some("demo")
)]
#[case::package(
    PluginError::Package {
        archive: PathBuf::from("/packages/demo.plug"),
        message: "corrupt".into(),
    },
    None
)]
#[case::policy(PluginError::Policy { message: "too large".into() }, None)]
fn plugin_accessor_reports_owner(#[case] error: PluginError, #[case] expected: Option<&str>) {
    assert_eq!(error.plugin(), expected);
}

#[test]
fn io_error_is_send_sync_and_clone() {
    fn assert_send_sync<T: Send + Sync + Clone>() {}
    assert_send_sync::<PluginError>();

    let error = PluginError::io("/tmp/work", std::io::Error::other("disk full"));
    let copy = error.clone();
    let message = copy.to_string();
    assert!(
        message.contains("/tmp/work"),
        "expected path in message: {message}"
    );
    assert!(
        message.contains("disk full"),
        "expected source in message: {message}"
    );
}
