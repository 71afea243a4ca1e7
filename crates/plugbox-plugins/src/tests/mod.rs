//! Crate-level integration and BDD tests.

use serde_json::json;

use crate::activator::PluginArgs;
use crate::descriptor::{Argb, PluginId};

pub(crate) mod support;


use self::support::{PackageBuilder, TestHost};

#[test]
fn end_to_end_demo_package() {
    let host = TestHost::new();
    host.install(
        "demo.plug",
        &PackageBuilder::demo("demo")
            .entry("style.json", r#"{ "backgroundColor": "255,0,0" }"#)
            .entry("lib/unused.rhai", "fn helper() { 1 }"),
    );
    let id = PluginId::new("demo").expect("valid id");

    let ids = host.manager.load_all_metadata().expect("metadata loads");
    assert_eq!(ids, vec![id.clone()]);
    let style = host.manager.style(&id).expect("registered");
    assert_eq!(style.background_color, "FF0000".parse::<Argb>().expect("hex colour"));

    host.manager.load_code(&id).expect("code loads");
    assert_eq!(
        host.manager.list_function_keys(&id).expect("registered"),
        vec![String::from("greet")]
    );

    let mut args = PluginArgs::new();
    args.insert(String::from("name"), json!("plugbox"));
    let first = host.manager.invoke(&id, "greet", args.clone()).expect("greet runs");
    let second = host.manager.invoke(&id, "greet", args).expect("greet runs again");
    assert_eq!(first, json!("Hello, plugbox!"));
    assert_eq!(first, second);
    assert_eq!(host.compiler.calls(), 1);
}
