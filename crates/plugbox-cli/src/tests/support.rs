//! Test support for CLI behavioural coverage.
//!
//! Supplies a static configuration loader rooted in a temporary directory and
//! a helper that writes plugin packages into it.

use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use plugbox_config::Config;
use serde_json::json;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::{AppError, ConfigLoader, run_with_loader};

pub(crate) const GREETER_SOURCE: &str = r#"
fn Greeter() {
    #{ greeting: "Hello" }
}

fn register() {
    ["greet", "add"]
}

fn describe_parameters() {
    #{
        greet: [
            #{ name: "name", "type": "string", defaultValue: "world" }
        ],
        add: [
            #{ name: "left", "type": "integer", required: true },
            #{ name: "right", "type": "integer", required: true }
        ]
    }
}

fn greet(args) {
    `${this.greeting}, ${args.name}!`
}

fn add(args) {
    args.left + args.right
}
"#;

pub(crate) struct StaticConfigLoader {
    config: Config,
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Temporary host directories plus captured output of the last run.
pub(crate) struct CliHarness {
    dir: TempDir,
    pub(crate) stdout: Vec<u8>,
    pub(crate) stderr: Vec<u8>,
    pub(crate) exit_code: Option<ExitCode>,
}

impl CliHarness {
    pub(crate) fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
        }
    }

    fn utf8(path: PathBuf) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path).expect("temp path should be UTF-8")
    }

    pub(crate) fn config(&self) -> Config {
        Config {
            packages_dir: Self::utf8(self.packages_dir()),
            work_dir: Self::utf8(self.dir.path().join("work")),
            data_dir: Self::utf8(self.dir.path().join("data")),
            log_filter: String::from("off"),
            ..Config::default()
        }
    }

    pub(crate) fn packages_dir(&self) -> PathBuf {
        self.dir.path().join("packages")
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the greeter package for `id` to `path`.
    pub(crate) fn write_greeter(&self, path: &Path, id: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create package parent");
        }
        let descriptor = json!({
            "id": id,
            "name": "Greeter",
            "className": "Greeter",
            "version": "1.0.0",
        });
        let file = File::create(path).expect("create package");
        let mut writer = ZipWriter::new(file);
        for (name, contents) in [
            ("plugin.json", descriptor.to_string()),
            ("Greeter.rhai", GREETER_SOURCE.to_owned()),
        ] {
            writer
                .start_file(name, SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(contents.as_bytes()).expect("write entry");
        }
        writer.finish().expect("finish package");
    }

    pub(crate) fn install_greeter(&self, id: &str) {
        self.write_greeter(&self.packages_dir().join(format!("{id}.plug")), id);
    }

    pub(crate) fn run(&mut self, tokens: &[&str]) -> ExitCode {
        self.stdout.clear();
        self.stderr.clear();
        let args = std::iter::once("plugbox")
            .chain(tokens.iter().copied())
            .map(OsString::from);
        let loader = StaticConfigLoader {
            config: self.config(),
        };
        let exit = run_with_loader(args, &mut self.stdout, &mut self.stderr, &loader);
        self.exit_code = Some(exit);
        exit
    }

    pub(crate) fn stdout_text(&self) -> String {
        String::from_utf8(self.stdout.clone()).expect("stdout utf8")
    }

    pub(crate) fn stderr_text(&self) -> String {
        String::from_utf8(self.stderr.clone()).expect("stderr utf8")
    }

    pub(crate) fn stdout_lines(&self) -> Vec<serde_json::Value> {
        self.stdout_text()
            .lines()
            .map(|line| serde_json::from_str(line).expect("stdout line is JSON"))
            .collect()
    }
}
