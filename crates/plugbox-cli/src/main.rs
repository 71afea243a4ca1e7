//! CLI entrypoint for the plugbox plugin host.
//!
//! The binary delegates to [`plugbox_cli::run`], which loads configuration,
//! discovers plugin packages and executes the requested command.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    plugbox_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
