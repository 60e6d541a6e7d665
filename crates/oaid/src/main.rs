use std::io::{self, Write};
use std::process::ExitCode;

use oai_config::CliError;
use oaid::LaunchError;

const MAIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::main");

fn main() -> ExitCode {
    let startup = match oaid::run_server(std::env::args_os()) {
        Ok(startup) => startup,
        Err(LaunchError::Cli {
            source: CliError::Parse(error),
        }) => error.exit(),
        Err(error) => {
            if let Err(write_error) = writeln!(io::stderr(), "oaid: {error}") {
                tracing::error!(
                    target: MAIN_TARGET,
                    error = %error,
                    write_error = %write_error,
                    "failed to report launch error"
                );
            }
            return ExitCode::FAILURE;
        }
    };

    let mut stderr = io::stderr().lock();
    if let Err(error) = oaid::write_summary(&mut stderr, &startup.outcome) {
        tracing::warn!(
            target: MAIN_TARGET,
            error = %error,
            "failed to write startup summary"
        );
    }
    if startup.outcome.is_ready() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
