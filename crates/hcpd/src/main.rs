//! Entry point for the `hcpd` bridge daemon.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match hcpd::run_bridge() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry may not be installed when bootstrap fails.
            let _ = writeln!(io::stderr(), "hcpd: {error}");
            ExitCode::FAILURE
        }
    }
}
