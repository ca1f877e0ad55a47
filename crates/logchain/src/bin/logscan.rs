//! logscan entry point
//!
//! Parses arguments, installs the tracing subscriber and delegates to
//! [`logchain::cli::run`]. Exits non-zero when the log had anomalies or
//! rejected records, or when the scan could not run at all.

use clap::Parser;
use logchain::cli::{self, Cli};

fn main() {
    cli::init_tracing();
    match cli::run(Cli::parse()) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("logscan: {e:#}");
            std::process::exit(2);
        }
    }
}
