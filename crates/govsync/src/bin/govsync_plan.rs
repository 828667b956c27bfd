//! `govsync-plan` — print the patch a reconciliation cycle would send.
//!
//! Usage:
//!   govsync-plan [--config <govsync.toml>] <kind> <previous.json> <desired.json>
//!
//! Set `RUST_LOG=debug` for a trace of the diff.

use std::io::{self, Write};

use govsync::cli::{run, PlanArgs};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = PlanArgs::parse(&args).and_then(|args| run(&args));
    match result {
        Ok(patch) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{patch}") {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
