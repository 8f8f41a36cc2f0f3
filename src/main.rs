//! Account Ledger CLI
//!
//! Command-line interface for running account and balance commands from a
//! CSV script.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- script.csv > accounts.csv
//! cargo run -- --lock-wait-ms 100 --lock-hold-ms 250 script.csv > accounts.csv
//! ```
//!
//! The program reads commands from the input CSV script, applies them in
//! order through the ledger engine, and writes the final account states to
//! stdout. Progress and rejections are logged to stderr; set `RUST_LOG` to
//! adjust verbosity.
//!
//! # Exit Codes
//!
//! - 0: Success (business rejections inside the script do not fail the run)
//! - 1: Error (missing arguments, script not found, script not readable)

use account_ledger::{cli, run_script, LedgerEngine};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let engine = LedgerEngine::new(args.to_lock_config());
    engine.start_background_tasks();

    // Final account report goes to stdout
    let mut output = std::io::stdout();
    if let Err(e) = run_script(&engine, &args.script, &mut output).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
