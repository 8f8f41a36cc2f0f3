use crate::lock::LockConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Run account and balance commands from a CSV script
#[derive(Parser, Debug)]
#[command(name = "account-ledger")]
#[command(about = "Run account and balance commands from a CSV script", long_about = None)]
pub struct CliArgs {
    /// Input CSV script with one command per row
    #[arg(value_name = "SCRIPT", help = "Path to the input CSV command script")]
    pub script: PathBuf,

    /// How long an acquirer waits for a contended account lock
    #[arg(
        long = "lock-wait-ms",
        value_name = "MILLIS",
        help = "Lock acquisition wait timeout in milliseconds (default: 5000)"
    )]
    pub lock_wait_ms: Option<u64>,

    /// How long a holder may keep an account lock before takeover
    #[arg(
        long = "lock-hold-ms",
        value_name = "MILLIS",
        help = "Lock hold timeout in milliseconds (default: 5000)"
    )]
    pub lock_hold_ms: Option<u64>,
}

impl CliArgs {
    /// Build the lock configuration from CLI overrides, falling back to the
    /// defaults for anything not given.
    pub fn to_lock_config(&self) -> LockConfig {
        let default = LockConfig::default();
        LockConfig {
            wait_timeout: self
                .lock_wait_ms
                .map(Duration::from_millis)
                .unwrap_or(default.wait_timeout),
            hold_timeout: self
                .lock_hold_ms
                .map(Duration::from_millis)
                .unwrap_or(default.hold_timeout),
        }
    }
}
