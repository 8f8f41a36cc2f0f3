//! Account Ledger Library
//! # Overview
//!
//! This library provides an in-memory account and balance-transaction system
//! with per-account locking and an immutable, balance-snapshotting ledger.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (User, Account, Transaction, requests, errors)
//! - [`cli`] - CLI argument parsing
//! - [`store`] - Concurrent in-memory stores for users, accounts, and the ledger
//! - [`lock`] - Per-account lock coordination:
//!   - [`lock::coordinator`] - keyed locks with wait and hold timeouts
//!   - [`lock::guard`] - the guarded invocation wrapper around locked operations
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - request orchestration and compensating failure records
//!   - [`core::processor`] - validated balance mutations and ledger appends
//!   - [`core::account_service`] - account lifecycle
//! - [`io`] - CSV command scripts and the final account report
//!
//! # Operations
//!
//! The engine exposes six operations:
//!
//! - **Register user**: create a user and assign an id
//! - **Create account**: open an account with a sequential 10-digit number
//! - **Close account**: unregister an empty account
//! - **Use balance**: debit an account under its lock, recording the result
//! - **Cancel balance**: reverse a prior use in full, under the same lock
//! - **Query transaction**: look up a ledger record by transaction id
//!
//! # Ledger Records
//!
//! Every settled use or cancel appends an immutable record carrying the
//! account balance as it stood immediately after the attempt. Business
//! rejections that resolve an account append a FAIL record with the
//! unchanged balance, so the ledger reads as a complete audit trail.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod lock;
pub mod store;
pub mod types;

pub use core::{AccountService, LedgerEngine, TransactionProcessor};
pub use io::{run_script, write_accounts_csv};
pub use lock::{with_account_lock, LockConfig, LockCoordinator, LockKeyed};
pub use types::{
    Account, AccountId, AccountStatus, AccountSummary, CancelBalanceRequest, LedgerError,
    Transaction, TransactionConfirmation, TransactionResult, TransactionType, UseBalanceRequest,
    User, UserId,
};
