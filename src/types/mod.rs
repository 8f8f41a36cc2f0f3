//! Core data types for the account ledger engine
//!
//! This module defines accounts, users, ledger transactions, request and
//! response shapes, and the error taxonomy used throughout the system.

pub mod account;
pub mod error;
pub mod request;
pub mod transaction;

pub use account::{
    Account, AccountId, AccountStatus, AccountSummary, User, UserId, ACCOUNT_NUMBER_LEN,
    FIRST_ACCOUNT_NUMBER, MAX_ACCOUNTS_PER_USER,
};
pub use error::{ErrorResponse, LedgerError};
pub use request::{
    CancelBalanceRequest, TransactionConfirmation, UseBalanceRequest, MAX_USE_AMOUNT,
    MIN_USE_AMOUNT,
};
pub use transaction::{
    new_transaction_id, Transaction, TransactionResult, TransactionType,
    CANCELLATION_WINDOW_DAYS,
};
