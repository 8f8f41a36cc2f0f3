//! Transaction ledger types
//!
//! Every attempted balance mutation produces exactly one immutable
//! [`Transaction`] record, whether it passed or failed validation. Records
//! snapshot the account balance immediately after the transaction's effect
//! (or the unchanged balance on failure) and are never updated or deleted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::{Account, AccountId};

/// How far back a USE transaction may be cancelled
pub const CANCELLATION_WINDOW_DAYS: i64 = 365;

/// Kind of balance mutation a transaction records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Debit ("use") of the account balance
    Use,
    /// Compensating credit reversing a prior USE in full
    Cancel,
}

/// Outcome recorded for an attempted mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionResult {
    /// The mutation was applied
    Success,
    /// The mutation was rejected after the account had been resolved
    Fail,
}

/// An immutable ledger record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Opaque unique token identifying this record
    pub transaction_id: String,

    /// USE or CANCEL
    pub transaction_type: TransactionType,

    /// SUCCESS or FAIL
    pub result: TransactionResult,

    /// Internal id of the owning account
    pub account_id: AccountId,

    /// External number of the owning account
    pub account_number: String,

    /// Amount of the attempted mutation, in minor units (always positive)
    pub amount: u64,

    /// Account balance immediately after this transaction's effect, or the
    /// unchanged balance for a FAIL record
    pub balance_snapshot: u64,

    /// When the attempt was recorded
    pub transacted_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a record for `account` with a fresh transaction id and the
    /// account's current balance as snapshot.
    ///
    /// The caller applies the mutation (if any) before constructing the
    /// record, so `account.balance` is already the post-effect value.
    pub fn record(
        transaction_type: TransactionType,
        result: TransactionResult,
        account: &Account,
        amount: u64,
    ) -> Self {
        Transaction {
            transaction_id: new_transaction_id(),
            transaction_type,
            result,
            account_id: account.id,
            account_number: account.account_number.clone(),
            amount,
            balance_snapshot: account.balance,
            transacted_at: Utc::now(),
        }
    }

    /// Whether this record is still inside the cancellation window.
    pub fn within_cancellation_window(&self, now: DateTime<Utc>) -> bool {
        self.transacted_at >= now - Duration::days(CANCELLATION_WINDOW_DAYS)
    }
}

/// Generate an opaque transaction id: UUID v4 hex without dashes.
pub fn new_transaction_id() -> String {
    Uuid::new_v4().simple().to_string()
}
