//! Ledger store
//!
//! Append-only transaction ledger. Records are indexed by their opaque
//! transaction id and are never updated or deleted once appended; the store
//! exposes no mutating access to stored records.

use dashmap::DashMap;

use crate::types::Transaction;

/// Append-only transaction ledger
#[derive(Debug, Default)]
pub struct LedgerStore {
    transactions: DashMap<String, Transaction>,
}

impl LedgerStore {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            transactions: DashMap::new(),
        }
    }

    /// Append a record.
    ///
    /// Transaction ids are freshly generated opaque tokens; if an id were
    /// ever to collide, the first record wins and the duplicate is dropped.
    pub fn append(&self, transaction: Transaction) {
        self.transactions
            .entry(transaction.transaction_id.clone())
            .or_insert(transaction);
    }

    /// Look up a record by transaction id.
    pub fn find_by_transaction_id(&self, transaction_id: &str) -> Option<Transaction> {
        self.transactions
            .get(transaction_id)
            .map(|entry| entry.value().clone())
    }

    /// All records appended for an account, in arbitrary order.
    pub fn find_by_account_number(&self, account_number: &str) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|entry| entry.value().account_number == account_number)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of records in the ledger.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
