//! Error types for the account ledger engine
//!
//! Every business-rule violation is represented as a typed error carrying a
//! stable machine-readable code plus a human-readable description. Errors
//! propagate to the boundary unmodified; unclassified faults are folded into
//! [`LedgerError::Internal`] so internal details never leak past the boundary.

use serde::Serialize;
use thiserror::Error;

use super::account::UserId;

/// Main error type for the account ledger engine
///
/// Each variant includes enough context to diagnose the rejection. The set of
/// variants is the complete error taxonomy of the system; transport layers map
/// them to [`ErrorResponse`] without further classification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// No user exists with the requested id.
    #[error("user {user_id} was not found")]
    UserNotFound {
        /// The user id that was looked up
        user_id: UserId,
    },

    /// No account exists with the requested account number.
    #[error("account {account_number} was not found")]
    AccountNotFound {
        /// The account number that was looked up
        account_number: String,
    },

    /// The account exists but is owned by a different user.
    #[error("account {account_number} is not owned by user {user_id}")]
    OwnerMismatch {
        /// The user who made the request
        user_id: UserId,
        /// The account number that is owned by someone else
        account_number: String,
    },

    /// The account has already been unregistered and cannot be mutated.
    #[error("account {account_number} is already unregistered")]
    AccountUnregistered {
        /// The unregistered account number
        account_number: String,
    },

    /// The requested debit is larger than the current balance.
    ///
    /// The balance is left unchanged; a compensating FAIL record is appended
    /// by the caller.
    #[error("use amount {requested} exceeds balance {balance}")]
    AmountExceedsBalance {
        /// Current balance in minor units
        balance: u64,
        /// Requested debit in minor units
        requested: u64,
    },

    /// A cancellation must reverse the full amount of the original use.
    #[error("cancel amount {requested} must equal the original amount {expected}")]
    CancelMustBeFull {
        /// Amount of the original USE transaction
        expected: u64,
        /// Amount requested for cancellation
        requested: u64,
    },

    /// The prior transaction belongs to a different account.
    #[error("transaction {transaction_id} does not belong to account {account_number}")]
    TransactionAccountMismatch {
        /// The prior transaction id
        transaction_id: String,
        /// The account number named in the cancel request
        account_number: String,
    },

    /// The prior transaction is older than the one-year cancellation window.
    #[error("transaction {transaction_id} is too old to cancel")]
    CancellationWindowExpired {
        /// The prior transaction id
        transaction_id: String,
    },

    /// No transaction exists with the requested transaction id.
    #[error("transaction {transaction_id} was not found")]
    TransactionNotFound {
        /// The transaction id that was looked up
        transaction_id: String,
    },

    /// A user may hold at most a fixed number of open accounts.
    #[error("user {user_id} already holds the maximum of {limit} accounts")]
    MaxAccountsPerUserExceeded {
        /// The user who requested another account
        user_id: UserId,
        /// The per-user account limit
        limit: usize,
    },

    /// An account can only be unregistered once its balance is zero.
    #[error("account {account_number} still has a balance of {balance}")]
    AccountBalanceNotEmpty {
        /// The account number that was to be closed
        account_number: String,
        /// Remaining balance in minor units
        balance: u64,
    },

    /// The per-account transaction lock could not be acquired within the
    /// wait window. The guarded operation was never invoked.
    #[error("could not acquire the transaction lock for account {key}")]
    LockUnavailable {
        /// The lock key (account number) that was contended
        key: String,
    },

    /// The request failed structural validation before any business logic ran.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the violated constraint
        message: String,
    },

    /// Unclassified internal fault (I/O, serialization, arithmetic).
    #[error("internal error: {message}")]
    Internal {
        /// Description of the fault
        message: String,
    },
}

impl LedgerError {
    /// Stable machine-readable code for this error.
    ///
    /// Codes are part of the external contract and never change for a given
    /// variant.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::UserNotFound { .. } => "USER_NOT_FOUND",
            LedgerError::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            LedgerError::OwnerMismatch { .. } => "OWNER_MISMATCH",
            LedgerError::AccountUnregistered { .. } => "ACCOUNT_UNREGISTERED",
            LedgerError::AmountExceedsBalance { .. } => "AMOUNT_EXCEEDS_BALANCE",
            LedgerError::CancelMustBeFull { .. } => "CANCEL_MUST_BE_FULL",
            LedgerError::TransactionAccountMismatch { .. } => "TRANSACTION_ACCOUNT_MISMATCH",
            LedgerError::CancellationWindowExpired { .. } => "CANCELLATION_WINDOW_EXPIRED",
            LedgerError::TransactionNotFound { .. } => "TRANSACTION_NOT_FOUND",
            LedgerError::MaxAccountsPerUserExceeded { .. } => "MAX_ACCOUNTS_PER_USER_EXCEEDED",
            LedgerError::AccountBalanceNotEmpty { .. } => "ACCOUNT_BALANCE_NOT_EMPTY",
            LedgerError::LockUnavailable { .. } => "LOCK_UNAVAILABLE",
            LedgerError::InvalidRequest { .. } => "INVALID_REQUEST",
            LedgerError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

// Conversion from io::Error: infrastructure faults are unclassified
impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Internal {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error (script reader / report writer)
impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        LedgerError::Internal {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a UserNotFound error
    pub fn user_not_found(user_id: UserId) -> Self {
        LedgerError::UserNotFound { user_id }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account_number: &str) -> Self {
        LedgerError::AccountNotFound {
            account_number: account_number.to_string(),
        }
    }

    /// Create an OwnerMismatch error
    pub fn owner_mismatch(user_id: UserId, account_number: &str) -> Self {
        LedgerError::OwnerMismatch {
            user_id,
            account_number: account_number.to_string(),
        }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(transaction_id: &str) -> Self {
        LedgerError::TransactionNotFound {
            transaction_id: transaction_id.to_string(),
        }
    }

    /// Create a LockUnavailable error
    pub fn lock_unavailable(key: &str) -> Self {
        LedgerError::LockUnavailable {
            key: key.to_string(),
        }
    }

    /// Create an InvalidRequest error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        LedgerError::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        LedgerError::Internal {
            message: message.into(),
        }
    }
}

/// Boundary error shape: stable code plus human description
///
/// This is what transport layers serialize when an operation is rejected.
/// Unclassified faults surface as `INTERNAL_ERROR` with their detail replaced
/// by the generic description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error code
    pub error_code: String,
    /// Human-readable description
    pub error_message: String,
}

impl From<&LedgerError> for ErrorResponse {
    fn from(error: &LedgerError) -> Self {
        match error {
            LedgerError::Internal { .. } => ErrorResponse {
                error_code: "INTERNAL_ERROR".to_string(),
                error_message: "internal server error".to_string(),
            },
            other => ErrorResponse {
                error_code: other.code().to_string(),
                error_message: other.to_string(),
            },
        }
    }
}
