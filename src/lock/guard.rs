//! Lock-guarded invocation wrapper
//!
//! Transport handlers wrap balance-mutating operations in
//! [`with_account_lock`]: the lock key is projected from the request, the
//! per-account lock is acquired, the operation runs exactly once while the
//! lock is held, and the lock is released on every exit path. Compensating
//! failure records are deliberately NOT written here; that is the caller's
//! responsibility, outside the lock scope.

use std::future::Future;

use crate::types::{CancelBalanceRequest, LedgerError, UseBalanceRequest};

use super::coordinator::{LockConfig, LockCoordinator};

/// Projection of the lock key out of a balance-mutating request
///
/// Pure and side-effect free; implementors return the account number the
/// request targets. Only request shapes that carry an account number can
/// implement this, so a request without an extractable key is rejected at
/// compile time.
pub trait LockKeyed {
    /// The account number to lock on.
    fn lock_key(&self) -> &str;
}

impl LockKeyed for UseBalanceRequest {
    fn lock_key(&self) -> &str {
        &self.account_number
    }
}

impl LockKeyed for CancelBalanceRequest {
    fn lock_key(&self) -> &str {
        &self.account_number
    }
}

/// Run `operation` while holding the per-account lock for `request`.
///
/// On contention the operation is never invoked and the caller receives
/// [`LedgerError::LockUnavailable`]. Once acquired, the lock is released
/// unconditionally after the operation returns; the guard also releases on
/// unwind.
pub async fn with_account_lock<R, T, F, Fut>(
    coordinator: &LockCoordinator,
    config: &LockConfig,
    request: &R,
    operation: F,
) -> Result<T, LedgerError>
where
    R: LockKeyed,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let guard = coordinator
        .acquire(request.lock_key(), config.wait_timeout, config.hold_timeout)
        .await?;
    let result = operation().await;
    guard.release();
    result
}
