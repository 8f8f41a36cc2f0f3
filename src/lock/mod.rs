//! Per-account mutual exclusion
//!
//! - [`coordinator`] - keyed exclusive locks with wait timeout and lease
//!   expiry
//! - [`guard`] - lock key projection from request shapes and the guarded
//!   invocation wrapper

pub mod coordinator;
pub mod guard;

pub use coordinator::{LockConfig, LockCoordinator, LockGuard};
pub use guard::{with_account_lock, LockKeyed};
