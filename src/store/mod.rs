//! In-memory collaborator stores
//!
//! Durable persistence is an external collaborator of this system; these
//! DashMap-backed stores implement the exact interfaces the engine consumes
//! (account lookup by number and user, user lookup by id, ledger append and
//! lookup by transaction id) with process-local storage.

pub mod accounts;
pub mod ledger;
pub mod users;

pub use accounts::AccountStore;
pub use ledger::LedgerStore;
pub use users::UserStore;
