//! Business logic components
//!
//! - [`processor`] - validated balance mutations and ledger appends
//! - [`account_service`] - account lifecycle (open, close, list)
//! - [`engine`] - orchestration: request validation, lock guarding, and
//!   compensating failure records

pub mod account_service;
pub mod engine;
pub mod processor;

pub use account_service::AccountService;
pub use engine::LedgerEngine;
pub use processor::TransactionProcessor;
