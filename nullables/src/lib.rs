//! Nullable infrastructure for deterministic testing.
//!
//! The external dependencies of the synchronization service (persistent
//! store, ledger node) are abstracted behind traits. This crate provides
//! test-friendly implementations that:
//! - Keep all state in memory and never touch the filesystem or network
//! - Can be controlled programmatically (script transactions, inject failures)
//! - Record what was asked of them for assertions
//!
//! Usage: swap real implementations for nullables in tests.

pub mod ledger;
pub mod store;

pub use ledger::NullLedger;
pub use store::{NullHistoryStore, NullHistoryStoreFactory};
