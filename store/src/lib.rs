//! Abstract storage traits for synchronized transaction history.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod error;
pub mod history_store;
pub mod stored_history;

pub use error::StoreError;
pub use history_store::{HistoryStore, HistoryStoreFactory};
pub use stored_history::StoredHistory;
