//! LMDB storage backend for synchronized transaction history.
//!
//! Implements the store traits from `txsync-store` using the `heed` LMDB bindings.
//! All networks share one environment and one named database keyed by network.

pub mod environment;
pub mod error;
pub mod history;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use history::{LmdbHistoryStore, LmdbHistoryStoreFactory};
