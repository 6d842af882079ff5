//! Transaction-history synchronization for a wallet account.
//!
//! Provides:
//! - [`TransactionHistory`] and its batch reconciliation (`merge_batch`)
//! - [`TransactionHistoryService`]: rehydrates history from a store, then runs
//!   a sequential scan loop and a tip watch loop, folding every fetched batch,
//!   persisting it and publishing the updated transaction list
//! - [`NodeClient`]: JSON-RPC fetcher and tip source
//! - [`RetryPolicy`] and [`SyncConfig`]

pub mod config;
pub mod error;
pub mod fetcher;
pub mod history;
pub mod node_client;
pub mod retry;
pub mod service;
pub mod tips;

pub use config::SyncConfig;
pub use error::HistoryError;
pub use fetcher::TransactionFetcher;
pub use history::TransactionHistory;
pub use node_client::NodeClient;
pub use retry::RetryPolicy;
pub use service::{HistoryWatch, TransactionHistoryService};
pub use tips::ChainTips;
