//! Fundamental types for transaction-history synchronization.
//!
//! This crate defines the values shared across every other crate in the workspace:
//! networks, addresses, hashes, amounts, block ranges and the transaction record.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod network;
pub mod range;
pub mod time;
pub mod transaction;

pub use address::AccountAddress;
pub use amount::Amount;
pub use error::TypesError;
pub use hash::TxHash;
pub use network::NetworkId;
pub use range::{BatchRange, BlockNumber, RangePurpose};
pub use time::Timestamp;
pub use transaction::{sort_canonical, Direction, Transaction, TransactionBatch, TxStatus};
