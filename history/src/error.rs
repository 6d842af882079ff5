use thiserror::Error;
use txsync_store::StoreError;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("node RPC error: {0}")]
    Node(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("giving up on {operation} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}
