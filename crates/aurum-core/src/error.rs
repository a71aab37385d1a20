//! Error types for aurum

use thiserror::Error;

/// Errors surfaced across the tracker
#[derive(Error, Debug)]
pub enum AurumError {
    // Session preconditions
    #[error("disallowed game mode: {0}")]
    DisallowedGameMode(String),

    #[error("session scope could not be identified")]
    UnidentifiedScope,

    // Key codec
    #[error("invalid position key: {0}")]
    InvalidPositionKey(String),

    // Persisted configuration
    #[error("configuration io error: {0}")]
    StoreIo(String),

    #[error("configuration malformed: {0}")]
    StoreFormat(String),

    // Remote ledger
    #[error("ledger rejected {endpoint}: status {status}")]
    LedgerRejected { endpoint: String, status: u16 },

    #[error("ledger transport error: {0}")]
    LedgerTransport(String),
}

/// Result type for aurum operations
pub type AurumResult<T> = Result<T, AurumError>;
