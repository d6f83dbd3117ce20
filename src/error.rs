// Error types shared by the position adapter, the players and the learning store.

use thiserror::Error;

/// Errors surfaced by the public API of the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A move was requested in a position where none exists.
    #[error("no legal move available in position {fen}")]
    NoLegalMove { fen: String },

    /// A move written in SAN or UCI could not be matched to a legal move.
    #[error("invalid move notation: {0}")]
    InvalidMoveNotation(String),

    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    /// Result codes other than `1-0`, `0-1`, `1/2-1/2` and `*`.
    #[error("invalid game result code: {0}")]
    InvalidResultCode(String),

    /// The learning store could not be decoded, even after trimming trailing bytes.
    #[error("learning store is corrupted: {0}")]
    PersistenceCorruption(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
