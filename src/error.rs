//! Load-time errors
//!
//! Everything that can go wrong before a game starts. Once a game is running
//! nothing in the core is fallible: illegal commands are dropped, not reported.

use std::path::PathBuf;

/// Failure while loading boards, moves, or piece-type templates
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}:{line}: invalid move rule {text:?}")]
    InvalidMove {
        path: PathBuf,
        line: usize,
        text: String,
    },

    #[error("invalid board: {0}")]
    InvalidBoard(String),

    #[error("piece type {piece_type:?}: {reason}")]
    InvalidPieceType { piece_type: String, reason: String },

    #[error("unknown piece type {0:?} on board")]
    UnknownPieceType(String),

    #[error("duplicate piece id {0:?}")]
    DuplicatePieceId(String),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn piece_type(piece_type: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPieceType {
            piece_type: piece_type.to_string(),
            reason: reason.into(),
        }
    }
}
