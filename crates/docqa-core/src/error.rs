use std::path::PathBuf;

use thiserror::Error;

/// Which side of the corpus store an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Dense,
    Sparse,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Dense => f.write_str("dense"),
            IndexKind::Sparse => f.write_str("sparse"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{kind} index not initialized at {}; run ingestion first", .location.display())]
    IndexNotInitialized { kind: IndexKind, location: PathBuf },

    #[error("OCR unavailable for {}: {reason}", .path.display())]
    OcrUnavailable { path: PathBuf, reason: String },

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn not_initialized(kind: IndexKind, location: impl Into<PathBuf>) -> Self {
        Error::IndexNotInitialized { kind, location: location.into() }
    }

    /// True when the caller should tell the user to run ingestion.
    pub fn is_index_missing(&self) -> bool {
        matches!(self, Error::IndexNotInitialized { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Other(e.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
