use thiserror::Error;

/// Top-level error type for litescan.
#[derive(Debug, Error)]
pub enum LitescanError {
    /// The buffer is not a valid or supported SQLite3 database, or its
    /// contents are internally inconsistent. Malformed input is not
    /// transient; retrying cannot help.
    #[error("database is corrupt: {0}")]
    Corrupt(String),

    /// The database is well-formed but does not contain the requested
    /// table. Distinct from corruption: the input was valid.
    #[error("table {0:?} not found")]
    TableNotFound(String),
}

pub type Result<T> = std::result::Result<T, LitescanError>;
