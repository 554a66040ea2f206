/// Error types for the storage layer
use thiserror::Error;

/// Main error type for storage operations
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLite reported an error preparing, binding or stepping a statement
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A single-row query matched nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// A table or column name is not a plain SQL identifier
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// Type alias for Results using DbError
pub type Result<T> = std::result::Result<T, DbError>;
