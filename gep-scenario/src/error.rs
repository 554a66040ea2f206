/// Error types for scenario requests
use gep_db::DbError;
use thiserror::Error;

/// Everything a scenario request can fail with. All of these are scoped to
/// the request; none is retried.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Scenario, model or feature absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Year outside the model's timesteps, or unusable model metadata
    #[error("{0}")]
    InvalidParameter(String),

    /// Filter key unknown to the model, or a filter without min/max/options
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Filter parameters in the query string could not be reconstructed
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A stored list column matched none of the known encodings
    #[error("Could not decode model {field}: {message}")]
    Decode {
        field: String,
        raw: String,
        message: String,
    },

    /// The storage layer failed
    #[error("Storage error: {0}")]
    Storage(DbError),
}

impl From<DbError> for ScenarioError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => ScenarioError::NotFound(what),
            DbError::InvalidIdentifier(name) => {
                ScenarioError::InvalidParameter(format!("invalid column name {:?}", name))
            }
            other => ScenarioError::Storage(other),
        }
    }
}

/// Type alias for Results using ScenarioError
pub type Result<T> = std::result::Result<T, ScenarioError>;
