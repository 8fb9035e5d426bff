use std::fmt;

use tokio_postgres::error::SqlState;

/// Result type for database operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the chat and algo stores
#[derive(Debug)]
pub enum Error {
    /// Invalid input rejected before reaching the database
    ValidationError(String),

    /// Database unreachable or misconfigured
    ConnectionError(String),

    /// Row that must exist does not
    NotFoundError(String),

    /// A unique constraint rejected the write
    UniqueViolation(String),

    /// SQL errors and row decoding failures
    DatabaseError(String),

    /// Connection pool exhausted or closed
    PoolError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            Error::NotFoundError(msg) => write!(f, "Not found: {}", msg),
            Error::UniqueViolation(msg) => write!(f, "Unique violation: {}", msg),
            Error::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            Error::PoolError(msg) => write!(f, "Pool error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<tokio_postgres::Error> for Error {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_error) = err.as_db_error() {
            if db_error.code() == &SqlState::UNIQUE_VIOLATION {
                return Error::UniqueViolation(
                    db_error
                        .constraint()
                        .unwrap_or_else(|| db_error.message())
                        .to_string(),
                );
            }
            return Error::DatabaseError(format!(
                "{}: {}",
                db_error.code().code(),
                db_error.message()
            ));
        }

        Error::DatabaseError(format!("{:?}", err))
    }
}

impl From<deadpool_postgres::PoolError> for Error {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Error::PoolError(err.to_string())
    }
}

impl From<deadpool_postgres::BuildError> for Error {
    fn from(err: deadpool_postgres::BuildError) -> Self {
        Error::ConnectionError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ValidationError(format!("JSON error: {}", err))
    }
}
