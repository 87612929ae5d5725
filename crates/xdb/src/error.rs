//! Error types for xdb

use thiserror::Error;

/// Result type alias for xdb operations
pub type XdbResult<T> = Result<T, XdbError>;

/// Error types for building, executing and mapping statements
#[derive(Debug, Error)]
pub enum XdbError {
    /// A single-row read found no row.
    ///
    /// Returned verbatim by `value`, `row` and `reflect_row`; the plural readers
    /// report an empty result instead.
    #[error("no rows in result set")]
    NoRows,

    /// A single-column extraction named a column the result set does not have
    #[error("column '{0}' not found in result set")]
    ColumnNotFound(String),

    /// The destination cannot receive the result
    #[error("invalid destination: {0}")]
    Shape(String),

    /// The cursor returned a row that does not fit the read
    #[error("scan error: {0}")]
    Scan(String),

    /// Query execution error from tokio-postgres
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Error raised by any other driver
    #[error("Driver error: {0}")]
    Driver(Box<dyn std::error::Error + Send + Sync>),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// An argument source could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl XdbError {
    /// Wrap a foreign driver error without altering its message
    pub fn driver<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Driver(err.into())
    }

    /// Create a scan error
    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan(message.into())
    }

    /// Create a destination shape error
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// Check if this is the distinguished "no rows" condition
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }

    /// Check if this is a column-not-found error
    pub fn is_column_not_found(&self) -> bool {
        matches!(self, Self::ColumnNotFound(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for XdbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
