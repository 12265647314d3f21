//! Error types for pgmodel

use thiserror::Error;

/// Result type alias for pgmodel operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for criteria compilation and model operations
#[derive(Debug, Error)]
pub enum ModelError {
    /// Caller supplied arguments the compiler or facade cannot accept
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal compiler inconsistency (placeholder/parameter mismatch)
    #[error("Query build error: {0}")]
    QueryBuild(String),

    /// Backend or driver failure while executing a statement
    #[error("Execution error ({context}): {source}")]
    Execution {
        context: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Error re-raised by a facade operation with extra context
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ModelError>,
    },
}

impl ModelError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a query build error
    pub fn query_build(message: impl Into<String>) -> Self {
        Self::QueryBuild(message.into())
    }

    /// Wrap a driver error with the operation that triggered it
    pub fn execution(context: impl Into<String>, source: tokio_postgres::Error) -> Self {
        Self::Execution {
            context: context.into(),
            source,
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Re-raise this error with added context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with any added context peeled off.
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self.root(), Self::Validation(_))
    }

    /// Check if this is a query build error
    pub fn is_query_build(&self) -> bool {
        matches!(self.root(), Self::QueryBuild(_))
    }

    /// Check if this error came from the backend (driver or pool)
    pub fn is_execution(&self) -> bool {
        match self.root() {
            Self::Execution { .. } => true,
            #[cfg(feature = "pool")]
            Self::Pool(_) => true,
            _ => false,
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for ModelError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
