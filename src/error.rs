//! Error types for logtable
//!
//! Classifies failures by where they occur in the delivery pipeline:
//! - Configuration errors (fail construction, never produce a sink)
//! - Acquisition errors (pool exhausted or connect failure, retriable)
//! - Insert errors (driver-level failure while writing the row)
//! - Translation errors (record could not be mapped to a row)

use std::fmt;
use thiserror::Error;

/// Result type for logtable operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid or missing construction option
    Configuration,
    /// Failed to obtain a pooled connection (retriable with backoff)
    Acquire,
    /// The insert statement failed at the driver
    Insert,
    /// The log record could not be translated into a row
    Translation,
}

impl ErrorCategory {
    /// Whether errors in this category are generally retriable
    #[inline]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Acquire)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Acquire => write!(f, "acquire"),
            Self::Insert => write!(f, "insert"),
            Self::Translation => write!(f, "translation"),
        }
    }
}

/// Main error type for logtable
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing construction option
    #[error("configuration error: {message}")]
    Configuration {
        /// What was missing or invalid
        message: String,
    },

    /// Failed to obtain a connection from the pool
    #[error("acquire error: {message}")]
    Acquire {
        /// Description of the acquisition failure
        message: String,
        /// Underlying driver error, when one exists
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Insert execution failed
    #[error("insert error: {message}")]
    Insert {
        /// Description of the insert failure
        message: String,
        /// The statement that failed, when known
        sql: Option<String>,
        /// Underlying driver error, when one exists
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Record could not be translated into a column row
    #[error("translation error: {message}")]
    Translation {
        /// What made the record untranslatable
        message: String,
    },
}

impl Error {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Acquire { .. } => ErrorCategory::Acquire,
            Self::Insert { .. } => ErrorCategory::Insert,
            Self::Translation { .. } => ErrorCategory::Translation,
        }
    }

    /// Whether this error is retriable
    #[inline]
    pub fn is_retriable(&self) -> bool {
        self.category().is_retriable()
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an acquisition error
    pub fn acquire(message: impl Into<String>) -> Self {
        Self::Acquire {
            message: message.into(),
            source: None,
        }
    }

    /// Create an acquisition error with the underlying driver error
    pub fn acquire_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Acquire {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an insert error
    pub fn insert(message: impl Into<String>) -> Self {
        Self::Insert {
            message: message.into(),
            sql: None,
            source: None,
        }
    }

    /// Create an insert error with the statement that failed
    pub fn insert_with_sql(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Insert {
            message: message.into(),
            sql: Some(sql.into()),
            source: None,
        }
    }

    /// Create a translation error
    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation {
            message: message.into(),
        }
    }
}
