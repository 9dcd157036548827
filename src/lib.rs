//! # logtable
//!
//! Persists structured application log records as rows in a MySQL table,
//! one row per record, through a bounded async connection pool.
//!
//! The table must exist before logging starts; provisioning is out of scope.
//! With the default field scheme the expected layout is:
//!
//! ```sql
//! CREATE TABLE `app`.`sys_logs_default` (
//!   `id` INT NOT NULL AUTO_INCREMENT,
//!   `level` VARCHAR(16) NOT NULL,
//!   `metadata` VARCHAR(2048) NOT NULL,
//!   `method` VARCHAR(16),
//!   `endpoint` VARCHAR(1024),
//!   `req` VARCHAR(2048),
//!   `responsecode` VARCHAR(8),
//!   `res` VARCHAR(2048),
//!   `timestamp` DATETIME NOT NULL,
//!   `responsetime` INT,
//!   PRIMARY KEY (`id`));
//! ```
//!
//! Column names are remappable per logical field; unspecified fields keep
//! their defaults, so a partially customized table like this works too:
//!
//! ```sql
//! CREATE TABLE `app`.`sys_logs_custom` (
//!   `id` INT NOT NULL AUTO_INCREMENT,
//!   `mylevel` VARCHAR(16) NOT NULL,
//!   `metadata` JSON NOT NULL,
//!   `method` VARCHAR(16),
//!   `endpoint` VARCHAR(1024),
//!   `req` JSON,
//!   `responsecode` VARCHAR(8),
//!   `res` JSON,
//!   `addDate` DATETIME NOT NULL,
//!   `responsetime` INT,
//!   PRIMARY KEY (`id`));
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use logtable::prelude::*;
//!
//! let config = SinkConfig::new("localhost", "logger", "secret", "app", "sys_logs_default")
//!     .with_field(LogField::Level, "mylevel");
//!
//! let sink = LogSink::connect(config).await?;
//!
//! // Await the outcome...
//! let record = LogRecord::new("info", "GET /users 200")
//!     .with_meta(RequestMeta::new(json!({}), json!({}), 12));
//! sink.log(record).await?;
//!
//! // ...or fire and forget, observing outcomes on the event channel.
//! let mut events = sink.subscribe();
//! sink.enqueue(LogRecord::new("info", "GET /health 200"));
//! ```
//!
//! ## Feature flags
//!
//! - `mysql` (default) — MySQL/MariaDB backend via mysql_async. Without it
//!   the crate compiles against the [`connection::Connection`] traits only,
//!   for custom backends and tests.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod error;
pub mod fields;
pub mod pool;
pub mod record;
pub mod sink;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;

/// Prelude module for convenient imports
pub mod prelude {
    // Error types
    pub use crate::error::{Error, ErrorCategory, Result};

    // Value and row types
    pub use crate::types::{ColumnRow, Value};

    // Field scheme
    pub use crate::fields::{FieldScheme, LogField};

    // Records
    pub use crate::record::{LogRecord, RequestMeta};

    // Configuration
    pub use crate::config::SinkConfig;

    // Pool types
    pub use crate::pool::{ConnectionPool, PoolConfig, PoolStats, PooledConnection, SimplePool};

    // Connection traits
    pub use crate::connection::{Connection, ConnectionFactory};

    // The sink
    pub use crate::sink::{LogSink, SinkEvent};

    #[cfg(feature = "mysql")]
    pub use crate::mysql::{MySqlConnection, MySqlConnectionFactory};
}

// Re-export commonly used items at crate root
pub use error::{Error, Result};
pub use record::LogRecord;
pub use sink::LogSink;
