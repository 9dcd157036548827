//! Connection traits
//!
//! The delivery pipeline only needs three things from a connection: execute
//! a parameterized statement, answer a liveness probe, and close. Backends
//! implement [`Connection`] and hand new connections out through a
//! [`ConnectionFactory`], which the pool drives.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Value;

/// A connection to a database
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a statement that modifies data, returns affected row count
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Check if the connection is valid/alive
    async fn is_valid(&self) -> bool;

    /// Close the connection
    async fn close(&self) -> Result<()>;
}

/// Factory for creating connections
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Create a new connection
    async fn connect(&self) -> Result<Box<dyn Connection>>;
}
