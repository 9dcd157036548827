//! Sink construction options
//!
//! All connection options are required and validated fail-fast: a missing
//! host, user, password, database, or table each produce a distinct
//! configuration error and no sink is constructed. The field-name overrides
//! and pool settings are optional.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::fields::LogField;
use crate::pool::PoolConfig;

/// Default MySQL port
pub const DEFAULT_PORT: u16 = 3306;

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for constructing a [`crate::sink::LogSink`].
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database username
    pub user: String,
    /// Database password
    pub password: String,
    /// Database name
    pub database: String,
    /// Table the log rows are written to
    pub table: String,
    /// Optional logical→physical column-name overrides; unspecified fields
    /// fall back to the built-in defaults
    pub fields: BTreeMap<LogField, String>,
    /// Connection pool settings
    pub pool: PoolConfig,
    /// Timeout for establishing a single connection
    pub connect_timeout: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            table: String::new(),
            fields: BTreeMap::new(),
            pool: PoolConfig::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl SinkConfig {
    /// Create a config with the required connection options
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            table: table.into(),
            ..Default::default()
        }
    }

    /// Set the database port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the physical column name for one logical field
    pub fn with_field(mut self, field: LogField, column: impl Into<String>) -> Self {
        self.fields.insert(field, column.into());
        self
    }

    /// Replace the full set of column-name overrides
    pub fn with_fields(mut self, fields: BTreeMap<LogField, String>) -> Self {
        self.fields = fields;
        self
    }

    /// Set the pool configuration
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Check that every required option is present.
    ///
    /// Each missing option fails with its own configuration error; the first
    /// missing one (in host, user, password, database, table order) is
    /// reported.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::config("the database host is required"));
        }
        if self.user.is_empty() {
            return Err(Error::config("the database username is required"));
        }
        if self.password.is_empty() {
            return Err(Error::config("the database password is required"));
        }
        if self.database.is_empty() {
            return Err(Error::config("the database name is required"));
        }
        if self.table.is_empty() {
            return Err(Error::config("the database table is required"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never let the password reach logs.
        f.debug_struct("SinkConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("table", &self.table)
            .field("fields", &self.fields)
            .field("pool", &self.pool)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> SinkConfig {
        SinkConfig::new("localhost", "logger", "secret", "app", "sys_logs")
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(full_config().validate().is_ok());
    }

    #[test]
    fn test_each_missing_option_is_distinct() {
        let cases = [
            (SinkConfig::new("", "u", "p", "d", "t"), "host"),
            (SinkConfig::new("h", "", "p", "d", "t"), "username"),
            (SinkConfig::new("h", "u", "", "d", "t"), "password"),
            (SinkConfig::new("h", "u", "p", "", "t"), "name"),
            (SinkConfig::new("h", "u", "p", "d", ""), "table"),
        ];
        for (config, expected) in cases {
            let err = config.validate().unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "expected {expected:?} in {err}"
            );
        }
    }

    #[test]
    fn test_builder_methods() {
        let config = full_config()
            .with_port(3307)
            .with_field(LogField::Level, "mylevel")
            .with_connect_timeout(Duration::from_secs(5));

        assert_eq!(config.port, 3307);
        assert_eq!(config.fields.get(&LogField::Level).unwrap(), "mylevel");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", full_config());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }
}
