//! MySQL backend via `mysql_async`
//!
//! One [`MySqlConnection`] wraps one `mysql_async::Conn`. The connection is
//! kept behind a take/put mutex so `execute` can hand the driver an owned
//! connection across await points.

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::SinkConfig;
use crate::connection::{Connection, ConnectionFactory};
use crate::error::{Error, Result};
use crate::types::Value;

/// Convert a logtable value to a MySQL parameter
fn value_to_sql(value: &Value) -> mysql_async::Value {
    match value {
        Value::Null => mysql_async::Value::NULL,
        Value::Bool(b) => mysql_async::Value::from(*b),
        Value::Int64(n) => mysql_async::Value::from(*n),
        Value::Float64(n) => mysql_async::Value::from(*n),
        Value::String(s) => mysql_async::Value::from(s.clone()),
        Value::DateTime(dt) => {
            use chrono::{Datelike, Timelike};
            mysql_async::Value::Date(
                dt.year() as u16,
                dt.month() as u8,
                dt.day() as u8,
                dt.hour() as u8,
                dt.minute() as u8,
                dt.second() as u8,
                dt.nanosecond() / 1000,
            )
        }
        Value::DateTimeTz(dt) => {
            use chrono::{Datelike, Timelike};
            let naive = dt.naive_utc();
            mysql_async::Value::Date(
                naive.year() as u16,
                naive.month() as u8,
                naive.day() as u8,
                naive.hour() as u8,
                naive.minute() as u8,
                naive.second() as u8,
                naive.nanosecond() / 1000,
            )
        }
        Value::Json(j) => mysql_async::Value::from(j.to_string()),
    }
}

/// MySQL connection implementation
pub struct MySqlConnection {
    conn: Mutex<Option<Conn>>,
}

impl MySqlConnection {
    /// Wrap an already established connection
    pub fn new(conn: Conn) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }

    /// Open a connection with the given options
    pub async fn connect(opts: OptsBuilder, timeout: Duration) -> Result<Self> {
        let conn = tokio::time::timeout(timeout, Conn::new(opts))
            .await
            .map_err(|_| {
                Error::acquire(format!("MySQL connect timed out after {}ms", timeout.as_millis()))
            })?
            .map_err(|e| Error::acquire_with_source("failed to connect to MySQL", e))?;
        Ok(Self::new(conn))
    }

    async fn take_conn(&self) -> Option<Conn> {
        self.conn.lock().await.take()
    }

    async fn put_conn(&self, conn: Conn) {
        *self.conn.lock().await = Some(conn);
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let mut conn = self
            .take_conn()
            .await
            .ok_or_else(|| Error::insert("connection not available"))?;

        let mysql_params: Vec<mysql_async::Value> = params.iter().map(value_to_sql).collect();

        let result = conn.exec_drop(sql, mysql_params).await;
        let affected = conn.affected_rows();
        self.put_conn(conn).await;

        match result {
            Ok(()) => Ok(affected),
            Err(e) => Err(Error::Insert {
                message: format!("failed to execute statement: {e}"),
                sql: Some(sql.to_string()),
                source: Some(Box::new(e)),
            }),
        }
    }

    async fn is_valid(&self) -> bool {
        if let Some(conn) = self.conn.lock().await.as_mut() {
            conn.ping().await.is_ok()
        } else {
            false
        }
    }

    async fn close(&self) -> Result<()> {
        if let Some(conn) = self.take_conn().await {
            conn.disconnect()
                .await
                .map_err(|e| Error::acquire_with_source("failed to close connection", e))?;
        }
        Ok(())
    }
}

/// Factory producing MySQL connections from the sink's connection options
pub struct MySqlConnectionFactory {
    opts: OptsBuilder,
    connect_timeout: Duration,
}

impl MySqlConnectionFactory {
    /// Build a factory from the sink configuration
    pub fn new(config: &SinkConfig) -> Self {
        let opts = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()));
        Self {
            opts,
            connect_timeout: config.connect_timeout,
        }
    }
}

#[async_trait]
impl ConnectionFactory for MySqlConnectionFactory {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let conn = MySqlConnection::connect(self.opts.clone(), self.connect_timeout).await?;
        Ok(Box::new(conn))
    }
}
