//! The delivery pipeline: log record in, table row out
//!
//! Per call: borrow a pooled connection, translate the record into a column
//! row under the resolved field scheme, execute one parameterized insert,
//! and report the outcome exactly once through the returned `Result`.
//! Subscribers on the observer channel additionally see a `Logged` event for
//! every stored record and an `Error` event for every failed insert.
//!
//! Acquisition failures are reported only through the `Result`, not on the
//! observer channel: the channel reflects storage outcomes, and an
//! acquisition failure never reached storage.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::{ErrorCategory, Result};
use crate::fields::{FieldScheme, LogField};
use crate::pool::{ConnectionPool, PoolStats};
use crate::record::LogRecord;

#[cfg(feature = "mysql")]
use crate::config::SinkConfig;
#[cfg(feature = "mysql")]
use crate::mysql::MySqlConnectionFactory;
#[cfg(feature = "mysql")]
use crate::pool::SimplePool;

/// Observer-channel capacity; slow subscribers lag rather than block the pipeline
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Outcome events published on the observer channel
#[derive(Debug, Clone)]
pub enum SinkEvent {
    /// A record was stored; carries the original record unchanged
    Logged(LogRecord),
    /// An insert failed at the driver
    Error {
        /// Rendered driver error
        message: String,
        /// Where in the pipeline the failure occurred
        category: ErrorCategory,
    },
}

struct Inner {
    pool: Arc<dyn ConnectionPool>,
    scheme: FieldScheme,
    table: String,
    insert_sql: String,
    events: broadcast::Sender<SinkEvent>,
}

/// A sink that persists each log record as one row in a relational table.
///
/// The field scheme and insert statement are resolved once at construction;
/// concurrent `log` calls share them immutably. Cloning the sink is cheap
/// and clones share the pool and observer channel.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<Inner>,
}

impl LogSink {
    /// Build a sink over an existing pool.
    ///
    /// `fields` merges over the default column names; unspecified fields
    /// keep their defaults.
    pub fn with_pool(
        table: impl Into<String>,
        fields: &BTreeMap<LogField, String>,
        pool: Arc<dyn ConnectionPool>,
    ) -> Self {
        let scheme = FieldScheme::resolve(fields);
        let table = table.into();
        let insert_sql = render_insert_sql(&table, &scheme);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                pool,
                scheme,
                table,
                insert_sql,
                events,
            }),
        }
    }

    /// Validate the configuration and build a MySQL-backed sink.
    ///
    /// Fails fast with a distinct configuration error for each missing
    /// required option; no sink is produced on failure. The pool is created
    /// once here and owned by the sink for its lifetime.
    #[cfg(feature = "mysql")]
    pub async fn connect(config: SinkConfig) -> Result<Self> {
        config.validate()?;

        let factory = Arc::new(MySqlConnectionFactory::new(&config));
        let pool = SimplePool::new(config.pool.clone(), factory).await?;

        Ok(Self::with_pool(config.table, &config.fields, pool))
    }

    /// Persist one record, reporting the outcome exactly once.
    ///
    /// The call borrows one pooled connection for its duration; the
    /// connection goes back to the pool on every exit path. Completion order
    /// between concurrent calls is unspecified.
    pub async fn log(&self, record: LogRecord) -> Result<()> {
        // Acquisition failure: Result only, no observer event.
        let conn = self.inner.pool.get().await?;

        let row = record.to_row(&self.inner.scheme)?;

        match conn.execute(&self.inner.insert_sql, &row.into_values()).await {
            Ok(_) => {
                tracing::debug!(table = %self.inner.table, level = %record.level, "log row stored");
                let _ = self.inner.events.send(SinkEvent::Logged(record));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(table = %self.inner.table, error = %e, "log row insert failed");
                let _ = self.inner.events.send(SinkEvent::Error {
                    message: e.to_string(),
                    category: e.category(),
                });
                Err(e)
            }
        }
    }

    /// Persist one record without waiting for the outcome.
    ///
    /// The pipeline runs as a spawned task; failures surface on the observer
    /// channel and in tracing output only. Never panics past this boundary.
    pub fn enqueue(&self, record: LogRecord) {
        let sink = self.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.log(record).await {
                tracing::warn!(error = %e, "detached log call failed");
            }
        });
    }

    /// Subscribe to the observer channel.
    ///
    /// Events published before this call are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<SinkEvent> {
        self.inner.events.subscribe()
    }

    /// The table rows are written to
    pub fn table(&self) -> &str {
        &self.inner.table
    }

    /// The resolved field scheme
    pub fn scheme(&self) -> &FieldScheme {
        &self.inner.scheme
    }

    /// Connection pool statistics
    pub fn pool_stats(&self) -> PoolStats {
        self.inner.pool.stats()
    }

    /// Close the underlying pool; subsequent `log` calls fail to acquire.
    pub async fn close(&self) -> Result<()> {
        self.inner.pool.close().await
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink")
            .field("table", &self.inner.table)
            .field("scheme", &self.inner.scheme)
            .finish_non_exhaustive()
    }
}

/// Render the per-sink insert statement once; only values vary per call.
fn render_insert_sql(table: &str, scheme: &FieldScheme) -> String {
    let assignments: Vec<String> = scheme.columns().map(|c| format!("`{c}` = ?")).collect();
    format!("INSERT INTO `{table}` SET {}", assignments.join(", "))
}
