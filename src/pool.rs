//! Bounded async connection pool
//!
//! Connections are shared process-wide across all `log` calls; each call
//! borrows exclusive use of one connection for its duration. The borrow is
//! scoped: [`PooledConnection`] returns its connection to the pool when
//! dropped, so every acquired connection goes back regardless of how the
//! call ends.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

use crate::connection::{Connection, ConnectionFactory};
use crate::error::{Error, Result};

/// Connection pool trait
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    /// Borrow a connection from the pool
    async fn get(&self) -> Result<PooledConnection>;

    /// Return a connection to the pool
    async fn return_connection(&self, conn: Box<dyn Connection>);

    /// Current total connection count
    fn size(&self) -> usize;

    /// Number of available borrow slots
    fn idle(&self) -> usize;

    /// Pool statistics
    fn stats(&self) -> PoolStats;

    /// Close all idle connections and refuse further borrows
    async fn close(&self) -> Result<()>;
}

/// A connection borrowed from the pool.
///
/// Dereferences to the underlying [`Connection`]. On drop the connection is
/// handed back to the pool, whatever path the borrowing call took.
pub struct PooledConnection {
    conn: Option<Box<dyn Connection>>,
    pool: Arc<dyn ConnectionPool>,
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("conn", &self.conn.as_ref().map(|_| ".."))
            .finish_non_exhaustive()
    }
}

impl PooledConnection {
    /// Wrap a connection borrowed from `pool`
    pub fn new(conn: Box<dyn Connection>, pool: Arc<dyn ConnectionPool>) -> Self {
        Self {
            conn: Some(conn),
            pool,
        }
    }
}

impl std::ops::Deref for PooledConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
            .as_ref()
            .expect("connection already returned")
            .as_ref()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let pool = Arc::clone(&self.pool);
            tokio::spawn(async move {
                pool.return_connection(conn).await;
            });
        }
    }
}

/// Pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Connections created eagerly at startup
    pub min_size: usize,
    /// Maximum total connections
    pub max_size: usize,
    /// Maximum time to wait for a borrow slot
    pub acquire_timeout: Duration,
    /// Connections older than this are recycled instead of reused
    pub max_lifetime: Duration,
    /// Connections idle longer than this are recycled instead of reused
    pub idle_timeout: Duration,
    /// Ping connections before handing them out
    pub test_on_borrow: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: 10,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Duration::from_secs(1800),
            idle_timeout: Duration::from_secs(600),
            test_on_borrow: true,
        }
    }
}

impl PoolConfig {
    /// Set the eager connection count
    pub fn with_min_size(mut self, size: usize) -> Self {
        self.min_size = size;
        self
    }

    /// Set the maximum total connections
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Set the borrow timeout
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the maximum connection lifetime
    pub fn with_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Enable/disable the ping on borrow
    pub fn with_test_on_borrow(mut self, test: bool) -> Self {
        self.test_on_borrow = test;
        self
    }
}

/// Pool statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Total connections created
    pub connections_created: u64,
    /// Total connections closed
    pub connections_closed: u64,
    /// Total borrows served
    pub acquisitions: u64,
    /// Number of borrows that timed out waiting
    pub exhausted_count: u64,
    /// Cumulative borrow wait time in milliseconds
    pub total_wait_time_ms: u64,
}

#[derive(Debug, Default)]
struct AtomicPoolStats {
    connections_created: AtomicU64,
    connections_closed: AtomicU64,
    acquisitions: AtomicU64,
    exhausted_count: AtomicU64,
    total_wait_time_ms: AtomicU64,
}

impl AtomicPoolStats {
    fn record_created(&self) {
        self.connections_created.fetch_add(1, Ordering::Relaxed);
    }

    fn record_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_acquisition(&self, wait_time_ms: u64) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        self.total_wait_time_ms
            .fetch_add(wait_time_ms, Ordering::Relaxed);
    }

    fn record_exhausted(&self) {
        self.exhausted_count.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PoolStats {
        PoolStats {
            connections_created: self.connections_created.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            exhausted_count: self.exhausted_count.load(Ordering::Relaxed),
            total_wait_time_ms: self.total_wait_time_ms.load(Ordering::Relaxed),
        }
    }
}

/// Idle-list entry with recycling metadata
struct PoolEntry {
    conn: Box<dyn Connection>,
    created_at: Instant,
    last_used: Instant,
}

/// Semaphore-bounded connection pool.
///
/// Borrowing is O(1) when an idle connection is available; otherwise a new
/// connection is created up to `max_size`. Idle connections are kept LIFO
/// and recycled when they exceed their lifetime or idle timeout.
pub struct SimplePool {
    config: PoolConfig,
    factory: Arc<dyn ConnectionFactory>,
    idle: Mutex<Vec<PoolEntry>>,
    semaphore: Semaphore,
    total_connections: AtomicUsize,
    stats: AtomicPoolStats,
    shutdown: AtomicBool,
    self_ref: tokio::sync::OnceCell<std::sync::Weak<Self>>,
}

impl SimplePool {
    /// Create a pool, eagerly opening `min_size` connections.
    pub async fn new(config: PoolConfig, factory: Arc<dyn ConnectionFactory>) -> Result<Arc<Self>> {
        let pool = Arc::new(Self {
            semaphore: Semaphore::new(config.max_size),
            config: config.clone(),
            factory,
            idle: Mutex::new(Vec::with_capacity(config.max_size)),
            total_connections: AtomicUsize::new(0),
            stats: AtomicPoolStats::default(),
            shutdown: AtomicBool::new(false),
            self_ref: tokio::sync::OnceCell::new(),
        });

        let _ = pool.self_ref.set(Arc::downgrade(&pool));

        for _ in 0..config.min_size {
            match pool.create_connection().await {
                Ok(conn) => {
                    let mut idle = pool.idle.lock().await;
                    idle.push(PoolEntry {
                        conn,
                        created_at: Instant::now(),
                        last_used: Instant::now(),
                    });
                }
                Err(e) => {
                    tracing::warn!("eager pool connection failed: {e}");
                }
            }
        }

        Ok(pool)
    }

    fn get_self_arc(&self) -> Option<Arc<Self>> {
        self.self_ref.get().and_then(std::sync::Weak::upgrade)
    }

    async fn create_connection(&self) -> Result<Box<dyn Connection>> {
        let conn = self.factory.connect().await?;
        self.total_connections.fetch_add(1, Ordering::Release);
        self.stats.record_created();
        Ok(conn)
    }

    fn should_recycle(&self, entry: &PoolEntry) -> bool {
        entry.created_at.elapsed() > self.config.max_lifetime
            || entry.last_used.elapsed() > self.config.idle_timeout
    }

    /// Pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

#[async_trait]
impl ConnectionPool for SimplePool {
    async fn get(&self) -> Result<PooledConnection> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(Error::acquire("pool is shut down"));
        }

        let start = Instant::now();

        let permit = tokio::time::timeout(self.config.acquire_timeout, self.semaphore.acquire())
            .await
            .map_err(|_| {
                self.stats.record_exhausted();
                Error::acquire(format!(
                    "timed out waiting for a connection ({}ms)",
                    self.config.acquire_timeout.as_millis()
                ))
            })?
            .map_err(|_| Error::acquire("pool semaphore closed"))?;

        // Reuse an idle connection, recycling expired or dead ones.
        let conn = {
            let mut idle = self.idle.lock().await;
            loop {
                match idle.pop() {
                    Some(entry) => {
                        if self.should_recycle(&entry) {
                            self.total_connections.fetch_sub(1, Ordering::Release);
                            self.stats.record_closed();
                            continue;
                        }
                        if self.config.test_on_borrow && !entry.conn.is_valid().await {
                            self.total_connections.fetch_sub(1, Ordering::Release);
                            self.stats.record_closed();
                            continue;
                        }
                        break Some(entry.conn);
                    }
                    None => break None,
                }
            }
        };

        let conn = match conn {
            Some(c) => c,
            None => match self.create_connection().await {
                Ok(c) => c,
                Err(e) => {
                    drop(permit);
                    return Err(e);
                }
            },
        };

        let wait_ms = start.elapsed().as_millis() as u64;
        self.stats.record_acquisition(wait_ms);

        // The permit travels with the connection; return_connection re-adds it.
        permit.forget();

        let pool_arc = self
            .get_self_arc()
            .ok_or_else(|| Error::acquire("pool has been dropped"))?;

        Ok(PooledConnection::new(conn, pool_arc))
    }

    async fn return_connection(&self, conn: Box<dyn Connection>) {
        self.semaphore.add_permits(1);

        if self.shutdown.load(Ordering::Acquire) {
            let _ = conn.close().await;
            self.total_connections.fetch_sub(1, Ordering::Release);
            self.stats.record_closed();
            return;
        }

        let mut idle = self.idle.lock().await;
        idle.push(PoolEntry {
            conn,
            created_at: Instant::now(),
            last_used: Instant::now(),
        });
    }

    fn size(&self) -> usize {
        self.total_connections.load(Ordering::Acquire)
    }

    fn idle(&self) -> usize {
        self.semaphore.available_permits()
    }

    fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    async fn close(&self) -> Result<()> {
        self.shutdown.store(true, Ordering::Release);

        let mut idle = self.idle.lock().await;
        for entry in idle.drain(..) {
            let _ = entry.conn.close().await;
            self.total_connections.fetch_sub(1, Ordering::Release);
            self.stats.record_closed();
        }

        Ok(())
    }
}
