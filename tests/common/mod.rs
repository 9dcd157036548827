//! Shared mock backend for integration tests
//!
//! `MockFactory` produces `MockConnection`s that record every executed
//! statement and can be switched to fail connects or inserts, simulating
//! pool-acquisition and driver failures without a database.
#![allow(dead_code)]

use async_trait::async_trait;
use logtable::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Every statement executed across all mock connections, in order
pub type ExecLog = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

pub struct MockConnection {
    exec_log: ExecLog,
    fail_inserts: Arc<AtomicBool>,
    valid: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(Error::insert_with_sql("simulated duplicate key", sql));
        }
        self.exec_log
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(1)
    }

    async fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

pub struct MockFactory {
    pub exec_log: ExecLog,
    pub fail_connects: Arc<AtomicBool>,
    pub fail_inserts: Arc<AtomicBool>,
    /// All connections stay valid unless this is flipped
    pub valid: Arc<AtomicBool>,
    pub created: AtomicUsize,
}

impl Default for MockFactory {
    fn default() -> Self {
        Self {
            exec_log: Arc::new(Mutex::new(Vec::new())),
            fail_connects: Arc::new(AtomicBool::new(false)),
            fail_inserts: Arc::new(AtomicBool::new(false)),
            valid: Arc::new(AtomicBool::new(true)),
            created: AtomicUsize::new(0),
        }
    }
}

impl MockFactory {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.exec_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        if self.fail_connects.load(Ordering::SeqCst) {
            return Err(Error::acquire("simulated connect failure"));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            exec_log: Arc::clone(&self.exec_log),
            fail_inserts: Arc::clone(&self.fail_inserts),
            valid: Arc::clone(&self.valid),
        }))
    }
}

/// Yield long enough for spawned connection-return tasks to run
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}
