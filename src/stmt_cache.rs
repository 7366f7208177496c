//! Prepared-statement cache / 预编译语句缓存
//!
//! Two-level ownership: an outer map keyed by connection identity, an
//! inner map keyed by SQL text. One global lock serializes every
//! mutation, so two callers racing on the same (connection, SQL) pair
//! cannot both prepare and leak a statement. That can serialize
//! unrelated connections' preparation; accepted given low contention.
//!
//! The cache never keeps a dead connection's resources alive: a cached
//! entry is revalidated against connection liveness on every lookup, and
//! the host's pooling layer calls `release` when it closes a connection.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::catalog::{Connection, ConnectionId, StatementHandle};
use crate::error::Result;

#[derive(Default)]
pub struct StatementCache {
    cache: Mutex<HashMap<ConnectionId, HashMap<String, StatementHandle>>>,
}

impl StatementCache {
    pub fn new() -> Self {
        StatementCache::default()
    }

    /// Cached prepared statement for (connection, SQL), preparing and
    /// caching on miss. A hit against a closed connection is discarded
    /// and treated as a miss; preparing anew then fails through the
    /// connection's own resource error.
    pub fn prepare(&self, conn: &dyn Connection, sql: &str) -> Result<StatementHandle> {
        let mut cache = self.cache.lock();

        if conn.is_closed() {
            // Anything we held for this connection is unusable now
            if cache.remove(&conn.id()).is_some() {
                warn!(connection = %conn.id(), "dropped statement cache for closed connection");
            }
        } else if let Some(statement) = cache.entry(conn.id()).or_default().get(sql) {
            debug!(connection = %conn.id(), "statement cache hit");
            return Ok(statement.clone());
        }

        let statement = conn.prepare(sql)?;
        cache
            .entry(conn.id())
            .or_default()
            .insert(sql.to_string(), statement.clone());
        debug!(connection = %conn.id(), sql, "statement prepared and cached");
        Ok(statement)
    }

    /// Teardown hook for the host's connection-pooling layer: forget
    /// every statement prepared against `connection`.
    pub fn release(&self, connection: ConnectionId) {
        if self.cache.lock().remove(&connection).is_some() {
            debug!(connection = %connection, "statement cache released");
        }
    }

    /// Number of connections currently holding cached statements.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Cached statement count for one connection.
    pub fn cached_statements(&self, connection: ConnectionId) -> usize {
        self.cache
            .lock()
            .get(&connection)
            .map(|inner| inner.len())
            .unwrap_or(0)
    }
}
