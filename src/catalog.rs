//! Host-database collaborators / 宿主数据库协作接口
//!
//! The engine runs inside the host database's trigger dispatch and owns
//! no SQL machinery of its own. Everything it needs from the host is
//! behind these traits: catalog introspection, the index-definition
//! store, and prepared-statement execution. All calls are blocking;
//! cancellation and timeouts are whatever the host imposes.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::value::{ColumnType, Value};

/// Catalog introspection for one database.
pub trait Catalog {
    /// Column (name, type) pairs in catalog order. That order is the
    /// positional contract used everywhere else in the engine.
    fn columns(&self, schema: &str, table: &str) -> Result<Vec<(String, ColumnType)>>;

    /// Primary-key column names, possibly empty.
    fn primary_key_columns(&self, schema: &str, table: &str) -> Result<Vec<String>>;
}

/// One row of the index-definition store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub id: i64,
    /// Optional comma-separated explicit column list; `None`/empty means
    /// index every column.
    pub columns: Option<String>,
}

/// Lookup into the index-definition store.
pub trait IndexDefinitions {
    fn lookup(&self, schema: &str, table: &str) -> Result<Option<IndexDefinition>>;
}

/// Stable identity of one connection, supplied by the host's pooling
/// layer. Used as the statement cache's outer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Opaque prepared-statement handle. Cheap to clone; the same handle is
/// returned to repeat callers by the statement cache.
#[derive(Debug, Clone)]
pub struct StatementHandle {
    inner: Arc<StatementInner>,
}

#[derive(Debug)]
struct StatementInner {
    connection: ConnectionId,
    sql: String,
}

impl StatementHandle {
    pub fn new(connection: ConnectionId, sql: impl Into<String>) -> Self {
        StatementHandle {
            inner: Arc::new(StatementInner {
                connection,
                sql: sql.into(),
            }),
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.inner.connection
    }

    pub fn sql(&self) -> &str {
        &self.inner.sql
    }

    /// Whether two handles refer to the same prepared statement.
    pub fn same_statement(&self, other: &StatementHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// A live database connection as seen from inside a trigger callback.
pub trait Connection {
    fn id(&self) -> ConnectionId;

    /// Whether the connection has been closed underneath us.
    fn is_closed(&self) -> bool;

    /// Prepare a parameterized statement. Fails with a resource error if
    /// the connection is unusable.
    fn prepare(&self, sql: &str) -> Result<StatementHandle>;

    /// Execute a previously prepared statement with positional
    /// parameters; returns the affected-row count.
    fn execute(&self, statement: &StatementHandle, params: &[Value]) -> Result<u64>;

    /// Execute a prepared query expected to return a single integer
    /// column (used for id lookups against the index tables).
    fn query_i64(&self, statement: &StatementHandle, params: &[Value]) -> Result<Option<i64>>;
}
