//! Trigger-driven full-text row indexing engine / 行级全文索引引擎
//!
//! Attaches to a relational table's row-mutation triggers and keeps a
//! derived word index in step with the table's live content, without
//! full table rescans. The host database supplies trigger dispatch,
//! catalog introspection, and SQL execution (see [`catalog`]); this
//! crate supplies everything that runs inside the trigger callback.
//!
//! Call direction: host trigger → [`registry`] → [`context`] +
//! [`metadata`] + [`tokenizer`] + [`stmt_cache`] / 调用方向：宿主触发器 → 引擎

pub mod catalog;
pub mod context;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod stmt_cache;
pub mod tokenizer;
pub mod trigger;
pub mod value;

pub use catalog::{
    Catalog, Connection, ConnectionId, IndexDefinition, IndexDefinitions, StatementHandle,
};
pub use context::{IndexStats, IndexingContext};
pub use error::{IndexError, Result};
pub use metadata::IndexedTableInfo;
pub use registry::ContextRegistry;
pub use stmt_cache::StatementCache;
pub use trigger::{IndexMaintainer, RowEvent};
pub use value::{ColumnType, Row, Value};

/// Build timestamp, stamped by build.rs / 构建时间
pub fn build_time() -> &'static str {
    env!("BUILD_TIME")
}
