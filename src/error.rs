//! Error types for the indexing engine / 索引引擎错误类型
//!
//! Two families, deliberately distinguishable by `match`:
//! - `InvalidArgument`: the calling code is wrong (fix the code)
//! - configuration variants: the table definition is wrong (fix the table)
//!
//! Collaborator failures (`Resource`) pass through unchanged; the engine
//! never retries and never logs-and-swallows.

use thiserror::Error;

/// Boxed collaborator error as handed to us by the host database layer.
pub type ResourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum IndexError {
    /// A required reference was absent or invalid at an API boundary.
    #[error("invalid argument: {what}")]
    InvalidArgument { what: &'static str },

    /// The table has no primary key, so rows cannot be identified for
    /// update/delete maintenance.
    #[error("no primary key for table {table}")]
    NoPrimaryKey { table: String },

    /// The table has no row in the index-definition store.
    #[error("table not registered for indexing: {table}")]
    NotIndexed { table: String },

    /// An index definition names a column the table does not have.
    #[error("column not found: {column}")]
    ColumnNotFound { column: String },

    /// Catalog introspection or SQL execution failed underneath us.
    #[error("resource error: {0}")]
    Resource(#[source] ResourceError),

    /// Unexpected fault while scanning text; non-recoverable for the call.
    #[error("tokenization failed: {0}")]
    Tokenize(String),
}

impl IndexError {
    pub fn invalid_argument(what: &'static str) -> Self {
        IndexError::InvalidArgument { what }
    }

    /// Whether this is a configuration problem in the table/index
    /// definition, as opposed to a caller bug or an infrastructure fault.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            IndexError::NoPrimaryKey { .. }
                | IndexError::NotIndexed { .. }
                | IndexError::ColumnNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
