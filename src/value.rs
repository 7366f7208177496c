//! Typed column values / 类型化列值
//!
//! Rows arrive from the trigger callback as positionally ordered values.
//! Rather than inspecting runtime types, the supported column categories
//! are modeled as a tagged variant with one conversion function per
//! variant: `index_text` for word-splitting and `quote_literal` for
//! building key-condition SQL.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Column type category as reported by catalog introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Boolean,
    Timestamp,
    Binary,
    /// CLOB/BLOB-style large objects; excluded from word-splitting.
    LargeObject,
}

/// A single column value inside a transient row.
///
/// Equality is typed-value equality and is what change detection uses:
/// it may report a change for semantically equal but differently
/// represented values, but never misses a substantive difference.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Binary(Vec<u8>),
}

/// One row, positionally aligned with `IndexedTableInfo::columns`.
/// Supplied by the trigger callback for the duration of one invocation.
pub type Row = Vec<Value>;

impl Value {
    /// Text to feed the word splitter, or `None` when the column does not
    /// participate (null, binary, large object).
    pub fn index_text(&self, column_type: ColumnType) -> Option<String> {
        if matches!(column_type, ColumnType::Binary | ColumnType::LargeObject) {
            return None;
        }
        match self {
            Value::Null => None,
            Value::Integer(v) => Some(v.to_string()),
            Value::Real(v) => Some(v.to_string()),
            Value::Text(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Value::Binary(_) => None,
        }
    }

    /// SQL literal for this value, quoted per column category.
    ///
    /// Any `'` inside character content is doubled, so column content can
    /// never break out of the literal.
    pub fn quote_literal(&self, _column_type: ColumnType) -> String {
        // The declared column type is accepted for symmetry with
        // `index_text`; the value variant determines the quoting rule.
        match self {
            Value::Null => "NULL".to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Real(v) => v.to_string(),
            Value::Boolean(v) => (if *v { "TRUE" } else { "FALSE" }).to_string(),
            Value::Timestamp(v) => format!(
                "'{}'",
                v.to_rfc3339_opts(SecondsFormat::Secs, true).replace('\'', "''")
            ),
            Value::Text(v) => format!("'{}'", v.replace('\'', "''")),
            Value::Binary(bytes) => {
                let mut hex = String::with_capacity(bytes.len() * 2);
                for b in bytes {
                    hex.push_str(&format!("{:02X}", b));
                }
                format!("X'{}'", hex)
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Quote a SQL identifier, doubling any embedded quote characters.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
