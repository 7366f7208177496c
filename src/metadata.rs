//! Indexed-table metadata / 索引表元数据
//!
//! Resolved once when indexing is set up for a table and immutable from
//! then on. Schema changes on the underlying table are not tracked; the
//! metadata must be re-resolved if the table definition changes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, IndexDefinitions};
use crate::error::{IndexError, Result};
use crate::value::{quote_identifier, ColumnType, Row};

/// Immutable description of one table under indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedTableInfo {
    /// Index-definition id, from the index-definition store.
    pub id: i64,
    pub schema: String,
    pub table: String,
    /// Column names in catalog order; position is the column ordinal.
    pub columns: Vec<String>,
    /// Type per column, aligned with `columns`.
    pub column_types: Vec<ColumnType>,
    /// Positions of the primary-key columns. Never empty.
    pub keys: Vec<usize>,
    /// Positions of the searchable columns.
    pub index_columns: Vec<usize>,
}

impl IndexedTableInfo {
    /// Resolve the metadata for `schema`.`table`.
    ///
    /// Fails with a configuration error when the table has no primary
    /// key, is absent from the index-definition store, or the definition
    /// names a column the table does not have.
    pub fn resolve(
        catalog: &dyn Catalog,
        definitions: &dyn IndexDefinitions,
        schema: &str,
        table: &str,
    ) -> Result<IndexedTableInfo> {
        // Column names and types, in catalog order
        let mut columns = Vec::new();
        let mut column_types = Vec::new();
        for (name, column_type) in catalog.columns(schema, table)? {
            columns.push(name);
            column_types.push(column_type);
        }

        // Primary keys; a table without one cannot be row-identified
        // for update/delete maintenance
        let key_names = catalog.primary_key_columns(schema, table)?;
        if key_names.is_empty() {
            return Err(IndexError::NoPrimaryKey {
                table: table.to_string(),
            });
        }
        let keys = column_positions(&columns, &key_names)?;

        // Index definition: id plus optional explicit column list
        let definition = definitions
            .lookup(schema, table)?
            .ok_or_else(|| IndexError::NotIndexed {
                table: table.to_string(),
            })?;

        let index_names: Vec<String> = match definition.columns.as_deref() {
            Some(list) if !list.trim().is_empty() => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            // No explicit list: every column is searchable
            _ => columns.clone(),
        };
        let index_columns = column_positions(&columns, &index_names)?;

        debug!(
            schema,
            table,
            id = definition.id,
            columns = columns.len(),
            indexed = index_columns.len(),
            "resolved indexed table metadata"
        );

        Ok(IndexedTableInfo {
            id: definition.id,
            schema: schema.to_string(),
            table: table.to_string(),
            columns,
            column_types,
            keys,
            index_columns,
        })
    }

    /// Check if the indexed columns of a row probably have changed. May
    /// report a change for minimal representation differences; never
    /// misses a substantive one. Short-circuits on the first difference.
    pub fn have_indexed_columns_changed(&self, old_row: &Row, new_row: &Row) -> bool {
        for &position in &self.index_columns {
            let old = old_row.get(position);
            let new = new_row.get(position);
            match (old, new) {
                (Some(o), Some(n)) => {
                    let null_transition = o.is_null() != n.is_null();
                    if null_transition || (!o.is_null() && o != n) {
                        return true;
                    }
                }
                (None, None) => {}
                _ => return true,
            }
        }
        false
    }

    /// SQL predicate uniquely identifying `row` by its primary-key
    /// values, e.g. `"ID"=42` or `"ID" IS NULL AND "REV"=3`.
    pub fn key_condition(&self, row: &Row) -> String {
        let mut buf = String::new();
        for &position in &self.keys {
            if !buf.is_empty() {
                buf.push_str(" AND ");
            }
            buf.push_str(&quote_identifier(&self.columns[position]));
            match row.get(position) {
                None | Some(crate::value::Value::Null) => buf.push_str(" IS NULL"),
                Some(value) => {
                    buf.push('=');
                    buf.push_str(&value.quote_literal(self.column_types[position]));
                }
            }
        }
        buf
    }
}

/// Map column names to their positions; unknown names fail fast.
fn column_positions(columns: &[String], names: &[String]) -> Result<Vec<usize>> {
    let mut positions = Vec::with_capacity(names.len());
    for name in names {
        let position = columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| IndexError::ColumnNotFound {
                column: name.clone(),
            })?;
        positions.push(position);
    }
    Ok(positions)
}
