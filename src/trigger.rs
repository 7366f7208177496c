//! Trigger callback body / 触发器回调
//!
//! What runs inside one row-mutation trigger: decide whether the
//! searchable columns changed, split the row into terms, and keep the
//! index tables in step through cached prepared statements. Registration
//! of the trigger itself and the index-table DDL belong to the host.
//!
//! Index tables live under one schema (`FT` in the original layout):
//! - `WORDS(ID, NAME)` — the persisted word dictionary
//! - `ROWS(ID, HASH, INDEXID, KEY)` — one row per indexed source row
//! - `MAP(ROWID, WORDID)` — the inverted word-to-row mapping

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::Connection;
use crate::context::IndexingContext;
use crate::error::{IndexError, Result};
use crate::metadata::IndexedTableInfo;
use crate::stmt_cache::StatementCache;
use crate::value::{quote_identifier, Row, Value};

/// One row mutation as delivered by the host's trigger dispatch.
#[derive(Debug, Clone)]
pub enum RowEvent {
    Insert { new: Row },
    Update { old: Row, new: Row },
    Delete { old: Row },
}

/// Maintains the index tables for one database's indexed content.
pub struct IndexMaintainer {
    context: Arc<IndexingContext>,
    statements: Arc<StatementCache>,
    index_schema: String,
}

impl IndexMaintainer {
    pub fn new(
        context: Arc<IndexingContext>,
        statements: Arc<StatementCache>,
        index_schema: impl Into<String>,
    ) -> Self {
        IndexMaintainer {
            context,
            statements,
            index_schema: index_schema.into(),
        }
    }

    pub fn context(&self) -> &Arc<IndexingContext> {
        &self.context
    }

    /// Handle one row mutation. An update whose indexed columns are
    /// unchanged is a no-op; otherwise the old entry is removed and/or
    /// the new row is indexed.
    pub fn fire(
        &self,
        conn: &dyn Connection,
        info: &IndexedTableInfo,
        event: &RowEvent,
    ) -> Result<()> {
        match event {
            RowEvent::Insert { new } => self.index_row(conn, info, new),
            RowEvent::Delete { old } => self.deindex_row(conn, info, old),
            RowEvent::Update { old, new } => {
                if !info.have_indexed_columns_changed(old, new) {
                    debug!(table = %info.table, "indexed columns unchanged, skipping");
                    return Ok(());
                }
                self.deindex_row(conn, info, old)?;
                self.index_row(conn, info, new)
            }
        }
    }

    fn table(&self, name: &str) -> String {
        format!("{}.{}", quote_identifier(&self.index_schema), quote_identifier(name))
    }

    fn index_row(&self, conn: &dyn Connection, info: &IndexedTableInfo, row: &Row) -> Result<()> {
        let key = info.key_condition(row);
        let hash = key_hash(&key);

        let insert_row = self.statements.prepare(
            conn,
            &format!(
                "INSERT INTO {}(\"HASH\", \"INDEXID\", \"KEY\") VALUES(?, ?, ?)",
                self.table("ROWS")
            ),
        )?;
        conn.execute(
            &insert_row,
            &[
                Value::Integer(hash),
                Value::Integer(info.id),
                Value::Text(key.clone()),
            ],
        )?;

        let select_row = self.statements.prepare(
            conn,
            &format!(
                "SELECT \"ID\" FROM {} WHERE \"HASH\"=? AND \"INDEXID\"=? AND \"KEY\"=?",
                self.table("ROWS")
            ),
        )?;
        let row_id = conn
            .query_i64(
                &select_row,
                &[
                    Value::Integer(hash),
                    Value::Integer(info.id),
                    Value::Text(key),
                ],
            )?
            .ok_or_else(|| IndexError::Resource("indexed row id not found after insert".into()))?;

        let mut words = HashSet::new();
        self.context.split_row_into_words(info, row, &mut words)?;

        let insert_map = self.statements.prepare(
            conn,
            &format!(
                "INSERT INTO {}(\"ROWID\", \"WORDID\") VALUES(?, ?)",
                self.table("MAP")
            ),
        )?;
        for word in words {
            let word_id = self.word_id(conn, &word)?;
            conn.execute(&insert_map, &[Value::Integer(row_id), Value::Integer(word_id)])?;
        }
        Ok(())
    }

    fn deindex_row(&self, conn: &dyn Connection, info: &IndexedTableInfo, row: &Row) -> Result<()> {
        let key = info.key_condition(row);
        let hash = key_hash(&key);

        let select_row = self.statements.prepare(
            conn,
            &format!(
                "SELECT \"ID\" FROM {} WHERE \"HASH\"=? AND \"INDEXID\"=? AND \"KEY\"=?",
                self.table("ROWS")
            ),
        )?;
        let row_id = conn.query_i64(
            &select_row,
            &[
                Value::Integer(hash),
                Value::Integer(info.id),
                Value::Text(key.clone()),
            ],
        )?;
        // A row that was never indexed has nothing to remove
        let Some(row_id) = row_id else { return Ok(()) };

        let delete_map = self.statements.prepare(
            conn,
            &format!("DELETE FROM {} WHERE \"ROWID\"=?", self.table("MAP")),
        )?;
        conn.execute(&delete_map, &[Value::Integer(row_id)])?;

        let delete_row = self.statements.prepare(
            conn,
            &format!("DELETE FROM {} WHERE \"ID\"=?", self.table("ROWS")),
        )?;
        conn.execute(&delete_row, &[Value::Integer(row_id)])?;
        Ok(())
    }

    /// Id of a word in the persisted dictionary, inserting it on first
    /// sight. The context's word list caches store-assigned ids so
    /// repeat rows skip the round trip.
    fn word_id(&self, conn: &dyn Connection, word: &str) -> Result<i64> {
        if let Some(id) = self.context.word_id(word) {
            return Ok(id);
        }

        let select_word = self.statements.prepare(
            conn,
            &format!("SELECT \"ID\" FROM {} WHERE \"NAME\"=?", self.table("WORDS")),
        )?;
        let existing = conn.query_i64(&select_word, &[Value::Text(word.to_string())])?;

        let id = match existing {
            Some(id) => id,
            None => {
                let insert_word = self.statements.prepare(
                    conn,
                    &format!("INSERT INTO {}(\"NAME\") VALUES(?)", self.table("WORDS")),
                )?;
                conn.execute(&insert_word, &[Value::Text(word.to_string())])?;
                conn.query_i64(&select_word, &[Value::Text(word.to_string())])?
                    .ok_or_else(|| {
                        IndexError::Resource("word id not found after insert".into())
                    })?
            }
        };

        self.context.with_word_list(|words| {
            words.insert(word.to_string(), id);
        });
        Ok(id)
    }
}

/// Deterministic 64-bit FNV-1a hash of the key-condition string, used as
/// the ROWS lookup hash.
pub fn key_hash(key: &str) -> i64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in key.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConnectionId, StatementHandle};
    use crate::value::ColumnType;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    fn test_info() -> IndexedTableInfo {
        IndexedTableInfo {
            id: 7,
            schema: "PUBLIC".to_string(),
            table: "DOCS".to_string(),
            columns: vec!["ID".to_string(), "TITLE".to_string()],
            column_types: vec![ColumnType::Integer, ColumnType::Text],
            keys: vec![0],
            index_columns: vec![1],
        }
    }

    fn doc_row(id: i64, title: &str) -> Row {
        vec![Value::Integer(id), Value::Text(title.to_string())]
    }

    #[derive(Default)]
    struct FakeDb {
        words: HashMap<String, i64>,
        next_word_id: i64,
        rows: HashMap<String, i64>,
        next_row_id: i64,
        map: Vec<(i64, i64)>,
        executed: Vec<String>,
        prepared: usize,
    }

    /// Understands just enough of the maintenance SQL to act like the
    /// FT schema tables.
    struct FakeConnection {
        id: ConnectionId,
        db: Mutex<FakeDb>,
    }

    impl FakeConnection {
        fn new() -> Self {
            FakeConnection {
                id: ConnectionId(1),
                db: Mutex::new(FakeDb::default()),
            }
        }
    }

    impl Connection for FakeConnection {
        fn id(&self) -> ConnectionId {
            self.id
        }

        fn is_closed(&self) -> bool {
            false
        }

        fn prepare(&self, sql: &str) -> Result<StatementHandle> {
            let mut db = self.db.lock();
            db.prepared += 1;
            Ok(StatementHandle::new(self.id, sql))
        }

        fn execute(&self, statement: &StatementHandle, params: &[Value]) -> Result<u64> {
            let mut db = self.db.lock();
            let sql = statement.sql().to_string();
            db.executed.push(sql.clone());
            if sql.contains("\"WORDS\"") {
                if let Value::Text(name) = &params[0] {
                    let id = db.next_word_id;
                    db.next_word_id += 1;
                    db.words.insert(name.clone(), id);
                }
            } else if sql.starts_with("INSERT") && sql.contains("\"ROWS\"") {
                if let Value::Text(key) = &params[2] {
                    let id = db.next_row_id;
                    db.next_row_id += 1;
                    db.rows.insert(key.clone(), id);
                }
            } else if sql.starts_with("DELETE") && sql.contains("\"ROWS\"") {
                if let Value::Integer(row_id) = params[0] {
                    db.rows.retain(|_, id| *id != row_id);
                }
            } else if sql.starts_with("DELETE") && sql.contains("\"MAP\"") {
                if let Value::Integer(row_id) = params[0] {
                    db.map.retain(|(r, _)| *r != row_id);
                }
            } else if sql.contains("\"MAP\"") {
                if let (Value::Integer(r), Value::Integer(w)) = (&params[0], &params[1]) {
                    db.map.push((*r, *w));
                }
            }
            Ok(1)
        }

        fn query_i64(&self, statement: &StatementHandle, params: &[Value]) -> Result<Option<i64>> {
            let db = self.db.lock();
            let sql = statement.sql();
            if sql.contains("\"WORDS\"") {
                if let Value::Text(name) = &params[0] {
                    return Ok(db.words.get(name).copied());
                }
            } else if sql.contains("\"ROWS\"") {
                if let Value::Text(key) = &params[2] {
                    return Ok(db.rows.get(key).copied());
                }
            }
            Ok(None)
        }
    }

    fn maintainer() -> (IndexMaintainer, FakeConnection) {
        let maintainer = IndexMaintainer::new(
            Arc::new(IndexingContext::new()),
            Arc::new(StatementCache::new()),
            "FT",
        );
        (maintainer, FakeConnection::new())
    }

    #[test]
    fn test_insert_indexes_words_and_mappings() {
        let (maintainer, conn) = maintainer();
        let info = test_info();
        maintainer
            .fire(&conn, &info, &RowEvent::Insert { new: doc_row(42, "quick fox") })
            .unwrap();

        let db = conn.db.lock();
        assert_eq!(db.rows.len(), 1);
        assert!(db.rows.contains_key("\"ID\"=42"));
        assert!(db.words.contains_key("QUICK"));
        assert!(db.words.contains_key("FOX"));
        assert_eq!(db.map.len(), 2);
    }

    #[test]
    fn test_delete_removes_row_and_mappings() {
        let (maintainer, conn) = maintainer();
        let info = test_info();
        let row = doc_row(42, "quick fox");
        maintainer
            .fire(&conn, &info, &RowEvent::Insert { new: row.clone() })
            .unwrap();
        maintainer
            .fire(&conn, &info, &RowEvent::Delete { old: row })
            .unwrap();

        let db = conn.db.lock();
        assert!(db.rows.is_empty());
        assert!(db.map.is_empty());
        // Dictionary rows stay; only the mapping is maintained
        assert!(db.words.contains_key("QUICK"));
    }

    #[test]
    fn test_delete_of_unindexed_row_is_noop() {
        let (maintainer, conn) = maintainer();
        maintainer
            .fire(&conn, &test_info(), &RowEvent::Delete { old: doc_row(9, "ghost") })
            .unwrap();
        assert!(conn.db.lock().rows.is_empty());
    }

    #[test]
    fn test_update_without_indexed_change_is_noop() {
        let (maintainer, conn) = maintainer();
        let info = test_info();
        let old = doc_row(42, "same title");
        let mut new = old.clone();
        new[0] = Value::Integer(42);
        maintainer
            .fire(&conn, &info, &RowEvent::Update { old, new })
            .unwrap();
        assert!(conn.db.lock().executed.is_empty());
    }

    #[test]
    fn test_update_reindexes_changed_row() {
        let (maintainer, conn) = maintainer();
        let info = test_info();
        let old = doc_row(42, "old words");
        maintainer
            .fire(&conn, &info, &RowEvent::Insert { new: old.clone() })
            .unwrap();
        maintainer
            .fire(
                &conn,
                &info,
                &RowEvent::Update { old, new: doc_row(42, "fresh words") },
            )
            .unwrap();

        let db = conn.db.lock();
        assert_eq!(db.rows.len(), 1);
        assert!(db.words.contains_key("FRESH"));
        // Two mappings for the current row content only
        assert_eq!(db.map.len(), 2);
    }

    #[test]
    fn test_repeat_fires_reuse_prepared_statements() {
        let (maintainer, conn) = maintainer();
        let info = test_info();
        maintainer
            .fire(&conn, &info, &RowEvent::Insert { new: doc_row(1, "alpha") })
            .unwrap();
        let after_first = conn.db.lock().prepared;
        maintainer
            .fire(&conn, &info, &RowEvent::Insert { new: doc_row(2, "alpha") })
            .unwrap();
        assert_eq!(conn.db.lock().prepared, after_first);
    }

    #[test]
    fn test_key_hash_deterministic() {
        assert_eq!(key_hash("\"ID\"=42"), key_hash("\"ID\"=42"));
        assert_ne!(key_hash("\"ID\"=42"), key_hash("\"ID\"=43"));
    }
}
