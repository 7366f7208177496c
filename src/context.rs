//! Per-database indexing context / 每库索引上下文
//!
//! Owns the aggregate word dictionary and the registry of indexed-table
//! metadata for one database. Shared across every trigger invocation for
//! that database; both structures live under one lock so `clear_all`
//! empties them as an atomic pair.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IndexError, Result};
use crate::metadata::IndexedTableInfo;
use crate::tokenizer::tokenize;
use crate::value::Row;

/// Observable counters / 索引统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub word_count: usize,
    pub table_count: usize,
}

#[derive(Default)]
struct ContextState {
    /// Normalized term -> term id. Append-only while the context lives;
    /// ids are never reused. `clear_all` resets it wholesale.
    words: HashMap<String, i64>,
    next_word_id: i64,
    /// Index id -> metadata for every table under indexing.
    indexed_tables: HashMap<i64, Arc<IndexedTableInfo>>,
}

/// The per-database indexing context.
pub struct IndexingContext {
    state: Mutex<ContextState>,
}

impl IndexingContext {
    pub(crate) fn new() -> Self {
        IndexingContext {
            state: Mutex::new(ContextState::default()),
        }
    }

    /// Empty the word dictionary and the table-metadata registry
    /// together. No reader can observe one cleared without the other.
    pub fn clear_all(&self) {
        let mut state = self.state.lock();
        state.words.clear();
        state.next_word_id = 0;
        state.indexed_tables.clear();
        info!("indexing context cleared");
    }

    /// Canonicalize a term for dictionary insertion and lookup.
    /// Uppercase fold; idempotent.
    pub fn convert_word(&self, word: &str) -> String {
        word.to_uppercase()
    }

    /// Id of a term if it is already in the dictionary.
    pub fn word_id(&self, word: &str) -> Option<i64> {
        let word = self.convert_word(word);
        self.state.lock().words.get(&word).copied()
    }

    /// Insert-or-get the id for a term. Ids grow monotonically and are
    /// never reassigned while the context lives.
    pub fn intern_word(&self, word: &str) -> i64 {
        let word = self.convert_word(word);
        let mut state = self.state.lock();
        if let Some(&id) = state.words.get(&word) {
            return id;
        }
        let id = state.next_word_id;
        state.next_word_id += 1;
        state.words.insert(word, id);
        id
    }

    /// Read or mutate the live word dictionary in place. The closure
    /// sees the same mapping every other handle sees.
    pub fn with_word_list<R>(&self, f: impl FnOnce(&mut HashMap<String, i64>) -> R) -> R {
        f(&mut self.state.lock().words)
    }

    pub fn word_count(&self) -> usize {
        self.state.lock().words.len()
    }

    /// Register metadata for a newly indexed table.
    pub fn add_indexed_table_info(&self, info: Arc<IndexedTableInfo>) -> Result<()> {
        if info.id <= 0 {
            return Err(IndexError::invalid_argument("info.id"));
        }
        info!(id = info.id, schema = %info.schema, table = %info.table, "table registered for indexing");
        self.state.lock().indexed_tables.insert(info.id, info);
        Ok(())
    }

    /// Drop the registration when the index definition is removed.
    pub fn remove_indexed_table_info(&self, info: &IndexedTableInfo) -> Result<()> {
        if info.id <= 0 {
            return Err(IndexError::invalid_argument("info.id"));
        }
        self.state.lock().indexed_tables.remove(&info.id);
        Ok(())
    }

    pub fn indexed_table_info(&self, id: i64) -> Option<Arc<IndexedTableInfo>> {
        self.state.lock().indexed_tables.get(&id).cloned()
    }

    /// Split `text` into canonicalized terms, accumulating into `words`
    /// so terms from several columns can merge into one set.
    pub fn split_into_words(&self, text: &str, words: &mut HashSet<String>) {
        for term in tokenize(text) {
            let term = self.convert_word(&term);
            if !term.is_empty() {
                words.insert(term);
            }
        }
    }

    /// Split every indexed column of `row` into one merged term set.
    /// Binary and large-object columns are skipped, not errors.
    pub fn split_row_into_words(
        &self,
        info: &IndexedTableInfo,
        row: &Row,
        words: &mut HashSet<String>,
    ) -> Result<()> {
        for &position in &info.index_columns {
            let value = row
                .get(position)
                .ok_or(IndexError::invalid_argument("row too short for metadata"))?;
            if let Some(text) = value.index_text(info.column_types[position]) {
                self.split_into_words(&text, words);
            }
        }
        debug!(table = %info.table, terms = words.len(), "row split into words");
        Ok(())
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.state.lock();
        IndexStats {
            word_count: state.words.len(),
            table_count: state.indexed_tables.len(),
        }
    }
}
