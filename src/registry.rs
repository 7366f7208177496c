//! Context registry / 上下文注册表
//!
//! Explicitly owned by the host application (created at startup, passed
//! by handle into trigger-callback code) rather than a process-wide
//! static. One context per database identity, created lazily, kept for
//! the registry's lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::context::IndexingContext;

#[derive(Default)]
pub struct ContextRegistry {
    contexts: Mutex<HashMap<String, Arc<IndexingContext>>>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        ContextRegistry::default()
    }

    /// Context for a database identity (a stable storage path or
    /// equivalent unique key). At most one context exists per identity,
    /// even under concurrent first access; repeated calls return the
    /// same instance.
    pub fn get_context(&self, database_identity: &str) -> Arc<IndexingContext> {
        let mut contexts = self.contexts.lock();
        if let Some(context) = contexts.get(database_identity) {
            return context.clone();
        }
        debug!(identity = database_identity, "creating indexing context");
        let context = Arc::new(IndexingContext::new());
        contexts.insert(database_identity.to_string(), context.clone());
        context
    }

    pub fn len(&self) -> usize {
        self.contexts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.lock().is_empty()
    }
}
