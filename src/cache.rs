use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::window::ValueWindow;

/// Values the engine persists across invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheValue {
    /// Sliding window of recent observations
    Window(ValueWindow),
    /// Wall-clock instant as epoch seconds
    Epoch(f64),
}

/// Process-wide, cross-invocation key/value store supplied by the host.
///
/// Keys are strings derived from table+field; see `keys`.
pub trait StateCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheValue>;
    fn put(&self, key: &str, value: CacheValue);
}

/// Cache key construction for the anomaly detector's state.
pub mod keys {
    pub fn window(table: &str, field: &str) -> String {
        format!("values_{}_{}", table, field)
    }

    pub fn last_alert(table: &str, field: &str) -> String {
        format!("last_alert_{}_{}", table, field)
    }
}

/// In-memory `StateCache`, the default host-embeddable implementation.
#[derive(Clone, Default)]
pub struct MemoryCache {
    inner: Arc<RwLock<HashMap<String, CacheValue>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateCache for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheValue> {
        self.inner.read().unwrap().get(key).cloned()
    }

    fn put(&self, key: &str, value: CacheValue) {
        self.inner.write().unwrap().insert(key.to_string(), value);
    }
}
