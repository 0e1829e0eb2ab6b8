use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

/// Optional metrics of one device. `None` means "no value".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionalMetrics {
    pub wifi_percent: Option<i64>,
    pub perfume_level_percent: Option<i64>,
    pub battery_percent: Option<i64>,
}

impl OptionalMetrics {
    /// Field-wise `self.or(fallback)`.
    fn or(self, fallback: Self) -> Self {
        Self {
            wifi_percent: self.wifi_percent.or(fallback.wifi_percent),
            perfume_level_percent: self
                .perfume_level_percent
                .or(fallback.perfume_level_percent),
            battery_percent: self.battery_percent.or(fallback.battery_percent),
        }
    }
}

/// Last successfully read optional metrics, keyed by device hash.
///
/// Wrapped in `Arc` so it can be cheaply cloned and shared across tasks.
/// Each device entry is replaced as a whole under one write lock, so a
/// reader never sees a mix of old and new values.
#[derive(Clone, Default)]
pub struct ReadingCache {
    inner: Arc<RwLock<HashMap<String, OptionalMetrics>>>,
}

impl ReadingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a fresh read into the cache and return what should be reported:
    /// fresh values where present, otherwise the last known ones.
    pub async fn merge(&self, device_hash: &str, fresh: OptionalMetrics) -> OptionalMetrics {
        let mut guard = self.inner.write().await;
        let previous = guard.get(device_hash).copied().unwrap_or_default();
        let merged = fresh.or(previous);
        guard.insert(device_hash.to_owned(), merged);
        merged
    }

    #[cfg(test)]
    pub async fn get(&self, device_hash: &str) -> Option<OptionalMetrics> {
        self.inner.read().await.get(device_hash).copied()
    }
}
