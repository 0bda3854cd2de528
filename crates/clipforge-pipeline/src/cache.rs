//! Process-wide VAD analysis cache.
//!
//! Analyses are memoized by `(source_id, preset)`. Entries are immutable
//! once inserted; invalidation is manual via [`VadCache::clear`]. The cache
//! is single-flight: when several requests miss the same key concurrently,
//! one computes while the rest wait on the same cell, and the map lock is
//! never held across VAD inference.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

use clipforge_models::{PlatformPreset, VadAnalysis};

type Key = (String, PlatformPreset);
type Cell = Arc<OnceCell<Arc<VadAnalysis>>>;

/// Thread-safe, single-flight cache of [`VadAnalysis`] values.
#[derive(Default)]
pub struct VadCache {
    entries: RwLock<HashMap<Key, Cell>>,
}

impl VadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an analysis, computing and inserting it on a miss.
    ///
    /// Concurrent callers for the same key share one computation. A failed
    /// computation leaves the cell empty so a later call can retry.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        source_id: &str,
        preset: PlatformPreset,
        compute: F,
    ) -> Result<Arc<VadAnalysis>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VadAnalysis, E>>,
    {
        let cell = self.cell(source_id, preset).await;

        let analysis = cell
            .get_or_try_init(|| async {
                debug!(source_id = source_id, preset = %preset, "VAD cache miss, computing");
                compute().await.map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(analysis))
    }

    /// Fetch the cell for a key, inserting an empty one if absent.
    async fn cell(&self, source_id: &str, preset: PlatformPreset) -> Cell {
        {
            let entries = self.entries.read().await;
            if let Some(cell) = entries.get(&(source_id.to_string(), preset)) {
                return Arc::clone(cell);
            }
        }

        let mut entries = self.entries.write().await;
        Arc::clone(
            entries
                .entry((source_id.to_string(), preset))
                .or_default(),
        )
    }

    /// Peek without computing.
    pub async fn get(&self, source_id: &str, preset: PlatformPreset) -> Option<Arc<VadAnalysis>> {
        let entries = self.entries.read().await;
        entries
            .get(&(source_id.to_string(), preset))
            .and_then(|cell| cell.get().cloned())
    }

    /// Drop every cached analysis for a source (all presets).
    pub async fn clear(&self, source_id: &str) {
        let mut entries = self.entries.write().await;
        entries.retain(|(id, _), _| id != source_id);
        debug!(source_id = source_id, "Cleared VAD cache entries");
    }

    /// Number of populated entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|cell| cell.get().is_some()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
