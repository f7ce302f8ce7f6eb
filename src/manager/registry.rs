//! Concurrency-safe set of active fetchers, keyed by stream id.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::fetcher::StreamFetcher;

/// The process-wide set of active fetchers.
///
/// Membership is keyed by stream id; no two members share one. Iteration
/// goes through [`snapshot`](Self::snapshot) so scheduler passes can never
/// observe a torn state while the lifecycle API inserts or removes
/// concurrently.
#[derive(Default)]
pub struct FetcherRegistry {
    inner: DashMap<String, Arc<dyn StreamFetcher>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, stream_id: &str) -> bool {
        self.inner.contains_key(stream_id)
    }

    /// Register a fetcher. Returns false (and keeps the incumbent) when one
    /// with the same stream id is already present.
    pub fn insert(&self, fetcher: Arc<dyn StreamFetcher>) -> bool {
        match self.inner.entry(fetcher.stream_id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(fetcher);
                true
            }
        }
    }

    pub fn remove(&self, stream_id: &str) -> Option<Arc<dyn StreamFetcher>> {
        self.inner.remove(stream_id).map(|(_, fetcher)| fetcher)
    }

    /// A point-in-time copy of the membership.
    pub fn snapshot(&self) -> Vec<Arc<dyn StreamFetcher>> {
        self.inner.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Swap the whole membership wholesale.
    pub fn replace_all(&self, fetchers: Vec<Arc<dyn StreamFetcher>>) {
        self.inner.clear();
        for fetcher in fetchers {
            self.insert(fetcher);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
