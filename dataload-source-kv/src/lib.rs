#![deny(missing_docs)]
//! Key/value implementation of dataload's Source trait.
//!
//! A [`KvSource`] collects item keys per batch key and, on run, hands each
//! batch to a user-supplied [`BatchFn`] in one call. Pending keys are
//! deduplicated, keys that already have a value are not fetched again, and
//! batches run concurrently up to a configurable limit. Keys the batch
//! function leaves out of its result load as `null`.

use async_trait::async_trait;
use dataload_core::{BatchKey, ItemKey, Source, SourceError};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

/// Fetches every requested item of one batch in a single call.
#[async_trait]
pub trait BatchFn: Send + Sync {
    /// Load `items` for `batch`. Items absent from the returned map are
    /// treated as having no value.
    async fn load(
        &self,
        batch: &BatchKey,
        items: &[ItemKey],
    ) -> Result<HashMap<ItemKey, serde_json::Value>, SourceError>;
}

/// Adapts an async closure into a [`BatchFn`].
pub struct FnBatch<F>(F);

#[async_trait]
impl<F, Fut> BatchFn for FnBatch<F>
where
    F: Fn(BatchKey, Vec<ItemKey>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HashMap<ItemKey, serde_json::Value>, SourceError>>
        + Send
        + 'static,
{
    async fn load(
        &self,
        batch: &BatchKey,
        items: &[ItemKey],
    ) -> Result<HashMap<ItemKey, serde_json::Value>, SourceError> {
        (self.0)(batch.clone(), items.to_vec()).await
    }
}

/// Key/value source over a [`BatchFn`].
///
/// Like every dataload source it is a value: `enqueue` and `run_pending`
/// return a new `KvSource` and leave the receiver untouched.
#[derive(Clone)]
pub struct KvSource {
    fetch: Arc<dyn BatchFn>,
    pending: BTreeMap<BatchKey, BTreeSet<ItemKey>>,
    results: HashMap<BatchKey, HashMap<ItemKey, serde_json::Value>>,
    max_concurrency: usize,
}

impl KvSource {
    /// Create a source over the given batch function.
    pub fn new(fetch: Arc<dyn BatchFn>) -> Self {
        Self {
            fetch,
            pending: BTreeMap::new(),
            results: HashMap::new(),
            max_concurrency: default_concurrency(),
        }
    }

    /// Create a source from an async closure taking the batch key and the
    /// item keys to load.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(BatchKey, Vec<ItemKey>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HashMap<ItemKey, serde_json::Value>, SourceError>>
            + Send
            + 'static,
    {
        Self::new(Arc::new(FnBatch(f)))
    }

    /// Limit how many batches are fetched at the same time. Zero is
    /// treated as one.
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Same as [`Source::enqueue`] but keeps the concrete type.
    #[must_use]
    pub fn with_pending(&self, batch: &BatchKey, item: &ItemKey) -> Self {
        let mut next = self.clone();
        if !self.is_loaded(batch, item) {
            next.pending
                .entry(batch.clone())
                .or_default()
                .insert(item.clone());
        }
        next
    }

    /// Item keys waiting to be fetched for `batch`, in key order.
    pub fn pending_items(&self, batch: &BatchKey) -> Vec<ItemKey> {
        self.pending
            .get(batch)
            .map(|items| items.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn is_loaded(&self, batch: &BatchKey, item: &ItemKey) -> bool {
        self.results
            .get(batch)
            .is_some_and(|values| values.contains_key(item))
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(2)
}

#[async_trait]
impl Source for KvSource {
    fn enqueue(&self, batch: &BatchKey, item: &ItemKey) -> Result<Arc<dyn Source>, SourceError> {
        Ok(Arc::new(self.with_pending(batch, item)))
    }

    async fn run_pending(&self) -> Result<Arc<dyn Source>, SourceError> {
        let mut next = self.clone();
        let batches = std::mem::take(&mut next.pending);
        if batches.is_empty() {
            return Ok(Arc::new(next));
        }

        let fetch = Arc::clone(&self.fetch);
        let fetched: Vec<(BatchKey, Vec<ItemKey>, HashMap<ItemKey, serde_json::Value>)> =
            stream::iter(batches)
                .map(move |(batch, items)| {
                    let fetch = Arc::clone(&fetch);
                    async move {
                        let items: Vec<ItemKey> = items.into_iter().collect();
                        tracing::debug!(batch = %batch, items = items.len(), "fetching batch");
                        let values = fetch.load(&batch, &items).await?;
                        Ok::<_, SourceError>((batch, items, values))
                    }
                })
                .buffer_unordered(self.max_concurrency)
                .try_collect()
                .await?;

        for (batch, items, mut values) in fetched {
            let stored = next.results.entry(batch).or_default();
            for item in items {
                let value = values.remove(&item).unwrap_or(serde_json::Value::Null);
                stored.insert(item, value);
            }
        }

        Ok(Arc::new(next))
    }

    fn get(&self, batch: &BatchKey, item: &ItemKey) -> Result<serde_json::Value, SourceError> {
        self.results
            .get(batch)
            .and_then(|values| values.get(item))
            .cloned()
            .ok_or_else(|| SourceError::NotLoaded {
                batch: batch.clone(),
                item: item.clone(),
            })
    }

    fn has_pending_work(&self) -> bool {
        !self.pending.is_empty()
    }

    fn put(
        &self,
        batch: &BatchKey,
        item: &ItemKey,
        value: serde_json::Value,
    ) -> Result<Arc<dyn Source>, SourceError> {
        let mut next = self.clone();
        if let Some(items) = next.pending.get_mut(batch) {
            items.remove(item);
            if items.is_empty() {
                next.pending.remove(batch);
            }
        }
        next.results
            .entry(batch.clone())
            .or_default()
            .insert(item.clone(), value);
        Ok(Arc::new(next))
    }
}
