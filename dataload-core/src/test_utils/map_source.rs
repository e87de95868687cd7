//! MapSource: fixed in-memory backend with optional latency.

use crate::error::SourceError;
use crate::id::{BatchKey, ItemKey};
use crate::source::Source;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Entry = (BatchKey, ItemKey);

/// Observations shared by every version of a [`MapSource`].
///
/// `started` is bumped when `run_pending` begins, `finished` when it returns.
/// A run that was aborted mid-flight leaves `finished` behind `started`.
#[derive(Debug, Default)]
pub struct SourceProbe {
    started: AtomicUsize,
    finished: AtomicUsize,
    enqueued: Mutex<Vec<Entry>>,
}

impl SourceProbe {
    /// Number of `run_pending` calls that began.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Number of `run_pending` calls that returned.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Every `enqueue` call seen so far, in call order.
    pub fn enqueued(&self) -> Vec<(BatchKey, ItemKey)> {
        self.enqueued
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

/// A source that serves values from a fixed map.
///
/// Enqueued keys are kept in call order (duplicates included) and can be
/// inspected with [`MapSource::enqueued`]. Keys absent from the backing map
/// load as `null`.
#[derive(Clone)]
pub struct MapSource {
    backend: Arc<HashMap<Entry, serde_json::Value>>,
    pending: Vec<Entry>,
    loaded: HashMap<Entry, serde_json::Value>,
    delay: Option<Duration>,
    probe: Arc<SourceProbe>,
}

impl MapSource {
    /// Create a source with an empty backend.
    pub fn new() -> Self {
        Self {
            backend: Arc::new(HashMap::new()),
            pending: Vec::new(),
            loaded: HashMap::new(),
            delay: None,
            probe: Arc::new(SourceProbe::default()),
        }
    }

    /// Add a backend row.
    #[must_use]
    pub fn with_value(
        mut self,
        batch: impl Into<BatchKey>,
        item: impl Into<ItemKey>,
        value: serde_json::Value,
    ) -> Self {
        Arc::make_mut(&mut self.backend).insert((batch.into(), item.into()), value);
        self
    }

    /// Sleep this long inside every `run_pending`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Keys enqueued since the last run, in call order.
    pub fn enqueued(&self) -> &[(BatchKey, ItemKey)] {
        &self.pending
    }

    /// Probe shared with every source derived from this one.
    pub fn probe(&self) -> Arc<SourceProbe> {
        Arc::clone(&self.probe)
    }
}

impl Default for MapSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for MapSource {
    fn enqueue(&self, batch: &BatchKey, item: &ItemKey) -> Result<Arc<dyn Source>, SourceError> {
        let entry = (batch.clone(), item.clone());
        if let Ok(mut log) = self.probe.enqueued.lock() {
            log.push(entry.clone());
        }
        let mut next = self.clone();
        next.pending.push(entry);
        Ok(Arc::new(next))
    }

    async fn run_pending(&self) -> Result<Arc<dyn Source>, SourceError> {
        self.probe.started.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut next = self.clone();
        for entry in std::mem::take(&mut next.pending) {
            let value = self
                .backend
                .get(&entry)
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            next.loaded.insert(entry, value);
        }

        self.probe.finished.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(next))
    }

    fn get(&self, batch: &BatchKey, item: &ItemKey) -> Result<serde_json::Value, SourceError> {
        self.loaded
            .get(&(batch.clone(), item.clone()))
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
        next.loaded.insert((batch.clone(), item.clone()), value);
        Ok(Arc::new(next))
    }
}
