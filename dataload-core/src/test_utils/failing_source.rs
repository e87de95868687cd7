//! Sources whose run always goes wrong.

use crate::error::SourceError;
use crate::id::{BatchKey, ItemKey};
use crate::source::Source;
use async_trait::async_trait;
use std::sync::Arc;

/// Accepts enqueues, then fails every `run_pending` with
/// [`SourceError::Fetch`].
#[derive(Clone)]
pub struct FailingSource {
    message: String,
}

impl FailingSource {
    /// Create a source that fails with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Source for FailingSource {
    fn enqueue(&self, _batch: &BatchKey, _item: &ItemKey) -> Result<Arc<dyn Source>, SourceError> {
        Ok(Arc::new(self.clone()))
    }

    async fn run_pending(&self) -> Result<Arc<dyn Source>, SourceError> {
        Err(SourceError::Fetch(self.message.clone()))
    }

    fn get(&self, batch: &BatchKey, item: &ItemKey) -> Result<serde_json::Value, SourceError> {
        Err(SourceError::NotLoaded {
            batch: batch.clone(),
            item: item.clone(),
        })
    }

    fn has_pending_work(&self) -> bool {
        true
    }
}

/// Panics inside `run_pending`.
pub struct PanickingSource;

#[async_trait]
impl Source for PanickingSource {
    fn enqueue(&self, _batch: &BatchKey, _item: &ItemKey) -> Result<Arc<dyn Source>, SourceError> {
        Ok(Arc::new(PanickingSource))
    }

    async fn run_pending(&self) -> Result<Arc<dyn Source>, SourceError> {
        panic!("source exploded");
    }

    fn get(&self, batch: &BatchKey, item: &ItemKey) -> Result<serde_json::Value, SourceError> {
        Err(SourceError::NotLoaded {
            batch: batch.clone(),
            item: item.clone(),
        })
    }

    fn has_pending_work(&self) -> bool {
        false
    }
}
