//! The Source protocol: one independently batchable unit of fetch logic.

use crate::error::SourceError;
use crate::id::{BatchKey, ItemKey};
use async_trait::async_trait;
use std::sync::Arc;

/// A batchable data source.
///
/// The loader only ever talks to sources through this trait. How a source
/// groups keys, talks to its backend, or memoizes results is its own
/// business.
///
/// Sources behave as immutable values: every operation that changes a
/// source returns the changed source and leaves `self` untouched. The loader
/// relies on this to keep the pre-run state of every source when a run
/// fails.
///
/// Implementations:
/// - `KvSource` (dataload-source-kv): generic key/value source over an
///   async batch function
/// - `MapSource` (test-utils): fixed in-memory data with optional latency
///
/// # Cancellation
///
/// A run that exceeds its timeout aborts the task driving
/// [`run_pending`](Source::run_pending), dropping the future at its next
/// suspension point. Work must therefore be async all the way down: a
/// future that blocks its worker thread without yielding cannot be
/// interrupted. Side effects already issued to a backend before the abort
/// are not rolled back, so re-running a source after a timeout must be
/// safe.
#[async_trait]
pub trait Source: Send + Sync {
    /// Record that `item` within `batch` is needed. Must not fetch.
    fn enqueue(&self, batch: &BatchKey, item: &ItemKey) -> Result<Arc<dyn Source>, SourceError>;

    /// Fetch everything enqueued since the last run and return the source
    /// holding the results.
    ///
    /// Runs concurrently with other sources' `run_pending`, never with
    /// another call on the same source.
    async fn run_pending(&self) -> Result<Arc<dyn Source>, SourceError>;

    /// Read a previously fetched value. What happens for a key that was
    /// never enqueued is up to the source.
    fn get(&self, batch: &BatchKey, item: &ItemKey) -> Result<serde_json::Value, SourceError>;

    /// Whether [`enqueue`](Source::enqueue) was called without a later
    /// [`run_pending`](Source::run_pending) covering it.
    fn has_pending_work(&self) -> bool;

    /// Seed the source with a value that is already known, so it is
    /// neither fetched nor reported as pending.
    fn put(
        &self,
        batch: &BatchKey,
        item: &ItemKey,
        value: serde_json::Value,
    ) -> Result<Arc<dyn Source>, SourceError> {
        let _ = (batch, item, value);
        Err(SourceError::Unsupported("put".into()))
    }
}
