//! The loader registry: request routing, runs, and reads.

use crate::runner;
use dataload_core::{BatchKey, ItemKey, LoadError, LoaderOptions, Source, SourceName};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// Immutable registry of named sources plus run options.
///
/// Every method that changes the registry takes `&self` and returns a new
/// `Loader`. Sources are held as `Arc<dyn Source>` values that are never
/// mutated in place, so cloning a loader is cheap and a loader a caller
/// still holds keeps its state no matter what happens to values derived
/// from it.
#[derive(Clone, Default)]
pub struct Loader {
    sources: HashMap<SourceName, Arc<dyn Source>>,
    options: LoaderOptions,
}

impl Loader {
    /// Create a loader with no sources.
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            sources: HashMap::new(),
            options,
        }
    }

    /// Register `source` under `name`, replacing any source already there.
    #[must_use]
    pub fn add_source(&self, name: impl Into<SourceName>, source: Arc<dyn Source>) -> Self {
        self.with_source(name.into(), source)
    }

    /// Enqueue one item key on the named source.
    pub fn load(
        &self,
        name: impl Into<SourceName>,
        batch: impl Into<BatchKey>,
        item: impl Into<ItemKey>,
    ) -> Result<Self, LoadError> {
        self.load_many(name, batch, [item])
    }

    /// Enqueue item keys on the named source, in iteration order.
    ///
    /// The source is resolved even when `items` is empty, so an unknown
    /// name always fails.
    pub fn load_many<I>(
        &self,
        name: impl Into<SourceName>,
        batch: impl Into<BatchKey>,
        items: I,
    ) -> Result<Self, LoadError>
    where
        I: IntoIterator,
        I::Item: Into<ItemKey>,
    {
        let name = name.into();
        let batch = batch.into();
        let mut source = Arc::clone(self.source(&name)?);
        for item in items {
            source = source
                .enqueue(&batch, &item.into())
                .map_err(|error| LoadError::source_failed(&name, error))?;
        }
        Ok(self.with_source(name, source))
    }

    /// Seed the named source with an already known value.
    pub fn put(
        &self,
        name: impl Into<SourceName>,
        batch: impl Into<BatchKey>,
        item: impl Into<ItemKey>,
        value: serde_json::Value,
    ) -> Result<Self, LoadError> {
        let name = name.into();
        let source = self
            .source(&name)?
            .put(&batch.into(), &item.into(), value)
            .map_err(|error| LoadError::source_failed(&name, error))?;
        Ok(self.with_source(name, source))
    }

    /// Run every source's pending work concurrently.
    ///
    /// All sources share one deadline taken from [`LoaderOptions::timeout`].
    /// On success the returned loader holds exactly the updated sources. If
    /// any source is still running at the deadline it is aborted and the
    /// run fails with [`LoadError::RunTimeout`] naming every unfinished
    /// source; results of sources that did finish are discarded. A source
    /// error or panic aborts the others and fails the run straight away.
    ///
    /// `self` is never modified. Must be called from within a tokio runtime.
    pub async fn run(&self) -> Result<Self, LoadError> {
        let timeout = self.options.timeout();
        let span = tracing::info_span!(
            "dataload.run",
            sources = self.sources.len(),
            timeout_ms = timeout.as_millis()
        );

        async {
            tracing::debug!("run start");
            let outcomes = runner::run_sources(&self.sources, timeout).await?;
            let sources = runner::aggregate(outcomes, timeout)?;
            tracing::debug!("run stop");
            Ok::<_, LoadError>(Self {
                sources,
                options: self.options,
            })
        }
        .instrument(span)
        .await
    }

    /// Read one loaded value from the named source.
    pub fn get(
        &self,
        name: impl Into<SourceName>,
        batch: impl Into<BatchKey>,
        item: impl Into<ItemKey>,
    ) -> Result<serde_json::Value, LoadError> {
        let name = name.into();
        self.source(&name)?
            .get(&batch.into(), &item.into())
            .map_err(|error| LoadError::source_failed(name, error))
    }

    /// Read several loaded values from the named source.
    ///
    /// The result lines up with `items`, duplicates included. The first
    /// key that fails aborts the whole read.
    pub fn get_many<I>(
        &self,
        name: impl Into<SourceName>,
        batch: impl Into<BatchKey>,
        items: I,
    ) -> Result<Vec<serde_json::Value>, LoadError>
    where
        I: IntoIterator,
        I::Item: Into<ItemKey>,
    {
        let name = name.into();
        let batch = batch.into();
        let source = self.source(&name)?;
        items
            .into_iter()
            .map(|item| {
                source
                    .get(&batch, &item.into())
                    .map_err(|error| LoadError::source_failed(&name, error))
            })
            .collect()
    }

    /// Whether any registered source has enqueued work that has not run.
    pub fn pending_batches(&self) -> bool {
        self.sources.values().any(|s| s.has_pending_work())
    }

    /// Look up a registered source.
    pub fn source(&self, name: &SourceName) -> Result<&Arc<dyn Source>, LoadError> {
        self.sources
            .get(name)
            .ok_or_else(|| LoadError::UnknownSource(name.clone()))
    }

    /// Names of every registered source, in no particular order.
    pub fn source_names(&self) -> impl Iterator<Item = &SourceName> {
        self.sources.keys()
    }

    /// The options runs use.
    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source is registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn with_source(&self, name: SourceName, source: Arc<dyn Source>) -> Self {
        let mut next = self.clone();
        next.sources.insert(name, source);
        next
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.sources.keys().map(SourceName::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Loader")
            .field("sources", &names)
            .field("options", &self.options)
            .finish()
    }
}
