//! Error types for sources and the loader.

use crate::duration::DurationMs;
use crate::id::{BatchKey, ItemKey, SourceName};
use thiserror::Error;

/// Errors raised by a [`Source`](crate::Source) implementation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SourceError {
    /// The requested item was never fetched for this batch.
    #[error("not loaded: {batch}/{item}")]
    NotLoaded {
        /// Batch the item was looked up in.
        batch: BatchKey,
        /// The missing item.
        item: ItemKey,
    },

    /// Fetching from the backend failed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The source does not implement the requested capability.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors returned by loader operations.
///
/// [`LoadError::UnknownSource`] signals a configuration mistake and
/// [`LoadError::RunTimeout`] an exceeded deadline; callers are expected to
/// branch on them.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LoadError {
    /// No source is registered under this name.
    #[error("unknown source: {0}")]
    UnknownSource(SourceName),

    /// One or more sources did not finish within the run timeout. Results
    /// from sources that did finish are discarded.
    #[error("run timed out after {timeout}; unfinished sources: {}", join_names(.sources))]
    RunTimeout {
        /// The timeout the run was configured with.
        timeout: DurationMs,
        /// Every source that had not finished at the deadline, sorted.
        sources: Vec<SourceName>,
    },

    /// A source operation failed. Not retried.
    #[error("source {name} failed: {error}")]
    Source {
        /// The source that failed.
        name: SourceName,
        /// The underlying source error.
        #[source]
        error: SourceError,
    },

    /// A source task panicked while running its pending work.
    #[error("source {name} panicked: {message}")]
    SourcePanicked {
        /// The source whose task panicked.
        name: SourceName,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl LoadError {
    /// Wrap a source error with the name of the source that raised it.
    pub fn source_failed(name: impl Into<SourceName>, error: SourceError) -> Self {
        Self::Source {
            name: name.into(),
            error,
        }
    }

    /// Whether this is a run timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RunTimeout { .. })
    }

    /// The sources that did not finish, if this is a run timeout.
    pub fn timed_out_sources(&self) -> Option<&[SourceName]> {
        match self {
            Self::RunTimeout { sources, .. } => Some(sources),
            _ => None,
        }
    }
}

fn join_names(names: &[SourceName]) -> String {
    names
        .iter()
        .map(SourceName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
