//! Loader run options.

use crate::duration::DurationMs;
use serde::{Deserialize, Serialize};

/// Timeout applied to a whole run when none is configured.
pub const DEFAULT_TIMEOUT: DurationMs = DurationMs::from_millis(15_000);

/// Options carried by a loader and consulted on every run.
///
/// Deserializes from a map such as `{"timeout": 5000}`; unknown keys are
/// ignored so options can live inside a larger config document.
///
/// ```
/// use dataload_core::{DurationMs, LoaderOptions};
///
/// let opts: LoaderOptions = serde_json::from_str(r#"{"timeout": 5000}"#).unwrap();
/// assert_eq!(opts.timeout(), DurationMs::from_millis(5000));
/// assert_eq!(LoaderOptions::default().timeout(), DurationMs::from_millis(15_000));
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderOptions {
    /// Wall-clock bound for one run across all sources, not per source.
    /// `None` falls back to [`DEFAULT_TIMEOUT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<DurationMs>,
}

impl LoaderOptions {
    /// Options with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the run timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: impl Into<DurationMs>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    /// The timeout a run will actually use.
    pub fn timeout(&self) -> DurationMs {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }
}
