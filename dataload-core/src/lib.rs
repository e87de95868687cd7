//! # dataload-core: Source protocol for batched data loading
//!
//! This crate defines the boundary between the loader that orchestrates a
//! run and the sources that actually fetch data.
//!
//! | Item | What it is |
//! |------|-----------|
//! | [`Source`] | The capability every batchable source implements |
//! | [`SourceName`], [`BatchKey`], [`ItemKey`] | Typed identifiers |
//! | [`LoaderOptions`] | Run configuration (shared timeout) |
//! | [`LoadError`], [`SourceError`] | Error kinds callers branch on |
//!
//! ## Design Principle
//!
//! Sources are values, not services. [`Source::enqueue`] and
//! [`Source::run_pending`] return a new source instead of mutating the old
//! one, so a loader holding `Arc<dyn Source>` can hand the same source to a
//! task and still keep its pre-run state intact if the run fails.
//!
//! Values flowing out of sources are `serde_json::Value`. Sources differ in
//! what they fetch, and a loader holds many of them side by side; a single
//! dynamic value type keeps `dyn Source` object-safe without a generic
//! parameter per registry.

#![deny(missing_docs)]

pub mod duration;
pub mod error;
pub mod id;
pub mod options;
pub mod source;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use duration::DurationMs;
pub use error::{LoadError, SourceError};
pub use id::{BatchKey, ItemKey, SourceName};
pub use options::{DEFAULT_TIMEOUT, LoaderOptions};
pub use source::Source;
