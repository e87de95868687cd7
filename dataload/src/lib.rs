#![deny(missing_docs)]
//! # dataload: umbrella crate
//!
//! Single import surface for the dataload crates. Re-exports the protocol,
//! the in-process loader, and sources behind feature flags, plus a
//! `prelude` for the common path.

#[cfg(feature = "core")]
pub use dataload_core;
#[cfg(feature = "local")]
pub use dataload_local;
#[cfg(feature = "source-kv")]
pub use dataload_source_kv;

/// Happy-path imports for building and running a loader.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use dataload_core::{
        BatchKey, DurationMs, ItemKey, LoadError, LoaderOptions, Source, SourceError, SourceName,
    };

    #[cfg(feature = "local")]
    pub use dataload_local::Loader;

    #[cfg(feature = "source-kv")]
    pub use dataload_source_kv::{BatchFn, KvSource};
}
