#![deny(missing_docs)]
//! In-process batched loader.
//!
//! A [`Loader`] is an immutable registry of named `dataload_core::Source`
//! values plus run options. Callers enqueue keys with [`Loader::load`] and
//! [`Loader::load_many`], execute everything at once with [`Loader::run`],
//! and read results back with [`Loader::get`] and [`Loader::get_many`].
//!
//! Every source runs in its own `tokio::spawn`ed task under one shared
//! deadline. Sources still running at the deadline are aborted and the run
//! fails with `LoadError::RunTimeout`, discarding every result including
//! those of sources that finished. There is no partial success and no retry.
//!
//! ```no_run
//! # async fn demo(users: std::sync::Arc<dyn dataload_core::Source>) -> Result<(), dataload_core::LoadError> {
//! use dataload_core::LoaderOptions;
//! use dataload_local::Loader;
//!
//! let loader = Loader::new(LoaderOptions::new().with_timeout(std::time::Duration::from_secs(2)))
//!     .add_source("users", users)
//!     .load_many("users", "by_id", [1u64, 2, 3])?
//!     .run()
//!     .await?;
//! let ada = loader.get("users", "by_id", 1u64)?;
//! # let _ = ada;
//! # Ok(())
//! # }
//! ```

mod loader;
mod runner;

pub use loader::Loader;
