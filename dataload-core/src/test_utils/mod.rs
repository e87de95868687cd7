//! In-memory sources for testing.
//!
//! Available behind the `test-utils` feature flag. These are minimal
//! implementations that exercise the loader without a real backend.

mod failing_source;
mod map_source;

pub use failing_source::{FailingSource, PanickingSource};
pub use map_source::{MapSource, SourceProbe};
