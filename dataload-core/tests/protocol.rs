//! Acceptance tests for the source protocol crate.
//!
//! Tests cover:
//! - Trait object safety (Arc<dyn Source> is Send + Sync)
//! - Default `put` behavior
//! - Error messages callers and logs depend on
//! - The in-memory test sources behave as value types

use dataload_core::test_utils::{FailingSource, MapSource};
use dataload_core::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn _assert_send_sync<T: Send + Sync>() {}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Object safety
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn source_is_object_safe_send_sync() {
    _assert_send_sync::<Box<dyn Source>>();
    _assert_send_sync::<Arc<dyn Source>>();
    let _: Arc<dyn Source> = Arc::new(MapSource::new());
}

#[test]
fn load_error_is_send_sync_and_static() {
    fn _assert_error<E: std::error::Error + Send + Sync + 'static>() {}
    _assert_error::<LoadError>();
    _assert_error::<SourceError>();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Default put
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn put_is_unsupported_unless_overridden() {
    let source = FailingSource::new("nope");
    let err = source
        .put(&BatchKey::from("b"), &ItemKey::from("k"), json!(1))
        .err()
        .unwrap();
    assert!(matches!(err, SourceError::Unsupported(ref op) if op == "put"));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error display
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn run_timeout_message_names_timeout_and_every_source() {
    let err = LoadError::RunTimeout {
        timeout: DurationMs::from_millis(5),
        sources: vec![SourceName::from("posts"), SourceName::from("users")],
    };
    let msg = err.to_string();
    assert!(msg.contains("5ms"), "{msg}");
    assert!(msg.contains("posts, users"), "{msg}");
    assert!(err.is_timeout());
    assert_eq!(
        err.timed_out_sources().unwrap(),
        &[SourceName::from("posts"), SourceName::from("users")]
    );
}

#[test]
fn unknown_source_is_not_a_timeout() {
    let err = LoadError::UnknownSource(SourceName::from("ghost"));
    assert_eq!(err.to_string(), "unknown source: ghost");
    assert!(!err.is_timeout());
    assert!(err.timed_out_sources().is_none());
}

#[test]
fn source_failure_keeps_underlying_error_as_cause() {
    use std::error::Error as _;

    let err = LoadError::source_failed("users", SourceError::Fetch("db down".into()));
    assert_eq!(err.to_string(), "source users failed: fetch failed: db down");
    let cause = err.source().unwrap();
    assert_eq!(cause.to_string(), "fetch failed: db down");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MapSource
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn map_source_enqueue_returns_new_value() {
    let original = MapSource::new().with_value("users", 1u64, json!({"name": "ada"}));
    let batch = BatchKey::from("users");

    let queued = original.enqueue(&batch, &ItemKey::from(1u64)).unwrap();
    assert!(!original.has_pending_work());
    assert!(queued.has_pending_work());

    let ran = queued.run_pending().await.unwrap();
    assert!(!ran.has_pending_work());
    assert_eq!(
        ran.get(&batch, &ItemKey::from(1u64)).unwrap(),
        json!({"name": "ada"})
    );
    // The queued value still has its work outstanding.
    assert!(queued.has_pending_work());
}

#[tokio::test]
async fn map_source_missing_rows_load_as_null() {
    let batch = BatchKey::from("users");
    let source = MapSource::new()
        .enqueue(&batch, &ItemKey::from("404"))
        .unwrap()
        .run_pending()
        .await
        .unwrap();
    assert_eq!(source.get(&batch, &ItemKey::from("404")).unwrap(), json!(null));
}

#[test]
fn map_source_get_before_run_is_not_loaded() {
    let source = MapSource::new();
    let err = source
        .get(&BatchKey::from("users"), &ItemKey::from("1"))
        .unwrap_err();
    assert_eq!(err.to_string(), "not loaded: users/1");
}

#[tokio::test]
async fn map_source_probe_tracks_runs() {
    let source = MapSource::new().with_delay(Duration::from_millis(1));
    let probe = source.probe();
    source.run_pending().await.unwrap();
    assert_eq!(probe.started(), 1);
    assert_eq!(probe.finished(), 1);
}

#[tokio::test]
async fn failing_source_reports_fetch_error() {
    let err = FailingSource::new("boom").run_pending().await.err().unwrap();
    assert!(matches!(err, SourceError::Fetch(ref m) if m == "boom"));
}
