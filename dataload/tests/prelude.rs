use dataload::prelude::*;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn prelude_covers_the_common_path() {
    let source = KvSource::from_fn(|_batch: BatchKey, items: Vec<ItemKey>| async move {
        Ok(items.into_iter().map(|i| (i, json!(true))).collect())
    });

    let loader = Loader::new(LoaderOptions::default())
        .add_source(SourceName::new("flags"), Arc::new(source))
        .load("flags", "enabled", "dark_mode")
        .unwrap();
    assert!(loader.pending_batches());

    let loader = loader.run().await.unwrap();
    assert_eq!(loader.get("flags", "enabled", "dark_mode").unwrap(), json!(true));
}

#[test]
fn crates_are_reexported() {
    let _ = dataload::dataload_core::DEFAULT_TIMEOUT;
    let _ = dataload::dataload_local::Loader::default();
}
