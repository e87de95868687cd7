//! Two key/value sources loaded in one run.
//!
//! Run with `RUST_LOG=dataload=debug cargo run -p dataload --example fan_out --features source-kv`
//! to see the per-source start/stop events.

use dataload::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), LoadError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let users = KvSource::from_fn(|_batch: BatchKey, ids: Vec<ItemKey>| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(ids
            .into_iter()
            .map(|id| {
                let value = json!({ "id": id.as_str(), "name": format!("user-{id}") });
                (id, value)
            })
            .collect::<HashMap<_, _>>())
    });
    let posts = KvSource::from_fn(|batch: BatchKey, authors: Vec<ItemKey>| async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok(authors
            .into_iter()
            .map(|author| {
                let value = json!([format!("{batch} by {author}")]);
                (author, value)
            })
            .collect::<HashMap<_, _>>())
    });

    let loader = Loader::new(LoaderOptions::new().with_timeout(Duration::from_secs(1)))
        .add_source("users", Arc::new(users))
        .add_source("posts", Arc::new(posts))
        .load_many("users", "by_id", [1u64, 2])?
        .load("posts", "by_author", 1u64)?
        .run()
        .await?;

    for user in loader.get_many("users", "by_id", [1u64, 2])? {
        println!("{user}");
    }
    println!("{}", loader.get("posts", "by_author", 1u64)?);
    Ok(())
}
