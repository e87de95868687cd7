//! Runs every source's pending work concurrently under one deadline.

use dataload_core::{DurationMs, LoadError, Source, SourceError, SourceName};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{AbortHandle, Id, JoinError, JoinSet};
use tokio::time::Instant;
use tracing::Instrument;

/// Result of one source's task. Only lives for the duration of a run.
pub(crate) enum RunOutcome {
    /// The task returned the updated source before the deadline.
    Completed(SourceName, Arc<dyn Source>),
    /// The task was still running at the deadline and was aborted.
    TimedOut(SourceName),
}

type TaskOutput = (SourceName, Result<Arc<dyn Source>, SourceError>);

// Used when `now + timeout` does not fit in an Instant.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Spawn one task per source and collect an outcome for each.
///
/// Returns early with an error if any source fails or panics; the remaining
/// tasks are aborted first. Every spawned task has finished or been
/// cancelled by the time this returns.
///
/// A source counts as completed only if its task had finished when the
/// deadline fired. Work that ignores the abort and returns later is still
/// reported as timed out.
pub(crate) async fn run_sources(
    sources: &HashMap<SourceName, Arc<dyn Source>>,
    timeout: DurationMs,
) -> Result<Vec<RunOutcome>, LoadError> {
    let started = Instant::now();
    let deadline = started
        .checked_add(timeout.to_std())
        .unwrap_or_else(|| started + FAR_FUTURE);

    let mut tasks: JoinSet<TaskOutput> = JoinSet::new();
    let mut running: HashMap<Id, SourceName> = HashMap::with_capacity(sources.len());
    let mut handles: Vec<AbortHandle> = Vec::with_capacity(sources.len());

    for (name, source) in sources {
        let source = Arc::clone(source);
        let task_name = name.clone();
        let span = tracing::debug_span!("dataload.source.run", source = %name);
        let handle = tasks.spawn(
            async move {
                let began = Instant::now();
                tracing::debug!("source run start");
                let result = source.run_pending().await;
                tracing::debug!(
                    elapsed_ms = elapsed_ms(began),
                    ok = result.is_ok(),
                    "source run stop"
                );
                (task_name, result)
            }
            .instrument(span),
        );
        running.insert(handle.id(), name.clone());
        handles.push(handle);
    }

    let mut outcomes = Vec::with_capacity(sources.len());
    let sleep = tokio::time::sleep_until(deadline);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            biased;
            joined = tasks.join_next_with_id() => {
                let Some(joined) = joined else { break };
                if let Some(outcome) = settle(joined, &mut running, &mut tasks).await? {
                    outcomes.push(outcome);
                }
            }
            () = &mut sleep => {
                tracing::debug!(
                    still_running = running.len(),
                    elapsed_ms = elapsed_ms(started),
                    "run deadline reached, aborting sources"
                );
                let finished: HashSet<Id> = handles
                    .iter()
                    .filter(|h| h.is_finished())
                    .map(AbortHandle::id)
                    .collect();
                tasks.abort_all();
                while let Some(joined) = tasks.join_next_with_id().await {
                    let id = match &joined {
                        Ok((id, _)) => *id,
                        Err(e) => e.id(),
                    };
                    if finished.contains(&id) {
                        if let Some(outcome) = settle(joined, &mut running, &mut tasks).await? {
                            outcomes.push(outcome);
                        }
                    } else if let Some(name) = running.remove(&id) {
                        outcomes.push(RunOutcome::TimedOut(name));
                    }
                }
                break;
            }
        }
    }

    Ok(outcomes)
}

/// Turn one joined task into an outcome, or fail the run.
async fn settle(
    joined: Result<(Id, TaskOutput), JoinError>,
    running: &mut HashMap<Id, SourceName>,
    tasks: &mut JoinSet<TaskOutput>,
) -> Result<Option<RunOutcome>, LoadError> {
    match joined {
        Ok((id, (name, Ok(updated)))) => {
            running.remove(&id);
            Ok(Some(RunOutcome::Completed(name, updated)))
        }
        Ok((id, (name, Err(error)))) => {
            running.remove(&id);
            tracing::warn!(source = %name, error = %error, "source run failed, aborting run");
            shutdown(tasks).await;
            Err(LoadError::Source { name, error })
        }
        Err(e) => {
            let name = running
                .remove(&e.id())
                .unwrap_or_else(|| SourceName::new("<unknown>"));
            if e.is_cancelled() {
                return Ok(Some(RunOutcome::TimedOut(name)));
            }
            let message = panic_message(e.into_panic());
            tracing::warn!(source = %name, panic = %message, "source task panicked, aborting run");
            shutdown(tasks).await;
            Err(LoadError::SourcePanicked { name, message })
        }
    }
}

/// Abort whatever is left and wait for it to wind down.
async fn shutdown(tasks: &mut JoinSet<TaskOutput>) {
    tasks.abort_all();
    while tasks.join_next().await.is_some() {}
}

/// Split outcomes into the updated registry or a timeout naming every
/// unfinished source.
pub(crate) fn aggregate(
    outcomes: Vec<RunOutcome>,
    timeout: DurationMs,
) -> Result<HashMap<SourceName, Arc<dyn Source>>, LoadError> {
    let mut updated = HashMap::with_capacity(outcomes.len());
    let mut timed_out = Vec::new();

    for outcome in outcomes {
        match outcome {
            RunOutcome::Completed(name, source) => {
                updated.insert(name, source);
            }
            RunOutcome::TimedOut(name) => timed_out.push(name),
        }
    }

    if timed_out.is_empty() {
        return Ok(updated);
    }

    timed_out.sort();
    tracing::warn!(
        timeout_ms = timeout.as_millis(),
        sources = ?timed_out,
        completed = updated.len(),
        "run timed out, discarding all results"
    );
    Err(LoadError::RunTimeout {
        timeout,
        sources: timed_out,
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataload_core::test_utils::MapSource;

    fn named(name: &str) -> SourceName {
        SourceName::from(name)
    }

    #[test]
    fn aggregate_all_completed_returns_every_source() {
        let outcomes = vec![
            RunOutcome::Completed(named("a"), Arc::new(MapSource::new())),
            RunOutcome::Completed(named("b"), Arc::new(MapSource::new())),
        ];
        let updated = aggregate(outcomes, DurationMs::from_millis(10)).unwrap();
        assert_eq!(updated.len(), 2);
        assert!(updated.contains_key(&named("a")));
        assert!(updated.contains_key(&named("b")));
    }

    #[test]
    fn aggregate_any_timeout_fails_with_sorted_names() {
        let outcomes = vec![
            RunOutcome::TimedOut(named("zeta")),
            RunOutcome::Completed(named("fast"), Arc::new(MapSource::new())),
            RunOutcome::TimedOut(named("alpha")),
        ];
        let err = aggregate(outcomes, DurationMs::from_millis(10)).err().unwrap();
        match err {
            LoadError::RunTimeout { timeout, sources } => {
                assert_eq!(timeout, DurationMs::from_millis(10));
                assert_eq!(sources, vec![named("alpha"), named("zeta")]);
            }
            other => panic!("expected timeout, got {other}"),
        }
    }

    #[test]
    fn aggregate_empty_is_ok() {
        let updated = aggregate(Vec::new(), DurationMs::from_millis(1)).unwrap();
        assert!(updated.is_empty());
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7u8)), "non-string panic payload");
    }

    #[tokio::test]
    async fn run_sources_on_empty_registry_returns_immediately() {
        let outcomes = run_sources(&HashMap::new(), DurationMs::from_millis(0))
            .await
            .unwrap();
        assert!(outcomes.is_empty());
    }
}
