// crates/cfdot-cli/src/commands/events.rs - LRP and task event streams
//
// lrp-events reads two subscriptions at once:
//
//   group events    ──pump──┐
//                           ├──▶ bounded channel ──▶ dedup ──▶ stdout
//   instance events ──pump──┘
//
// Desired LRP events show up on both subscriptions, so a desired event equal
// to the one just written is dropped. The first end of stream from either
// side finishes the command; any error aborts it. Subscriptions are closed on
// every way out.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use cfdot_core::bbs::BbsResult;
use cfdot_core::{CfdotError, EventEnvelope, EventSource, RecordStore};
use tokio::sync::mpsc;
use tracing::debug;

use super::bounded;
use crate::output::JsonWriter;

const EVENT_BUFFER: usize = 64;

type Item = BbsResult<Option<EventEnvelope>>;

/// Drops a desired LRP event identical to the previous one written
#[derive(Debug, Default)]
pub struct Dedup {
    last_desired: Option<EventEnvelope>,
}

impl Dedup {
    /// Whether `event` should be written
    pub fn admit(&mut self, event: &EventEnvelope) -> bool {
        if !event.is_desired_lrp_event() {
            self.last_desired = None;
            return true;
        }
        if self.last_desired.as_ref() == Some(event) {
            debug!(event_type = %event.event_type, "dropping repeated event");
            return false;
        }
        self.last_desired = Some(event.clone());
        true
    }
}

pub async fn lrp_events<S: RecordStore, W: Write>(
    store: &S,
    cell_id: Option<&str>,
    exclude_groups: bool,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let mut instances = bounded(timeout, store.subscribe_lrp_instance_events(cell_id)).await?;

    let mut groups = if exclude_groups {
        None
    } else {
        match bounded(timeout, store.subscribe_lrp_group_events(cell_id)).await {
            Ok(groups) => Some(groups),
            Err(err) => {
                instances.close();
                return Err(err.into());
            }
        }
    };

    let result = merge(&mut instances, groups.as_mut(), out).await;

    instances.close();
    if let Some(groups) = groups.as_mut() {
        groups.close();
    }
    result
}

pub async fn task_events<S: RecordStore, W: Write>(
    store: &S,
    cell_id: Option<&str>,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let mut events = bounded(timeout, store.subscribe_task_events(cell_id)).await?;

    let result = async {
        while let Some(event) = events.next().await.map_err(CfdotError::from)? {
            out.emit(&event)?;
        }
        Ok::<_, anyhow::Error>(())
    }
    .await;

    events.close();
    result
}

async fn pump<E: EventSource>(source: &mut E, tx: mpsc::Sender<Item>) {
    loop {
        let item = source.next().await;
        let last = !matches!(item, Ok(Some(_)));
        if tx.send(item).await.is_err() || last {
            break;
        }
    }
}

async fn consume<W: Write>(rx: &mut mpsc::Receiver<Item>, out: &JsonWriter<W>) -> Result<()> {
    let mut dedup = Dedup::default();
    while let Some(item) = rx.recv().await {
        match item.map_err(CfdotError::from)? {
            Some(event) => {
                if dedup.admit(&event) {
                    out.emit(&event)?;
                }
            }
            None => {
                debug!("event stream ended");
                break;
            }
        }
    }
    Ok(())
}

async fn merge<A, B, W>(first: &mut A, second: Option<&mut B>, out: &JsonWriter<W>) -> Result<()>
where
    A: EventSource,
    B: EventSource,
    W: Write,
{
    let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);

    let produce = async move {
        let second_tx = tx.clone();
        let second = async move {
            if let Some(second) = second {
                pump(second, second_tx).await;
            }
        };
        tokio::join!(pump(first, tx), second);
    };

    let consumer = consume(&mut rx, out);
    tokio::pin!(consumer);

    tokio::select! {
        result = &mut consumer => result,
        () = produce => consumer.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fakes::{FakeEvents, FakeStore};
    use crate::output;
    use cfdot_core::bbs::BbsError;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;

    fn removed(guid: &str) -> EventEnvelope {
        EventEnvelope::new("desired_lrp_removed", json!({"desired_lrp": {"process_guid": guid}}))
    }

    fn instance_changed(guid: &str) -> EventEnvelope {
        EventEnvelope::new(
            "actual_lrp_instance_changed",
            json!({"actual_lrp_key": {"process_guid": guid}}),
        )
    }

    fn types(out: JsonWriter<Vec<u8>>) -> Vec<String> {
        output::lines(out)
            .into_iter()
            .map(|line| line["type"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_dedup_is_adjacent_only() {
        let mut dedup = Dedup::default();
        assert!(dedup.admit(&removed("pg-0")));
        assert!(!dedup.admit(&removed("pg-0")));
        assert!(dedup.admit(&removed("pg-1")));
        assert!(dedup.admit(&instance_changed("pg-1")));
        assert!(dedup.admit(&removed("pg-1")));
        assert!(dedup.admit(&instance_changed("pg-1")));
        assert!(dedup.admit(&instance_changed("pg-1")));
    }

    #[tokio::test]
    async fn test_repeated_removal_is_written_once() {
        let store = FakeStore {
            instance_events: Mutex::new(Some(FakeEvents::ending(vec![removed("pg-0"), removed("pg-0")]))),
            group_events: Mutex::new(Some(FakeEvents::hanging(vec![]))),
            ..Default::default()
        };
        let out = output::buffer();
        lrp_events(&store, None, false, None, &out).await.unwrap();

        let lines = output::lines(out);
        assert_eq!(lines, vec![json!({"type": "desired_lrp_removed", "data": {"desired_lrp": {"process_guid": "pg-0"}}})]);
    }

    #[tokio::test]
    async fn test_both_sources_are_merged_and_closed() {
        let groups = FakeEvents::ending(vec![EventEnvelope::new("actual_lrp_changed", json!({}))]);
        let instances = FakeEvents::hanging(vec![instance_changed("pg-0")]);
        let (groups_closed, instances_closed) = (groups.closed_flag(), instances.closed_flag());

        let store = FakeStore {
            group_events: Mutex::new(Some(groups)),
            instance_events: Mutex::new(Some(instances)),
            ..Default::default()
        };
        let out = output::buffer();
        lrp_events(&store, Some("cell-1"), false, None, &out).await.unwrap();

        let mut seen = types(out);
        seen.sort();
        assert!(seen.contains(&"actual_lrp_changed".to_string()), "{seen:?}");
        assert!(groups_closed.load(Ordering::SeqCst));
        assert!(instances_closed.load(Ordering::SeqCst));

        let calls = store.calls();
        assert!(calls.contains(&("subscribe_lrp_group_events", json!({"cell_id": "cell-1"}))));
        assert!(calls.contains(&("subscribe_lrp_instance_events", json!({"cell_id": "cell-1"}))));
    }

    #[tokio::test]
    async fn test_exclude_skips_group_subscription() {
        let store = FakeStore {
            instance_events: Mutex::new(Some(FakeEvents::ending(vec![instance_changed("pg-0")]))),
            ..Default::default()
        };
        let out = output::buffer();
        lrp_events(&store, None, true, None, &out).await.unwrap();

        assert_eq!(types(out), vec!["actual_lrp_instance_changed"]);
        let names: Vec<_> = store.calls().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["subscribe_lrp_instance_events"]);
    }

    #[tokio::test]
    async fn test_stream_error_aborts() {
        let instances = FakeEvents::failing_after(
            vec![instance_changed("pg-0")],
            BbsError::transport("connection reset"),
        );
        let closed = instances.closed_flag();
        let store = FakeStore {
            instance_events: Mutex::new(Some(instances)),
            ..Default::default()
        };
        let out = output::buffer();
        let err = lrp_events(&store, None, true, None, &out).await.unwrap_err();

        let err = err.downcast_ref::<CfdotError>().unwrap();
        assert_eq!(err.message(), "BBS error: connection reset");
        assert_eq!(err.exit_code(), 4);
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(types(out), vec!["actual_lrp_instance_changed"]);
    }

    #[tokio::test]
    async fn test_task_events_are_not_deduplicated() {
        let created = EventEnvelope::new("task_created", json!({"task": {"task_guid": "tg-1"}}));
        let events = FakeEvents::ending(vec![created.clone(), created]);
        let closed = events.closed_flag();
        let store = FakeStore {
            task_events: Mutex::new(Some(events)),
            ..Default::default()
        };
        let out = output::buffer();
        task_events(&store, Some("cell-1"), None, &out).await.unwrap();

        assert_eq!(types(out), vec!["task_created", "task_created"]);
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(store.calls(), vec![("subscribe_task_events", json!({"cell_id": "cell-1"}))]);
    }
}
