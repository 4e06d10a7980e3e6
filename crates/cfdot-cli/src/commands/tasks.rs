// crates/cfdot-cli/src/commands/tasks.rs - Task commands

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use cfdot_core::bbs::TaskSpec;
use cfdot_core::{RecordFilter, RecordStore};
use tracing::info;

use super::bounded;
use crate::output::JsonWriter;

pub async fn list<S: RecordStore, W: Write>(
    store: &S,
    filter: &RecordFilter,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let tasks = bounded(timeout, store.tasks(filter)).await?;
    out.emit_all(&tasks)?;
    Ok(())
}

pub async fn show<S: RecordStore, W: Write>(
    store: &S,
    task_guid: &str,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let task = bounded(timeout, store.task_by_guid(task_guid)).await?;
    out.emit(&task)?;
    Ok(())
}

pub async fn create<S: RecordStore>(
    store: &S,
    spec: &TaskSpec,
    timeout: Option<Duration>,
) -> Result<()> {
    bounded(timeout, store.desire_task(spec)).await?;
    info!(task_guid = %spec.task_guid, domain = %spec.domain, "task desired");
    Ok(())
}

pub async fn cancel<S: RecordStore>(
    store: &S,
    task_guid: &str,
    timeout: Option<Duration>,
) -> Result<()> {
    bounded(timeout, store.cancel_task(task_guid)).await?;
    info!(task_guid, "task cancelled");
    Ok(())
}

/// A task must be marked resolving before the store lets it go
pub async fn delete<S: RecordStore>(
    store: &S,
    task_guid: &str,
    timeout: Option<Duration>,
) -> Result<()> {
    bounded(timeout, store.resolving_task(task_guid)).await?;
    bounded(timeout, store.delete_task(task_guid)).await?;
    info!(task_guid, "task deleted");
    Ok(())
}
