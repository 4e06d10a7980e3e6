// crates/cfdot-cli/src/commands/desired_lrps.rs - Desired LRP commands

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use cfdot_core::{RecordFilter, RecordStore};
use serde_json::Value;
use tracing::info;

use super::bounded;
use crate::output::JsonWriter;

pub async fn list<S: RecordStore, W: Write>(
    store: &S,
    filter: &RecordFilter,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let lrps = bounded(timeout, store.desired_lrps(filter)).await?;
    out.emit_all(&lrps)?;
    Ok(())
}

pub async fn scheduling_infos<S: RecordStore, W: Write>(
    store: &S,
    filter: &RecordFilter,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let infos = bounded(timeout, store.desired_lrp_scheduling_infos(filter)).await?;
    out.emit_all(&infos)?;
    Ok(())
}

pub async fn show<S: RecordStore, W: Write>(
    store: &S,
    process_guid: &str,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let lrp = bounded(timeout, store.desired_lrp_by_process_guid(process_guid)).await?;
    out.emit(&lrp)?;
    Ok(())
}

pub async fn create<S: RecordStore>(
    store: &S,
    spec: &Value,
    timeout: Option<Duration>,
) -> Result<()> {
    bounded(timeout, store.desire_lrp(spec)).await?;
    info!(process_guid = ?spec.get("process_guid"), "desired lrp created");
    Ok(())
}

pub async fn update<S: RecordStore>(
    store: &S,
    process_guid: &str,
    update: &Value,
    timeout: Option<Duration>,
) -> Result<()> {
    bounded(timeout, store.update_desired_lrp(process_guid, update)).await?;
    info!(process_guid, "desired lrp updated");
    Ok(())
}

pub async fn delete<S: RecordStore>(
    store: &S,
    process_guid: &str,
    timeout: Option<Duration>,
) -> Result<()> {
    bounded(timeout, store.remove_desired_lrp(process_guid)).await?;
    info!(process_guid, "desired lrp removed");
    Ok(())
}
