// crates/cfdot-cli/src/commands/actual_lrps.rs - Actual LRP commands
//
// `actual-lrps` is the current listing; `actual-lrp-groups` and
// `actual-lrp-groups-for-guid` keep the older group-shaped views available.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use cfdot_core::bbs::ActualLrpKey;
use cfdot_core::{CfdotError, RecordFilter, RecordStore};
use tracing::info;

use super::bounded;
use crate::output::JsonWriter;

pub async fn list<S: RecordStore, W: Write>(
    store: &S,
    filter: &RecordFilter,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let records = bounded(timeout, store.actual_lrps(filter)).await?;
    out.emit_all(&records)?;
    Ok(())
}

pub async fn list_groups<S: RecordStore, W: Write>(
    store: &S,
    filter: &RecordFilter,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let groups = bounded(timeout, store.actual_lrp_groups(filter)).await?;
    out.emit_all(&groups)?;
    Ok(())
}

/// All groups for a process guid, or just the one at `index`
pub async fn groups_for_guid<S: RecordStore, W: Write>(
    store: &S,
    process_guid: &str,
    index: Option<i32>,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    match index {
        Some(index) => {
            let group = bounded(
                timeout,
                store.actual_lrp_group_by_process_guid_and_index(process_guid, index),
            )
            .await?;
            out.emit(&group)?;
        }
        None => {
            let groups =
                bounded(timeout, store.actual_lrp_groups_by_process_guid(process_guid)).await?;
            out.emit_all(&groups)?;
        }
    }
    Ok(())
}

/// Look the instance up to learn its domain, then retire it by full key
pub async fn retire<S: RecordStore>(
    store: &S,
    process_guid: &str,
    index: i32,
    timeout: Option<Duration>,
) -> Result<()> {
    let filter = RecordFilter {
        process_guid: Some(process_guid.to_string()),
        index: Some(index),
        ..Default::default()
    };
    let records = bounded(timeout, store.actual_lrps(&filter)).await?;

    let key = records
        .iter()
        .find_map(ActualLrpKey::from_actual_lrp)
        .ok_or_else(|| {
            CfdotError::not_found(format!(
                "Actual LRP with process guid {process_guid} and index {index} not found"
            ))
        })?;

    bounded(timeout, store.retire_actual_lrp(&key)).await?;
    info!(process_guid, index, domain = %key.domain, "retired actual lrp");
    Ok(())
}
