// crates/cfdot-cli/src/commands/cell_state.rs - Cell worker state, one cell or all
//
// The fan-out runs several cell fetches at once but emits in the order the
// record store listed the cells. A failing cell does not stop the others;
// every failure is collected into one component error at the end.

use std::io::Write;
use std::pin::pin;
use std::time::Duration;

use anyhow::Result;
use cfdot_core::bbs::CellPresence;
use cfdot_core::rep::RepError;
use cfdot_core::{CellWorker, CellWorkerFactory, CfdotError, RecordStore};
use futures::{StreamExt, stream};
use serde_json::Value;
use tracing::{debug, warn};

use super::{bounded, cells};
use crate::output::JsonWriter;

/// Cells fetched at once during fan-out
const MAX_CONCURRENT_CELLS: usize = 8;

fn failure_line(cell_id: &str, err: &RepError) -> String {
    format!("Rep error: Failed to get cell state for cell {cell_id}: {err}")
}

async fn fetch_state<F: CellWorkerFactory>(
    workers: &F,
    cell: &CellPresence,
    timeout: Option<Duration>,
) -> Result<Value, RepError> {
    let client = workers.create_client(&cell.rep_address, &cell.rep_url)?;
    debug!(cell_id = %cell.cell_id, "fetching cell state");

    match timeout {
        Some(limit) => tokio::time::timeout(limit, client.state())
            .await
            .map_err(|_| RepError::Timeout)?,
        None => client.state().await,
    }
}

pub async fn single<S, F, W>(
    store: &S,
    workers: &F,
    cell_id: &str,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()>
where
    S: RecordStore,
    F: CellWorkerFactory,
    W: Write,
{
    let presences = bounded(timeout, store.cells()).await?;
    let cell = cells::find(&presences, cell_id)?;

    let state = fetch_state(workers, cell, timeout)
        .await
        .map_err(|err| CfdotError::component(failure_line(&cell.cell_id, &err)))?;
    out.emit(&state)?;
    Ok(())
}

pub async fn fan_out<S, F, W>(
    store: &S,
    workers: &F,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()>
where
    S: RecordStore,
    F: CellWorkerFactory,
    W: Write,
{
    let presences = bounded(timeout, store.cells()).await?;

    let mut results = pin!(
        stream::iter(&presences)
            .map(|cell| async move { (cell, fetch_state(workers, cell, timeout).await) })
            .buffered(MAX_CONCURRENT_CELLS)
    );

    let mut failures = Vec::new();
    while let Some((cell, result)) = results.next().await {
        match result {
            Ok(state) => out.emit(&state)?,
            Err(err) => {
                warn!(cell_id = %cell.cell_id, error = %err, "cell state fetch failed");
                failures.push(failure_line(&cell.cell_id, &err));
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(CfdotError::component(failures.join("\n")).into())
    }
}
