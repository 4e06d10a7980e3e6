// crates/cfdot-cli/src/commands/cells.rs - Cell presence commands

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use cfdot_core::bbs::CellPresence;
use cfdot_core::error::CfdotResult;
use cfdot_core::{CfdotError, RecordStore};

use super::bounded;
use crate::output::JsonWriter;

pub async fn list<S: RecordStore, W: Write>(
    store: &S,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let cells = bounded(timeout, store.cells()).await?;
    out.emit_all(&cells)?;
    Ok(())
}

pub async fn show<S: RecordStore, W: Write>(
    store: &S,
    cell_id: &str,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let cells = bounded(timeout, store.cells()).await?;
    out.emit(find(&cells, cell_id)?)?;
    Ok(())
}

/// The presence registered under `cell_id`
pub fn find<'a>(cells: &'a [CellPresence], cell_id: &str) -> CfdotResult<&'a CellPresence> {
    cells
        .iter()
        .find(|cell| cell.cell_id == cell_id)
        .ok_or_else(|| CfdotError::not_found(format!("Cell {cell_id} not found")))
}
