// crates/cfdot-cli/src/commands/locks.rs - Lock and presence commands

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use cfdot_core::error::CfdotResult;
use cfdot_core::{CfdotError, LockRequest, LockService, Resource, ResourceType};
use tracing::info;

use super::bounded;
use crate::output::JsonWriter;

/// An absent or unparseable TTL reads as zero, which validation rejects
pub fn parse_ttl(raw: Option<&str>) -> i64 {
    raw.and_then(|raw| raw.parse().ok()).unwrap_or(0)
}

pub fn release_resource(key: &str, owner: &str) -> CfdotResult<Resource> {
    if key.is_empty() {
        return Err(CfdotError::validation("key cannot be empty"));
    }
    if owner.is_empty() {
        return Err(CfdotError::validation("owner cannot be empty"));
    }
    Ok(Resource::new(key, owner, "", ResourceType::Lock))
}

pub async fn claim<L: LockService>(
    service: &L,
    request: &LockRequest,
    timeout: Option<Duration>,
) -> Result<()> {
    bounded(timeout, service.lock(request)).await?;
    info!(
        key = %request.key,
        owner = %request.owner,
        kind = ?request.resource_type,
        ttl_secs = request.ttl_seconds,
        "claimed"
    );
    Ok(())
}

pub async fn release<L: LockService>(
    service: &L,
    resource: &Resource,
    timeout: Option<Duration>,
) -> Result<()> {
    bounded(timeout, service.release(resource)).await?;
    info!(key = %resource.key, owner = %resource.owner, "released");
    Ok(())
}

pub async fn list<L: LockService, W: Write>(
    service: &L,
    resource_type: ResourceType,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let resources = bounded(timeout, service.fetch_all(resource_type)).await?;
    out.emit_all(&resources)?;
    Ok(())
}
