// crates/cfdot-cli/src/commands/domains.rs - Fresh domain commands

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use cfdot_core::error::CfdotResult;
use cfdot_core::{CfdotError, RecordStore};
use tracing::info;

use super::bounded;
use crate::args;
use crate::cli::SetDomainArgs;
use crate::output::JsonWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDomain {
    pub domain: String,
    /// Zero keeps the domain fresh forever
    pub ttl: Duration,
}

impl SetDomain {
    pub fn from_args(args: &SetDomainArgs) -> CfdotResult<Self> {
        let [domain] = args::exact_args(&args.positionals.args)?;

        let seconds = match args.ttl.as_deref() {
            None => 0,
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                CfdotError::validation(format!(
                    "The value {raw} is not a valid ttl. Should be an integer number of seconds"
                ))
            })?,
        };
        if seconds < 0 {
            return Err(CfdotError::validation("ttl is negative"));
        }

        Ok(Self {
            domain: domain.to_string(),
            ttl: Duration::from_secs(seconds.unsigned_abs()),
        })
    }
}

pub async fn list<S: RecordStore, W: Write>(
    store: &S,
    timeout: Option<Duration>,
    out: &JsonWriter<W>,
) -> Result<()> {
    let domains = bounded(timeout, store.domains()).await?;
    out.emit_all(&domains)?;
    Ok(())
}

pub async fn set<S: RecordStore>(
    store: &S,
    set: &SetDomain,
    timeout: Option<Duration>,
) -> Result<()> {
    bounded(timeout, store.upsert_domain(&set.domain, set.ttl)).await?;
    info!(domain = %set.domain, ttl_secs = set.ttl.as_secs(), "domain marked fresh");
    Ok(())
}
