// crates/cfdot-cli/src/context.rs - The client set handed to command bodies
//
// Only the clients a command's registry entry asks for are built, so a
// command that never talks to the lock service is not held up by lock
// service configuration problems.

use std::time::Duration;

use anyhow::{Result, anyhow};
use cfdot_core::error::CfdotResult;
use cfdot_core::{ClientFactory, Config, HttpLockService, HttpRecordStore, RepClientFactory};
use tracing::debug;

use crate::registry::Requirement;

pub struct Context {
    timeout: Option<Duration>,
    record_store: Option<HttpRecordStore>,
    cell_workers: Option<RepClientFactory>,
    lock_service: Option<HttpLockService>,
}

impl Context {
    pub fn new(config: &Config, requires: Requirement) -> CfdotResult<Self> {
        let factory = ClientFactory::new(config);
        let mut ctx = Self {
            timeout: config.timeout(),
            record_store: None,
            cell_workers: None,
            lock_service: None,
        };

        match requires {
            Requirement::RecordStore => {
                ctx.record_store = Some(factory.record_store()?);
            }
            Requirement::RecordStoreAndCells => {
                ctx.record_store = Some(factory.record_store()?);
                ctx.cell_workers = Some(factory.cell_workers()?);
            }
            Requirement::LockService => {
                ctx.lock_service = Some(factory.lock_service()?);
            }
        }

        debug!(?requires, "client set ready");
        Ok(ctx)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn record_store(&self) -> Result<&HttpRecordStore> {
        self.record_store
            .as_ref()
            .ok_or_else(|| anyhow!("record store client was not configured for this command"))
    }

    pub fn cell_workers(&self) -> Result<&RepClientFactory> {
        self.cell_workers
            .as_ref()
            .ok_or_else(|| anyhow!("cell worker clients were not configured for this command"))
    }

    pub fn lock_service(&self) -> Result<&HttpLockService> {
        self.lock_service
            .as_ref()
            .ok_or_else(|| anyhow!("lock service client was not configured for this command"))
    }
}
