// crates/cfdot-cli/src/commands/mod.rs - Command validation and dispatch
//
// Every invocation goes through two steps:
//
//   Commands (raw clap values) ──validate──▶ Invocation ──run──▶ command body
//
// Validation is pure and happens before any client exists, so argument
// problems are reported even when the endpoints are misconfigured. Command
// bodies are generic over the capability traits and are unit tested against
// the fakes in `fakes`.
//
// MODULE ORGANIZATION:
// - domains: fresh domain listing and upsert
// - cells: cell presences
// - cell_state: per-cell and fan-out worker state
// - actual_lrps: actual LRP listings and retirement
// - desired_lrps: desired LRP and scheduling info commands
// - tasks: task listing and lifecycle
// - events: LRP and task event streams
// - locks: lock and presence commands

pub mod actual_lrps;
pub mod cell_state;
pub mod cells;
pub mod desired_lrps;
pub mod domains;
pub mod events;
pub mod locks;
pub mod tasks;

#[cfg(test)]
pub(crate) mod fakes;

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use cfdot_core::bbs::TaskSpec;
use cfdot_core::error::CfdotResult;
use cfdot_core::{CfdotError, LockRequest, RecordFilter, Resource, ResourceType, with_deadline};
use serde_json::Value;

use crate::args;
use crate::cli::{ClaimArgs, Commands};
use crate::context::Context;
use crate::output::JsonWriter;

/// Run one remote call under the configured deadline
pub(crate) async fn bounded<T, E, F>(timeout: Option<Duration>, call: F) -> CfdotResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<CfdotError>,
{
    with_deadline(timeout, async move { call.await.map_err(Into::into) }).await
}

/// A command whose arguments have been checked and typed
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Domains,
    SetDomain(domains::SetDomain),
    Cells,
    Cell(String),
    CellState(String),
    CellStates,
    ActualLrps(RecordFilter),
    ActualLrpGroups(RecordFilter),
    ActualLrpGroupsForGuid {
        process_guid: String,
        index: Option<i32>,
    },
    DesiredLrps(RecordFilter),
    DesiredLrpSchedulingInfos(RecordFilter),
    DesiredLrp(String),
    CreateDesiredLrp(Value),
    UpdateDesiredLrp {
        process_guid: String,
        update: Value,
    },
    DeleteDesiredLrp(String),
    RetireActualLrp {
        process_guid: String,
        index: i32,
    },
    LrpEvents {
        cell_id: Option<String>,
        exclude_groups: bool,
    },
    Tasks(RecordFilter),
    Task(String),
    TaskEvents {
        cell_id: Option<String>,
    },
    CreateTask(TaskSpec),
    CancelTask(String),
    DeleteTask(String),
    ClaimLock(LockRequest),
    ReleaseLock(Resource),
    ClaimPresence(LockRequest),
    Locks,
    Presences,
}

impl Invocation {
    pub fn validate(command: &Commands) -> CfdotResult<Self> {
        let invocation = match command {
            Commands::Domains(args) => {
                args::no_args(&args.args)?;
                Self::Domains
            }
            Commands::SetDomain(args) => Self::SetDomain(domains::SetDomain::from_args(args)?),
            Commands::Cells(args) => {
                args::no_args(&args.args)?;
                Self::Cells
            }
            Commands::Cell(args) => {
                let [cell_id] = args::exact_args(&args.args)?;
                Self::Cell(cell_id.to_string())
            }
            Commands::CellState(args) => {
                let [cell_id] = args::exact_args(&args.args)?;
                Self::CellState(cell_id.to_string())
            }
            Commands::CellStates(args) => {
                args::no_args(&args.args)?;
                Self::CellStates
            }
            Commands::ActualLrps(args) => {
                args::no_args(&args.positionals.args)?;
                Self::ActualLrps(RecordFilter {
                    domain: args::single_domain(&args.domain)?,
                    cell_id: args.cell_id.clone(),
                    process_guid: args.process_guid.clone(),
                    index: args::optional_index(args.index.as_deref())?,
                })
            }
            Commands::ActualLrpGroups(args) => {
                args::no_args(&args.positionals.args)?;
                Self::ActualLrpGroups(RecordFilter {
                    domain: args::single_domain(&args.domain)?,
                    cell_id: args.cell_id.clone(),
                    ..Default::default()
                })
            }
            Commands::ActualLrpGroupsForGuid(args) => {
                let [guid] = args::exact_args(&args.positionals.args)?;
                Self::ActualLrpGroupsForGuid {
                    process_guid: args::process_guid(guid)?,
                    index: args::optional_index(args.index.as_deref())?,
                }
            }
            Commands::DesiredLrps(args) => {
                args::no_args(&args.positionals.args)?;
                Self::DesiredLrps(RecordFilter::domain(args::single_domain(&args.domain)?))
            }
            Commands::DesiredLrpSchedulingInfos(args) => {
                args::no_args(&args.positionals.args)?;
                Self::DesiredLrpSchedulingInfos(RecordFilter::domain(args::single_domain(
                    &args.domain,
                )?))
            }
            Commands::DesiredLrp(args) => {
                let [guid] = args::exact_args(&args.args)?;
                Self::DesiredLrp(args::process_guid(guid)?)
            }
            Commands::CreateDesiredLrp(args) => {
                let [spec] = args::exact_args(&args.args)?;
                Self::CreateDesiredLrp(args::load_spec(spec)?)
            }
            Commands::UpdateDesiredLrp(args) => {
                let [guid, spec] = args::exact_args(&args.args)?;
                Self::UpdateDesiredLrp {
                    process_guid: args::process_guid(guid)?,
                    update: args::load_spec(spec)?,
                }
            }
            Commands::DeleteDesiredLrp(args) => {
                let [guid] = args::exact_args(&args.args)?;
                Self::DeleteDesiredLrp(args::process_guid(guid)?)
            }
            Commands::RetireActualLrp(args) => {
                let [guid, index] = args::exact_args(&args.args)?;
                Self::RetireActualLrp {
                    process_guid: args::process_guid(guid)?,
                    index: args::index(index)?,
                }
            }
            Commands::LrpEvents(args) => {
                args::no_args(&args.filter.positionals.args)?;
                Self::LrpEvents {
                    cell_id: args.filter.cell_id.clone(),
                    exclude_groups: args.exclude_actual_lrp_groups,
                }
            }
            Commands::Tasks(args) => {
                args::no_args(&args.positionals.args)?;
                Self::Tasks(RecordFilter {
                    domain: args::single_domain(&args.domain)?,
                    cell_id: args.cell_id.clone(),
                    ..Default::default()
                })
            }
            Commands::Task(args) => {
                let [guid] = args::exact_args(&args.args)?;
                Self::Task(args::task_guid(guid)?)
            }
            Commands::TaskEvents(args) => {
                args::no_args(&args.positionals.args)?;
                Self::TaskEvents {
                    cell_id: args.cell_id.clone(),
                }
            }
            Commands::CreateTask(args) => {
                let [spec] = args::exact_args(&args.args)?;
                Self::CreateTask(args::load_spec(spec)?)
            }
            Commands::CancelTask(args) => {
                let [guid] = args::exact_args(&args.args)?;
                Self::CancelTask(args::task_guid(guid)?)
            }
            Commands::DeleteTask(args) => {
                let [guid] = args::exact_args(&args.args)?;
                Self::DeleteTask(args::task_guid(guid)?)
            }
            Commands::ClaimLock(args) => Self::ClaimLock(claim(args, ResourceType::Lock)?),
            Commands::ClaimPresence(args) => {
                Self::ClaimPresence(claim(args, ResourceType::Presence)?)
            }
            Commands::ReleaseLock(args) => {
                args::no_args(&args.positionals.args)?;
                Self::ReleaseLock(locks::release_resource(&args.key, &args.owner)?)
            }
            Commands::Locks(args) => {
                args::no_args(&args.args)?;
                Self::Locks
            }
            Commands::Presences(args) => {
                args::no_args(&args.args)?;
                Self::Presences
            }
        };
        Ok(invocation)
    }
}

fn claim(args: &ClaimArgs, resource_type: ResourceType) -> CfdotResult<LockRequest> {
    args::no_args(&args.positionals.args)?;
    let request = LockRequest {
        key: args.key.clone(),
        owner: args.owner.clone(),
        value: args.value.clone(),
        resource_type,
        ttl_seconds: locks::parse_ttl(args.ttl.as_deref()),
    };
    request.validate()?;
    Ok(request)
}

/// Dispatch a validated invocation to its command body
pub async fn run<W: Write>(invocation: Invocation, ctx: &Context, out: &JsonWriter<W>) -> Result<()> {
    let timeout = ctx.timeout();

    match invocation {
        Invocation::Domains => domains::list(ctx.record_store()?, timeout, out).await,
        Invocation::SetDomain(set) => domains::set(ctx.record_store()?, &set, timeout).await,
        Invocation::Cells => cells::list(ctx.record_store()?, timeout, out).await,
        Invocation::Cell(cell_id) => cells::show(ctx.record_store()?, &cell_id, timeout, out).await,
        Invocation::CellState(cell_id) => {
            cell_state::single(ctx.record_store()?, ctx.cell_workers()?, &cell_id, timeout, out)
                .await
        }
        Invocation::CellStates => {
            cell_state::fan_out(ctx.record_store()?, ctx.cell_workers()?, timeout, out).await
        }
        Invocation::ActualLrps(filter) => {
            actual_lrps::list(ctx.record_store()?, &filter, timeout, out).await
        }
        Invocation::ActualLrpGroups(filter) => {
            actual_lrps::list_groups(ctx.record_store()?, &filter, timeout, out).await
        }
        Invocation::ActualLrpGroupsForGuid {
            process_guid,
            index,
        } => {
            actual_lrps::groups_for_guid(ctx.record_store()?, &process_guid, index, timeout, out)
                .await
        }
        Invocation::DesiredLrps(filter) => {
            desired_lrps::list(ctx.record_store()?, &filter, timeout, out).await
        }
        Invocation::DesiredLrpSchedulingInfos(filter) => {
            desired_lrps::scheduling_infos(ctx.record_store()?, &filter, timeout, out).await
        }
        Invocation::DesiredLrp(process_guid) => {
            desired_lrps::show(ctx.record_store()?, &process_guid, timeout, out).await
        }
        Invocation::CreateDesiredLrp(spec) => {
            desired_lrps::create(ctx.record_store()?, &spec, timeout).await
        }
        Invocation::UpdateDesiredLrp {
            process_guid,
            update,
        } => desired_lrps::update(ctx.record_store()?, &process_guid, &update, timeout).await,
        Invocation::DeleteDesiredLrp(process_guid) => {
            desired_lrps::delete(ctx.record_store()?, &process_guid, timeout).await
        }
        Invocation::RetireActualLrp {
            process_guid,
            index,
        } => actual_lrps::retire(ctx.record_store()?, &process_guid, index, timeout).await,
        Invocation::LrpEvents {
            cell_id,
            exclude_groups,
        } => {
            events::lrp_events(
                ctx.record_store()?,
                cell_id.as_deref(),
                exclude_groups,
                timeout,
                out,
            )
            .await
        }
        Invocation::Tasks(filter) => tasks::list(ctx.record_store()?, &filter, timeout, out).await,
        Invocation::Task(task_guid) => {
            tasks::show(ctx.record_store()?, &task_guid, timeout, out).await
        }
        Invocation::TaskEvents { cell_id } => {
            events::task_events(ctx.record_store()?, cell_id.as_deref(), timeout, out).await
        }
        Invocation::CreateTask(spec) => tasks::create(ctx.record_store()?, &spec, timeout).await,
        Invocation::CancelTask(task_guid) => {
            tasks::cancel(ctx.record_store()?, &task_guid, timeout).await
        }
        Invocation::DeleteTask(task_guid) => {
            tasks::delete(ctx.record_store()?, &task_guid, timeout).await
        }
        Invocation::ClaimLock(request) | Invocation::ClaimPresence(request) => {
            locks::claim(ctx.lock_service()?, &request, timeout).await
        }
        Invocation::ReleaseLock(resource) => {
            locks::release(ctx.lock_service()?, &resource, timeout).await
        }
        Invocation::Locks => {
            locks::list(ctx.lock_service()?, ResourceType::Lock, timeout, out).await
        }
        Invocation::Presences => {
            locks::list(ctx.lock_service()?, ResourceType::Presence, timeout, out).await
        }
    }
}
