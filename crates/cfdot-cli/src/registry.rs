// crates/cfdot-cli/src/registry.rs - Ordered table of every command
//
// The registry is the single place that says which collaborators a command
// needs and how its usage line reads. The clap command tree is patched from
// it at startup so `--help` and the validation-error banner agree.

use clap::{Command, CommandFactory};

use crate::cli::Cli;

/// Which clients a command needs before its body runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    RecordStore,
    RecordStoreAndCells,
    LockService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub requires: Requirement,
}

const fn spec(name: &'static str, usage: &'static str, requires: Requirement) -> CommandSpec {
    CommandSpec {
        name,
        usage,
        requires,
    }
}

use Requirement::{LockService, RecordStore, RecordStoreAndCells};

pub const REGISTRY: &[CommandSpec] = &[
    spec("domains", "cfdot domains [flags]", RecordStore),
    spec("set-domain", "cfdot set-domain DOMAIN [--ttl SECONDS] [flags]", RecordStore),
    spec("cells", "cfdot cells [flags]", RecordStore),
    spec("cell", "cfdot cell CELL_ID [flags]", RecordStore),
    spec("cell-state", "cfdot cell-state CELL_ID [flags]", RecordStoreAndCells),
    spec("cell-states", "cfdot cell-states [flags]", RecordStoreAndCells),
    spec(
        "actual-lrps",
        "cfdot actual-lrps [-d DOMAIN] [-c CELL_ID] [-p PROCESS_GUID] [-i INDEX] [flags]",
        RecordStore,
    ),
    spec(
        "actual-lrp-groups",
        "cfdot actual-lrp-groups [-d DOMAIN] [-c CELL_ID] [flags]",
        RecordStore,
    ),
    spec(
        "actual-lrp-groups-for-guid",
        "cfdot actual-lrp-groups-for-guid PROCESS_GUID [-i INDEX] [flags]",
        RecordStore,
    ),
    spec("desired-lrps", "cfdot desired-lrps [-d DOMAIN] [flags]", RecordStore),
    spec(
        "desired-lrp-scheduling-infos",
        "cfdot desired-lrp-scheduling-infos [-d DOMAIN] [flags]",
        RecordStore,
    ),
    spec("desired-lrp", "cfdot desired-lrp PROCESS_GUID [flags]", RecordStore),
    spec("create-desired-lrp", "cfdot create-desired-lrp (SPEC|@FILE) [flags]", RecordStore),
    spec(
        "update-desired-lrp",
        "cfdot update-desired-lrp PROCESS_GUID (SPEC|@FILE) [flags]",
        RecordStore,
    ),
    spec("delete-desired-lrp", "cfdot delete-desired-lrp PROCESS_GUID [flags]", RecordStore),
    spec("retire-actual-lrp", "cfdot retire-actual-lrp PROCESS_GUID INDEX [flags]", RecordStore),
    spec(
        "lrp-events",
        "cfdot lrp-events [-c CELL_ID] [--exclude-actual-lrp-groups] [flags]",
        RecordStore,
    ),
    spec("tasks", "cfdot tasks [-d DOMAIN] [-c CELL_ID] [flags]", RecordStore),
    spec("task", "cfdot task TASK_GUID [flags]", RecordStore),
    spec("task-events", "cfdot task-events [-c CELL_ID] [flags]", RecordStore),
    spec("create-task", "cfdot create-task (SPEC|@FILE) [flags]", RecordStore),
    spec("cancel-task", "cfdot cancel-task TASK_GUID [flags]", RecordStore),
    spec("delete-task", "cfdot delete-task TASK_GUID [flags]", RecordStore),
    spec(
        "claim-lock",
        "cfdot claim-lock --key KEY --owner OWNER [--value VALUE] --ttl SECONDS [flags]",
        LockService,
    ),
    spec("release-lock", "cfdot release-lock --key KEY --owner OWNER [flags]", LockService),
    spec(
        "claim-presence",
        "cfdot claim-presence --key KEY --owner OWNER [--value VALUE] --ttl SECONDS [flags]",
        LockService,
    ),
    spec("locks", "cfdot locks [flags]", LockService),
    spec("presences", "cfdot presences [flags]", LockService),
];

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    REGISTRY.iter().find(|spec| spec.name == name)
}

/// The clap command tree with registry usage lines applied
pub fn command() -> Command {
    REGISTRY.iter().fold(Cli::command(), |cmd, spec| {
        cmd.mut_subcommand(spec.name, |sub| sub.override_usage(spec.usage))
    })
}

/// Rendered help for one command, used under validation errors
pub fn render_help(name: &str) -> Option<String> {
    let mut cmd = command();
    cmd.build();
    cmd.find_subcommand_mut(name)
        .map(|sub| sub.render_help().to_string())
}
