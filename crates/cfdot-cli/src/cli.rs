// crates/cfdot-cli/src/cli.rs - Command-line surface (pure data structures)
//
// Every global option is an `Option<String>` so the config resolver can tell
// "flag given" from "flag absent" and do its own parsing. Positionals are
// collected as plain string lists; the per-command validators decide what
// "missing" and "too many" mean, which keeps those messages uniform.

use cfdot_core::RawOptions;
use clap::{ArgAction, Args, Parser, Subcommand};

/// Main CLI structure
#[derive(Parser, Debug)]
#[command(name = "cfdot")]
#[command(about = "Diagnose and control the record store, lock service and cells")]
#[command(version)]
#[command(args_override_self = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Endpoint, TLS and deadline options accepted by every command
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// URL of the BBS server to target [env: BBS_URL]
    #[arg(long = "bbsURL", global = true, value_name = "URL")]
    pub bbs_url: Option<String>,

    /// Skip verification of the BBS server certificate [env: BBS_SKIP_CERT_VERIFY]
    #[arg(
        long = "bbsSkipCertVerify",
        global = true,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub bbs_skip_cert_verify: Option<String>,

    /// Path to the CA certificate bundle for the BBS [env: BBS_CA_CERT_FILE]
    #[arg(long = "bbsCACertFile", global = true, value_name = "PATH")]
    pub bbs_ca_cert_file: Option<String>,

    /// Path to the client certificate for mutual TLS with the BBS [env: BBS_CERT_FILE]
    #[arg(long = "bbsCertFile", global = true, value_name = "PATH")]
    pub bbs_cert_file: Option<String>,

    /// Path to the client key for mutual TLS with the BBS [env: BBS_KEY_FILE]
    #[arg(long = "bbsKeyFile", global = true, value_name = "PATH")]
    pub bbs_key_file: Option<String>,

    /// host:port of the Locket API [env: LOCKET_API_LOCATION]
    #[arg(long = "locketAPILocation", global = true, value_name = "HOST:PORT")]
    pub locket_api_location: Option<String>,

    /// Skip certificate verification for Locket and cells [env: SKIP_CERT_VERIFY]
    #[arg(
        long = "skipCertVerify",
        global = true,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub skip_cert_verify: Option<String>,

    /// CA certificate bundle for Locket and cells [env: CA_CERT_FILE]
    #[arg(long = "caCertFile", global = true, value_name = "PATH")]
    pub ca_cert_file: Option<String>,

    /// Client certificate for Locket and cells [env: CLIENT_CERT_FILE]
    #[arg(long = "clientCertFile", global = true, value_name = "PATH")]
    pub client_cert_file: Option<String>,

    /// Client key for Locket and cells [env: CLIENT_KEY_FILE]
    #[arg(long = "clientKeyFile", global = true, value_name = "PATH")]
    pub client_key_file: Option<String>,

    /// Per-request deadline in seconds, 0 for none [env: CFDOT_TIMEOUT]
    #[arg(long = "timeout", global = true, value_name = "SECONDS", allow_negative_numbers = true)]
    pub timeout: Option<String>,
}

impl GlobalArgs {
    pub fn raw_options(&self) -> RawOptions {
        RawOptions {
            bbs_url: self.bbs_url.clone(),
            bbs_skip_cert_verify: self.bbs_skip_cert_verify.clone(),
            bbs_ca_cert_file: self.bbs_ca_cert_file.clone(),
            bbs_cert_file: self.bbs_cert_file.clone(),
            bbs_key_file: self.bbs_key_file.clone(),
            locket_api_location: self.locket_api_location.clone(),
            skip_cert_verify: self.skip_cert_verify.clone(),
            ca_cert_file: self.ca_cert_file.clone(),
            client_cert_file: self.client_cert_file.clone(),
            client_key_file: self.client_key_file.clone(),
            timeout: self.timeout.clone(),
        }
    }
}

/// Every command the tool knows, in registry order
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List fresh domains
    Domains(NoArgs),

    /// Mark a domain as fresh for a number of seconds
    SetDomain(SetDomainArgs),

    /// List registered cell presences
    Cells(NoArgs),

    /// Show the presence of one cell
    Cell(Positionals),

    /// Show the in-memory state of one cell
    CellState(Positionals),

    /// Show the in-memory state of every cell
    CellStates(NoArgs),

    /// List actual LRPs
    ActualLrps(ActualLrpsArgs),

    /// List actual LRP groups (legacy)
    ActualLrpGroups(ActualLrpGroupsArgs),

    /// List actual LRP groups for a process guid
    ActualLrpGroupsForGuid(IndexedArgs),

    /// List desired LRPs
    DesiredLrps(DomainArgs),

    /// List desired LRP scheduling infos
    DesiredLrpSchedulingInfos(DomainArgs),

    /// Show one desired LRP
    DesiredLrp(Positionals),

    /// Create a desired LRP from inline JSON or @FILE
    CreateDesiredLrp(Positionals),

    /// Update a desired LRP from inline JSON or @FILE
    UpdateDesiredLrp(Positionals),

    /// Delete a desired LRP
    DeleteDesiredLrp(Positionals),

    /// Retire one actual LRP instance
    RetireActualLrp(Positionals),

    /// Stream LRP events
    LrpEvents(LrpEventsArgs),

    /// List tasks
    Tasks(TasksArgs),

    /// Show one task
    Task(Positionals),

    /// Stream task events
    TaskEvents(CellFilterArgs),

    /// Create a task from inline JSON or @FILE
    CreateTask(Positionals),

    /// Cancel a task
    CancelTask(Positionals),

    /// Resolve and delete a completed task
    DeleteTask(Positionals),

    /// Claim a lock
    ClaimLock(ClaimArgs),

    /// Release a lock
    ReleaseLock(ReleaseArgs),

    /// Claim a presence
    ClaimPresence(ClaimArgs),

    /// List all locks
    Locks(NoArgs),

    /// List all presences
    Presences(NoArgs),
}

/// Positional arguments, validated per command
#[derive(Args, Debug, Default, Clone)]
pub struct Positionals {
    #[arg(value_name = "ARGS", allow_negative_numbers = true)]
    pub args: Vec<String>,
}

/// Commands without positional arguments still collect strays
#[derive(Args, Debug, Default, Clone)]
pub struct NoArgs {
    #[arg(hide = true)]
    pub args: Vec<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct SetDomainArgs {
    #[command(flatten)]
    pub positionals: Positionals,

    /// Seconds the domain stays fresh, 0 for forever
    #[arg(short = 't', long = "ttl", value_name = "SECONDS", allow_negative_numbers = true)]
    pub ttl: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct DomainArgs {
    #[command(flatten)]
    pub positionals: NoArgs,

    /// Only records in this domain
    #[arg(short = 'd', long = "domain", value_name = "DOMAIN", action = ArgAction::Append)]
    pub domain: Vec<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ActualLrpsArgs {
    #[command(flatten)]
    pub positionals: NoArgs,

    /// Only actual LRPs in this domain
    #[arg(short = 'd', long = "domain", value_name = "DOMAIN", action = ArgAction::Append)]
    pub domain: Vec<String>,

    /// Only actual LRPs on this cell
    #[arg(short = 'c', long = "cell-id", value_name = "CELL_ID")]
    pub cell_id: Option<String>,

    /// Only actual LRPs for this process guid
    #[arg(short = 'p', long = "process-guid", value_name = "GUID")]
    pub process_guid: Option<String>,

    /// Only the instance at this index
    #[arg(short = 'i', long = "index", value_name = "INDEX", allow_negative_numbers = true)]
    pub index: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ActualLrpGroupsArgs {
    #[command(flatten)]
    pub positionals: NoArgs,

    /// Only groups in this domain
    #[arg(short = 'd', long = "domain", value_name = "DOMAIN", action = ArgAction::Append)]
    pub domain: Vec<String>,

    /// Only groups on this cell
    #[arg(short = 'c', long = "cell-id", value_name = "CELL_ID")]
    pub cell_id: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct IndexedArgs {
    #[command(flatten)]
    pub positionals: Positionals,

    /// Only the group at this index
    #[arg(short = 'i', long = "index", value_name = "INDEX", allow_negative_numbers = true)]
    pub index: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct TasksArgs {
    #[command(flatten)]
    pub positionals: NoArgs,

    /// Only tasks in this domain
    #[arg(short = 'd', long = "domain", value_name = "DOMAIN", action = ArgAction::Append)]
    pub domain: Vec<String>,

    /// Only tasks on this cell
    #[arg(short = 'c', long = "cell-id", value_name = "CELL_ID")]
    pub cell_id: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct CellFilterArgs {
    #[command(flatten)]
    pub positionals: NoArgs,

    /// Only events for this cell
    #[arg(short = 'c', long = "cell-id", value_name = "CELL_ID")]
    pub cell_id: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct LrpEventsArgs {
    #[command(flatten)]
    pub filter: CellFilterArgs,

    /// Only stream instance-granularity events
    #[arg(long = "exclude-actual-lrp-groups")]
    pub exclude_actual_lrp_groups: bool,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ClaimArgs {
    #[command(flatten)]
    pub positionals: NoArgs,

    /// Key to claim
    #[arg(short = 'k', long = "key", value_name = "KEY", default_value = "")]
    pub key: String,

    /// Owner of the claim
    #[arg(short = 'o', long = "owner", value_name = "OWNER", default_value = "")]
    pub owner: String,

    /// Value stored with the claim
    #[arg(short = 'v', long = "value", value_name = "VALUE", default_value = "")]
    pub value: String,

    /// Seconds the claim lives without renewal
    #[arg(short = 't', long = "ttl", value_name = "SECONDS", allow_negative_numbers = true)]
    pub ttl: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ReleaseArgs {
    #[command(flatten)]
    pub positionals: NoArgs,

    /// Key to release
    #[arg(short = 'k', long = "key", value_name = "KEY", default_value = "")]
    pub key: String,

    /// Owner holding the lock
    #[arg(short = 'o', long = "owner", value_name = "OWNER", default_value = "")]
    pub owner: String,
}

impl Commands {
    /// The name the command is invoked by; also its registry key
    pub fn name(&self) -> &'static str {
        match self {
            Self::Domains(_) => "domains",
            Self::SetDomain(_) => "set-domain",
            Self::Cells(_) => "cells",
            Self::Cell(_) => "cell",
            Self::CellState(_) => "cell-state",
            Self::CellStates(_) => "cell-states",
            Self::ActualLrps(_) => "actual-lrps",
            Self::ActualLrpGroups(_) => "actual-lrp-groups",
            Self::ActualLrpGroupsForGuid(_) => "actual-lrp-groups-for-guid",
            Self::DesiredLrps(_) => "desired-lrps",
            Self::DesiredLrpSchedulingInfos(_) => "desired-lrp-scheduling-infos",
            Self::DesiredLrp(_) => "desired-lrp",
            Self::CreateDesiredLrp(_) => "create-desired-lrp",
            Self::UpdateDesiredLrp(_) => "update-desired-lrp",
            Self::DeleteDesiredLrp(_) => "delete-desired-lrp",
            Self::RetireActualLrp(_) => "retire-actual-lrp",
            Self::LrpEvents(_) => "lrp-events",
            Self::Tasks(_) => "tasks",
            Self::Task(_) => "task",
            Self::TaskEvents(_) => "task-events",
            Self::CreateTask(_) => "create-task",
            Self::CancelTask(_) => "cancel-task",
            Self::DeleteTask(_) => "delete-task",
            Self::ClaimLock(_) => "claim-lock",
            Self::ReleaseLock(_) => "release-lock",
            Self::ClaimPresence(_) => "claim-presence",
            Self::Locks(_) => "locks",
            Self::Presences(_) => "presences",
        }
    }
}
