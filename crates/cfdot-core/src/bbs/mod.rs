// crates/cfdot-core/src/bbs/mod.rs - The record store capability
//
// Commands are written against the `RecordStore` trait rather than the HTTP
// client so they can be exercised with in-memory fakes.

mod client;
mod error;
mod events;
mod models;

use std::time::Duration;

use serde_json::Value;

pub use client::HttpRecordStore;
pub use error::{BbsError, BbsResult, ErrorType};
pub use events::{EventEnvelope, EventSource, SseDecoder, SseEventSource, SseFrame};
pub use models::{ActualLrpKey, CellPresence, RecordFilter, TaskSpec};

pub mod routes {
    pub const DOMAINS: &str = "/v1/domains/list";
    pub const UPSERT_DOMAIN: &str = "/v1/domains/upsert";
    pub const CELLS: &str = "/v1/cells/list.r1";
    pub const ACTUAL_LRPS: &str = "/v1/actual_lrps/list";
    pub const ACTUAL_LRP_GROUPS: &str = "/v1/actual_lrp_groups/list";
    pub const ACTUAL_LRP_GROUPS_BY_PROCESS_GUID: &str =
        "/v1/actual_lrp_groups/list_by_process_guid";
    pub const ACTUAL_LRP_GROUP_BY_PROCESS_GUID_AND_INDEX: &str =
        "/v1/actual_lrp_groups/get_by_process_guid_and_index";
    pub const DESIRED_LRPS: &str = "/v1/desired_lrps/list.r3";
    pub const DESIRED_LRP_SCHEDULING_INFOS: &str = "/v1/desired_lrp_scheduling_infos/list";
    pub const DESIRED_LRP_BY_PROCESS_GUID: &str = "/v1/desired_lrps/get_by_process_guid.r3";
    pub const DESIRE_LRP: &str = "/v1/desired_lrp/desire.r2";
    pub const UPDATE_DESIRED_LRP: &str = "/v1/desired_lrp/update";
    pub const REMOVE_DESIRED_LRP: &str = "/v1/desired_lrp/remove";
    pub const RETIRE_ACTUAL_LRP: &str = "/v1/actual_lrps/retire";
    pub const TASKS: &str = "/v1/tasks/list.r3";
    pub const TASK_BY_GUID: &str = "/v1/tasks/get_by_task_guid.r3";
    pub const DESIRE_TASK: &str = "/v1/tasks/desire.r2";
    pub const CANCEL_TASK: &str = "/v1/tasks/cancel";
    pub const RESOLVING_TASK: &str = "/v1/tasks/resolving";
    pub const DELETE_TASK: &str = "/v1/tasks/delete";
    pub const LRP_GROUP_EVENTS: &str = "/v1/events.r1";
    pub const LRP_INSTANCE_EVENTS: &str = "/v1/events/lrp_instances.r1";
    pub const TASK_EVENTS: &str = "/v1/events/tasks.r1";
}

/// Everything the CLI asks of the record store
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    type Events: EventSource;

    async fn domains(&self) -> BbsResult<Vec<String>>;
    /// A zero TTL marks the domain fresh forever
    async fn upsert_domain(&self, domain: &str, ttl: Duration) -> BbsResult<()>;

    async fn cells(&self) -> BbsResult<Vec<CellPresence>>;

    async fn actual_lrps(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>>;
    /// Legacy listing: only `domain` and `cell_id` of the filter apply
    async fn actual_lrp_groups(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>>;
    async fn actual_lrp_groups_by_process_guid(&self, process_guid: &str) -> BbsResult<Vec<Value>>;
    async fn actual_lrp_group_by_process_guid_and_index(
        &self,
        process_guid: &str,
        index: i32,
    ) -> BbsResult<Value>;
    async fn retire_actual_lrp(&self, key: &ActualLrpKey) -> BbsResult<()>;

    async fn desired_lrps(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>>;
    async fn desired_lrp_scheduling_infos(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>>;
    async fn desired_lrp_by_process_guid(&self, process_guid: &str) -> BbsResult<Value>;
    async fn desire_lrp(&self, desired_lrp: &Value) -> BbsResult<()>;
    async fn update_desired_lrp(&self, process_guid: &str, update: &Value) -> BbsResult<()>;
    async fn remove_desired_lrp(&self, process_guid: &str) -> BbsResult<()>;

    async fn tasks(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>>;
    async fn task_by_guid(&self, task_guid: &str) -> BbsResult<Value>;
    async fn desire_task(&self, task: &TaskSpec) -> BbsResult<()>;
    async fn cancel_task(&self, task_guid: &str) -> BbsResult<()>;
    async fn resolving_task(&self, task_guid: &str) -> BbsResult<()>;
    async fn delete_task(&self, task_guid: &str) -> BbsResult<()>;

    /// Group-granularity LRP events (legacy actual LRP groups plus desired LRPs)
    async fn subscribe_lrp_group_events(&self, cell_id: Option<&str>) -> BbsResult<Self::Events>;
    /// Instance-granularity LRP events (actual LRP instances plus desired LRPs)
    async fn subscribe_lrp_instance_events(&self, cell_id: Option<&str>)
    -> BbsResult<Self::Events>;
    async fn subscribe_task_events(&self, cell_id: Option<&str>) -> BbsResult<Self::Events>;
}
