// In-memory stand-ins for the capability traits, shared by command tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cfdot_core::bbs::{ActualLrpKey, BbsError, BbsResult, CellPresence, ErrorType, TaskSpec};
use cfdot_core::locket::{LocketError, LocketResult};
use cfdot_core::rep::RepError;
use cfdot_core::{
    CellWorker, CellWorkerFactory, EventEnvelope, EventSource, LockRequest, LockService,
    RecordFilter, RecordStore, Resource, ResourceType,
};
use serde_json::{Value, json};

type Calls = Mutex<Vec<(&'static str, Value)>>;

fn not_found() -> BbsError {
    BbsError::api(ErrorType::RESOURCE_NOT_FOUND, "the requested resource could not be found")
}

fn key_of(record: &Value) -> &Value {
    record.get("actual_lrp_key").unwrap_or(record)
}

fn field_is(record: &Value, field: &str, expected: Option<Value>) -> bool {
    expected.is_none_or(|expected| key_of(record).get(field) == Some(&expected))
}

/// Scripted event subscription
#[derive(Default)]
pub struct FakeEvents {
    items: VecDeque<BbsResult<Option<EventEnvelope>>>,
    hang: bool,
    closed: Arc<AtomicBool>,
}

impl FakeEvents {
    /// Yields `events` then ends the stream
    pub fn ending(events: Vec<EventEnvelope>) -> Self {
        Self {
            items: events.into_iter().map(|event| Ok(Some(event))).collect(),
            ..Default::default()
        }
    }

    /// Yields `events` then stays open with nothing to say
    pub fn hanging(events: Vec<EventEnvelope>) -> Self {
        Self {
            hang: true,
            ..Self::ending(events)
        }
    }

    pub fn failing_after(events: Vec<EventEnvelope>, err: BbsError) -> Self {
        let mut source = Self::hanging(events);
        source.items.push_back(Err(err));
        source
    }

    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl EventSource for FakeEvents {
    async fn next(&mut self) -> BbsResult<Option<EventEnvelope>> {
        tokio::task::yield_now().await;
        if self.closed.load(Ordering::SeqCst) {
            return Ok(None);
        }
        match self.items.pop_front() {
            Some(item) => item,
            None if self.hang => std::future::pending().await,
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub domains: Vec<String>,
    pub cells: Vec<CellPresence>,
    pub actual_lrps: Vec<Value>,
    pub actual_lrp_groups: Vec<Value>,
    pub desired_lrps: Vec<Value>,
    pub scheduling_infos: Vec<Value>,
    pub tasks: Vec<Value>,
    pub failure: Option<BbsError>,
    pub delay: Option<Duration>,
    pub group_events: Mutex<Option<FakeEvents>>,
    pub instance_events: Mutex<Option<FakeEvents>>,
    pub task_events: Mutex<Option<FakeEvents>>,
    pub calls: Calls,
}

impl FakeStore {
    pub fn failing(err: BbsError) -> Self {
        Self {
            failure: Some(err),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(&'static str, Value)> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond<T>(&self, name: &'static str, payload: Value, value: impl FnOnce() -> BbsResult<T>) -> BbsResult<T> {
        self.calls.lock().unwrap().push((name, payload));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => value(),
        }
    }

    fn take_events(slot: &Mutex<Option<FakeEvents>>) -> FakeEvents {
        slot.lock().unwrap().take().unwrap_or_default()
    }
}

impl RecordStore for FakeStore {
    type Events = FakeEvents;

    async fn domains(&self) -> BbsResult<Vec<String>> {
        self.respond("domains", json!({}), || Ok(self.domains.clone())).await
    }

    async fn upsert_domain(&self, domain: &str, ttl: Duration) -> BbsResult<()> {
        let payload = json!({"domain": domain, "ttl": ttl.as_secs()});
        self.respond("upsert_domain", payload, || Ok(())).await
    }

    async fn cells(&self) -> BbsResult<Vec<CellPresence>> {
        self.respond("cells", json!({}), || Ok(self.cells.clone())).await
    }

    async fn actual_lrps(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>> {
        let payload = serde_json::to_value(filter).unwrap();
        self.respond("actual_lrps", payload, || {
            Ok(self
                .actual_lrps
                .iter()
                .filter(|record| field_is(record, "process_guid", filter.process_guid.clone().map(Value::from)))
                .filter(|record| field_is(record, "index", filter.index.map(Value::from)))
                .cloned()
                .collect())
        })
        .await
    }

    async fn actual_lrp_groups(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>> {
        let payload = serde_json::to_value(filter).unwrap();
        self.respond("actual_lrp_groups", payload, || Ok(self.actual_lrp_groups.clone()))
            .await
    }

    async fn actual_lrp_groups_by_process_guid(&self, process_guid: &str) -> BbsResult<Vec<Value>> {
        self.respond(
            "actual_lrp_groups_by_process_guid",
            json!({"process_guid": process_guid}),
            || {
                Ok(self
                    .actual_lrp_groups
                    .iter()
                    .filter(|group| field_is(group, "process_guid", Some(json!(process_guid))))
                    .cloned()
                    .collect())
            },
        )
        .await
    }

    async fn actual_lrp_group_by_process_guid_and_index(
        &self,
        process_guid: &str,
        index: i32,
    ) -> BbsResult<Value> {
        self.respond(
            "actual_lrp_group_by_process_guid_and_index",
            json!({"process_guid": process_guid, "index": index}),
            || {
                self.actual_lrp_groups
                    .iter()
                    .find(|group| {
                        field_is(group, "process_guid", Some(json!(process_guid)))
                            && field_is(group, "index", Some(json!(index)))
                    })
                    .cloned()
                    .ok_or_else(not_found)
            },
        )
        .await
    }

    async fn retire_actual_lrp(&self, key: &ActualLrpKey) -> BbsResult<()> {
        let payload = serde_json::to_value(key).unwrap();
        self.respond("retire_actual_lrp", payload, || Ok(())).await
    }

    async fn desired_lrps(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>> {
        let payload = serde_json::to_value(filter).unwrap();
        self.respond("desired_lrps", payload, || Ok(self.desired_lrps.clone()))
            .await
    }

    async fn desired_lrp_scheduling_infos(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>> {
        let payload = serde_json::to_value(filter).unwrap();
        self.respond("desired_lrp_scheduling_infos", payload, || {
            Ok(self.scheduling_infos.clone())
        })
        .await
    }

    async fn desired_lrp_by_process_guid(&self, process_guid: &str) -> BbsResult<Value> {
        self.respond(
            "desired_lrp_by_process_guid",
            json!({"process_guid": process_guid}),
            || {
                self.desired_lrps
                    .iter()
                    .find(|lrp| field_is(lrp, "process_guid", Some(json!(process_guid))))
                    .cloned()
                    .ok_or_else(not_found)
            },
        )
        .await
    }

    async fn desire_lrp(&self, desired_lrp: &Value) -> BbsResult<()> {
        self.respond("desire_lrp", desired_lrp.clone(), || Ok(())).await
    }

    async fn update_desired_lrp(&self, process_guid: &str, update: &Value) -> BbsResult<()> {
        let payload = json!({"process_guid": process_guid, "update": update});
        self.respond("update_desired_lrp", payload, || Ok(())).await
    }

    async fn remove_desired_lrp(&self, process_guid: &str) -> BbsResult<()> {
        let payload = json!({"process_guid": process_guid});
        self.respond("remove_desired_lrp", payload, || Ok(())).await
    }

    async fn tasks(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>> {
        let payload = serde_json::to_value(filter).unwrap();
        self.respond("tasks", payload, || Ok(self.tasks.clone())).await
    }

    async fn task_by_guid(&self, task_guid: &str) -> BbsResult<Value> {
        self.respond("task_by_guid", json!({"task_guid": task_guid}), || {
            self.tasks
                .iter()
                .find(|task| field_is(task, "task_guid", Some(json!(task_guid))))
                .cloned()
                .ok_or_else(not_found)
        })
        .await
    }

    async fn desire_task(&self, task: &TaskSpec) -> BbsResult<()> {
        let payload = serde_json::to_value(task).unwrap();
        self.respond("desire_task", payload, || Ok(())).await
    }

    async fn cancel_task(&self, task_guid: &str) -> BbsResult<()> {
        self.respond("cancel_task", json!({"task_guid": task_guid}), || Ok(()))
            .await
    }

    async fn resolving_task(&self, task_guid: &str) -> BbsResult<()> {
        self.respond("resolving_task", json!({"task_guid": task_guid}), || Ok(()))
            .await
    }

    async fn delete_task(&self, task_guid: &str) -> BbsResult<()> {
        self.respond("delete_task", json!({"task_guid": task_guid}), || Ok(()))
            .await
    }

    async fn subscribe_lrp_group_events(&self, cell_id: Option<&str>) -> BbsResult<FakeEvents> {
        self.respond("subscribe_lrp_group_events", json!({"cell_id": cell_id}), || {
            Ok(Self::take_events(&self.group_events))
        })
        .await
    }

    async fn subscribe_lrp_instance_events(&self, cell_id: Option<&str>) -> BbsResult<FakeEvents> {
        self.respond("subscribe_lrp_instance_events", json!({"cell_id": cell_id}), || {
            Ok(Self::take_events(&self.instance_events))
        })
        .await
    }

    async fn subscribe_task_events(&self, cell_id: Option<&str>) -> BbsResult<FakeEvents> {
        self.respond("subscribe_task_events", json!({"cell_id": cell_id}), || {
            Ok(Self::take_events(&self.task_events))
        })
        .await
    }
}

/// Cell workers keyed by the endpoint they were created for
#[derive(Default)]
pub struct FakeCells {
    pub states: HashMap<String, Result<Value, RepError>>,
    pub delays: HashMap<String, Duration>,
    pub created: Mutex<Vec<String>>,
}

pub struct FakeCell {
    state: Result<Value, RepError>,
    delay: Option<Duration>,
}

impl CellWorker for FakeCell {
    async fn state(&self) -> Result<Value, RepError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.state.clone()
    }
}

impl CellWorkerFactory for FakeCells {
    type Client = FakeCell;

    fn create_client(&self, address: &str, _url: &str) -> Result<FakeCell, RepError> {
        self.created.lock().unwrap().push(address.to_string());
        let state = self
            .states
            .get(address)
            .cloned()
            .ok_or_else(|| RepError::InvalidAddress(address.to_string()))?;
        Ok(FakeCell {
            state,
            delay: self.delays.get(address).copied(),
        })
    }
}

pub fn cell(cell_id: &str, rep_address: &str) -> CellPresence {
    CellPresence {
        cell_id: cell_id.to_string(),
        rep_address: rep_address.to_string(),
        ..Default::default()
    }
}

/// Lock service keeping resources in memory
#[derive(Default)]
pub struct FakeLocks {
    pub resources: Mutex<Vec<Resource>>,
    pub failure: Option<LocketError>,
    pub delay: Option<Duration>,
}

impl FakeLocks {
    async fn check(&self) -> LocketResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl LockService for FakeLocks {
    async fn lock(&self, request: &LockRequest) -> LocketResult<()> {
        self.check().await?;
        let mut resources = self.resources.lock().unwrap();
        if resources
            .iter()
            .any(|held| held.key == request.key && held.owner != request.owner)
        {
            return Err(LocketError::Response {
                status: 409,
                message: "lock-collision".into(),
            });
        }
        resources.retain(|held| held.key != request.key);
        resources.push(request.resource());
        Ok(())
    }

    async fn release(&self, resource: &Resource) -> LocketResult<()> {
        self.check().await?;
        let mut resources = self.resources.lock().unwrap();
        let before = resources.len();
        resources.retain(|held| !(held.key == resource.key && held.owner == resource.owner));
        if resources.len() == before {
            return Err(LocketError::Response {
                status: 404,
                message: "resource-not-found".into(),
            });
        }
        Ok(())
    }

    async fn fetch_all(&self, resource_type: ResourceType) -> LocketResult<Vec<Resource>> {
        self.check().await?;
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|held| held.resource_type == resource_type)
            .cloned()
            .collect())
    }
}
