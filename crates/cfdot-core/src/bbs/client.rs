// crates/cfdot-core/src/bbs/client.rs - JSON-over-HTTP record store client

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::error::{BbsError, BbsResult, ErrorType};
use super::events::SseEventSource;
use super::models::{ActualLrpKey, CellPresence, RecordFilter, TaskSpec};
use super::{RecordStore, routes};

/// Record store client bound to one endpoint
#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    http: Client,
    base: Url,
}

/// Typed error as it appears inside a response object
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    error_type: ErrorType,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Response<T> {
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Default, Deserialize)]
struct Empty {}

#[derive(Debug, Default, Deserialize)]
struct DomainsResponse {
    #[serde(default)]
    domains: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CellsResponse {
    #[serde(default)]
    cells: Vec<CellPresence>,
}

#[derive(Debug, Default, Deserialize)]
struct ActualLrpsResponse {
    #[serde(default)]
    actual_lrps: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ActualLrpGroupsResponse {
    #[serde(default)]
    actual_lrp_groups: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ActualLrpGroupResponse {
    #[serde(default)]
    actual_lrp_group: Value,
}

#[derive(Debug, Default, Deserialize)]
struct DesiredLrpsResponse {
    #[serde(default)]
    desired_lrps: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulingInfosResponse {
    #[serde(default)]
    desired_lrp_scheduling_infos: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct DesiredLrpResponse {
    #[serde(default)]
    desired_lrp: Value,
}

#[derive(Debug, Default, Deserialize)]
struct TasksResponse {
    #[serde(default)]
    tasks: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TaskResponse {
    #[serde(default)]
    task: Value,
}

#[derive(Serialize)]
struct CellIdQuery<'a> {
    cell_id: &'a str,
}

impl HttpRecordStore {
    pub fn new(http: Client, base: Url) -> Self {
        Self { http, base }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), route)
    }

    /// POST a JSON request and unwrap the response envelope
    async fn call<Req, Resp>(&self, route: &'static str, request: &Req) -> BbsResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!(route, "bbs request");

        let response = self
            .http
            .post(self.url(route))
            .json(request)
            .send()
            .await
            .map_err(BbsError::transport)?;

        let status = response.status();
        if !status.is_success() {
            debug!(route, status = status.as_u16(), "bbs request failed");
            return Err(BbsError::invalid_status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(BbsError::transport)?;
        let envelope: Response<Resp> = serde_json::from_slice(&bytes).map_err(|err| {
            BbsError::api(
                ErrorType::INVALID_JSON,
                format!("failed to decode response from {route}: {err}"),
            )
        })?;

        match envelope.error {
            Some(err) => Err(BbsError::api(err.error_type, err.message)),
            None => Ok(envelope.body),
        }
    }

    async fn subscribe(
        &self,
        route: &'static str,
        cell_id: Option<&str>,
    ) -> BbsResult<SseEventSource> {
        debug!(route, ?cell_id, "bbs subscribe");

        let mut request = self
            .http
            .get(self.url(route))
            .header(reqwest::header::ACCEPT, "text/event-stream");
        if let Some(cell_id) = cell_id {
            request = request.query(&CellIdQuery { cell_id });
        }

        let response = request.send().await.map_err(BbsError::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(BbsError::invalid_status(status.as_u16()));
        }

        Ok(SseEventSource::new(route, response))
    }
}

impl RecordStore for HttpRecordStore {
    type Events = SseEventSource;

    async fn domains(&self) -> BbsResult<Vec<String>> {
        let resp: DomainsResponse = self.call(routes::DOMAINS, &json!({})).await?;
        Ok(resp.domains)
    }

    async fn upsert_domain(&self, domain: &str, ttl: Duration) -> BbsResult<()> {
        let request = json!({"domain": domain, "ttl": ttl.as_secs()});
        self.call::<_, Empty>(routes::UPSERT_DOMAIN, &request).await?;
        Ok(())
    }

    async fn cells(&self) -> BbsResult<Vec<CellPresence>> {
        let resp: CellsResponse = self.call(routes::CELLS, &json!({})).await?;
        Ok(resp.cells)
    }

    async fn actual_lrps(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>> {
        let resp: ActualLrpsResponse = self.call(routes::ACTUAL_LRPS, filter).await?;
        Ok(resp.actual_lrps)
    }

    async fn actual_lrp_groups(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>> {
        let resp: ActualLrpGroupsResponse = self.call(routes::ACTUAL_LRP_GROUPS, filter).await?;
        Ok(resp.actual_lrp_groups)
    }

    async fn actual_lrp_groups_by_process_guid(&self, process_guid: &str) -> BbsResult<Vec<Value>> {
        let request = json!({"process_guid": process_guid});
        let resp: ActualLrpGroupsResponse = self
            .call(routes::ACTUAL_LRP_GROUPS_BY_PROCESS_GUID, &request)
            .await?;
        Ok(resp.actual_lrp_groups)
    }

    async fn actual_lrp_group_by_process_guid_and_index(
        &self,
        process_guid: &str,
        index: i32,
    ) -> BbsResult<Value> {
        let request = json!({"process_guid": process_guid, "index": index});
        let resp: ActualLrpGroupResponse = self
            .call(routes::ACTUAL_LRP_GROUP_BY_PROCESS_GUID_AND_INDEX, &request)
            .await?;
        Ok(resp.actual_lrp_group)
    }

    async fn desired_lrps(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>> {
        let resp: DesiredLrpsResponse = self.call(routes::DESIRED_LRPS, filter).await?;
        Ok(resp.desired_lrps)
    }

    async fn desired_lrp_scheduling_infos(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>> {
        let resp: SchedulingInfosResponse =
            self.call(routes::DESIRED_LRP_SCHEDULING_INFOS, filter).await?;
        Ok(resp.desired_lrp_scheduling_infos)
    }

    async fn desired_lrp_by_process_guid(&self, process_guid: &str) -> BbsResult<Value> {
        let request = json!({"process_guid": process_guid});
        let resp: DesiredLrpResponse = self.call(routes::DESIRED_LRP_BY_PROCESS_GUID, &request).await?;
        Ok(resp.desired_lrp)
    }

    async fn desire_lrp(&self, desired_lrp: &Value) -> BbsResult<()> {
        let request = json!({"desired_lrp": desired_lrp});
        self.call::<_, Empty>(routes::DESIRE_LRP, &request).await?;
        Ok(())
    }

    async fn update_desired_lrp(&self, process_guid: &str, update: &Value) -> BbsResult<()> {
        let request = json!({"process_guid": process_guid, "update": update});
        self.call::<_, Empty>(routes::UPDATE_DESIRED_LRP, &request).await?;
        Ok(())
    }

    async fn remove_desired_lrp(&self, process_guid: &str) -> BbsResult<()> {
        let request = json!({"process_guid": process_guid});
        self.call::<_, Empty>(routes::REMOVE_DESIRED_LRP, &request).await?;
        Ok(())
    }

    async fn retire_actual_lrp(&self, key: &ActualLrpKey) -> BbsResult<()> {
        let request = json!({"actual_lrp_key": key});
        self.call::<_, Empty>(routes::RETIRE_ACTUAL_LRP, &request).await?;
        Ok(())
    }

    async fn tasks(&self, filter: &RecordFilter) -> BbsResult<Vec<Value>> {
        let resp: TasksResponse = self.call(routes::TASKS, filter).await?;
        Ok(resp.tasks)
    }

    async fn task_by_guid(&self, task_guid: &str) -> BbsResult<Value> {
        let request = json!({"task_guid": task_guid});
        let resp: TaskResponse = self.call(routes::TASK_BY_GUID, &request).await?;
        Ok(resp.task)
    }

    async fn desire_task(&self, task: &TaskSpec) -> BbsResult<()> {
        self.call::<_, Empty>(routes::DESIRE_TASK, task).await?;
        Ok(())
    }

    async fn cancel_task(&self, task_guid: &str) -> BbsResult<()> {
        let request = json!({"task_guid": task_guid});
        self.call::<_, Empty>(routes::CANCEL_TASK, &request).await?;
        Ok(())
    }

    async fn resolving_task(&self, task_guid: &str) -> BbsResult<()> {
        let request = json!({"task_guid": task_guid});
        self.call::<_, Empty>(routes::RESOLVING_TASK, &request).await?;
        Ok(())
    }

    async fn delete_task(&self, task_guid: &str) -> BbsResult<()> {
        let request = json!({"task_guid": task_guid});
        self.call::<_, Empty>(routes::DELETE_TASK, &request).await?;
        Ok(())
    }

    async fn subscribe_lrp_group_events(&self, cell_id: Option<&str>) -> BbsResult<SseEventSource> {
        self.subscribe(routes::LRP_GROUP_EVENTS, cell_id).await
    }

    async fn subscribe_lrp_instance_events(
        &self,
        cell_id: Option<&str>,
    ) -> BbsResult<SseEventSource> {
        self.subscribe(routes::LRP_INSTANCE_EVENTS, cell_id).await
    }

    async fn subscribe_task_events(&self, cell_id: Option<&str>) -> BbsResult<SseEventSource> {
        self.subscribe(routes::TASK_EVENTS, cell_id).await
    }
}
