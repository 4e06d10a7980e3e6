// crates/cfdot-core/src/bbs/models.rs - Wire shapes the CLI needs to look inside
//
// Most record store payloads (desired LRPs, actual LRPs, tasks, scheduling
// infos) pass through untouched as serde_json::Value. Only the pieces the
// tool itself reads get a struct.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query-narrowing options shared by the listing routes
///
/// Absent fields are left out of the request body entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
}

impl RecordFilter {
    pub fn domain(domain: Option<String>) -> Self {
        Self {
            domain,
            ..Default::default()
        }
    }
}

/// A cell's advertisement in the record store
///
/// Unknown fields are kept so the presence can be echoed back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellPresence {
    pub cell_id: String,
    #[serde(default)]
    pub rep_address: String,
    #[serde(default)]
    pub rep_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identifies one instance of a desired LRP
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualLrpKey {
    pub process_guid: String,
    pub index: i32,
    #[serde(default)]
    pub domain: String,
}

impl ActualLrpKey {
    /// Pull the key out of an actual LRP record, wherever the server nested it
    pub fn from_actual_lrp(record: &Value) -> Option<Self> {
        let key = record.get("actual_lrp_key").unwrap_or(record);
        serde_json::from_value(key.clone()).ok()
    }
}

/// Body of a task creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_guid: String,
    pub domain: String,
    pub task_definition: Value,
}
