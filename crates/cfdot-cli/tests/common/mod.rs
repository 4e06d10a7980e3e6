// Shared helpers for driving the cfdot binary

#![allow(dead_code)]

use assert_cmd::Command;
use httpmock::MockServer;

/// Every variable the binary reads, so the host environment cannot leak in
const ENV_VARS: &[&str] = &[
    "BBS_URL",
    "BBS_SKIP_CERT_VERIFY",
    "BBS_CA_CERT_FILE",
    "BBS_CERT_FILE",
    "BBS_KEY_FILE",
    "LOCKET_API_LOCATION",
    "SKIP_CERT_VERIFY",
    "CA_CERT_FILE",
    "CLIENT_CERT_FILE",
    "CLIENT_KEY_FILE",
    "CFDOT_TIMEOUT",
    "CFDOT_LOG_LEVEL",
];

pub fn cfdot() -> Command {
    let mut cmd = Command::cargo_bin("cfdot").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// cfdot pointed at a mock record store
pub fn cfdot_against(server: &MockServer) -> Command {
    let mut cmd = cfdot();
    cmd.arg(format!("--bbsURL={}", server.base_url()));
    cmd
}

/// Render events the way the record store streams them
pub fn sse(events: &[(&str, serde_json::Value)]) -> String {
    events
        .iter()
        .enumerate()
        .map(|(id, (event, data))| format!("event: {event}\nid: {id}\ndata: {data}\n\n"))
        .collect()
}
