// crates/cfdot-core/src/rep.rs - Cell worker ("rep") state clients
//
// Each cell advertises two endpoints in its presence: a plain address and a
// TLS URL. With TLS material configured the URL is preferred (when the cell
// advertises one); otherwise the address is used.

use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors from a single cell worker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepError {
    #[error("invalid cell address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid Response with status code: {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),

    #[error("failed to decode cell state: {0}")]
    Decode(String),

    #[error("Timeout exceeded")]
    Timeout,
}

/// A client for one cell worker
#[allow(async_fn_in_trait)]
pub trait CellWorker {
    async fn state(&self) -> Result<Value, RepError>;
}

/// Builds a cell worker client from a cell's advertised endpoints
pub trait CellWorkerFactory {
    type Client: CellWorker;

    fn create_client(&self, address: &str, url: &str) -> Result<Self::Client, RepError>;
}

/// HTTP(S) client for one cell's `/state` endpoint
#[derive(Debug, Clone)]
pub struct HttpCellWorker {
    http: Client,
    base: Url,
}

impl HttpCellWorker {
    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

impl CellWorker for HttpCellWorker {
    async fn state(&self) -> Result<Value, RepError> {
        let url = format!("{}/state", self.base.as_str().trim_end_matches('/'));
        debug!(url = %url, "fetching cell state");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| RepError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| RepError::Decode(err.to_string()))
    }
}

/// Shared HTTP client plus the rule for choosing a cell's endpoint
#[derive(Debug, Clone)]
pub struct RepClientFactory {
    http: Client,
    tls_enabled: bool,
}

impl RepClientFactory {
    pub fn new(http: Client, tls_enabled: bool) -> Self {
        Self { http, tls_enabled }
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls_enabled
    }
}

impl CellWorkerFactory for RepClientFactory {
    type Client = HttpCellWorker;

    fn create_client(&self, address: &str, url: &str) -> Result<HttpCellWorker, RepError> {
        let endpoint = if self.tls_enabled && !url.is_empty() {
            url
        } else {
            address
        };

        let base = Url::parse(endpoint).map_err(|_| RepError::InvalidAddress(endpoint.to_string()))?;
        Ok(HttpCellWorker {
            http: self.http.clone(),
            base,
        })
    }
}
