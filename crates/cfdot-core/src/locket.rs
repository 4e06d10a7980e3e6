// crates/cfdot-core/src/locket.rs - The lock/presence service capability
//
// Locks and presences are the same resource with a different type. A claim
// carries a TTL; the service expires the resource if the owner stops
// renewing it.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::error::{CfdotError, CfdotResult};

pub mod routes {
    pub const LOCK: &str = "/v1/locks/lock";
    pub const RELEASE: &str = "/v1/locks/release";
    pub const FETCH_ALL: &str = "/v1/locks/fetch_all";
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocketError {
    #[error("Locket error: {0}")]
    Transport(String),

    #[error("Locket error: {message}")]
    Response { status: u16, message: String },

    #[error("Locket error: failed to decode response: {0}")]
    Decode(String),
}

pub type LocketResult<T> = Result<T, LocketError>;

impl From<LocketError> for CfdotError {
    fn from(err: LocketError) -> Self {
        CfdotError::lock_service(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Lock,
    Presence,
}

impl ResourceType {
    pub fn code(self) -> u8 {
        match self {
            Self::Lock => 1,
            Self::Presence => 2,
        }
    }
}

/// A lock or presence as stored by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub key: String,
    pub owner: String,
    #[serde(default)]
    pub value: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default)]
    pub type_code: u8,
}

impl Resource {
    pub fn new(
        key: impl Into<String>,
        owner: impl Into<String>,
        value: impl Into<String>,
        resource_type: ResourceType,
    ) -> Self {
        Self {
            key: key.into(),
            owner: owner.into(),
            value: value.into(),
            resource_type,
            type_code: resource_type.code(),
        }
    }
}

/// A claim for a lock or presence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRequest {
    pub key: String,
    pub owner: String,
    pub value: String,
    pub resource_type: ResourceType,
    pub ttl_seconds: i64,
}

impl LockRequest {
    /// Key and owner must be non-empty and the TTL positive
    pub fn validate(&self) -> CfdotResult<()> {
        if self.key.is_empty() {
            return Err(CfdotError::validation("key cannot be empty"));
        }
        if self.owner.is_empty() {
            return Err(CfdotError::validation("owner cannot be empty"));
        }
        if self.ttl_seconds <= 0 {
            return Err(CfdotError::validation(
                "ttl should be an integer greater than zero",
            ));
        }
        Ok(())
    }

    pub fn resource(&self) -> Resource {
        Resource::new(&self.key, &self.owner, &self.value, self.resource_type)
    }
}

#[allow(async_fn_in_trait)]
pub trait LockService {
    async fn lock(&self, request: &LockRequest) -> LocketResult<()>;
    async fn release(&self, resource: &Resource) -> LocketResult<()>;
    async fn fetch_all(&self, resource_type: ResourceType) -> LocketResult<Vec<Resource>>;
}

/// HTTPS client for the lock service at `host:port`
#[derive(Debug, Clone)]
pub struct HttpLockService {
    http: Client,
    base: String,
}

#[derive(Deserialize)]
struct FetchAllResponse {
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Deserialize)]
struct Empty {}

impl HttpLockService {
    pub fn new(http: Client, address: &str) -> Self {
        Self {
            http,
            base: format!("https://{}", address.trim_end_matches('/')),
        }
    }

    #[cfg(test)]
    fn with_base(http: Client, base: &str) -> Self {
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    async fn call<Req, Resp>(&self, route: &'static str, request: &Req) -> LocketResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!(route, "locket request");

        let response = self
            .http
            .post(format!("{}{}", self.base, route))
            .json(request)
            .send()
            .await
            .map_err(|err| LocketError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                format!("request failed with status code: {}", status.as_u16())
            } else {
                body.trim().to_string()
            };
            return Err(LocketError::Response {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Resp>()
            .await
            .map_err(|err| LocketError::Decode(err.to_string()))
    }
}

impl LockService for HttpLockService {
    async fn lock(&self, request: &LockRequest) -> LocketResult<()> {
        let body = json!({"resource": request.resource(), "ttl_in_seconds": request.ttl_seconds});
        self.call::<_, Empty>(routes::LOCK, &body).await?;
        Ok(())
    }

    async fn release(&self, resource: &Resource) -> LocketResult<()> {
        self.call::<_, Empty>(routes::RELEASE, &json!({"resource": resource}))
            .await?;
        Ok(())
    }

    async fn fetch_all(&self, resource_type: ResourceType) -> LocketResult<Vec<Resource>> {
        let body = json!({"type": resource_type, "type_code": resource_type.code()});
        let response: FetchAllResponse = self.call(routes::FETCH_ALL, &body).await?;
        Ok(response.resources)
    }
}
