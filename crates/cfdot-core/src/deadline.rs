// crates/cfdot-core/src/deadline.rs - Bounding a remote call by --timeout

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{CfdotError, CfdotResult};

pub const TIMEOUT_MESSAGE: &str = "Timeout exceeded";

/// Run `call` under the deadline, if there is one
///
/// Expiry drops the in-flight call and returns a remote error carrying
/// exactly [`TIMEOUT_MESSAGE`].
pub async fn with_deadline<T, F>(timeout: Option<Duration>, call: F) -> CfdotResult<T>
where
    F: Future<Output = CfdotResult<T>>,
{
    let Some(limit) = timeout else {
        return call.await;
    };

    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            debug!(timeout_secs = limit.as_secs(), "deadline expired");
            Err(CfdotError::remote(TIMEOUT_MESSAGE))
        }
    }
}
