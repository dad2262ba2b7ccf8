//! HTTP handlers for the tapping-game backend.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod rounds;
pub mod taps;

use error::ApiError;

/// Run blocking DB work off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("blocking task join error: {}", e))?;
    result.map_err(ApiError::from)
}
