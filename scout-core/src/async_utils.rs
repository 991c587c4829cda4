//! Async helpers shared by the fetch workers

use crate::error::{ErrorContext, ScoutError, ScoutResult};
use tokio::time::{timeout, Duration};

/// Bound a page load by `timeout_ms`, mapping expiry to [`ScoutError::FetchTimeout`]
pub async fn with_fetch_timeout<F, T>(future: F, timeout_ms: u64, url: &str) -> ScoutResult<T>
where
    F: std::future::Future<Output = ScoutResult<T>>,
{
    match timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => result,
        Err(_) => Err(ScoutError::FetchTimeout {
            url: url.to_string(),
            duration_ms: timeout_ms,
            context: ErrorContext::new("async_utils")
                .with_operation("page_load")
                .with_metadata("timeout_ms", &timeout_ms.to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_maps_to_fetch_timeout() {
        let result: ScoutResult<()> = with_fetch_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            },
            10,
            "https://slow.example.com",
        )
        .await;

        match result {
            Err(ScoutError::FetchTimeout { url, duration_ms, .. }) => {
                assert_eq!(url, "https://slow.example.com");
                assert_eq!(duration_ms, 10);
            }
            other => panic!("Expected FetchTimeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inner_result_passes_through() {
        let ok = with_fetch_timeout(async { Ok(7) }, 100, "u").await.unwrap();
        assert_eq!(ok, 7);
    }
}
