//! Shared request plumbing: retry on rate limiting and server errors.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use placebot_core::error::{PlacebotError, Result};

/// Whether a response status should be retried.
pub fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Send `request`, resending it after `pause` for as long as the server
/// answers 429 or 5xx. Connection errors are returned immediately.
pub async fn send_with_retry(request: RequestBuilder, pause: Duration) -> Result<Response> {
    let mut attempt: u32 = 1;
    loop {
        let req = request.try_clone().ok_or_else(|| {
            PlacebotError::Other(anyhow::anyhow!("request body cannot be replayed"))
        })?;

        let resp = req.send().await?;
        let status = resp.status();
        if !is_transient(status) {
            return Ok(resp);
        }

        warn!(%status, attempt, url = %resp.url(), "Transient response, retrying");
        attempt = attempt.saturating_add(1);
        tokio::time::sleep(pause).await;
    }
}

/// Decode a JSON body, turning non-success statuses into errors.
pub async fn decode_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = resp.error_for_status()?;
    Ok(resp.json::<T>().await?)
}

/// Round a server-reported wait in seconds up to whole seconds.
pub fn wait_duration(wait_seconds: f64) -> Duration {
    let secs = (wait_seconds + 0.99).floor();
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs(secs as u64)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient(StatusCode::BAD_GATEWAY));
        assert!(!is_transient(StatusCode::OK));
        assert!(!is_transient(StatusCode::FORBIDDEN));
        assert!(!is_transient(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_wait_duration_rounds_up() {
        assert_eq!(wait_duration(0.0), Duration::ZERO);
        assert_eq!(wait_duration(0.5), Duration::from_secs(1));
        assert_eq!(wait_duration(299.2), Duration::from_secs(300));
        assert_eq!(wait_duration(300.0), Duration::from_secs(300));
        assert_eq!(wait_duration(-4.0), Duration::ZERO);
        assert_eq!(wait_duration(f64::NAN), Duration::ZERO);
    }
}
