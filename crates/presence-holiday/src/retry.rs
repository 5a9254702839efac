//! Backoff for holiday API requests.
//!
//! A request is retried only when it never produced a response: the
//! connection failed or the request timed out. Malformed requests fail on
//! the first attempt, and a response with any status code is handed back
//! to the caller untouched.

use std::time::Duration;

/// Delays slept between attempts. Its length is the number of retries.
const BACKOFF: [Duration; 2] = [Duration::from_millis(100), Duration::from_millis(200)];

/// Whether `err` is a transport failure worth another attempt.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

/// Send a request, retrying transient failures on the [`BACKOFF`] schedule.
///
/// `f` is called at most `BACKOFF.len() + 1` times.
pub(crate) async fn retry_send<F, Fut>(endpoint: &str, f: F) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut delays = BACKOFF.iter();
    loop {
        let err = match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) => e,
        };
        let Some(delay) = delays.next().filter(|_| is_transient(&err)) else {
            return Err(err);
        };
        tracing::warn!(
            endpoint,
            retries_left = delays.len(),
            "holiday API unreachable, retrying in {delay:?}: {err}"
        );
        tokio::time::sleep(*delay).await;
    }
}
