//! Exponential backoff for transient rendering-surface failures.
//!
//! Protocol hiccups and navigation timeouts are retried; a bad selector or a
//! script error would fail the same way again and is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::SurfaceError;

/// Ceiling on any single backoff sleep.
const MAX_DELAY_SECS: u64 = 60;

fn is_retriable(err: &SurfaceError) -> bool {
    matches!(
        err,
        SurfaceError::Protocol(_) | SurfaceError::Timeout { .. }
    )
}

/// Runs `operation`, retrying transient errors up to `max_retries` times.
///
/// The wait before retry `n` (1-based) is `backoff_base_secs * 2^(n-1)`
/// seconds, so `max_retries = 2` with a 2 s base attempts at most three times
/// and sleeps 2 s then 4 s. Each sleep is capped at 60 s. The last error is
/// returned once retries run out.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, SurfaceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SurfaceError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        let delay_secs = backoff_delay_secs(backoff_base_secs, attempt);
        tracing::warn!(
            attempt = attempt + 1,
            max_retries,
            delay_secs,
            error = %err,
            "transient surface error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

/// Sleep before the retry that follows failed attempt `attempt` (0-based).
fn backoff_delay_secs(backoff_base_secs: u64, attempt: u32) -> u64 {
    backoff_base_secs
        .saturating_mul(1u64 << attempt.min(10))
        .min(MAX_DELAY_SECS)
}
