use std::{future::Future, time::Duration};

use tokio::time;

use crate::{Error, Result};
use quarry_config::Retry;

const MAX_BACKOFF_EXPONENT: u32 = 20;

/// Delay slept after the given failed attempt (1-based): the floor doubled per attempt,
/// capped at the ceiling.
pub fn backoff_for_attempt(policy: &Retry, attempt: u32) -> Duration {
	let exp = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
	let base = policy.initial_backoff_ms.saturating_mul(1_u64 << exp);

	Duration::from_millis(base.min(policy.max_backoff_ms))
}

/// Runs `call` until it succeeds, fails with a non-retryable error, or the attempt budget
/// is spent. Exhaustion is reported as [`Error::Unavailable`].
pub async fn with_retry<T, F, Fut>(policy: &Retry, operation: &'static str, mut call: F) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let max_attempts = policy.max_attempts.max(1);
	let mut attempt = 0;

	loop {
		attempt += 1;

		let err = match call().await {
			Ok(value) => return Ok(value),
			Err(err) if !err.is_retryable() => return Err(err),
			Err(err) => err,
		};

		if attempt >= max_attempts {
			tracing::error!(operation, attempts = attempt, error = %err, "Provider retries exhausted.");

			return Err(Error::Unavailable { operation, attempts: attempt, last_error: err.to_string() });
		}

		let delay = backoff_for_attempt(policy, attempt);

		tracing::warn!(
			operation,
			attempt,
			max_attempts,
			delay_ms = delay.as_millis() as u64,
			error = %err,
			"Provider call failed. Retrying."
		);

		time::sleep(delay).await;
	}
}
