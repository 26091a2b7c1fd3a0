//! Retry schedule with full-range jitter honoring server `Retry-After` hints.

// crates.io
use http::StatusCode;
use rand::Rng;
// self
use crate::_prelude::*;

/// Number of retries attempted after the initial send.
pub const RETRY_COUNT: u32 = 5;
/// Constant lower bound of the jitter window.
pub const BASE_DELAY: StdDuration = StdDuration::from_millis(500);
/// Millisecond multiplier applied to the exponentially growing upper bound.
pub const MULTIPLIER_MS: u64 = 1_000;

/// Returns `true` for statuses the retry layer treats as transient.
pub fn is_retriable_status(status: StatusCode) -> bool {
	matches!(status.as_u16(), 408 | 429 | 502 | 503 | 504)
}

/// Returns `true` for statuses that count against the breaker's
/// consecutive-failure window.
///
/// 500 marks a real server error: the breaker counts it, the retry layer does
/// not re-attempt it.
pub fn is_breaker_failure_status(status: StatusCode) -> bool {
	status.as_u16() == 500 || is_retriable_status(status)
}

/// Returns `true` for error outcomes the retry layer may re-attempt.
pub fn is_transient_error(err: &Error) -> bool {
	matches!(err, Error::Timeout { .. } | Error::Transport(_))
}

/// Bounded backoff schedule with a constant jitter floor.
///
/// The wait before retry `n` is sampled from
/// `uniform[BASE_DELAY, 2^n · MULTIPLIER_MS)`. The upper bound doubles from
/// 2 000 ms at n = 1 up to 32 000 ms at n = 5 while the lower bound stays
/// fixed, so the jitter window widens rather than shifts. This is deliberately
/// not a pure exponential backoff. A server `Retry-After` delta is added on
/// top of the sampled wait, never substituted for it.
#[derive(Clone, Copy, Debug, Default)]
pub struct RetrySchedule;
impl RetrySchedule {
	/// Number of retries this schedule performs after the initial attempt.
	pub fn retry_count(&self) -> u32 {
		RETRY_COUNT
	}

	/// Computes the sleep before retry `attempt` (1-based), honoring `hint`.
	pub fn delay_before(&self, attempt: u32, hint: Option<Duration>) -> StdDuration {
		let upper = MULTIPLIER_MS << attempt.min(RETRY_COUNT);
		let jitter_ms = rand::thread_rng().gen_range(BASE_DELAY.as_millis() as u64..upper);
		let jitter = StdDuration::from_millis(jitter_ms);

		match hint {
			Some(delta) if delta.is_positive() => jitter + delta.unsigned_abs(),
			_ => jitter,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn retriable_statuses_match_the_transient_set() {
		for status in [408, 429, 502, 503, 504] {
			assert!(is_retriable_status(
				StatusCode::from_u16(status).expect("Status fixture should be valid.")
			));
		}
		for status in [200, 400, 401, 403, 404, 500] {
			assert!(!is_retriable_status(
				StatusCode::from_u16(status).expect("Status fixture should be valid.")
			));
		}
	}

	#[test]
	fn breaker_failures_include_internal_server_errors() {
		assert!(is_breaker_failure_status(StatusCode::INTERNAL_SERVER_ERROR));
		assert!(is_breaker_failure_status(StatusCode::SERVICE_UNAVAILABLE));
		assert!(!is_breaker_failure_status(StatusCode::UNAUTHORIZED));
	}

	#[test]
	fn delays_stay_inside_the_jitter_window() {
		let schedule = RetrySchedule;

		for attempt in 1..=RETRY_COUNT {
			let upper = StdDuration::from_millis(MULTIPLIER_MS << attempt);

			for _ in 0..32 {
				let delay = schedule.delay_before(attempt, None);

				assert!(delay >= BASE_DELAY, "Delay must respect the constant floor.");
				assert!(delay < upper, "Delay must stay below 2^n times the multiplier.");
			}
		}
	}

	#[test]
	fn hints_are_added_on_top_of_the_jitter() {
		let schedule = RetrySchedule;
		let delay = schedule.delay_before(1, Some(Duration::seconds(2)));

		assert!(delay >= StdDuration::from_millis(2_500));
		assert!(delay < StdDuration::from_millis(4_000));

		let ignored_past = schedule.delay_before(1, Some(Duration::seconds(-3)));

		assert!(ignored_past < StdDuration::from_millis(2_000));
	}
}
