//! Consecutive-failure circuit breaker shared across one handler's requests.

// crates.io
use tokio::time::Instant;
// self
use crate::{
	_prelude::*,
	obs::{self, BreakerTransition},
};

/// Consecutive failure outcomes required to trip the breaker open.
pub const FAILURE_THRESHOLD: u32 = 3;
/// Cooldown during which an open breaker fails fast.
pub const OPEN_INTERVAL: StdDuration = StdDuration::from_secs(60);

#[derive(Clone, Copy, Debug)]
enum BreakerState {
	/// Requests flow; tracks the consecutive-failure count.
	Closed { consecutive_failures: u32 },
	/// Requests fail fast until the instant elapses.
	Open { until: Instant },
	/// One probe outcome decides between closing and re-opening.
	HalfOpen,
}

/// Shared circuit breaker counting consecutive failure outcomes.
///
/// Clones share state, so the breaker aggregates outcomes across every request
/// flowing through the policy that owns it. Failure outcomes are recorded once
/// per overall operation (after its retries), not once per attempt.
#[derive(Clone, Debug)]
pub struct CircuitBreaker(Arc<Mutex<BreakerState>>);
impl CircuitBreaker {
	/// Admits a request, or fails fast with [`Error::CircuitOpen`] while the
	/// cooldown is running.
	///
	/// The first admission after the cooldown elapses moves the breaker into
	/// its half-open probe state.
	pub fn admit(&self) -> Result<()> {
		let mut state = self.0.lock();

		match *state {
			BreakerState::Closed { .. } | BreakerState::HalfOpen => Ok(()),
			BreakerState::Open { until } => {
				let now = Instant::now();

				if now < until {
					return Err(Error::CircuitOpen { retry_in: until - now });
				}

				*state = BreakerState::HalfOpen;

				obs::record_breaker_transition(BreakerTransition::HalfOpen);

				Ok(())
			},
		}
	}

	/// Records a success outcome, closing the breaker.
	pub fn record_success(&self) {
		let mut state = self.0.lock();

		if matches!(*state, BreakerState::HalfOpen) {
			obs::record_breaker_transition(BreakerTransition::Closed);
		}

		*state = BreakerState::Closed { consecutive_failures: 0 };
	}

	/// Records a failure outcome, tripping the breaker at the threshold and
	/// re-opening it from the half-open probe state.
	pub fn record_failure(&self) {
		let mut state = self.0.lock();

		match *state {
			BreakerState::Closed { consecutive_failures } => {
				let consecutive_failures = consecutive_failures + 1;

				if consecutive_failures >= FAILURE_THRESHOLD {
					*state = BreakerState::Open { until: Instant::now() + OPEN_INTERVAL };

					obs::record_breaker_transition(BreakerTransition::Opened);
				} else {
					*state = BreakerState::Closed { consecutive_failures };
				}
			},
			BreakerState::HalfOpen => {
				*state = BreakerState::Open { until: Instant::now() + OPEN_INTERVAL };

				obs::record_breaker_transition(BreakerTransition::Opened);
			},
			BreakerState::Open { .. } => {},
		}
	}
}
impl Default for CircuitBreaker {
	fn default() -> Self {
		Self(Arc::new(Mutex::new(BreakerState::Closed { consecutive_failures: 0 })))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn trip(breaker: &CircuitBreaker) {
		for _ in 0..FAILURE_THRESHOLD {
			breaker.admit().expect("Closed breaker should admit requests.");
			breaker.record_failure();
		}
	}

	#[tokio::test(start_paused = true)]
	async fn trips_after_three_consecutive_failures() {
		let breaker = CircuitBreaker::default();

		breaker.admit().expect("Fresh breaker should admit requests.");
		breaker.record_failure();
		breaker.record_failure();
		breaker.admit().expect("Breaker below the threshold should still admit requests.");
		breaker.record_failure();

		let err = breaker.admit().expect_err("Tripped breaker should fail fast.");

		assert!(matches!(err, Error::CircuitOpen { retry_in } if retry_in <= OPEN_INTERVAL));
	}

	#[tokio::test(start_paused = true)]
	async fn success_resets_the_failure_count() {
		let breaker = CircuitBreaker::default();

		breaker.record_failure();
		breaker.record_failure();
		breaker.record_success();
		breaker.record_failure();
		breaker.record_failure();
		breaker.admit().expect("Interleaved successes should keep the breaker closed.");
	}

	#[tokio::test(start_paused = true)]
	async fn half_open_probe_closes_on_success_and_reopens_on_failure() {
		let breaker = CircuitBreaker::default();

		trip(&breaker);
		assert!(breaker.admit().is_err());

		tokio::time::advance(OPEN_INTERVAL + StdDuration::from_secs(1)).await;

		breaker.admit().expect("Cooldown elapsed; the probe should be admitted.");
		breaker.record_failure();
		assert!(breaker.admit().is_err(), "A failed probe must re-open the breaker.");

		tokio::time::advance(OPEN_INTERVAL + StdDuration::from_secs(1)).await;

		breaker.admit().expect("Second probe should be admitted after the cooldown.");
		breaker.record_success();
		breaker.admit().expect("A successful probe must close the breaker.");
	}

	#[tokio::test(start_paused = true)]
	async fn clones_share_state() {
		let breaker = CircuitBreaker::default();
		let clone = breaker.clone();

		trip(&breaker);

		assert!(clone.admit().is_err(), "Clones must observe the shared open state.");
	}
}
