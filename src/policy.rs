//! Resiliency policy composition over a single transport send.
//!
//! The layers compose as functions around the send, outermost first:
//! **breaker → retry → timeout → send**. The timeout is innermost so each
//! attempt is independently bounded and a slow attempt becomes a retryable
//! event. The breaker is outermost so per-retry delays count against its
//! consecutive-failure window realistically and an open circuit
//! short-circuits the inner layers without any network I/O.

pub mod breaker;
pub mod retry;

pub use breaker::*;
pub use retry::*;

// crates.io
use tokio::time::{sleep, timeout};
// self
use crate::{
	_prelude::*,
	http::{HttpRequest, HttpResponse, SendRequest, clone_request, parse_retry_after},
	obs,
};

/// Default per-attempt timeout.
///
/// Sits above the upstream gateway's 10-second ceiling so gateway 504s are
/// observed as HTTP responses instead of local timeouts.
pub const DEFAULT_ATTEMPT_TIMEOUT: StdDuration = StdDuration::from_secs(15);

/// Composition of circuit breaker, retry, and per-attempt timeout.
///
/// Cloning the policy shares its breaker, so every clone contributes to the
/// same consecutive-failure window.
#[derive(Clone, Debug)]
pub struct ResiliencyPolicy {
	attempt_timeout: StdDuration,
	schedule: RetrySchedule,
	breaker: CircuitBreaker,
}
impl ResiliencyPolicy {
	/// Creates a policy with the default per-attempt timeout and a fresh breaker.
	pub fn new() -> Self {
		Self::with_timeout(DEFAULT_ATTEMPT_TIMEOUT)
	}

	/// Creates a policy with a custom per-attempt timeout and an isolated breaker.
	pub fn with_timeout(attempt_timeout: StdDuration) -> Self {
		Self {
			attempt_timeout,
			schedule: RetrySchedule::default(),
			breaker: CircuitBreaker::default(),
		}
	}

	/// Returns the breaker shared by clones of this policy.
	pub fn breaker(&self) -> &CircuitBreaker {
		&self.breaker
	}

	/// Executes `request` through the breaker, retry, and timeout layers.
	///
	/// The request is re-cloned for every attempt; extensions never travel.
	/// Once the retries are exhausted the last outcome (response or error) is
	/// returned unmodified.
	pub async fn execute<T>(
		&self,
		transport: &T,
		request: &HttpRequest,
		cancel: &CancellationToken,
	) -> Result<HttpResponse>
	where
		T: ?Sized + SendRequest,
	{
		self.breaker.admit()?;

		let outcome = self.run_retries(transport, request, cancel).await;

		match &outcome {
			Ok(response) if is_breaker_failure_status(response.status()) =>
				self.breaker.record_failure(),
			Ok(_) => self.breaker.record_success(),
			Err(err) if is_transient_error(err) => self.breaker.record_failure(),
			// Cancellation says nothing about upstream health.
			Err(_) => {},
		}

		outcome
	}

	async fn run_retries<T>(
		&self,
		transport: &T,
		request: &HttpRequest,
		cancel: &CancellationToken,
	) -> Result<HttpResponse>
	where
		T: ?Sized + SendRequest,
	{
		let mut outcome = self.attempt_once(transport, request, cancel).await;

		for attempt in 1..=self.schedule.retry_count() {
			let hint = match &outcome {
				Ok(response) if is_retriable_status(response.status()) =>
					parse_retry_after(response.headers()),
				Ok(_) => return outcome,
				Err(err) if is_transient_error(err) => None,
				Err(_) => return outcome,
			};
			let delay = self.schedule.delay_before(attempt, hint);

			obs::record_retry(attempt, delay);
			sleep_cancellable(delay, cancel).await?;

			outcome = self.attempt_once(transport, request, cancel).await;
		}

		outcome
	}

	async fn attempt_once<T>(
		&self,
		transport: &T,
		request: &HttpRequest,
		cancel: &CancellationToken,
	) -> Result<HttpResponse>
	where
		T: ?Sized + SendRequest,
	{
		// Dropping the bounded future cancels the in-flight send.
		let bounded = timeout(self.attempt_timeout, transport.send(clone_request(request)));

		tokio::select! {
			_ = cancel.cancelled() => Err(Error::Cancelled),
			result = bounded => match result {
				Ok(Ok(response)) => Ok(response),
				Ok(Err(err)) => Err(Error::Transport(err)),
				Err(_) => Err(Error::Timeout { after: self.attempt_timeout }),
			},
		}
	}
}
impl Default for ResiliencyPolicy {
	fn default() -> Self {
		Self::new()
	}
}

async fn sleep_cancellable(delay: StdDuration, cancel: &CancellationToken) -> Result<()> {
	tokio::select! {
		_ = cancel.cancelled() => Err(Error::Cancelled),
		_ = sleep(delay) => Ok(()),
	}
}
