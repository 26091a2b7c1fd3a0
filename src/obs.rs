//! Optional observability for the interposer pipeline.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to open a `forge_client.call` span around each data send and token fetch
//!   (the auth pre-step, retries, and refresh resend all land inside it), with debug events for
//!   scheduled retries and a warning when the circuit breaker opens.
//! - Enable `metrics` to maintain `forge_client_calls_total` (by `kind` + `outcome`),
//!   `forge_client_retries_total`, `forge_client_breaker_transitions_total` (by `to`), and
//!   `forge_client_token_cache_total` (by `result`).
//!
//! Everything degrades to a no-op when the features are off.

mod metrics;
mod tracing;

pub use tracing::{CallSpan, Traced};

// crates.io
use http::StatusCode;
// self
use crate::{_prelude::*, http::HttpResponse};

/// Kinds of outbound calls the interposer distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Caller data request dispatched through the handler.
	Data,
	/// Two-legged exchange against the token endpoint.
	Token,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Data => "data",
			CallKind::Token => "token",
		}
	}
}

/// Circuit breaker transitions surfaced to operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BreakerTransition {
	/// The failure threshold was reached (or a probe failed); calls now fail fast.
	Opened,
	/// The cooldown elapsed; the next call probes upstream.
	HalfOpen,
	/// A probe succeeded; calls flow normally again.
	Closed,
}
impl BreakerTransition {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			BreakerTransition::Opened => "opened",
			BreakerTransition::HalfOpen => "half_open",
			BreakerTransition::Closed => "closed",
		}
	}
}

/// Token cache lookup results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheLookup {
	/// A live entry satisfied the lookup.
	Hit,
	/// No live entry; a fetch follows.
	Miss,
}
impl CacheLookup {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheLookup::Hit => "hit",
			CacheLookup::Miss => "miss",
		}
	}
}

/// Records the terminal outcome of a data send, labeled by status class or
/// failure class.
pub fn record_data_call(result: &Result<HttpResponse>) {
	let outcome = match result {
		Ok(response) => status_class(response.status()),
		Err(err) => failure_class(err),
	};

	metrics::increment_call(CallKind::Data, outcome);
}

/// Records the terminal outcome of a token fetch.
pub fn record_token_fetch<T>(result: &Result<T>) {
	let outcome = match result {
		Ok(_) => "ok",
		Err(err) => failure_class(err),
	};

	metrics::increment_call(CallKind::Token, outcome);
}

/// Records one scheduled retry together with the delay chosen for it.
pub fn record_retry(attempt: u32, delay: StdDuration) {
	metrics::increment_retry();
	tracing::retry_scheduled(attempt, delay);
}

/// Records a circuit breaker state transition.
pub fn record_breaker_transition(transition: BreakerTransition) {
	metrics::increment_breaker_transition(transition);
	tracing::breaker_transition(transition);
}

/// Records a token cache lookup result.
pub fn record_cache_lookup(lookup: CacheLookup) {
	metrics::increment_cache_lookup(lookup);
}

fn status_class(status: StatusCode) -> &'static str {
	match status.as_u16() {
		200..=299 => "2xx",
		300..=399 => "3xx",
		400..=499 => "4xx",
		500..=599 => "5xx",
		_ => "other",
	}
}

fn failure_class(err: &Error) -> &'static str {
	match err {
		Error::Timeout { .. } => "timeout",
		Error::Transport(_) => "transport",
		Error::CircuitOpen { .. } => "circuit_open",
		Error::Cancelled => "cancelled",
		Error::TooManyRequests { .. } => "throttled",
		Error::Http { .. } => "http_error",
		Error::TokenResponse { .. } => "bad_token_payload",
		Error::Config(_) | Error::Argument { .. } => "config",
	}
}
