// self
use crate::obs::{BreakerTransition, CacheLookup, CallKind};

pub(super) fn increment_call(kind: CallKind, outcome: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"forge_client_calls_total",
			"kind" => kind.as_str(),
			"outcome" => outcome
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

pub(super) fn increment_retry() {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("forge_client_retries_total").increment(1);
	}
}

pub(super) fn increment_breaker_transition(transition: BreakerTransition) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"forge_client_breaker_transitions_total",
			"to" => transition.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = transition;
	}
}

pub(super) fn increment_cache_lookup(lookup: CacheLookup) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("forge_client_token_cache_total", "result" => lookup.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = lookup;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_noop_without_metrics() {
		increment_call(CallKind::Data, "2xx");
		increment_retry();
		increment_breaker_transition(BreakerTransition::HalfOpen);
		increment_cache_lookup(CacheLookup::Hit);
	}
}
