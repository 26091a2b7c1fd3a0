// self
use crate::{
	_prelude::*,
	obs::{BreakerTransition, CallKind},
};

/// Future wrapped by [`CallSpan::wrap`] when tracing is enabled.
#[cfg(feature = "tracing")]
pub type Traced<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type Traced<F> = F;

/// Span covering one outbound call from dispatch to its terminal outcome.
///
/// Opened before the auth pre-step, so token acquisition, retry sleeps, and
/// the refresh resend all land inside the same span.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Opens a span for the given call kind.
	pub fn new(kind: CallKind) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("forge_client.call", kind = kind.as_str()) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = kind;

			Self {}
		}
	}

	/// Attaches the span to `fut` without holding a guard across `.await` points.
	pub fn wrap<Fut>(&self, fut: Fut) -> Traced<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(super) fn retry_scheduled(attempt: u32, delay: StdDuration) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			attempt,
			delay_ms = delay.as_millis() as u64,
			"Retrying after a transient outcome."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (attempt, delay);
	}
}

pub(super) fn breaker_transition(transition: BreakerTransition) {
	#[cfg(feature = "tracing")]
	{
		match transition {
			BreakerTransition::Opened =>
				tracing::warn!(to = transition.as_str(), "Circuit breaker opened; failing fast."),
			_ => tracing::debug!(to = transition.as_str(), "Circuit breaker transitioned."),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = transition;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn wrapped_futures_resolve_to_their_inner_value() {
		let span = CallSpan::new(CallKind::Token);
		let sum = span.wrap(async { 2 + 3 }).await;

		assert_eq!(sum, 5);
	}

	#[test]
	fn event_helpers_accept_every_transition() {
		for transition in
			[BreakerTransition::Opened, BreakerTransition::HalfOpen, BreakerTransition::Closed]
		{
			breaker_transition(transition);
		}

		retry_scheduled(1, StdDuration::from_millis(500));
	}
}
