//! Per-request options attached to outbound requests through `http` extensions.

// self
use crate::_prelude::*;

/// Sentinel agent name that resolves to the default credential pair.
pub const DEFAULT_AGENT: &str = "default";

/// Options recognized by the interposer for a single outbound request.
///
/// Attach options with [`attach`](Self::attach) before handing the request to
/// the handler; the handler consumes them with [`take`](Self::take) so they
/// never travel to the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
	/// Per-attempt timeout override for this call.
	pub timeout: Option<StdDuration>,
	/// Scope for which the interposer manages authorization.
	pub scope: Option<String>,
	/// Named alternate credential set from the configuration.
	pub agent: Option<String>,
}
impl RequestOptions {
	/// Creates empty options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Overrides the per-attempt timeout for this call.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Requests managed authorization for the provided scope.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Names an alternate credential set from the configuration.
	pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
		self.agent = Some(agent.into());

		self
	}

	/// Computes the token cache key for these options.
	///
	/// The key is the plain concatenation `agent + scope`; the default identity
	/// (empty agent or the [`DEFAULT_AGENT`] sentinel) contributes an empty
	/// agent component.
	pub fn cache_key(&self) -> String {
		let agent = match self.agent.as_deref() {
			None | Some(DEFAULT_AGENT) => "",
			Some(other) => other,
		};

		format!("{agent}{}", self.scope.as_deref().unwrap_or_default())
	}

	/// Attaches these options to a request's extensions.
	pub fn attach<B>(self, request: &mut http::Request<B>) {
		request.extensions_mut().insert(self);
	}

	/// Removes and returns the options attached to a request, if any.
	pub fn take<B>(request: &mut http::Request<B>) -> Option<Self> {
		request.extensions_mut().remove::<Self>()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn cache_key_concatenates_agent_and_scope() {
		let default_identity = RequestOptions::new().with_scope("data:read");

		assert_eq!(default_identity.cache_key(), "data:read");

		let sentinel = RequestOptions::new().with_agent(DEFAULT_AGENT).with_scope("data:read");

		assert_eq!(sentinel.cache_key(), "data:read");

		let named = RequestOptions::new().with_agent("render").with_scope("data:read");

		assert_eq!(named.cache_key(), "renderdata:read");
		assert_eq!(RequestOptions::new().cache_key(), "");
	}

	#[test]
	fn options_round_trip_through_extensions() {
		let mut request = http::Request::new(Vec::<u8>::new());
		let options = RequestOptions::new()
			.with_timeout(StdDuration::from_secs(3))
			.with_scope("data:write");

		options.clone().attach(&mut request);

		assert_eq!(RequestOptions::take(&mut request), Some(options));
		assert_eq!(RequestOptions::take(&mut request), None);
	}
}
