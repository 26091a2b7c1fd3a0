//! Client-core error types shared across the cache, policy, fetch, and handler layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client-core error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, abrupt close).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Upstream rejected the call with 429 Too Many Requests.
	#[error("{message}")]
	TooManyRequests {
		/// HTTP status code (always 429).
		status: u16,
		/// Retry-After hint from upstream, if expressed as a relative duration.
		retry_after: Option<Duration>,
		/// Human-readable failure summary including the body snippet.
		message: String,
	},
	/// Upstream returned a non-success status with no dedicated variant.
	#[error("{message}")]
	Http {
		/// HTTP status code.
		status: u16,
		/// Human-readable failure summary including the body snippet.
		message: String,
	},
	/// A required request argument was missing or malformed.
	#[error("Request argument `{field}` is missing or invalid.")]
	Argument {
		/// Name of the offending argument.
		field: &'static str,
	},
	/// The circuit breaker is open; no network I/O was attempted.
	#[error("Circuit breaker is open; next probe allowed in {retry_in:?}.")]
	CircuitOpen {
		/// Remaining cooldown before the next half-open probe.
		retry_in: StdDuration,
	},
	/// A single send attempt exceeded its per-attempt timeout.
	#[error("Attempt exceeded the per-attempt timeout of {after:?}.")]
	Timeout {
		/// The per-attempt bound that was exceeded.
		after: StdDuration,
	},
	/// The caller cancelled the operation.
	#[error("Operation was cancelled by the caller.")]
	Cancelled,
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration and validation failures raised before any network I/O.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required credential field is empty.
	#[error("Configuration field `{field}` is empty.")]
	MissingCredential {
		/// Name of the missing field.
		field: &'static str,
	},
	/// The named agent has no credential set configured.
	#[error("Agent `{agent}` has no configured credentials.")]
	UnknownAgent {
		/// Agent name supplied in the request options.
		agent: String,
	},
	/// Authentication address must use HTTPS (loopback hosts excepted).
	#[error("Authentication address must use HTTPS: {url}.")]
	InsecureAuthenticationAddress {
		/// Offending URL.
		url: String,
	},
	/// Token endpoint returned a non-positive `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Outbound request could not be constructed from its parts.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn config_errors_convert_into_client_errors() {
		let err: Error = ConfigError::MissingCredential { field: "client_secret" }.into();

		assert!(matches!(err, Error::Config(ConfigError::MissingCredential { .. })));
		assert!(err.to_string().contains("client_secret"));
	}

	#[test]
	fn transport_errors_expose_their_source() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer hung up");
		let err: Error = TransportError::from(io).into();
		let source = StdError::source(&err)
			.expect("Transport errors should expose the underlying failure as their source.");

		assert!(source.to_string().contains("peer hung up"));
	}
}
