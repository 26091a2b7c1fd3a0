//! Bearer token wrappers and the token endpoint response payload.

// self
use crate::{_prelude::*, error::ConfigError};

/// Redacted bearer token wrapper keeping the credential out of logs.
///
/// The stored value already carries its scheme prefix, e.g. `"Bearer <access>"`,
/// so it can be written into an `Authorization` header verbatim.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken(String);
impl BearerToken {
	/// Wraps a scheme-prefixed header value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner header value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Converts the token into a sensitive `Authorization` header value.
	pub fn header_value(&self) -> Result<http::HeaderValue> {
		let mut value = http::HeaderValue::from_str(&self.0)
			.map_err(http::Error::from)
			.map_err(ConfigError::from)?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl AsRef<str> for BearerToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerToken").field(&"<redacted>").finish()
	}
}
impl Display for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Token endpoint response payload for the client-credentials grant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Token scheme, e.g. `Bearer`.
	pub token_type: String,
	/// Opaque access token issued by the authorization server.
	pub access_token: String,
	/// Token lifetime in seconds.
	pub expires_in: i64,
}
impl TokenResponse {
	/// Collapses the payload into a scheme-prefixed token plus its lifetime.
	pub fn into_parts(self) -> (BearerToken, Duration) {
		let token = BearerToken::new(format!("{} {}", self.token_type, self.access_token));

		(token, Duration::seconds(self.expires_in))
	}
}
