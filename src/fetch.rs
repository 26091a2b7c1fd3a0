//! Two-legged token acquisition against the OAuth token endpoint.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http::{
	Method,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	config::ForgeConfig,
	error::ConfigError,
	http::{HttpRequest, SendRequest},
	obs::{self, CallKind, CallSpan},
	policy::ResiliencyPolicy,
	token::{BearerToken, TokenResponse},
	validate,
};

/// Fetches client-credentials bearer tokens for the configured identities.
///
/// Token requests flow through the same resiliency policy as data calls, so
/// transient token endpoint failures are retried and count against the shared
/// breaker. They never receive the 401-refresh wrapper: a rejected token
/// request is terminal.
pub struct TokenFetcher<T>
where
	T: ?Sized + SendRequest,
{
	config: Arc<ForgeConfig>,
	transport: Arc<T>,
	policy: ResiliencyPolicy,
}
impl<T> TokenFetcher<T>
where
	T: ?Sized + SendRequest,
{
	/// Creates a fetcher sharing the handler's transport and default policy.
	pub fn new(config: Arc<ForgeConfig>, transport: Arc<T>, policy: ResiliencyPolicy) -> Self {
		Self { config, transport, policy }
	}

	/// Obtains a fresh token for `(agent, scope)` via the client-credentials
	/// grant.
	///
	/// Returns the scheme-prefixed token together with its lifetime. Failures
	/// propagate to the caller of the original API request; nothing is
	/// swallowed here.
	pub async fn two_legged(
		&self,
		agent: &str,
		scope: &str,
		cancel: &CancellationToken,
	) -> Result<(BearerToken, Duration)> {
		let span = CallSpan::new(CallKind::Token);
		let result = span
			.wrap(async move {
				let (client_id, client_secret) = self.config.credentials_for(agent)?;
				let request = build_token_request(
					&self.config.authentication_address,
					client_id,
					client_secret,
					scope,
				)?;
				let response =
					self.policy.execute(self.transport.as_ref(), &request, cancel).await?;
				let response = validate::ensure_success(response)?;
				let deserializer = &mut serde_json::Deserializer::from_slice(response.body());
				let payload: TokenResponse = serde_path_to_error::deserialize(deserializer)
					.map_err(|source| Error::TokenResponse { source })?;

				if payload.expires_in <= 0 {
					return Err(ConfigError::NonPositiveExpiresIn.into());
				}

				Ok(payload.into_parts())
			})
			.await;

		obs::record_token_fetch(&result);

		result
	}
}
impl<T> Debug for TokenFetcher<T>
where
	T: ?Sized + SendRequest,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenFetcher").field("config", &self.config).finish()
	}
}

fn build_token_request(
	address: &Url,
	client_id: &str,
	client_secret: &str,
	scope: &str,
) -> Result<HttpRequest> {
	let credentials = STANDARD.encode(format!("{client_id}:{client_secret}"));
	let body = url::form_urlencoded::Serializer::new(String::new())
		.append_pair("grant_type", "client_credentials")
		.append_pair("scope", scope)
		.finish();
	let request = http::Request::builder()
		.method(Method::POST)
		.uri(address.as_str())
		.header(AUTHORIZATION, format!("Basic {credentials}"))
		.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(body.into_bytes())
		.map_err(ConfigError::from)?;

	Ok(request)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_requests_carry_basic_credentials_and_grant_form() {
		let address =
			Url::parse("https://auth.example.com/token").expect("Failed to parse test URL.");
		let request = build_token_request(&address, "client-id", "client-secret", "data:read")
			.expect("Token request fixture should build successfully.");

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.uri(), "https://auth.example.com/token");
		assert_eq!(
			request
				.headers()
				.get(AUTHORIZATION)
				.expect("Token requests must carry an Authorization header.")
				.to_str()
				.expect("Authorization header should remain readable."),
			// base64("client-id:client-secret")
			"Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=",
		);
		assert_eq!(
			request
				.headers()
				.get(CONTENT_TYPE)
				.expect("Token requests must declare a content type.")
				.to_str()
				.expect("Content type header should remain readable."),
			"application/x-www-form-urlencoded",
		);
		assert_eq!(
			String::from_utf8_lossy(request.body()),
			"grant_type=client_credentials&scope=data%3Aread",
		);
	}

	#[test]
	fn scopes_with_spaces_are_form_encoded() {
		let address =
			Url::parse("https://auth.example.com/token").expect("Failed to parse test URL.");
		let request = build_token_request(&address, "id", "secret", "data:read data:write")
			.expect("Token request fixture should build successfully.");

		assert_eq!(
			String::from_utf8_lossy(request.body()),
			"grant_type=client_credentials&scope=data%3Aread+data%3Awrite",
		);
	}
}
