//! Transport primitives for the outbound request pipeline.
//!
//! [`SendRequest`] is the crate's only dependency on an HTTP stack: the policy
//! and handler layers are generic over it and tests substitute scripted fakes.
//! The default [`ReqwestTransport`] buffers response bodies so the validator
//! and retry layers can inspect status, headers, and body without re-reading
//! streams.

// crates.io
use http::header::RETRY_AFTER;
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// Request currency of the pipeline: a fully buffered `http` request.
pub type HttpRequest = http::Request<Vec<u8>>;
/// Response currency of the pipeline: a fully buffered `http` response.
pub type HttpResponse = http::Response<Vec<u8>>;

/// Boxed future returned by [`SendRequest::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing one buffered exchange.
///
/// Implementations perform a single send with no retries or timeouts of their
/// own—the policy layers wrap those around each call. They must be
/// `Send + Sync + 'static` so one transport can be shared by every request
/// flowing through a handler.
pub trait SendRequest
where
	Self: 'static + Send + Sync,
{
	/// Executes a single HTTP exchange.
	fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Clones the resend-relevant parts of a request (method, URI, version,
/// headers, body).
///
/// Extensions do not travel: per-request options are consumed by the handler
/// before the request enters the policy layers.
pub fn clone_request(request: &HttpRequest) -> HttpRequest {
	let mut cloned = http::Request::new(request.body().clone());

	*cloned.method_mut() = request.method().clone();
	*cloned.uri_mut() = request.uri().clone();
	*cloned.version_mut() = request.version();
	*cloned.headers_mut() = request.headers().clone();

	cloned
}

/// Parses a `Retry-After` header into a relative duration.
///
/// Delta-seconds values are returned directly; RFC 2822 HTTP-dates are
/// converted to a delta when they lie in the future.
pub fn parse_retry_after(headers: &http::HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

/// Thin wrapper around [`ReqwestClient`] so shared transport behavior lives in
/// one place. The interposer applies its own per-attempt timeout, so custom
/// clients should not configure a total request timeout of their own.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl SendRequest for ReqwestTransport {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request).map_err(TransportError::from)?;
			let response = client.execute(request).await.map_err(TransportError::from)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();
			let mut buffered = http::Response::new(body);

			*buffered.status_mut() = status;
			*buffered.headers_mut() = headers;

			Ok(buffered)
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::header::AUTHORIZATION;
	// self
	use super::*;

	fn headers_with_retry_after(value: &str) -> http::HeaderMap {
		let mut headers = http::HeaderMap::new();

		headers.insert(
			RETRY_AFTER,
			value.parse().expect("Retry-After fixture should be a valid header value."),
		);

		headers
	}

	#[test]
	fn retry_after_parses_delta_seconds() {
		assert_eq!(
			parse_retry_after(&headers_with_retry_after("7")),
			Some(Duration::seconds(7)),
		);
		assert_eq!(parse_retry_after(&http::HeaderMap::new()), None);
		assert_eq!(parse_retry_after(&headers_with_retry_after("soon")), None);
	}

	#[test]
	fn retry_after_converts_future_http_dates() {
		let future = (OffsetDateTime::now_utc() + Duration::minutes(2))
			.format(&Rfc2822)
			.expect("Future instant should format as RFC 2822.");
		let delta = parse_retry_after(&headers_with_retry_after(&future))
			.expect("Future HTTP-dates should convert to a delta.");

		assert!(delta.is_positive());
		assert!(delta <= Duration::minutes(2));

		let past = (OffsetDateTime::now_utc() - Duration::minutes(2))
			.format(&Rfc2822)
			.expect("Past instant should format as RFC 2822.");

		assert_eq!(parse_retry_after(&headers_with_retry_after(&past)), None);
	}

	#[test]
	fn clone_request_copies_resend_relevant_parts() {
		let mut request = http::Request::builder()
			.method(http::Method::POST)
			.uri("https://api.example.com/data")
			.header(AUTHORIZATION, "Bearer abc")
			.body(b"payload".to_vec())
			.expect("Request fixture should build successfully.");

		request.extensions_mut().insert(42_u8);

		let cloned = clone_request(&request);

		assert_eq!(cloned.method(), request.method());
		assert_eq!(cloned.uri(), request.uri());
		assert_eq!(cloned.headers(), request.headers());
		assert_eq!(cloned.body(), request.body());
		assert!(cloned.extensions().get::<u8>().is_none());
	}
}
