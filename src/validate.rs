//! Strict success validation for buffered responses.
//!
//! The retry layer already handles 429 internally; [`ensure_success`] exists
//! for callers that sit above or bypass the resiliency layer (notably the
//! token fetcher) and want a terminal error instead of a response.

// crates.io
use http::StatusCode;
// self
use crate::{
	_prelude::*,
	http::{HttpResponse, parse_retry_after},
};

/// Returns the response unchanged when its status is 2xx; otherwise converts it
/// into a typed failure preserving status, reason, body snippet, and (for 429)
/// the server's `Retry-After` hint.
pub fn ensure_success(response: HttpResponse) -> Result<HttpResponse> {
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let retry_after = parse_retry_after(response.headers());
	let body = String::from_utf8_lossy(response.body()).into_owned();
	let reason = status.canonical_reason().unwrap_or("Unknown");
	let message = if body.is_empty() {
		format!("The server returned the non-success status code {} ({reason}).", status.as_u16())
	} else {
		format!(
			"The server returned the non-success status code {} ({reason}).\nMore error details:\n{body}.",
			status.as_u16(),
		)
	};

	if status == StatusCode::TOO_MANY_REQUESTS {
		return Err(Error::TooManyRequests { status: status.as_u16(), retry_after, message });
	}

	Err(Error::Http { status: status.as_u16(), message })
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::header::RETRY_AFTER;
	// self
	use super::*;

	fn response(status: u16, body: &str) -> HttpResponse {
		let mut response = http::Response::new(body.as_bytes().to_vec());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Status fixture should be valid.");

		response
	}

	#[test]
	fn success_statuses_pass_through_unchanged() {
		let validated = ensure_success(response(204, ""))
			.expect("2xx responses should pass through unchanged.");

		assert_eq!(validated.status(), StatusCode::NO_CONTENT);
	}

	#[test]
	fn failures_preserve_status_and_body() {
		let err = ensure_success(response(404, "missing resource"))
			.expect_err("Non-success statuses should fail validation.");

		match err {
			Error::Http { status, message } => {
				assert_eq!(status, 404);
				assert_eq!(
					message,
					"The server returned the non-success status code 404 (Not Found).\nMore error details:\nmissing resource.",
				);
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn empty_bodies_omit_the_details_clause() {
		let err = ensure_success(response(502, ""))
			.expect_err("Non-success statuses should fail validation.");

		match err {
			Error::Http { status, message } => {
				assert_eq!(status, 502);
				assert_eq!(
					message,
					"The server returned the non-success status code 502 (Bad Gateway).",
				);
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn throttled_responses_carry_the_retry_hint() {
		let mut throttled = response(429, "slow down");

		throttled.headers_mut().insert(
			RETRY_AFTER,
			"2".parse().expect("Retry-After fixture should be a valid header value."),
		);

		let err = ensure_success(throttled)
			.expect_err("Throttled responses should fail validation.");

		match err {
			Error::TooManyRequests { status, retry_after, message } => {
				assert_eq!(status, 429);
				assert_eq!(retry_after, Some(Duration::seconds(2)));
				assert!(message.contains("slow down"));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
