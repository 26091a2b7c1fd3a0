//! Forge's resilient authenticated HTTP client core—per-scope bearer token caching, bounded
//! retries honoring server hints, and circuit breaking composed behind one pipeline interposer.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod http;
pub mod obs;
pub mod options;
pub mod policy;
pub mod token;
pub mod validate;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{config::ForgeConfig, handler::AuthHandler, http::ReqwestTransport};

	/// Handler type alias used by reqwest-backed integration tests.
	pub type ReqwestTestHandler = AuthHandler<ReqwestTransport>;

	/// Builds a configuration pointing at the provided token endpoint with the default
	/// test credential pair.
	pub fn test_config(token_endpoint: &str) -> ForgeConfig {
		ForgeConfig::builder(
			Url::parse(token_endpoint).expect("Failed to parse test token endpoint URL."),
		)
		.client_id("client-id")
		.client_secret("client-secret")
		.build()
		.expect("Failed to build test configuration.")
	}

	/// Constructs an [`AuthHandler`] backed by the crate's default reqwest transport.
	pub fn build_reqwest_test_handler(config: ForgeConfig) -> ReqwestTestHandler {
		AuthHandler::new(config)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, forge_http_client as _, httpmock as _};
