//! The public interposer: policy selection, token attachment, and the one-shot
//! auth-refresh retry around the resiliency policy.
//!
//! One [`AuthHandler`] instance is safe to share across many concurrent
//! callers. Its default policy owns the breaker state aggregated across every
//! standard-timeout request; its refresh gate serializes credential
//! acquisitions so simultaneous cache misses for one key issue exactly one
//! token endpoint call.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use http::{StatusCode, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	cache::TokenCache,
	config::ForgeConfig,
	fetch::TokenFetcher,
	http::{HttpRequest, HttpResponse, SendRequest},
	obs::{self, CacheLookup, CallKind, CallSpan},
	options::RequestOptions,
	policy::ResiliencyPolicy,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Thread-safe counters describing a handler's lifetime activity.
#[derive(Debug, Default)]
pub struct HandlerMetrics {
	sends: AtomicU64,
	token_fetches: AtomicU64,
	auth_refreshes: AtomicU64,
	breaker_rejections: AtomicU64,
}
impl HandlerMetrics {
	/// Total `send` invocations.
	pub fn sends(&self) -> u64 {
		self.sends.load(Ordering::Relaxed)
	}

	/// Token endpoint fetches performed (cache misses plus forced refreshes).
	pub fn token_fetches(&self) -> u64 {
		self.token_fetches.load(Ordering::Relaxed)
	}

	/// One-shot 401 refresh cycles performed.
	pub fn auth_refreshes(&self) -> u64 {
		self.auth_refreshes.load(Ordering::Relaxed)
	}

	/// Requests rejected by an open breaker.
	pub fn breaker_rejections(&self) -> u64 {
		self.breaker_rejections.load(Ordering::Relaxed)
	}

	pub(crate) fn record_send(&self) {
		self.sends.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_token_fetch(&self) {
		self.token_fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_auth_refresh(&self) {
		self.auth_refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_breaker_rejection(&self) {
		self.breaker_rejections.fetch_add(1, Ordering::Relaxed);
	}
}

/// Interposer for outbound service requests: acquires and attaches bearer
/// tokens, applies the resiliency policy, and reauthenticates once on 401.
pub struct AuthHandler<T>
where
	T: ?Sized + SendRequest,
{
	config: Arc<ForgeConfig>,
	transport: Arc<T>,
	cache: TokenCache,
	fetcher: TokenFetcher<T>,
	default_policy: ResiliencyPolicy,
	refresh_gate: AsyncMutex<()>,
	metrics: HandlerMetrics,
}
impl<T> AuthHandler<T>
where
	T: ?Sized + SendRequest,
{
	/// Creates a handler that reuses the caller-provided transport.
	pub fn with_transport(config: ForgeConfig, transport: impl Into<Arc<T>>) -> Self {
		let config = Arc::new(config);
		let transport = transport.into();
		let default_policy = ResiliencyPolicy::new();
		let fetcher =
			TokenFetcher::new(config.clone(), transport.clone(), default_policy.clone());

		Self {
			config,
			transport,
			cache: TokenCache::default(),
			fetcher,
			default_policy,
			refresh_gate: AsyncMutex::new(()),
			metrics: HandlerMetrics::default(),
		}
	}

	/// Returns the configuration the handler was constructed with.
	pub fn config(&self) -> &ForgeConfig {
		&self.config
	}

	/// Returns the handler's lifetime activity counters.
	pub fn metrics(&self) -> &HandlerMetrics {
		&self.metrics
	}

	/// Sends `request` through the interposer pipeline.
	///
	/// Per-request [`RequestOptions`] are consumed from the request's
	/// extensions. The returned response may itself be a non-success status;
	/// callers wanting a terminal error pass it through
	/// [`validate::ensure_success`](crate::validate::ensure_success).
	pub async fn send(
		&self,
		mut request: HttpRequest,
		cancel: &CancellationToken,
	) -> Result<HttpResponse> {
		let span = CallSpan::new(CallKind::Data);

		self.metrics.record_send();

		let result = span.wrap(self.dispatch(&mut request, cancel)).await;

		if matches!(&result, Err(Error::CircuitOpen { .. })) {
			self.metrics.record_breaker_rejection();
		}

		obs::record_data_call(&result);

		result
	}

	async fn dispatch(
		&self,
		request: &mut HttpRequest,
		cancel: &CancellationToken,
	) -> Result<HttpResponse> {
		if request.uri().host().is_none() {
			return Err(Error::Argument { field: "uri" });
		}

		let options = RequestOptions::take(request).unwrap_or_default();
		let policy = match options.timeout {
			// Non-standard timeouts are exceptional: they run behind an
			// isolated breaker so they do not pollute the shared failure
			// window.
			Some(timeout) => ResiliencyPolicy::with_timeout(timeout),
			None => self.default_policy.clone(),
		};
		let auth_managed =
			request.headers().get(AUTHORIZATION).is_none() && options.scope.is_some();

		if auth_managed {
			self.ensure_token(request, &options, false, cancel).await?;
		}

		let response = policy.execute(self.transport.as_ref(), request, cancel).await?;

		if !(auth_managed && response.status() == StatusCode::UNAUTHORIZED) {
			return Ok(response);
		}

		// One-shot reauthentication; a second 401 is returned as-is.
		self.metrics.record_auth_refresh();
		self.ensure_token(request, &options, true, cancel).await?;

		policy.execute(self.transport.as_ref(), request, cancel).await
	}

	async fn ensure_token(
		&self,
		request: &mut HttpRequest,
		options: &RequestOptions,
		force_refresh: bool,
		cancel: &CancellationToken,
	) -> Result<()> {
		let key = options.cache_key();
		let agent = options.agent.as_deref().unwrap_or_default();
		let scope = options.scope.as_deref().unwrap_or_default();
		// Coarse by intent: one in-flight credential acquisition per handler
		// prevents thundering-herd token fetches at the cost of briefly
		// blocking unrelated keys.
		let gate = tokio::select! {
			_ = cancel.cancelled() => return Err(Error::Cancelled),
			guard = self.refresh_gate.lock() => guard,
		};
		let cached = if force_refresh { None } else { self.cache.try_get(&key) };

		if !force_refresh {
			obs::record_cache_lookup(if cached.is_some() {
				CacheLookup::Hit
			} else {
				CacheLookup::Miss
			});
		}

		let token = match cached {
			Some(token) => token,
			None => {
				let (token, ttl) = self.fetcher.two_legged(agent, scope, cancel).await?;

				self.metrics.record_token_fetch();
				self.cache.add(key, token.clone(), ttl);

				token
			},
		};

		drop(gate);
		request.headers_mut().insert(AUTHORIZATION, token.header_value()?);

		Ok(())
	}
}
#[cfg(feature = "reqwest")]
impl AuthHandler<ReqwestTransport> {
	/// Creates a handler backed by the crate's default reqwest transport.
	pub fn new(config: ForgeConfig) -> Self {
		Self::with_transport(config, ReqwestTransport::default())
	}
}
impl<T> Debug for AuthHandler<T>
where
	T: ?Sized + SendRequest,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthHandler")
			.field("config", &self.config)
			.field("metrics", &self.metrics)
			.finish()
	}
}
