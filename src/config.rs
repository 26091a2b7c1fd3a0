//! Immutable client configuration injected at handler construction.

// self
use crate::{_prelude::*, error::ConfigError, options::DEFAULT_AGENT};

/// Credential pair for a named agent identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCredentials {
	/// OAuth client identifier for this agent.
	pub client_id: String,
	/// OAuth client secret for this agent.
	pub client_secret: String,
}
impl Debug for AgentCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AgentCredentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.finish()
	}
}

/// Immutable configuration for the client core.
///
/// The top-level credential pair backs the default identity; `agents` holds
/// named alternates. Either side may be left empty as long as every call
/// resolves to a populated pair.
#[derive(Clone, Serialize, Deserialize)]
pub struct ForgeConfig {
	/// Default OAuth client identifier.
	#[serde(default)]
	pub client_id: String,
	/// Default OAuth client secret.
	#[serde(default)]
	pub client_secret: String,
	/// Absolute URL of the OAuth token endpoint.
	pub authentication_address: Url,
	/// Named alternate credential sets.
	#[serde(default)]
	pub agents: HashMap<String, AgentCredentials>,
}
impl ForgeConfig {
	/// Returns a builder seeded with the token endpoint address.
	pub fn builder(authentication_address: Url) -> ForgeConfigBuilder {
		ForgeConfigBuilder::new(authentication_address)
	}

	/// Resolves the credential pair for the provided agent name.
	///
	/// An empty name or the [`DEFAULT_AGENT`] sentinel selects the top-level
	/// pair; anything else must name an entry inside `agents`.
	pub fn credentials_for(&self, agent: &str) -> Result<(&str, &str), ConfigError> {
		let (client_id, client_secret) = if agent.is_empty() || agent == DEFAULT_AGENT {
			(self.client_id.as_str(), self.client_secret.as_str())
		} else {
			let credentials = self
				.agents
				.get(agent)
				.ok_or_else(|| ConfigError::UnknownAgent { agent: agent.to_owned() })?;

			(credentials.client_id.as_str(), credentials.client_secret.as_str())
		};

		if client_id.is_empty() {
			return Err(ConfigError::MissingCredential { field: "client_id" });
		}
		if client_secret.is_empty() {
			return Err(ConfigError::MissingCredential { field: "client_secret" });
		}

		Ok((client_id, client_secret))
	}
}
impl Debug for ForgeConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ForgeConfig")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("authentication_address", &self.authentication_address.as_str())
			.field("agents", &self.agents.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Builder for [`ForgeConfig`] values.
#[derive(Clone, Debug)]
pub struct ForgeConfigBuilder {
	/// Token endpoint the configuration is being built around.
	pub authentication_address: Url,
	/// Default OAuth client identifier.
	pub client_id: String,
	/// Default OAuth client secret.
	pub client_secret: String,
	/// Named alternate credential sets.
	pub agents: HashMap<String, AgentCredentials>,
}
impl ForgeConfigBuilder {
	/// Creates a new builder seeded with the token endpoint address.
	pub fn new(authentication_address: Url) -> Self {
		Self {
			authentication_address,
			client_id: String::new(),
			client_secret: String::new(),
			agents: HashMap::new(),
		}
	}

	/// Sets the default client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the default client secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = client_secret.into();

		self
	}

	/// Registers a named agent credential set.
	pub fn agent(
		mut self,
		name: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		self.agents.insert(
			name.into(),
			AgentCredentials { client_id: client_id.into(), client_secret: client_secret.into() },
		);

		self
	}

	/// Validates and produces the immutable [`ForgeConfig`].
	pub fn build(self) -> Result<ForgeConfig, ConfigError> {
		validate_address(&self.authentication_address)?;

		Ok(ForgeConfig {
			client_id: self.client_id,
			client_secret: self.client_secret,
			authentication_address: self.authentication_address,
			agents: self.agents,
		})
	}
}

fn validate_address(url: &Url) -> Result<(), ConfigError> {
	if url.scheme() == "https" {
		return Ok(());
	}

	// Loopback hosts stay reachable over plain HTTP so mock servers remain testable.
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if url.scheme() == "http" && loopback {
		return Ok(());
	}

	Err(ConfigError::InsecureAuthenticationAddress { url: url.to_string() })
}
