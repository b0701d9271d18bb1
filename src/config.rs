//! Process-wide broker configuration.
//!
//! [`BrokerConfig`] replaces hard-coded broker constants: every endpoint the SDK contacts is
//! derived from it, and it is immutable once [`BrokerConfigBuilder::build`] validates it.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{AppKey, TokenSecret},
	error::ConfigError,
};

/// Hosted OAuth.io broker.
pub const DEFAULT_BROKER_URL: &str = "https://oauth.io";
/// Path prefix of the broker's redirect endpoint.
pub const DEFAULT_BASE_PATH: &str = "/auth";
/// Connect timeout applied to the shared HTTP client.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Read-only broker configuration shared by every operation.
#[derive(Clone)]
pub struct BrokerConfig {
	/// Broker base URL (scheme, host, optional path prefix).
	pub broker_url: Url,
	/// Path prefix of the redirect endpoint (`{broker_url}{base_path}/{provider}`).
	pub base_path: String,
	/// Public application key.
	pub app_key: AppKey,
	/// Application secret; only sent to the exchange and refresh endpoints.
	pub app_secret: TokenSecret,
	/// Connect timeout enforced by the shared HTTP client.
	pub timeout: StdDuration,
}
impl BrokerConfig {
	/// Creates a builder seeded with the application credentials.
	pub fn builder(
		app_key: impl Into<String>,
		app_secret: impl Into<String>,
	) -> BrokerConfigBuilder {
		BrokerConfigBuilder::new(app_key, app_secret)
	}

	/// Joins `path` onto the broker URL without normalizing it.
	///
	/// `path` is appended verbatim so provider endpoints keep their own query strings.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let endpoint = format!("{}{path}", self.broker_url.as_str().trim_end_matches('/'));

		Url::parse(&endpoint).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
	}
}
impl Debug for BrokerConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BrokerConfig")
			.field("broker_url", &self.broker_url.as_str())
			.field("base_path", &self.base_path)
			.field("app_key", &self.app_key)
			.field("app_secret", &"<redacted>")
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Builder for [`BrokerConfig`] values.
#[derive(Debug)]
pub struct BrokerConfigBuilder {
	/// Raw application key.
	pub app_key: String,
	/// Raw application secret.
	pub app_secret: TokenSecret,
	/// Broker URL override.
	pub broker_url: Option<Url>,
	/// Redirect base path override.
	pub base_path: Option<String>,
	/// Connect timeout override.
	pub timeout: Option<StdDuration>,
}
impl BrokerConfigBuilder {
	/// Creates a new builder with the default broker URL, base path, and timeout.
	pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
		Self {
			app_key: app_key.into(),
			app_secret: TokenSecret::new(app_secret),
			broker_url: None,
			base_path: None,
			timeout: None,
		}
	}

	/// Points the SDK at a self-hosted `oauthd` instance.
	pub fn broker_url(mut self, url: Url) -> Self {
		self.broker_url = Some(url);

		self
	}

	/// Overrides the redirect base path.
	pub fn base_path(mut self, path: impl Into<String>) -> Self {
		self.base_path = Some(path.into());

		self
	}

	/// Overrides the connect timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<BrokerConfig, ConfigError> {
		let app_key = AppKey::new(&self.app_key).map_err(ConfigError::InvalidAppKey)?;

		if self.app_secret.is_empty() {
			return Err(ConfigError::MissingAppSecret);
		}

		let broker_url = match self.broker_url {
			Some(url) => url,
			None => Url::parse(DEFAULT_BROKER_URL).map_err(|source| {
				ConfigError::InvalidEndpoint { endpoint: DEFAULT_BROKER_URL.into(), source }
			})?,
		};

		validate_broker_url(&broker_url)?;

		let base_path = self.base_path.unwrap_or_else(|| DEFAULT_BASE_PATH.into());

		if !base_path.starts_with('/') {
			return Err(ConfigError::InvalidBasePath { path: base_path });
		}

		let base_path = base_path.trim_end_matches('/').to_owned();
		let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

		if timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}

		Ok(BrokerConfig { broker_url, base_path, app_key, app_secret: self.app_secret, timeout })
	}
}

fn validate_broker_url(url: &Url) -> Result<(), ConfigError> {
	let scheme_ok = matches!(url.scheme(), "http" | "https");

	if !scheme_ok || url.cannot_be_a_base() || url.query().is_some() || url.fragment().is_some() {
		Err(ConfigError::InvalidBrokerUrl { url: url.to_string() })
	} else {
		Ok(())
	}
}
