//! Credential record returned by a code exchange, its builder, and expiry helpers.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, IdentifierError, ProviderId, TokenSecret},
};

/// Errors produced by [`CredentialRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialRecordBuilderError {
	/// The broker did not echo a CSRF state; the record must not be trusted.
	#[error("State is required.")]
	MissingState,
	/// No provider identifier was supplied.
	#[error("Provider is required.")]
	MissingProvider,
	/// The provider identifier failed validation.
	#[error("Provider identifier is invalid.")]
	InvalidProvider(#[source] IdentifierError),
	/// Neither an access token nor an OAuth1 pair was supplied.
	#[error("Either an access token or an OAuth1 token pair is required.")]
	MissingToken,
	/// Only one half of the OAuth1 token/secret pair was supplied.
	#[error("OAuth1 token and token secret must be supplied together.")]
	IncompleteOAuth1Pair,
	/// `expires_in` pushes the expiry outside the representable range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}

/// Token bundle issued by the broker for a single provider authorization.
///
/// The record only holds token state. The broker URL, application key, and HTTP client needed to
/// use it live on [`Broker`](crate::flows::Broker) and are passed explicitly to every call.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
	/// Provider that issued the tokens; used to build proxy paths.
	pub provider: ProviderId,
	/// CSRF correlation value echoed by the broker.
	pub state: String,
	/// Bearer token or OAuth1 pair.
	pub credentials: Credentials,
	/// Refresh token, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime reported by the broker, in seconds.
	pub expires_in_seconds: i64,
	/// Instant the current tokens were received.
	pub issued_at: OffsetDateTime,
	/// `issued_at + expires_in_seconds`.
	pub expires_at: OffsetDateTime,
	/// Set once the record has been renewed through the refresh endpoint.
	pub refreshed: bool,
}
impl CredentialRecord {
	/// Returns a builder for assembling (or restoring) records.
	pub fn builder() -> CredentialRecordBuilder {
		CredentialRecordBuilder::default()
	}

	/// Expiry instant as a Unix timestamp in seconds.
	pub fn expire_at_epoch(&self) -> i64 {
		self.expires_at.unix_timestamp()
	}

	/// Returns `true` once `instant` is past the expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant > self.expires_at
	}

	/// Convenience helper that checks expiry against the current UTC instant.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns the bearer access token, if the record holds one.
	pub fn access_token(&self) -> Option<&str> {
		self.credentials.access_token().map(TokenSecret::expose)
	}

	/// Replaces token fields after a successful refresh.
	///
	/// `refresh_token` and `expires_in_seconds` keep their previous values when `None`.
	pub(crate) fn rotate(
		&mut self,
		rotation: Rotation,
		issued_at: OffsetDateTime,
	) -> Result<(), CredentialRecordBuilderError> {
		let Rotation { credentials, refresh_token, expires_in_seconds, provider, state } = rotation;
		let provider = provider
			.filter(|provider| !provider.is_empty())
			.map(ProviderId::new)
			.transpose()
			.map_err(CredentialRecordBuilderError::InvalidProvider)?;
		let expires_in_seconds = expires_in_seconds.unwrap_or(self.expires_in_seconds);
		let expires_at = expiry(issued_at, expires_in_seconds)?;

		self.credentials = credentials;

		if let Some(refresh_token) = refresh_token.filter(|token| !token.is_empty()) {
			self.refresh_token = Some(TokenSecret::new(refresh_token));
		}
		if let Some(provider) = provider {
			self.provider = provider;
		}
		if let Some(state) = state.filter(|state| !state.is_empty()) {
			self.state = state;
		}

		self.expires_in_seconds = expires_in_seconds;
		self.issued_at = issued_at;
		self.expires_at = expires_at;
		self.refreshed = true;

		Ok(())
	}
}
impl Debug for CredentialRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialRecord")
			.field("provider", &self.provider)
			.field("state", &self.state)
			.field("credentials", &self.credentials)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in_seconds", &self.expires_in_seconds)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("refreshed", &self.refreshed)
			.finish()
	}
}

/// Fields returned by the refresh endpoint; absent or empty values keep the record's own.
#[derive(Debug)]
pub(crate) struct Rotation {
	pub(crate) credentials: Credentials,
	pub(crate) refresh_token: Option<String>,
	pub(crate) expires_in_seconds: Option<i64>,
	pub(crate) provider: Option<String>,
	pub(crate) state: Option<String>,
}

/// Builder for [`CredentialRecord`] working from raw broker fields.
#[derive(Clone, Debug, Default)]
pub struct CredentialRecordBuilder {
	provider: Option<String>,
	state: Option<String>,
	access_token: Option<String>,
	oauth_token: Option<String>,
	oauth_token_secret: Option<String>,
	refresh_token: Option<String>,
	expires_in_seconds: i64,
	issued_at: Option<OffsetDateTime>,
}
impl CredentialRecordBuilder {
	/// Sets the provider identifier.
	pub fn provider(mut self, provider: impl Into<String>) -> Self {
		self.provider = Some(provider.into());

		self
	}

	/// Sets the CSRF state echoed by the broker.
	pub fn state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}

	/// Provides a bearer access token.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(token.into());

		self
	}

	/// Provides an OAuth1 token pair.
	pub fn oauth1(mut self, token: impl Into<String>, secret: impl Into<String>) -> Self {
		self.oauth_token = Some(token.into());
		self.oauth_token_secret = Some(secret.into());

		self
	}

	/// Provides the refresh token value; empty values are ignored.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(token.into());

		self
	}

	/// Sets the lifetime reported by the broker.
	pub fn expires_in_seconds(mut self, seconds: i64) -> Self {
		self.expires_in_seconds = seconds;

		self
	}

	/// Sets the issued-at instant (defaults to the current clock).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	pub(crate) fn raw_oauth1(mut self, token: Option<String>, secret: Option<String>) -> Self {
		self.oauth_token = token;
		self.oauth_token_secret = secret;

		self
	}

	/// Consumes the builder and produces a [`CredentialRecord`].
	pub fn build(self) -> Result<CredentialRecord, CredentialRecordBuilderError> {
		let state = self
			.state
			.filter(|state| !state.is_empty())
			.ok_or(CredentialRecordBuilderError::MissingState)?;
		let provider = self
			.provider
			.filter(|provider| !provider.is_empty())
			.ok_or(CredentialRecordBuilderError::MissingProvider)?;
		let provider =
			ProviderId::new(provider).map_err(CredentialRecordBuilderError::InvalidProvider)?;
		let credentials = Credentials::from_parts(
			self.access_token.as_deref(),
			self.oauth_token.as_deref(),
			self.oauth_token_secret.as_deref(),
		)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = expiry(issued_at, self.expires_in_seconds)?;

		Ok(CredentialRecord {
			provider,
			state,
			credentials,
			refresh_token: self.refresh_token.filter(|t| !t.is_empty()).map(TokenSecret::new),
			expires_in_seconds: self.expires_in_seconds,
			issued_at,
			expires_at,
			refreshed: false,
		})
	}
}

fn expiry(
	issued_at: OffsetDateTime,
	expires_in_seconds: i64,
) -> Result<OffsetDateTime, CredentialRecordBuilderError> {
	issued_at
		.checked_add(Duration::seconds(expires_in_seconds))
		.ok_or(CredentialRecordBuilderError::ExpiresInOutOfRange)
}
