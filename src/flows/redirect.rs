//! Authorization redirect construction.
//!
//! The broker's redirect endpoint `{broker_url}{base_path}/{provider}` starts the provider
//! handshake. [`Broker::authorize_url`] builds that URL with a fresh state token; the caller
//! issues the redirect and keeps the token to compare against the callback.

// crates.io
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	error::ConfigError,
	flows::Broker,
	http::BrokerHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	transport::TransportErrorMapper,
};

const REDIRECT_TYPE: &str = "server";

/// Redirect metadata returned by [`Broker::authorize_url`].
#[derive(Clone, Debug)]
pub struct AuthorizationRedirect {
	/// Provider the user is sent to.
	pub provider: ProviderId,
	/// Correlation token that must round-trip through the callback.
	pub state: String,
	/// Redirect URI the broker calls back, exactly as supplied.
	pub redirect_uri: String,
	/// Fully-formed broker URL that callers should send end-users to.
	pub url: Url,
}
impl AuthorizationRedirect {
	/// Validates the `state` reported back by the callback.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state { Ok(()) } else { Err(Error::StateMismatch) }
	}
}

#[derive(Serialize)]
struct RedirectOptions<'a> {
	state: &'a str,
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + BrokerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the broker URL that starts authorization with `provider`.
	///
	/// No network call is made. The returned state is not stored anywhere; persist it (for
	/// example in the user's session) and check it with
	/// [`AuthorizationRedirect::validate_state`] or [`Broker::dispatch_callback_with_state`].
	pub fn authorize_url(
		&self,
		provider: impl AsRef<str>,
		redirect_uri: &str,
	) -> Result<AuthorizationRedirect> {
		const KIND: FlowKind = FlowKind::Redirect;

		let provider = provider.as_ref();
		let _guard = FlowSpan::new(KIND, "authorize_url").with_provider(provider).entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = self.build_redirect(provider, redirect_uri);

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	fn build_redirect(&self, provider: &str, redirect_uri: &str) -> Result<AuthorizationRedirect> {
		let provider = ProviderId::new(provider).map_err(ConfigError::InvalidProvider)?;
		// Validated only; sent verbatim.
		Url::parse(redirect_uri).map_err(|source| ConfigError::InvalidRedirect { source })?;

		let state = generate_state_token();
		let opts = serde_json::to_string(&RedirectOptions { state: &state })
			.map_err(ConfigError::JsonEncode)?;
		let mut url = self.config.endpoint(&format!("{}/{provider}", self.config.base_path))?;

		url.query_pairs_mut()
			.append_pair("k", &self.config.app_key)
			.append_pair("opts", &opts)
			.append_pair("redirect_type", REDIRECT_TYPE)
			.append_pair("redirect_uri", redirect_uri);

		Ok(AuthorizationRedirect { provider, state, redirect_uri: redirect_uri.to_owned(), url })
	}
}

/// Generates a random version-4 UUID used as a CSRF correlation token.
pub fn generate_state_token() -> String {
	Uuid::new_v4().to_string()
}
