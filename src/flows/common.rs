//! Shared helpers for broker operations (request assembly, dispatch, response decoding).

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use serde::de::DeserializeOwned;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{CredentialRecord, CredentialRecordBuilder, Credentials},
	error::ConfigError,
	flows::Broker,
	http::{BrokerHttpClient, ResponseMetadataSlot},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	transport::TransportErrorMapper,
};

pub(crate) const ACCESS_TOKEN_PATH: &str = "/auth/access_token";
pub(crate) const REFRESH_TOKEN_PATH: &str = "/auth/refresh_token/";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Token document returned by the exchange and refresh endpoints.
///
/// Every field is optional on the wire; validation happens when the document is turned into a
/// [`CredentialRecord`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
	/// Bearer token.
	pub access_token: Option<String>,
	/// OAuth1 token.
	pub oauth_token: Option<String>,
	/// OAuth1 token secret.
	pub oauth_token_secret: Option<String>,
	/// CSRF state echoed by the broker.
	pub state: Option<String>,
	/// Provider identifier.
	pub provider: Option<String>,
	/// Token lifetime in seconds.
	pub expires_in: Option<i64>,
	/// Refresh token.
	pub refresh_token: Option<String>,
}
impl TokenResponse {
	/// Builds a fresh record issued at `issued_at`.
	pub fn into_record(self, issued_at: OffsetDateTime) -> Result<CredentialRecord> {
		let mut builder = CredentialRecordBuilder::default()
			.issued_at(issued_at)
			.expires_in_seconds(self.expires_in.unwrap_or_default())
			.raw_oauth1(self.oauth_token, self.oauth_token_secret);

		if let Some(state) = self.state {
			builder = builder.state(state);
		}
		if let Some(provider) = self.provider {
			builder = builder.provider(provider);
		}
		if let Some(access_token) = self.access_token {
			builder = builder.access_token(access_token);
		}
		if let Some(refresh_token) = self.refresh_token {
			builder = builder.refresh_token(refresh_token);
		}

		Ok(builder.build()?)
	}

	/// Extracts the credential shape, rejecting documents without a usable token.
	pub fn credentials(&self) -> Result<Credentials> {
		Ok(Credentials::from_parts(
			self.access_token.as_deref(),
			self.oauth_token.as_deref(),
			self.oauth_token_secret.as_deref(),
		)?)
	}
}

/// Builds a form-encoded `POST` to a broker endpoint.
pub(crate) fn form_request(url: &Url, fields: &[(&str, &str)]) -> Result<HttpRequest> {
	let body = form_urlencoded::Serializer::new(String::new()).extend_pairs(fields).finish();
	let request = Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, JSON_CONTENT_TYPE)
		.body(body.into_bytes())
		.map_err(ConfigError::from)?;

	Ok(request)
}

/// Builds a proxied request; `body` is sent verbatim.
pub(crate) fn proxy_request(
	method: Method,
	url: &Url,
	body: Option<Vec<u8>>,
	content_type: Option<&'static str>,
) -> Result<HttpRequest> {
	let mut builder = Request::builder().method(method).uri(url.as_str());

	if let Some(content_type) = content_type {
		builder = builder.header(CONTENT_TYPE, content_type);
	}

	Ok(builder.body(body.unwrap_or_default()).map_err(ConfigError::from)?)
}

/// Serializes a JSON request body.
pub(crate) fn json_body<B>(body: &B) -> Result<(Vec<u8>, &'static str)>
where
	B: ?Sized + Serialize,
{
	let bytes = serde_json::to_vec(body).map_err(ConfigError::JsonEncode)?;

	Ok((bytes, JSON_CONTENT_TYPE))
}

/// Decodes a broker JSON document, reporting the failing path on error.
pub(crate) fn parse_json<T>(response: &HttpResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(response.body());

	serde_path_to_error::deserialize(&mut de).map_err(|source| Error::ParseFailure {
		source,
		status: Some(response.status().as_u16()),
	})
}

/// Runs `fut` inside a flow span and records attempt/outcome counters around it.
pub(crate) async fn observed<T, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	observed_in(kind, FlowSpan::new(kind, stage), fut).await
}

/// [`observed`] with a caller-built span, e.g. one tagged with the provider.
pub(crate) async fn observed_in<T, Fut>(kind: FlowKind, span: FlowSpan, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	obs::record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	obs::record_flow_outcome(kind, FlowOutcome::of(&result));

	result
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + BrokerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends a single request through the transport; no retries.
	pub(crate) async fn execute(&self, kind: FlowKind, request: HttpRequest) -> Result<HttpResponse> {
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());

		handle.call(request).await.map_err(|err| {
			self.transport_mapper.map_transport_error(kind, slot.take().as_ref(), err)
		})
	}

	/// Form fields authenticating the application against the broker.
	pub(crate) fn app_fields<'a>(&'a self, extra: (&'a str, &'a str)) -> [(&'a str, &'a str); 3] {
		[extra, ("key", self.config.app_key.as_ref()), ("secret", self.config.app_secret.expose())]
	}
}
