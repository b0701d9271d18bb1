//! Signed provider calls proxied through the broker.
//!
//! Requests go to `{broker}/request/{provider}{endpoint}` with the `oauthio` header built by
//! [`BrokerHeaderSigner`](crate::ext::BrokerHeaderSigner); the broker signs and forwards them.
//! Provider responses, including 4xx/5xx payloads, come back as opaque bytes.

pub use oauth2::http::Method;

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::CredentialRecord,
	error::ConfigError,
	ext::RequestSignerExt,
	flows::{Broker, common},
	http::BrokerHttpClient,
	obs::{FlowKind, FlowSpan},
	transport::TransportErrorMapper,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + BrokerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends `method` to the provider `endpoint` (e.g. `/user/repos?per_page=5`) on behalf of
	/// `record`, returning the provider's response body.
	pub async fn request(
		&self,
		record: &CredentialRecord,
		method: Method,
		endpoint: &str,
		body: Option<Vec<u8>>,
	) -> Result<Vec<u8>> {
		self.send_proxied(record, method, endpoint, body, None).await
	}

	/// `GET` through the proxy.
	pub async fn get(&self, record: &CredentialRecord, endpoint: &str) -> Result<Vec<u8>> {
		self.send_proxied(record, Method::GET, endpoint, None, None).await
	}

	/// `DELETE` through the proxy.
	pub async fn delete(&self, record: &CredentialRecord, endpoint: &str) -> Result<Vec<u8>> {
		self.send_proxied(record, Method::DELETE, endpoint, None, None).await
	}

	/// `POST` with a JSON body through the proxy.
	pub async fn post<B>(&self, record: &CredentialRecord, endpoint: &str, body: &B) -> Result<Vec<u8>>
	where
		B: ?Sized + Serialize,
	{
		self.send_json(record, Method::POST, endpoint, body).await
	}

	/// `PUT` with a JSON body through the proxy.
	pub async fn put<B>(&self, record: &CredentialRecord, endpoint: &str, body: &B) -> Result<Vec<u8>>
	where
		B: ?Sized + Serialize,
	{
		self.send_json(record, Method::PUT, endpoint, body).await
	}

	/// `PATCH` with a JSON body through the proxy.
	pub async fn patch<B>(
		&self,
		record: &CredentialRecord,
		endpoint: &str,
		body: &B,
	) -> Result<Vec<u8>>
	where
		B: ?Sized + Serialize,
	{
		self.send_json(record, Method::PATCH, endpoint, body).await
	}

	/// Looks up the authenticated user's unified profile, restricted to `filters`
	/// (e.g. `["email", "name"]`). An empty filter list asks for every field.
	pub async fn me<I, S>(&self, record: &CredentialRecord, filters: I) -> Result<Vec<u8>>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		const KIND: FlowKind = FlowKind::Request;

		let filters = filters.into_iter().map(|f| f.as_ref().to_owned()).collect::<Vec<_>>();
		let span = FlowSpan::new(KIND, "me").with_provider(&record.provider);

		common::observed_in(KIND, span, async move {
			let query = form_urlencoded::Serializer::new(String::new())
				.append_pair("filters", &filters.join(","))
				.finish();
			let url = self.config.endpoint(&format!("/auth/{}/me?{query}", record.provider))?;
			let request = common::proxy_request(Method::GET, &url, None, None)?;

			self.dispatch_signed(record, request).await
		})
		.await
	}

	async fn send_json<B>(
		&self,
		record: &CredentialRecord,
		method: Method,
		endpoint: &str,
		body: &B,
	) -> Result<Vec<u8>>
	where
		B: ?Sized + Serialize,
	{
		let (bytes, content_type) = common::json_body(body)?;

		self.send_proxied(record, method, endpoint, Some(bytes), Some(content_type)).await
	}

	async fn send_proxied(
		&self,
		record: &CredentialRecord,
		method: Method,
		endpoint: &str,
		body: Option<Vec<u8>>,
		content_type: Option<&'static str>,
	) -> Result<Vec<u8>> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "request").with_provider(&record.provider);

		common::observed_in(KIND, span, async move {
			if has_dot_segment(endpoint) {
				let endpoint = endpoint.to_owned();

				return Err(ConfigError::InvalidProxyEndpoint { endpoint }.into());
			}

			let url = self.config.endpoint(&proxy_path(&record.provider, endpoint))?;
			let request = common::proxy_request(method, &url, body, content_type)?;

			self.dispatch_signed(record, request).await
		})
		.await
	}

	async fn dispatch_signed(
		&self,
		record: &CredentialRecord,
		request: oauth2::HttpRequest,
	) -> Result<Vec<u8>> {
		let request = self.signer.attach_token(request, record)?;
		let response = self.execute(FlowKind::Request, request).await?;

		Ok(response.into_body())
	}
}

/// `/request/{provider}{endpoint}`, inserting the separating `/` when `endpoint` lacks it.
fn proxy_path(provider: &str, endpoint: &str) -> String {
	if endpoint.is_empty() || endpoint.starts_with('/') || endpoint.starts_with('?') {
		format!("/request/{provider}{endpoint}")
	} else {
		format!("/request/{provider}/{endpoint}")
	}
}

/// URL parsing resolves `.`/`..` (including `%2e` forms and `\` separators), which would move the
/// signed call out of `/request/{provider}`.
fn has_dot_segment(endpoint: &str) -> bool {
	let path = endpoint.split(['?', '#']).next().unwrap_or_default();

	path.split(['/', '\\']).any(|segment| {
		let segment = segment.to_ascii_lowercase().replace("%2e", ".");

		segment == "." || segment == ".."
	})
}
