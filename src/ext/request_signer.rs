//! Request signing: the `oauthio` header that lets the broker sign provider calls on our behalf.
//!
//! The SDK never signs provider requests itself. Every proxied call carries one header whose
//! value is a form-encoded list of pairs: the application key, plus either the bearer access
//! token or the OAuth1 token pair together with `oauthv=1`.

// crates.io
use oauth2::{
	HttpRequest,
	http::header::{HeaderName, HeaderValue},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{AppKey, CredentialRecord, Credentials},
	error::ConfigError,
};

/// Name of the header carrying broker credentials on proxied calls.
pub const OAUTHIO_HEADER: &str = "oauthio";

/// Describes how to attach a [`CredentialRecord`] to an outbound request without constraining
/// the HTTP client type.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the provided request and injects authorization state derived from the record.
	fn attach_token(&self, request: Request, record: &CredentialRecord) -> Result<Request, Error>;
}

/// Signer producing the broker's `oauthio` header.
#[derive(Clone, Debug)]
pub struct BrokerHeaderSigner {
	app_key: AppKey,
}
impl BrokerHeaderSigner {
	/// Creates a signer for the given application key.
	pub fn new(app_key: AppKey) -> Self {
		Self { app_key }
	}

	/// Renders the header value for `record`.
	pub fn header_value(&self, record: &CredentialRecord) -> String {
		let mut pairs = form_urlencoded::Serializer::new(String::new());

		pairs.append_pair("k", &self.app_key);

		match &record.credentials {
			Credentials::Bearer { access_token } => {
				pairs.append_pair("access_token", access_token.expose());
			},
			Credentials::OAuth1 { oauth_token, oauth_token_secret } => {
				pairs.append_pair("oauth_token", oauth_token.expose());
				pairs.append_pair("oauth_token_secret", oauth_token_secret.expose());
				pairs.append_pair("oauthv", "1");
			},
		}

		pairs.finish()
	}

	fn header(&self, record: &CredentialRecord) -> Result<HeaderValue, ConfigError> {
		let mut value = HeaderValue::try_from(self.header_value(record))
			.map_err(|e| ConfigError::HttpRequest(e.into()))?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl RequestSignerExt<HttpRequest, Error> for BrokerHeaderSigner {
	fn attach_token(
		&self,
		mut request: HttpRequest,
		record: &CredentialRecord,
	) -> Result<HttpRequest, Error> {
		let value = self.header(record)?;

		request.headers_mut().insert(HeaderName::from_static(OAUTHIO_HEADER), value);

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::RequestBuilder, Error> for BrokerHeaderSigner {
	fn attach_token(
		&self,
		request: reqwest::RequestBuilder,
		record: &CredentialRecord,
	) -> Result<reqwest::RequestBuilder, Error> {
		let value = self.header(record)?;

		Ok(request.header(OAUTHIO_HEADER, value))
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	fn signer() -> BrokerHeaderSigner {
		BrokerHeaderSigner::new(AppKey::new("app-key").expect("App key fixture should be valid."))
	}

	fn record(builder: crate::auth::CredentialRecordBuilder) -> CredentialRecord {
		builder
			.provider("twitter")
			.state("state")
			.expires_in_seconds(60)
			.build()
			.expect("Record fixture should build successfully.")
	}

	fn pairs(value: &str) -> HashMap<String, String> {
		form_urlencoded::parse(value.as_bytes()).into_owned().collect()
	}

	#[test]
	fn bearer_records_send_access_token_only() {
		let record = record(CredentialRecord::builder().access_token("a b&c"));
		let pairs = pairs(&signer().header_value(&record));

		assert_eq!(pairs.len(), 2);
		assert_eq!(pairs.get("k").map(String::as_str), Some("app-key"));
		assert_eq!(pairs.get("access_token").map(String::as_str), Some("a b&c"));
	}

	#[test]
	fn oauth1_records_send_pair_and_version_marker() {
		let record = record(CredentialRecord::builder().oauth1("tok", "sec"));
		let pairs = pairs(&signer().header_value(&record));

		assert_eq!(pairs.len(), 4);
		assert_eq!(pairs.get("oauth_token").map(String::as_str), Some("tok"));
		assert_eq!(pairs.get("oauth_token_secret").map(String::as_str), Some("sec"));
		assert_eq!(pairs.get("oauthv").map(String::as_str), Some("1"));
		assert!(!pairs.contains_key("access_token"));
	}

	#[test]
	fn attach_token_sets_sensitive_header() {
		let record = record(CredentialRecord::builder().access_token("token"));
		let request = HttpRequest::new(Vec::new());
		let signed =
			signer().attach_token(request, &record).expect("Signing a request should succeed.");
		let header =
			signed.headers().get(OAUTHIO_HEADER).expect("Signed request should carry the header.");

		assert!(header.is_sensitive());
		assert_eq!(header.to_str().ok(), Some("k=app-key&access_token=token"));
	}
}
