//! Callback dispatch for the broker's redirect back to the application.
//!
//! After the provider handshake the broker redirects the browser to the application's redirect
//! URI with a single `oauthio` query parameter holding a JSON document:
//!
//! ```json
//! {"status":"success","data":{"code":"..."},"state":"...","provider":"github"}
//! ```
//!
//! On failure `status` is anything else and `message` explains why.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::CredentialRecord,
	error::GENERIC_BROKER_ERROR,
	flows::{Broker, common},
	http::BrokerHttpClient,
	obs::FlowKind,
	transport::TransportErrorMapper,
};

/// Query parameter carrying the broker's callback payload.
pub const CALLBACK_PARAM: &str = "oauthio";

const SUCCESS_STATUS: &str = "success";

/// Decoded callback payload; absent fields decode as `None`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallbackPayload {
	/// `success` when the handshake completed.
	pub status: Option<String>,
	/// Success data.
	pub data: Option<CallbackData>,
	/// CSRF state echoed by the broker.
	pub state: Option<String>,
	/// Provider identifier.
	pub provider: Option<String>,
	/// Broker-supplied failure message.
	pub message: Option<String>,
}
impl CallbackPayload {
	/// Parses the raw JSON carried by the [`CALLBACK_PARAM`] parameter.
	pub fn parse(raw: &str) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut de).map_err(|source| Error::CallbackParse { source })
	}

	/// Authorization code, or an empty string when the broker sent none.
	pub fn code(&self) -> &str {
		self.data.as_ref().and_then(|data| data.code.as_deref()).unwrap_or_default()
	}

	fn ensure_success(&self) -> Result<()> {
		if self.status.as_deref() == Some(SUCCESS_STATUS) {
			return Ok(());
		}

		let message = self
			.message
			.as_deref()
			.filter(|message| !message.is_empty())
			.unwrap_or(GENERIC_BROKER_ERROR)
			.to_owned();

		Err(Error::BrokerError { message })
	}
}

/// `data` section of a successful callback.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallbackData {
	/// One-time authorization code.
	pub code: Option<String>,
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + BrokerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Handles the broker redirect from its decoded query pairs and exchanges the code.
	///
	/// The broker is only contacted once the payload reports success.
	pub async fn dispatch_callback<I, K, V>(&self, pairs: I) -> Result<CredentialRecord>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let raw = find_payload(pairs);

		common::observed(FlowKind::Callback, "dispatch_callback", async move {
			let payload = decode(raw)?;

			self.exchange_code(payload.code()).await
		})
		.await
	}

	/// Same as [`Broker::dispatch_callback`], taking the raw (undecoded) query string.
	pub async fn dispatch_callback_query(&self, query: &str) -> Result<CredentialRecord> {
		let query = query.strip_prefix('?').unwrap_or(query);

		self.dispatch_callback(form_urlencoded::parse(query.as_bytes())).await
	}

	/// Same as [`Broker::dispatch_callback`], additionally requiring the round-tripped state to
	/// equal `expected_state`.
	///
	/// A payload announcing a different state is rejected before the broker is contacted; the
	/// state of the exchanged record is checked as well.
	pub async fn dispatch_callback_with_state<I, K, V>(
		&self,
		pairs: I,
		expected_state: &str,
	) -> Result<CredentialRecord>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let raw = find_payload(pairs);

		common::observed(FlowKind::Callback, "dispatch_callback_with_state", async move {
			let payload = decode(raw)?;

			let announced = payload.state.as_deref().filter(|state| !state.is_empty());

			if announced.is_some_and(|state| state != expected_state) {
				return Err(Error::StateMismatch);
			}

			let record = self.exchange_code(payload.code()).await?;

			if record.state != expected_state {
				return Err(Error::StateMismatch);
			}

			Ok(record)
		})
		.await
	}
}

fn find_payload<I, K, V>(pairs: I) -> Option<String>
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	pairs
		.into_iter()
		.find(|(key, _)| key.as_ref() == CALLBACK_PARAM)
		.map(|(_, value)| value.as_ref().to_owned())
}

fn decode(raw: Option<String>) -> Result<CallbackPayload> {
	let raw = raw.ok_or(Error::MissingPayload)?;
	let payload = CallbackPayload::parse(&raw)?;

	payload.ensure_success()?;

	Ok(payload)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ErrorKind;

	#[test]
	fn payload_decodes_success_document() {
		let payload = CallbackPayload::parse(
			r#"{"status":"success","data":{"code":"abc"},"state":"s1","provider":"github"}"#,
		)
		.expect("Success payload should parse.");

		assert_eq!(payload.code(), "abc");
		assert_eq!(payload.state.as_deref(), Some("s1"));
		assert!(payload.ensure_success().is_ok());
	}

	#[test]
	fn failure_status_carries_broker_message() {
		let payload = CallbackPayload::parse(r#"{"status":"error","message":"denied"}"#)
			.expect("Error payload should parse.");

		match payload.ensure_success() {
			Err(Error::BrokerError { message }) => assert_eq!(message, "denied"),
			other => panic!("Unexpected result: {other:?}."),
		}

		let payload = CallbackPayload::parse("{}").expect("Empty payload should parse.");

		match payload.ensure_success() {
			Err(Error::BrokerError { message }) => assert_eq!(message, GENERIC_BROKER_ERROR),
			other => panic!("Unexpected result: {other:?}."),
		}
	}

	#[test]
	fn malformed_payload_is_distinct_from_broker_error() {
		let err = CallbackPayload::parse("{not json").expect_err("Malformed JSON should fail.");

		assert_eq!(err.kind(), ErrorKind::CallbackParse);
	}

	#[test]
	fn missing_parameter_is_reported() {
		let raw = find_payload([("code", "abc")]);

		assert!(raw.is_none());
		assert!(matches!(decode(raw), Err(Error::MissingPayload)));
	}

	#[test]
	fn payload_is_found_among_pairs() {
		let raw = find_payload(vec![
			("foo".to_owned(), "bar".to_owned()),
			(CALLBACK_PARAM.to_owned(), "{}".to_owned()),
		]);

		assert_eq!(raw.as_deref(), Some("{}"));
	}
}
