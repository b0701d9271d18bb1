//! Authorization code exchange against `/auth/access_token`.
//!
//! The broker finishes the provider handshake itself and hands the application a one-time code
//! through the callback. [`Broker::exchange_code`] trades that code, together with the
//! application key and secret, for a [`CredentialRecord`]. A response that does not echo a CSRF
//! state is treated as untrusted and never surfaces as a record.

// self
use crate::{
	_prelude::*,
	auth::CredentialRecord,
	flows::{
		Broker,
		common::{self, ACCESS_TOKEN_PATH, TokenResponse},
	},
	http::BrokerHttpClient,
	obs::FlowKind,
	transport::TransportErrorMapper,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + BrokerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges an authorization code for a credential record.
	///
	/// The record's expiry is stamped as the local receive time plus the broker's `expires_in`.
	/// Codes are single-use on the broker side; calling this twice with the same code is not
	/// expected to succeed.
	pub async fn exchange_code(&self, code: &str) -> Result<CredentialRecord> {
		const KIND: FlowKind = FlowKind::Exchange;

		common::observed(KIND, "exchange_code", async move {
			if code.is_empty() {
				return Err(Error::MissingCode);
			}

			let url = self.config.endpoint(ACCESS_TOKEN_PATH)?;
			let request = common::form_request(&url, &self.app_fields(("code", code)))?;
			let response = self.execute(KIND, request).await?;
			let document: TokenResponse = common::parse_json(&response)?;

			document.into_record(OffsetDateTime::now_utc())
		})
		.await
	}
}
