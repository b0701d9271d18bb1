//! Credential renewal against `/auth/refresh_token/`.
//!
//! [`Broker::refresh`] renews a caller-owned [`CredentialRecord`] in place once it has expired
//! (or unconditionally when forced). The response is validated before anything is written, so a
//! failed refresh leaves the record exactly as it was. The `&mut` borrow is the only
//! synchronization: callers sharing a record across tasks wrap it in their own lock.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{CredentialRecord, token::record::Rotation},
	error::ConfigError,
	flows::{
		Broker,
		common::{self, REFRESH_TOKEN_PATH, TokenResponse},
	},
	http::BrokerHttpClient,
	obs::{FlowKind, FlowSpan},
	transport::TransportErrorMapper,
};

/// Result of a successful [`Broker::refresh`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
	/// The record was still fresh and `force` was not set; nothing was sent.
	Skipped,
	/// The broker issued new tokens and the record was updated.
	Refreshed,
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + BrokerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Renews `record` when it is past its expiry, or always when `force` is set.
	///
	/// A record without a refresh token fails with
	/// [`ConfigError::MissingRefreshToken`] before any request is sent, even when forced.
	/// `provider` and `state` are updated when the broker returns non-empty values.
	pub async fn refresh(
		&self,
		record: &mut CredentialRecord,
		force: bool,
	) -> Result<RefreshOutcome> {
		const KIND: FlowKind = FlowKind::Refresh;

		self.refresh_metrics.record_attempt();

		let span = FlowSpan::new(KIND, "refresh").with_provider(&record.provider);
		let result = common::observed_in(KIND, span, async move {
			if !force && !record.is_expired_at(OffsetDateTime::now_utc()) {
				return Ok(RefreshOutcome::Skipped);
			}

			let refresh_token = record
				.refresh_token
				.as_ref()
				.filter(|token| !token.is_empty())
				.ok_or(ConfigError::MissingRefreshToken)?;
			let url = self.config.endpoint(REFRESH_TOKEN_PATH)?;
			let request =
				common::form_request(&url, &self.app_fields(("token", refresh_token.expose())))?;
			let response = self.execute(KIND, request).await?;
			let document: TokenResponse = common::parse_json(&response)?;
			let rotation = Rotation {
				credentials: document.credentials()?,
				refresh_token: document.refresh_token,
				expires_in_seconds: document.expires_in,
				provider: document.provider,
				state: document.state,
			};

			record.rotate(rotation, OffsetDateTime::now_utc())?;

			Ok(RefreshOutcome::Refreshed)
		})
		.await;

		match &result {
			Ok(RefreshOutcome::Skipped) => self.refresh_metrics.record_skipped(),
			Ok(RefreshOutcome::Refreshed) => self.refresh_metrics.record_refreshed(),
			Err(_) => self.refresh_metrics.record_failure(),
		}

		result
	}
}
