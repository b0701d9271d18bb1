//! Token kinds issued by the broker: bearer tokens or OAuth1 token/secret pairs.

// self
use crate::{
	_prelude::*,
	auth::{CredentialRecordBuilderError, TokenSecret},
};

/// Provider credentials held by a [`CredentialRecord`](crate::auth::CredentialRecord).
///
/// Exactly one shape exists per record, so a record can never carry a bearer token and an
/// OAuth1 pair at the same time, nor half of a pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Credentials {
	/// OAuth2-style bearer token.
	#[serde(rename = "bearer")]
	Bearer {
		/// Access token forwarded to the broker on every proxied call.
		access_token: TokenSecret,
	},
	/// OAuth1-style token pair; the broker signs each proxied call with it.
	#[serde(rename = "oauth1")]
	OAuth1 {
		/// OAuth1 token.
		oauth_token: TokenSecret,
		/// OAuth1 token secret.
		oauth_token_secret: TokenSecret,
	},
}
impl Credentials {
	/// Creates bearer credentials.
	pub fn bearer(access_token: impl Into<String>) -> Self {
		Self::Bearer { access_token: TokenSecret::new(access_token) }
	}

	/// Creates OAuth1 credentials.
	pub fn oauth1(oauth_token: impl Into<String>, oauth_token_secret: impl Into<String>) -> Self {
		Self::OAuth1 {
			oauth_token: TokenSecret::new(oauth_token),
			oauth_token_secret: TokenSecret::new(oauth_token_secret),
		}
	}

	/// Picks the credential shape from the raw broker fields.
	///
	/// Empty strings count as absent. A non-empty access token always wins over an OAuth1
	/// pair; a lone OAuth1 token or secret is rejected.
	pub fn from_parts(
		access_token: Option<&str>,
		oauth_token: Option<&str>,
		oauth_token_secret: Option<&str>,
	) -> Result<Self, CredentialRecordBuilderError> {
		if let Some(access_token) = present(access_token) {
			return Ok(Self::bearer(access_token));
		}

		match (present(oauth_token), present(oauth_token_secret)) {
			(Some(token), Some(secret)) => Ok(Self::oauth1(token, secret)),
			(None, None) => Err(CredentialRecordBuilderError::MissingToken),
			_ => Err(CredentialRecordBuilderError::IncompleteOAuth1Pair),
		}
	}

	/// Returns `true` for bearer credentials.
	pub fn is_bearer(&self) -> bool {
		matches!(self, Self::Bearer { .. })
	}

	/// Returns the bearer access token, if any.
	pub fn access_token(&self) -> Option<&TokenSecret> {
		match self {
			Self::Bearer { access_token } => Some(access_token),
			Self::OAuth1 { .. } => None,
		}
	}

	/// Returns the OAuth1 token and secret, if any.
	pub fn oauth1_pair(&self) -> Option<(&TokenSecret, &TokenSecret)> {
		match self {
			Self::Bearer { .. } => None,
			Self::OAuth1 { oauth_token, oauth_token_secret } =>
				Some((oauth_token, oauth_token_secret)),
		}
	}
}

fn present(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.is_empty())
}
