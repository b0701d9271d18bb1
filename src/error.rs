//! SDK-level error types shared across flows, the transport seam, and configuration.

// self
use crate::{_prelude::*, auth::CredentialRecordBuilderError};

/// SDK-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Generic message used when the broker reports a failure without a message.
pub const GENERIC_BROKER_ERROR: &str = "An error occurred while contacting the OAuth broker";

/// Canonical SDK error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The broker could not be reached (DNS, TCP, TLS, connect timeout).
	#[error("Couldn't communicate with the OAuth broker.")]
	Unreachable {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// The broker answered but its response body could not be read.
	#[error("Couldn't read the OAuth broker response.")]
	ReadFailure {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// The broker response body was not the expected JSON document.
	#[error("Couldn't parse the OAuth broker response.")]
	ParseFailure {
		/// Structured parsing failure, including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The broker response did not carry the CSRF state and cannot be trusted.
	#[error("State is missing in the OAuth broker response.")]
	MissingState,
	/// The broker response could not be turned into a usable credential.
	#[error("OAuth broker response does not describe a usable credential.")]
	InvalidCredential(#[source] CredentialRecordBuilderError),
	/// The authorization code handed to the exchanger was empty.
	#[error("Authorization code is missing.")]
	MissingCode,

	/// The callback request did not carry the broker payload parameter.
	#[error("Callback request is missing the `oauthio` parameter.")]
	MissingPayload,
	/// The callback payload was not valid JSON.
	#[error("Callback payload is malformed.")]
	CallbackParse {
		/// Structured parsing failure, including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The broker reported a non-success status in the callback payload.
	#[error("{message}.")]
	BrokerError {
		/// Broker-supplied message, verbatim when available.
		message: String,
	},
	/// The state returned through the redirect round trip does not match the stored one.
	#[error("Authorization state mismatch.")]
	StateMismatch,
}
impl Error {
	/// Wraps a transport failure that happened before a response was received.
	pub fn unreachable(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Unreachable { source: Box::new(src) }
	}

	/// Wraps a transport failure that happened while reading the response body.
	pub fn read_failure(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::ReadFailure { source: Box::new(src) }
	}

	/// Returns the fieldless classification of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Config(_) => ErrorKind::Config,
			Self::Unreachable { .. } => ErrorKind::Unreachable,
			Self::ReadFailure { .. } => ErrorKind::ReadFailure,
			Self::ParseFailure { .. } => ErrorKind::ParseFailure,
			Self::MissingState => ErrorKind::MissingState,
			Self::InvalidCredential(_) => ErrorKind::InvalidCredential,
			Self::MissingCode => ErrorKind::MissingCode,
			Self::MissingPayload => ErrorKind::MissingPayload,
			Self::CallbackParse { .. } => ErrorKind::CallbackParse,
			Self::BrokerError { .. } => ErrorKind::BrokerError,
			Self::StateMismatch => ErrorKind::StateMismatch,
		}
	}
}
impl From<CredentialRecordBuilderError> for Error {
	fn from(e: CredentialRecordBuilderError) -> Self {
		match e {
			CredentialRecordBuilderError::MissingState => Self::MissingState,
			other => Self::InvalidCredential(other),
		}
	}
}

/// Fieldless classification of [`Error`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// See [`Error::Config`].
	Config,
	/// See [`Error::Unreachable`].
	Unreachable,
	/// See [`Error::ReadFailure`].
	ReadFailure,
	/// See [`Error::ParseFailure`].
	ParseFailure,
	/// See [`Error::MissingState`].
	MissingState,
	/// See [`Error::InvalidCredential`].
	InvalidCredential,
	/// See [`Error::MissingCode`].
	MissingCode,
	/// See [`Error::MissingPayload`].
	MissingPayload,
	/// See [`Error::CallbackParse`].
	CallbackParse,
	/// See [`Error::BrokerError`].
	BrokerError,
	/// See [`Error::StateMismatch`].
	StateMismatch,
}

/// Configuration and validation failures raised by the SDK.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Broker URL cannot be used as a base for broker endpoints.
	#[error("Broker URL `{url}` must be an absolute http(s) URL without query or fragment.")]
	InvalidBrokerUrl {
		/// Offending URL.
		url: String,
	},
	/// Redirect base path is not an absolute path.
	#[error("Broker base path `{path}` must start with `/`.")]
	InvalidBasePath {
		/// Offending path.
		path: String,
	},
	/// Application key failed identifier validation.
	#[error("Application key is invalid.")]
	InvalidAppKey(#[source] crate::auth::IdentifierError),
	/// Application secret was empty.
	#[error("Application secret cannot be empty.")]
	MissingAppSecret,
	/// Connect timeout was zero.
	#[error("Connect timeout must be greater than zero.")]
	ZeroTimeout,
	/// A broker endpoint could not be assembled into a valid URL.
	#[error("Broker endpoint `{endpoint}` is not a valid URL.")]
	InvalidEndpoint {
		/// Endpoint string that failed to parse.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Proxied endpoint would escape the provider's proxy path.
	#[error("Endpoint `{endpoint}` must not contain dot segments.")]
	InvalidProxyEndpoint {
		/// Offending endpoint.
		endpoint: String,
	},
	/// Provider identifier failed validation.
	#[error("Provider identifier is invalid.")]
	InvalidProvider(#[source] crate::auth::IdentifierError),
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request or options payload could not be encoded as JSON.
	#[error("Payload could not be encoded as JSON.")]
	JsonEncode(#[source] serde_json::Error),
	/// Record is missing a refresh token.
	#[error("Credential record is missing a refresh token.")]
	MissingRefreshToken,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
