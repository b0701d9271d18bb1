//! Mapping of transport failures into the SDK error taxonomy.

// crates.io
use oauth2::HttpClientError;
// self
use crate::{_prelude::*, error::ConfigError, http::ResponseMetadata, obs::FlowKind};

/// Maps HTTP transport failures into SDK [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into an SDK error.
	///
	/// `flow` names the operation that issued the call, for mappers that treat flows differently.
	fn map_transport_error(
		&self,
		flow: FlowKind,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_flow: FlowKind,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => classify_by_metadata(meta, inner),
			HttpClientError::Other(message) => classify_by_metadata(meta, OtherTransportError(message)),
			_ => classify_by_metadata(meta, OtherTransportError("Unknown transport error".into())),
		}
	}
}

/// Classifies a transport failure using the metadata contract of
/// [`BrokerHttpClient`](crate::http::BrokerHttpClient): once a response status was recorded the
/// broker was reached, so the failure happened while reading the body.
pub fn classify_by_metadata(
	meta: Option<&ResponseMetadata>,
	source: impl 'static + Send + Sync + StdError,
) -> Error {
	if meta.and_then(|value| value.status).is_some() {
		Error::read_failure(source)
	} else {
		Error::unreachable(source)
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_body() || err.is_decode() {
		return Error::read_failure(err);
	}

	classify_by_metadata(meta, err)
}

/// Free-form transport failure reported through [`HttpClientError::Other`].
#[derive(Debug, ThisError)]
#[error("{0}.")]
pub struct OtherTransportError(pub String);
