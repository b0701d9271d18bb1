//! Broker operations: code exchange, refresh, signed proxy calls, redirects, and callbacks.

pub mod callback;
pub mod common;
pub mod exchange;
pub mod redirect;
pub mod refresh;
pub mod request;

pub use callback::*;
pub use redirect::*;
pub use refresh::*;
pub use request::*;

// self
use crate::{
	_prelude::*, config::BrokerConfig, ext::BrokerHeaderSigner, http::BrokerHttpClient,
	transport::TransportErrorMapper,
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestHttpClient, transport::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Client-side handle to the OAuth broker.
///
/// The broker owns everything that is shared and read-only across calls: the configuration, the
/// pooled HTTP client, and the transport error mapper. Credential records are owned by the caller
/// and passed into each operation, so the same broker serves any number of records concurrently.
/// Cloning is cheap.
#[derive(Clone)]
pub struct Broker<C, M>
where
	C: ?Sized + BrokerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound broker request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Broker URL, base path, application credentials, and timeout.
	pub config: Arc<BrokerConfig>,
	/// Signer attaching the `oauthio` header to proxied calls.
	pub signer: BrokerHeaderSigner,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + BrokerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	///
	/// The connect timeout in `config` is only enforced by clients built through
	/// [`ReqwestHttpClient::from_config`](crate::http::ReqwestHttpClient::from_config); custom
	/// transports must apply it themselves.
	pub fn with_http_client(
		config: BrokerConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let signer = BrokerHeaderSigner::new(config.app_key.clone());

		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config: Arc::new(config),
			signer,
			refresh_metrics: Default::default(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a broker with its own pooled reqwest client.
	///
	/// The client enforces `config.timeout` as its connect timeout and never follows redirects.
	pub fn new(config: BrokerConfig) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::from_config(&config)?;

		Ok(Self::with_http_client(config, http_client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + BrokerHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker").field("config", &self.config).finish()
	}
}
