//! Async client SDK for the OAuth.io broker: start provider redirects, exchange authorization
//! codes, refresh expiring credentials, and proxy signed provider calls through the broker.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod ext;
pub mod flows;
pub mod http;
pub mod obs;
pub mod transport;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::{_prelude::*, error::ErrorKind};

	// self
	use crate::{
		config::BrokerConfig, flows::Broker, http::ReqwestHttpClient,
		transport::ReqwestTransportErrorMapper,
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Application key used by test brokers.
	pub const TEST_APP_KEY: &str = "app-key-test";
	/// Application secret used by test brokers.
	pub const TEST_APP_SECRET: &str = "app-secret-test";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a [`BrokerConfig`] pointing at `broker_url` with the test application credentials.
	pub fn test_broker_config(broker_url: &str) -> BrokerConfig {
		BrokerConfig::builder(TEST_APP_KEY, TEST_APP_SECRET)
			.broker_url(Url::parse(broker_url).expect("Test broker URL should parse successfully."))
			.build()
			.expect("Test broker config should build successfully.")
	}

	/// Constructs a [`Broker`] that talks to the mock broker at `broker_url` through the reqwest
	/// transport used across integration tests.
	pub fn build_reqwest_test_broker(broker_url: &str) -> ReqwestTestBroker {
		Broker::with_http_client(
			test_broker_config(broker_url),
			test_reqwest_http_client(),
			ReqwestTransportErrorMapper,
		)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

/// Version of the SDK, reported alongside broker calls for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _, tokio as _};
