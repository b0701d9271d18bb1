//! Walks through a full broker round trip: build the redirect URL, then (once the user comes back)
//! dispatch the callback, call the provider through the proxy, and refresh when needed.
//!
//! Run once to print the redirect URL, then re-run with the callback query string:
//!
//! ```sh
//! OAUTHIO_APP_KEY=... OAUTHIO_APP_SECRET=... cargo run --example broker_flow
//! OAUTHIO_STATE=<printed state> OAUTHIO_CALLBACK='oauthio=...' cargo run --example broker_flow
//! ```

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use oauthd_client::{config::BrokerConfig, flows::Broker};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = BrokerConfig::builder(
		env::var("OAUTHIO_APP_KEY").unwrap_or_else(|_| "demo-app-key".into()),
		env::var("OAUTHIO_APP_SECRET").unwrap_or_else(|_| "demo-app-secret".into()),
	)
	.build()?;
	let broker = Broker::new(config)?;
	let Ok(callback) = env::var("OAUTHIO_CALLBACK") else {
		let redirect = broker.authorize_url("github", "http://localhost:8080/oauth/callback")?;

		println!("Send your user to {}.", redirect.url);
		println!("Store state `{}` in their session.", redirect.state);

		return Ok(());
	};
	let state = env::var("OAUTHIO_STATE").map_err(|_| eyre!("OAUTHIO_STATE is required."))?;
	let mut record = broker
		.dispatch_callback_with_state(url::form_urlencoded::parse(callback.as_bytes()), &state)
		.await?;

	println!("Authorized {} until {}.", record.provider, record.expires_at);

	let profile = broker.me(&record, ["email", "name"]).await?;

	println!("Profile: {}.", String::from_utf8_lossy(&profile));

	if record.refresh_token.is_some() {
		let outcome = broker.refresh(&mut record, false).await?;

		println!("Refresh outcome: {outcome:?}.");
	}

	Ok(())
}
