#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use oauthd_client::{_preludet::*, auth::CredentialRecord, error::ConfigError, flows::Method};

fn bearer_record() -> CredentialRecord {
	CredentialRecord::builder()
		.provider("github")
		.state("state-1")
		.access_token("tok")
		.expires_in_seconds(3600)
		.build()
		.expect("Bearer record fixture should build.")
}

fn oauth1_record() -> CredentialRecord {
	CredentialRecord::builder()
		.provider("twitter")
		.state("state-1")
		.oauth1("ot", "os")
		.expires_in_seconds(3600)
		.build()
		.expect("OAuth1 record fixture should build.")
}

#[tokio::test]
async fn get_sends_bearer_header_and_returns_body() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/request/github/user/repos")
				.query_param("per_page", "5")
				.header("oauthio", "k=app-key-test&access_token=tok");
			then.status(200).header("content-type", "application/json").body("[{\"id\":1}]");
		})
		.await;
	let body = broker
		.get(&bearer_record(), "/user/repos?per_page=5")
		.await
		.expect("Proxied GET should succeed.");

	mock.assert_async().await;

	assert_eq!(body, b"[{\"id\":1}]");
}

#[tokio::test]
async fn oauth1_records_send_pair_and_version_marker() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/request/twitter/1.1/account/verify_credentials.json")
				.header("oauthio", "k=app-key-test&oauth_token=ot&oauth_token_secret=os&oauthv=1");
			then.status(200).body("{}");
		})
		.await;

	broker
		.request(&oauth1_record(), Method::GET, "1.1/account/verify_credentials.json", None)
		.await
		.expect("Proxied OAuth1 call should succeed.");

	mock.assert_async().await;
}

#[tokio::test]
async fn json_verbs_send_encoded_body() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let post = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/request/github/user/repos")
				.header("content-type", "application/json")
				.body("{\"name\":\"demo\"}");
			then.status(201).body("{\"id\":7}");
		})
		.await;
	let patch = server
		.mock_async(|when, then| {
			when.method(PATCH).path("/request/github/repos/demo").body("{\"private\":true}");
			then.status(200).body("{}");
		})
		.await;
	let put = server
		.mock_async(|when, then| {
			when.method(PUT).path("/request/github/user/starred/octo/demo").body("null");
			then.status(204);
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/request/github/repos/demo");
			then.status(204);
		})
		.await;
	let record = bearer_record();
	let created = broker
		.post(&record, "/user/repos", &serde_json::json!({ "name": "demo" }))
		.await
		.expect("Proxied POST should succeed.");

	assert_eq!(created, b"{\"id\":7}");

	broker
		.patch(&record, "/repos/demo", &serde_json::json!({ "private": true }))
		.await
		.expect("Proxied PATCH should succeed.");

	broker
		.put(&record, "/user/starred/octo/demo", &())
		.await
		.expect("Proxied PUT should succeed.");

	let deleted =
		broker.delete(&record, "/repos/demo").await.expect("Proxied DELETE should succeed.");

	assert!(deleted.is_empty());

	post.assert_async().await;
	patch.assert_async().await;
	put.assert_async().await;
	delete.assert_async().await;
}

#[tokio::test]
async fn provider_errors_come_back_as_bytes() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/request/github/missing");
			then.status(404).body("{\"message\":\"Not Found\"}");
		})
		.await;
	let body = broker
		.get(&bearer_record(), "/missing")
		.await
		.expect("Provider errors are not SDK errors.");

	assert_eq!(body, b"{\"message\":\"Not Found\"}");
}

#[tokio::test]
async fn me_requests_filtered_profile() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/auth/github/me")
				.query_param("filters", "email,name")
				.header("oauthio", "k=app-key-test&access_token=tok");
			then.status(200).body("{\"email\":\"a@b.c\",\"name\":\"A\"}");
		})
		.await;
	let body =
		broker.me(&bearer_record(), ["email", "name"]).await.expect("Profile lookup should succeed.");

	mock.assert_async().await;

	assert_eq!(body, b"{\"email\":\"a@b.c\",\"name\":\"A\"}");
}

#[tokio::test]
async fn unreachable_proxy_is_reported() {
	let broker = build_reqwest_test_broker("http://127.0.0.1:1");
	let err = broker.get(&bearer_record(), "/user").await.expect_err("Closed port must fail.");

	assert_eq!(err.kind(), ErrorKind::Unreachable);
}

#[tokio::test]
async fn endpoints_cannot_escape_the_proxy_path() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.path("/auth/access_token");
			then.status(200);
		})
		.await;

	for endpoint in ["/../../auth/access_token", "/%2e%2e/%2E%2E/auth/access_token"] {
		let err = broker
			.get(&bearer_record(), endpoint)
			.await
			.expect_err("Dot segments must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidProxyEndpoint { .. })));
	}

	mock.assert_calls_async(0).await;
}
