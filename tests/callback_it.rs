#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use url::form_urlencoded;
// self
use oauthd_client::{_preludet::*, flows::CALLBACK_PARAM};

const TOKEN_DOCUMENT: &str =
	"{\"access_token\":\"tok\",\"state\":\"state-1\",\"provider\":\"github\",\"expires_in\":3600}";

fn callback_query(payload: &str) -> String {
	form_urlencoded::Serializer::new(String::new()).append_pair(CALLBACK_PARAM, payload).finish()
}

#[tokio::test]
async fn success_payload_is_exchanged() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/access_token")
				.body("code=code-123&key=app-key-test&secret=app-secret-test");
			then.status(200).header("content-type", "application/json").body(TOKEN_DOCUMENT);
		})
		.await;
	let query = callback_query(
		"{\"status\":\"success\",\"data\":{\"code\":\"code-123\"},\"state\":\"state-1\",\"provider\":\"github\"}",
	);
	let record =
		broker.dispatch_callback_query(&format!("?{query}")).await.expect("Callback should succeed.");

	mock.assert_async().await;

	assert_eq!(record.access_token(), Some("tok"));
	assert_eq!(record.state, "state-1");
}

#[tokio::test]
async fn broker_failure_is_reported_without_contacting_broker() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/access_token");
			then.status(200);
		})
		.await;
	let err = broker
		.dispatch_callback([(CALLBACK_PARAM, "{\"status\":\"error\",\"message\":\"denied\"}")])
		.await
		.expect_err("Broker-reported failure must surface.");

	match err {
		Error::BrokerError { message } => assert_eq!(message, "denied"),
		other => panic!("Unexpected error: {other:?}."),
	}

	let err = broker
		.dispatch_callback([(CALLBACK_PARAM, "{\"status\":\"error\"}")])
		.await
		.expect_err("Broker-reported failure must surface.");

	assert_eq!(err.to_string(), format!("{}.", oauthd_client::error::GENERIC_BROKER_ERROR));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn missing_or_malformed_payload_is_rejected() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/access_token");
			then.status(200);
		})
		.await;
	let err = broker
		.dispatch_callback_query("code=abc&state=xyz")
		.await
		.expect_err("Missing payload must fail.");

	assert!(matches!(err, Error::MissingPayload));

	let err = broker
		.dispatch_callback_query(&callback_query("{\"status\":"))
		.await
		.expect_err("Malformed payload must fail.");

	assert_eq!(err.kind(), ErrorKind::CallbackParse);

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn success_without_code_surfaces_missing_code() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let err = broker
		.dispatch_callback([(CALLBACK_PARAM, "{\"status\":\"success\"}")])
		.await
		.expect_err("Success without a code must fail.");

	assert!(matches!(err, Error::MissingCode));
}

#[tokio::test]
async fn state_mismatch_is_detected_before_exchange() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/access_token");
			then.status(200).header("content-type", "application/json").body(TOKEN_DOCUMENT);
		})
		.await;
	let payload =
		"{\"status\":\"success\",\"data\":{\"code\":\"code-123\"},\"state\":\"forged\"}";
	let err = broker
		.dispatch_callback_with_state([(CALLBACK_PARAM, payload)], "state-1")
		.await
		.expect_err("Foreign state must be rejected.");

	assert!(matches!(err, Error::StateMismatch));

	mock.assert_calls_async(0).await;

	let payload =
		"{\"status\":\"success\",\"data\":{\"code\":\"code-123\"},\"state\":\"state-1\"}";
	let record = broker
		.dispatch_callback_with_state([(CALLBACK_PARAM, payload)], "state-1")
		.await
		.expect("Matching state should succeed.");

	assert_eq!(record.state, "state-1");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn exchanged_state_is_checked_too() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(&server.base_url());
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/access_token");
			then.status(200).header("content-type", "application/json").body(TOKEN_DOCUMENT);
		})
		.await;
	let err = broker
		.dispatch_callback_with_state(
			[(CALLBACK_PARAM, "{\"status\":\"success\",\"data\":{\"code\":\"code-123\"}}")],
			"state-2",
		)
		.await
		.expect_err("Exchanged state must match.");

	assert!(matches!(err, Error::StateMismatch));
}
