#![cfg(feature = "reqwest")]

// self
use oauthd_client::{
	_preludet::*,
	flows::Broker,
	http::{BrokerHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	obs::FlowKind,
	transport::{self, TransportErrorMapper},
};

#[derive(Debug)]
enum FakeTransportError {
	Refused,
	Truncated,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Refused => write!(f, "Connection refused."),
			Self::Truncated => write!(f, "Body truncated."),
		}
	}
}
impl StdError for FakeTransportError {}

/// How the fake transport behaves for every call.
#[derive(Clone, Copy)]
enum Behavior {
	/// Fails before any response head arrives.
	Refuse,
	/// Publishes a status, then fails while "reading" the body.
	Truncate(u16),
}

#[derive(Clone, Copy)]
struct FakeHttpClient {
	behavior: Behavior,
}
impl BrokerHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, behavior: self.behavior }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	behavior: Behavior,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, _request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let behavior = self.behavior;

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);

			match behavior {
				Behavior::Refuse =>
					Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Refused))),
				Behavior::Truncate(status) => {
					slot.store(ResponseMetadata { status: Some(status) });

					Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Truncated)))
				},
			}
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	seen: Arc<Mutex<Vec<(FlowKind, Option<ResponseMetadata>)>>>,
}
impl RecordingTransportErrorMapper {
	fn seen(&self) -> Vec<(FlowKind, Option<ResponseMetadata>)> {
		self.seen.lock().clone()
	}
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		flow: FlowKind,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> Error {
		self.seen.lock().push((flow, meta.cloned()));

		transport::classify_by_metadata(meta, err)
	}
}

fn fake_broker(
	behavior: Behavior,
	mapper: Arc<RecordingTransportErrorMapper>,
) -> Broker<FakeHttpClient, RecordingTransportErrorMapper> {
	Broker::with_http_client(
		test_broker_config("https://broker.example.com"),
		FakeHttpClient { behavior },
		mapper,
	)
}

#[tokio::test]
async fn failures_before_a_response_are_unreachable() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let broker = fake_broker(Behavior::Refuse, mapper.clone());
	let err = broker.exchange_code("code-123").await.expect_err("Refused call must fail.");

	assert_eq!(err.kind(), ErrorKind::Unreachable);
	assert_eq!(mapper.seen(), vec![(FlowKind::Exchange, None)]);
}

#[tokio::test]
async fn failures_after_a_response_head_are_read_failures() {
	let mapper = Arc::new(RecordingTransportErrorMapper::default());
	let broker = fake_broker(Behavior::Truncate(200), mapper.clone());
	let mut record = oauthd_client::auth::CredentialRecord::builder()
		.provider("github")
		.state("state-1")
		.access_token("tok")
		.refresh_token("refresh")
		.build()
		.expect("Record fixture should build.");
	let err = broker.refresh(&mut record, true).await.expect_err("Truncated body must fail.");

	assert_eq!(err.kind(), ErrorKind::ReadFailure);
	assert!(!record.refreshed);

	let err = broker.get(&record, "/user").await.expect_err("Truncated body must fail.");

	assert_eq!(err.kind(), ErrorKind::ReadFailure);
	assert_eq!(
		mapper.seen(),
		vec![
			(FlowKind::Refresh, Some(ResponseMetadata { status: Some(200) })),
			(FlowKind::Request, Some(ResponseMetadata { status: Some(200) })),
		]
	);
}
