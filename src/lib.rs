//! Exact Online OAuth 2.0 sign-in strategy: authorize redirects, code exchange, and
//! `/current/Me` identity normalization behind a narrow host-facing interface.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.
	//!
	//! [`ScriptedHttpClient`] replays canned responses in order and records every request it
	//! receives, so flow tests can assert on exactly what went over the wire.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// crates.io
	use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode};
	// self
	use crate::{
		config::ProviderConfig,
		error::{ConfigError, TransientError, TransportError},
		flows::AuthorizationFlow,
		http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
		oauth::{TokenClient, TransportErrorMapper},
		provider::{EndpointKind, ProviderDescriptor, Region},
	};
	#[cfg(feature = "reqwest")]
	use crate::http::ReqwestHttpClient;

	/// Client identifier used by test configurations.
	pub const TEST_CLIENT_ID: &str = "test-client";
	/// Client secret used by test configurations.
	pub const TEST_CLIENT_SECRET: &str = "test-secret";
	/// Callback URL used by test configurations.
	pub const TEST_REDIRECT_URI: &str = "https://app.example.com/auth/exact/callback";

	/// Token client driven by a [`ScriptedHttpClient`].
	pub type ScriptedTokenClient = TokenClient<ScriptedHttpClient, ScriptedTransportErrorMapper>;
	/// Authorization flow driven by a [`ScriptedHttpClient`].
	pub type ScriptedFlow = AuthorizationFlow<ScriptedHttpClient, ScriptedTransportErrorMapper>;

	/// Transport failures a script can inject.
	#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
	pub enum ScriptedFailure {
		/// Request timed out.
		#[error("Scripted request timed out.")]
		Timeout,
		/// Connection was refused.
		#[error("Scripted connection was refused.")]
		Refused,
		/// Connection dropped while reading the response body.
		#[error("Scripted connection dropped mid-body.")]
		Dropped,
	}

	/// Request captured by a [`ScriptedHttpClient`].
	#[derive(Clone, Debug)]
	pub struct RecordedRequest {
		/// HTTP method.
		pub method: String,
		/// Request URL.
		pub url: Url,
		/// Headers keyed by lowercase name.
		pub headers: BTreeMap<String, String>,
		/// Raw body.
		pub body: Vec<u8>,
	}
	impl RecordedRequest {
		/// Looks up a header by lowercase name.
		pub fn header(&self, name: &str) -> Option<&str> {
			self.headers.get(name).map(String::as_str)
		}

		/// Decodes a form-encoded body.
		pub fn form(&self) -> BTreeMap<String, String> {
			url::form_urlencoded::parse(&self.body).into_owned().collect()
		}
	}

	#[derive(Debug)]
	enum ScriptedResponse {
		Http { status: u16, body: Vec<u8> },
		Failure(ScriptedFailure),
	}

	#[derive(Debug, Default)]
	struct ScriptState {
		responses: VecDeque<ScriptedResponse>,
		requests: Vec<RecordedRequest>,
	}

	/// In-memory transport replaying scripted responses. Clones share one script.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedHttpClient(Arc<Mutex<ScriptState>>);
	impl ScriptedHttpClient {
		/// Queues a JSON response.
		pub fn push_json(&self, status: u16, body: &str) {
			self.0
				.lock()
				.responses
				.push_back(ScriptedResponse::Http { status, body: body.as_bytes().to_vec() });
		}

		/// Queues a transport failure.
		pub fn push_failure(&self, failure: ScriptedFailure) {
			self.0.lock().responses.push_back(ScriptedResponse::Failure(failure));
		}

		/// Requests received so far.
		pub fn requests(&self) -> Vec<RecordedRequest> {
			self.0.lock().requests.clone()
		}

		/// Returns the only request received, panicking otherwise.
		pub fn single_request(&self) -> RecordedRequest {
			let mut requests = self.requests();

			assert_eq!(requests.len(), 1, "Exactly one request should have been sent.");

			requests.remove(0)
		}
	}
	impl TokenHttpClient for ScriptedHttpClient {
		type Handle = ScriptedHandle;
		type TransportError = ScriptedFailure;

		fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
			ScriptedHandle { script: self.clone(), slot }
		}
	}

	/// Handle returned by [`ScriptedHttpClient`].
	#[derive(Debug)]
	pub struct ScriptedHandle {
		script: ScriptedHttpClient,
		slot: ResponseMetadataSlot,
	}
	impl<'c> AsyncHttpClient<'c> for ScriptedHandle {
		type Error = HttpClientError<ScriptedFailure>;
		type Future =
			Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

		fn call(&'c self, request: HttpRequest) -> Self::Future {
			Box::pin(async move {
				self.slot.take();

				let url = Url::parse(&request.uri().to_string())
					.map_err(|err| HttpClientError::Other(err.to_string()))?;
				let headers = request
					.headers()
					.iter()
					.map(|(name, value)| {
						(name.as_str().to_owned(), value.to_str().unwrap_or_default().to_owned())
					})
					.collect();
				let recorded = RecordedRequest {
					method: request.method().to_string(),
					url,
					headers,
					body: request.into_body(),
				};
				let next = {
					let mut state = self.script.0.lock();

					state.requests.push(recorded);
					state.responses.pop_front()
				};

				match next {
					Some(ScriptedResponse::Http { status, body }) => {
						self.slot.store(ResponseMetadata { status: Some(status), retry_after: None });

						let mut response = HttpResponse::new(body);

						*response.status_mut() = StatusCode::from_u16(status)
							.map_err(|err| HttpClientError::Other(err.to_string()))?;

						Ok(response)
					},
					Some(ScriptedResponse::Failure(failure)) =>
						Err(HttpClientError::Reqwest(Box::new(failure))),
					None => Err(HttpClientError::Other("script exhausted".into())),
				}
			})
		}
	}

	/// Maps [`ScriptedFailure`]s the same way the reqwest mapper maps real failures.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedTransportErrorMapper;
	impl TransportErrorMapper<ScriptedFailure> for ScriptedTransportErrorMapper {
		fn map_transport_error(
			&self,
			endpoint: EndpointKind,
			metadata: Option<&ResponseMetadata>,
			error: HttpClientError<ScriptedFailure>,
		) -> Error {
			match error {
				HttpClientError::Reqwest(failure) => match *failure {
					ScriptedFailure::Timeout =>
						TransportError::Timeout { endpoint: endpoint.as_str() }.into(),
					ScriptedFailure::Refused =>
						TransportError::connect(endpoint.as_str(), *failure).into(),
					ScriptedFailure::Dropped =>
						TransportError::network(endpoint.as_str(), *failure).into(),
				},
				HttpClientError::Http(inner) => ConfigError::from(inner).into(),
				HttpClientError::Io(inner) => TransportError::Io(inner).into(),
				other => TransientError::UnexpectedResponse {
					endpoint: endpoint.as_str(),
					message: other.to_string(),
					status: metadata.and_then(|meta| meta.status),
					retry_after: None,
				}
				.into(),
			}
		}
	}

	/// Netherlands configuration with test credentials and callback URL.
	pub fn test_config() -> ProviderConfig {
		let redirect_uri =
			Url::parse(TEST_REDIRECT_URI).expect("Test redirect URI should be a valid URL.");

		ProviderConfig::new(
			TEST_CLIENT_ID,
			TEST_CLIENT_SECRET,
			ProviderDescriptor::exact_online(Region::Netherlands),
		)
		.expect("Test configuration should be valid.")
		.with_redirect_uri(Some(redirect_uri))
	}

	/// Builds a token client sharing `script`.
	pub fn scripted_token_client(
		config: ProviderConfig,
		script: &ScriptedHttpClient,
	) -> ScriptedTokenClient {
		TokenClient::with_http_client(config, script.clone(), ScriptedTransportErrorMapper)
	}

	/// Builds a flow sharing `script`.
	pub fn scripted_flow(config: ProviderConfig, script: &ScriptedHttpClient) -> ScriptedFlow {
		AuthorizationFlow::with_token_client(scripted_token_client(config, script))
	}

	/// Collects a URL's query string into a map; later duplicates win.
	pub fn query_map(url: &Url) -> BTreeMap<String, String> {
		url.query_pairs().into_owned().collect()
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
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
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
