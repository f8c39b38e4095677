//! Crate-level error types shared by configuration, the token client, and flows.
//!
//! These errors describe failures of the machinery itself. Per-request sign-in failures handed
//! to the host are expressed as [`AuthError`](crate::flows::AuthError) values instead.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint answered with an OAuth error payload instead of a token.
	#[error("Token endpoint rejected the request with `{code}`.")]
	Rejected {
		/// Provider-supplied `error` code.
		code: String,
		/// Provider-supplied `error_description`, when present.
		description: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl Error {
	/// Returns `true` when the failure was a transport timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Transport(TransportError::Timeout { .. }))
	}

	/// Returns `true` when the provider could not be reached at all.
	pub fn is_connect(&self) -> bool {
		matches!(self, Self::Transport(TransportError::Connect { .. } | TransportError::Io(_)))
	}
}

/// Configuration and validation failures. These are raised before any request is served or
/// while building a client, never as part of the per-request sign-in taxonomy.
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

	/// The client identifier is absent or empty.
	#[error("Client identifier is missing.")]
	MissingClientId,
	/// The client secret is absent or empty.
	#[error("Client secret is missing.")]
	MissingClientSecret,
	/// An `{ "env": ... }` indirection named a variable that is not set.
	#[error("Environment variable `{name}` referenced by `{field}` is not set.")]
	MissingEnvVar {
		/// Setting that carried the indirection.
		field: &'static str,
		/// Environment variable name.
		name: String,
	},
	/// Settings document could not be deserialized.
	#[error("Provider settings are malformed at `{path}`.", path = .source.path())]
	MalformedSettings {
		/// Path-aware deserialization failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// An endpoint URL could not be parsed.
	#[error("The {endpoint} URL is invalid.")]
	InvalidEndpoint {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint set failed descriptor validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Refresh was requested for a token set without a refresh token.
	#[error("Token set does not carry a refresh token.")]
	MissingRefreshToken,
	/// A redirect URI is required because `send_redirect_uri` is enabled.
	#[error("Redirect URI is required when `send_redirect_uri` is enabled.")]
	MissingRedirectUri,
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

/// Temporary failure variants.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned an unexpected but non-fatal response.
	#[error("The {endpoint} endpoint returned an unexpected response: {message}.")]
	UnexpectedResponse {
		/// Endpoint label (`token`, `api`).
		endpoint: &'static str,
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Connection to the provider could not be established.
	#[error("Could not connect to the {endpoint} endpoint.")]
	Connect {
		/// Endpoint label (`token`, `api`).
		endpoint: &'static str,
		/// Transport-specific connection error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client failed after connecting (body read, decode, redirect).
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint label (`token`, `api`).
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request did not complete within the transport's timeout.
	#[error("Request to the {endpoint} endpoint timed out.")]
	Timeout {
		/// Endpoint label (`token`, `api`).
		endpoint: &'static str,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}

	/// Wraps a transport-specific connection error.
	pub fn connect(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Connect { endpoint, source: Box::new(src) }
	}
}
