//! Per-request sign-in failures handed back to the host.

// self
use crate::{_prelude::*, flows::CallbackParams, oauth::response::MISSING_ACCESS_TOKEN};

/// One sign-in failure: a kind tag plus a human-readable message.
///
/// The kind is either one of the associated constants or a provider-supplied OAuth error code
/// (for example `invalid_grant`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ThisError)]
#[error("{kind}: {message}")]
pub struct AuthError {
	/// Failure tag.
	pub kind: String,
	/// Failure detail.
	pub message: String,
}
impl AuthError {
	/// Callback arrived without an authorization code.
	pub const MISSING_CODE: &'static str = "missing_code";
	/// Profile fetch was refused with HTTP 401.
	pub const TOKEN: &'static str = "token";
	/// Any other profile fetch failure.
	pub const OAUTH2: &'static str = "OAuth2";
	/// Token exchange timed out.
	pub const TIMEOUT: &'static str = "timeout";
	/// Token endpoint could not be reached.
	pub const FAILED_TO_CONNECT: &'static str = "failed_to_connect";
	/// Token exchange failed without a more specific reason.
	pub const INVALID_CREDENTIALS: &'static str = "invalid_credentials";
	/// Fallback message when a provider error body carries none.
	pub const UNKNOWN_ERROR: &'static str = "unknown error";

	/// Creates a failure with an arbitrary kind.
	pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
		Self { kind: kind.into(), message: message.into() }
	}

	/// `missing_code` failure.
	pub fn missing_code() -> Self {
		Self::new(Self::MISSING_CODE, "No code received")
	}

	/// `token` / `unauthorized` failure.
	pub fn unauthorized() -> Self {
		Self::new(Self::TOKEN, "unauthorized")
	}

	/// `OAuth2` failure with the given message.
	pub fn oauth2(message: impl Into<String>) -> Self {
		Self::new(Self::OAUTH2, message)
	}

	/// Classifies a failed code exchange.
	///
	/// Provider error payloads keep their code and description. When the token endpoint gave
	/// no error fields, the callback's own `error` / `error_description` are used instead.
	pub fn from_exchange(error: &Error, callback: &CallbackParams) -> Self {
		match error {
			Error::Rejected { code, description, .. } if code != MISSING_ACCESS_TOKEN =>
				Self::new(code, description.as_deref().unwrap_or(code)),
			_ if error.is_timeout() => Self::new(Self::TIMEOUT, error.to_string()),
			_ if error.is_connect() => Self::new(Self::FAILED_TO_CONNECT, error.to_string()),
			Error::Rejected { .. } | Error::Transient(_) =>
				callback.provider_error().unwrap_or_else(|| {
					Self::new(Self::INVALID_CREDENTIALS, rejected_message(error))
				}),
			_ => Self::new(Self::INVALID_CREDENTIALS, error.to_string()),
		}
	}
}

fn rejected_message(error: &Error) -> String {
	match error {
		Error::Rejected { description: Some(description), .. } => description.clone(),
		_ => error.to_string(),
	}
}
