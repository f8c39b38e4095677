//! Token set handed back by the token endpoint.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Access/refresh token pair produced by a code exchange or a refresh.
///
/// The set is owned by the calling session for its lifetime; the crate never persists it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
	/// Access token secret.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the provider (`bearer`).
	pub token_type: String,
	/// Expiry instant derived from `expires_in` at receipt time, serialized as a Unix timestamp.
	#[serde(with = "time::serde::timestamp::option")]
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenSet {
	/// Default token type used when the provider omits `token_type`.
	pub const DEFAULT_TOKEN_TYPE: &'static str = "bearer";

	/// Creates a bearer token set without refresh token or expiry.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: None,
			token_type: Self::DEFAULT_TOKEN_TYPE.into(),
			expires_at: None,
		}
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides the token type.
	pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = token_type.into();

		self
	}

	/// Sets an absolute expiry instant.
	pub fn with_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the expiry relative to `issued_at`.
	///
	/// Returns `None` when the instant falls outside the representable date range.
	pub fn with_expires_in(self, issued_at: OffsetDateTime, expires_in: Duration) -> Option<Self> {
		issued_at.checked_add(expires_in).map(|instant| self.with_expires_at(instant))
	}

	/// Returns `true` once the expiry instant has been reached. Sets without expiry never expire.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Whole seconds until expiry, clamped at zero.
	pub fn expires_in_at(&self, instant: OffsetDateTime) -> Option<i64> {
		self.expires_at.map(|expires_at| (expires_at - instant).whole_seconds().max(0))
	}
}
impl Debug for TokenSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSet")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
