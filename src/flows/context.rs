//! Per-request state captured while handling one callback.

// self
use crate::{_prelude::*, auth::TokenSet};

/// Request-scoped context passed by reference through the flow.
///
/// [`AuthorizationFlow::complete_login`](crate::flows::AuthorizationFlow::complete_login)
/// fills it only on success. [`LoginContext::cleanup`] drops everything captured so later reads
/// cannot observe stale data.
#[derive(Clone, Default)]
pub struct LoginContext {
	redirect_uri: Option<Url>,
	token: Option<TokenSet>,
	profile: Option<JsonValue>,
}
impl LoginContext {
	/// Sets the callback URL used for this request's code exchange.
	///
	/// Only needed when the authorize redirect used a per-request callback URL.
	pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Per-request callback URL, if set.
	pub fn redirect_uri(&self) -> Option<&Url> {
		self.redirect_uri.as_ref()
	}

	/// Token set captured by the last successful callback.
	pub fn token(&self) -> Option<&TokenSet> {
		self.token.as_ref()
	}

	/// Profile captured by the last successful callback.
	pub fn profile(&self) -> Option<&JsonValue> {
		self.profile.as_ref()
	}

	/// Returns `true` when no token or profile is held.
	pub fn is_empty(&self) -> bool {
		self.token.is_none() && self.profile.is_none()
	}

	/// Drops the captured token and profile. Idempotent.
	pub fn cleanup(&mut self) {
		self.token = None;
		self.profile = None;
	}

	pub(crate) fn store(&mut self, token: TokenSet, profile: JsonValue) {
		self.token = Some(token);
		self.profile = Some(profile);
	}
}
impl Debug for LoginContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginContext")
			.field("redirect_uri", &self.redirect_uri)
			.field("token", &self.token)
			.field("profile_set", &self.profile.is_some())
			.finish()
	}
}
