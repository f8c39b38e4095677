//! Login initiation: authorize redirect construction.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	flows::AuthorizationFlow,
	http::TokenHttpClient,
	oauth::{AuthorizeParams, ClientOverrides, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Caller input for [`AuthorizationFlow::begin_login`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginRequest {
	/// Opaque value forwarded unchanged to the provider.
	pub state: Option<String>,
	/// Per-request callback URL overriding the configured one.
	pub redirect_uri: Option<Url>,
	/// Extra authorize parameters (for example `force_login=1`).
	pub extra: Vec<(String, String)>,
}
impl LoginRequest {
	/// Sets the opaque `state`.
	pub fn with_state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}

	/// Sets the per-request callback URL.
	pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Appends an extra authorize parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra.push((key.into(), value.into()));

		self
	}
}

/// Where the host should send the user-agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectInstruction {
	/// Provider authorize URL.
	pub url: Url,
}

impl<C, M> AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the provider authorize URL. No request is sent and nothing is stored.
	///
	/// With `send_redirect_uri` enabled the callback URL (request override first, then the
	/// configured one) is required and sent as `redirect_uri`.
	pub fn begin_login(&self, request: &LoginRequest) -> Result<RedirectInstruction> {
		const KIND: FlowKind = FlowKind::BeginLogin;

		let span = FlowSpan::new(KIND, "begin_login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.in_scope(|| -> Result<RedirectInstruction> {
			let config = self.client.config();
			let mut params = AuthorizeParams {
				state: request.state.clone(),
				extra: request.extra.clone(),
				..Default::default()
			};

			if config.options.send_redirect_uri {
				let redirect_uri = request
					.redirect_uri
					.clone()
					.or_else(|| config.redirect_uri.clone())
					.ok_or(ConfigError::MissingRedirectUri)?;

				params.redirect_uri = Some(redirect_uri);
			}

			self.client
				.authorize_url(&params, &ClientOverrides::default())
				.map(|url| RedirectInstruction { url })
		});
		let outcome = if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };

		span.record_outcome(outcome);
		obs::record_flow_outcome(KIND, outcome);

		result
	}
}
