//! Callback handling: code exchange, profile fetch, identity normalization.

// self
use crate::{
	_prelude::*,
	auth::TokenSet,
	flows::{AuthError, AuthorizationFlow, Identity, LoginContext},
	http::{ApiResponse, TokenHttpClient},
	oauth::{ClientOverrides, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// REST path of the signed-in user's profile.
pub const PROFILE_PATH: &str = "/current/Me";

/// Parameters the provider attaches to the callback redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
	/// Authorization code.
	pub code: Option<String>,
	/// Opaque state echoed back by the provider.
	pub state: Option<String>,
	/// OAuth error code attached to a failed redirect.
	pub error: Option<String>,
	/// OAuth error description attached to a failed redirect.
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Reads the parameters from a callback URL's query string; unknown keys are ignored.
	pub fn from_query(url: &Url) -> Self {
		Self::from_pairs(url.query_pairs())
	}

	/// Builds the parameters from key/value pairs; later duplicates win.
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let mut params = Self::default();

		for (key, value) in pairs {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};

			*slot = Some(value.into());
		}

		params
	}

	/// Returns the authorization code unless it is absent or blank.
	pub fn code(&self) -> Option<&str> {
		self.code.as_deref().map(str::trim).filter(|code| !code.is_empty())
	}

	/// Returns the provider's redirect error, if any.
	pub fn provider_error(&self) -> Option<AuthError> {
		let kind = self.error.as_deref().filter(|kind| !kind.trim().is_empty())?;
		let message = self
			.error_description
			.as_deref()
			.filter(|message| !message.trim().is_empty())
			.unwrap_or(kind);

		Some(AuthError::new(kind, message))
	}
}

impl<C, M> AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Handles the provider callback.
	///
	/// Yields either an [`Identity`] or a non-empty list of [`AuthError`]s, never both. Any state
	/// left on `ctx` from an earlier callback is cleared first; the token and profile are
	/// stored only once both the exchange and the profile fetch succeed.
	pub async fn complete_login(
		&self,
		ctx: &mut LoginContext,
		params: &CallbackParams,
	) -> Result<Identity, Vec<AuthError>> {
		const KIND: FlowKind = FlowKind::CompleteLogin;

		let span = FlowSpan::new(KIND, "complete_login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		ctx.cleanup();

		let result = span.instrument(self.run_callback(ctx, params)).await;

		match &result {
			Ok(_) => {
				span.record_outcome(FlowOutcome::Success);
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(errors) => {
				span.record_outcome(FlowOutcome::Failure);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				for error in errors {
					obs::record_auth_failure(KIND, error);
				}
			},
		}

		result
	}

	async fn run_callback(
		&self,
		ctx: &mut LoginContext,
		params: &CallbackParams,
	) -> Result<Identity, Vec<AuthError>> {
		let code = params.code().ok_or_else(|| vec![AuthError::missing_code()])?;
		let config = self.client.config();
		let redirect_uri = if config.options.send_redirect_uri {
			ctx.redirect_uri().or(config.redirect_uri.as_ref())
		} else {
			None
		};
		let token = self
			.client
			.exchange_code(code, redirect_uri, &ClientOverrides::default())
			.await
			.map_err(|err| vec![AuthError::from_exchange(&err, params)])?;
		let profile = self.fetch_profile(&token).await.map_err(|err| vec![err])?;
		let identity = Identity::build(
			&config.descriptor.id,
			&config.options.uid_field,
			&token,
			&profile,
		);

		ctx.store(token, profile);

		Ok(identity)
	}

	async fn fetch_profile(&self, token: &TokenSet) -> Result<JsonValue, AuthError> {
		let response = self
			.client
			.fetch_profile(token, PROFILE_PATH)
			.await
			.map_err(|err| AuthError::oauth2(err.to_string()))?;

		match response.status {
			401 => Err(AuthError::unauthorized()),
			200..=399 => first_result(&response),
			_ => Err(AuthError::oauth2(error_message(&response))),
		}
	}
}

fn first_result(response: &ApiResponse) -> Result<JsonValue, AuthError> {
	let body = response
		.json()
		.map_err(|err| AuthError::oauth2(format!("Profile response is not JSON: {err}.")))?;

	match body.pointer("/d/results/0") {
		Some(profile) if profile.is_object() => Ok(profile.clone()),
		_ => Err(AuthError::oauth2("Profile response did not contain a user.")),
	}
}

// Exact Online reports errors as `{"error":{"message":{"value":"..."}}}`; other gateways use a
// plain `message`.
fn error_message(response: &ApiResponse) -> String {
	let Ok(body) = response.json() else {
		return AuthError::UNKNOWN_ERROR.into();
	};

	["/message", "/error/message", "/error/message/value"]
		.into_iter()
		.find_map(|pointer| body.pointer(pointer).and_then(JsonValue::as_str))
		.filter(|message| !message.trim().is_empty())
		.unwrap_or(AuthError::UNKNOWN_ERROR)
		.to_owned()
}
