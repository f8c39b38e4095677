//! Sign-in orchestration: the redirect phase, the callback phase, and the host-facing
//! [`LoginStrategy`] interface.

pub mod callback;
pub mod context;
pub mod failure;
pub mod identity;
pub mod login;

pub use callback::*;
pub use context::*;
pub use failure::*;
pub use identity::*;
pub use login::*;

// self
use crate::{
	_prelude::*,
	auth::TokenSet,
	config::ProviderConfig,
	error::ConfigError,
	http::TokenHttpClient,
	oauth::{ClientOverrides, TokenClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Boxed callback future returned through [`LoginStrategy`].
pub type LoginFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Identity, Vec<AuthError>>> + 'a + Send>>;

#[cfg(feature = "reqwest")]
/// Flow specialized for the crate's default reqwest transport stack.
pub type ReqwestAuthorizationFlow = AuthorizationFlow<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Narrow interface a host authentication framework drives.
///
/// Host adapters (route registration, session plumbing) live outside this crate and talk to
/// the strategy only through these three operations.
pub trait LoginStrategy
where
	Self: Send + Sync,
{
	/// Computes where to redirect the user-agent.
	fn begin_login(&self, request: &LoginRequest) -> Result<RedirectInstruction>;

	/// Resolves a provider callback into an identity or a non-empty failure list.
	fn complete_login<'a>(
		&'a self,
		ctx: &'a mut LoginContext,
		params: &'a CallbackParams,
	) -> LoginFuture<'a>;

	/// Releases per-request state captured on `ctx`.
	fn cleanup(&self, ctx: &mut LoginContext);
}

/// Exact Online sign-in flow bound to one process configuration.
pub struct AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client: TokenClient<C, M>,
}
impl<C, M> AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a flow that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: impl Into<Arc<ProviderConfig>>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		Self::with_token_client(TokenClient::with_http_client(config, http_client, error_mapper))
	}

	/// Wraps an existing token client.
	pub fn with_token_client(client: TokenClient<C, M>) -> Self {
		Self { client }
	}

	/// Token client backing this flow.
	pub fn token_client(&self) -> &TokenClient<C, M> {
		&self.client
	}

	/// Process configuration backing this flow.
	pub fn config(&self) -> &ProviderConfig {
		self.client.config()
	}

	/// Releases the token and profile captured on `ctx`. Idempotent.
	pub fn cleanup(&self, ctx: &mut LoginContext) {
		ctx.cleanup();
	}

	/// uid of the user captured on `ctx`, if any.
	pub fn uid(&self, ctx: &LoginContext) -> Option<String> {
		profile_uid(ctx.profile()?, &self.config().options.uid_field)
	}

	/// Display details of the user captured on `ctx`, if any.
	pub fn info(&self, ctx: &LoginContext) -> Option<IdentityInfo> {
		ctx.profile().map(IdentityInfo::from_profile)
	}

	/// Credentials captured on `ctx`, if any.
	pub fn credentials(&self, ctx: &LoginContext) -> Option<Credentials> {
		ctx.token().map(Credentials::from_token)
	}

	/// Full identity captured on `ctx`, if any.
	pub fn identity(&self, ctx: &LoginContext) -> Option<Identity> {
		let config = self.config();

		Some(Identity::build(
			&config.descriptor.id,
			&config.options.uid_field,
			ctx.token()?,
			ctx.profile()?,
		))
	}

	/// Exchanges the refresh token carried by `token` for a new set.
	///
	/// The host decides when to refresh; the crate never stores the result.
	pub async fn refresh(&self, token: &TokenSet) -> Result<TokenSet> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let refresh_token =
					token.refresh_token.as_ref().ok_or(ConfigError::MissingRefreshToken)?;

				self.client.refresh_token(refresh_token.expose(), &ClientOverrides::default()).await
			})
			.await;
		let outcome = if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };

		span.record_outcome(outcome);
		obs::record_flow_outcome(KIND, outcome);

		result
	}
}
#[cfg(feature = "reqwest")]
impl AuthorizationFlow<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a flow that provisions its own reqwest-backed transport.
	pub fn new(config: impl Into<Arc<ProviderConfig>>) -> Self {
		Self::with_token_client(TokenClient::new(config))
	}
}
impl<C, M> LoginStrategy for AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn begin_login(&self, request: &LoginRequest) -> Result<RedirectInstruction> {
		AuthorizationFlow::begin_login(self, request)
	}

	fn complete_login<'a>(
		&'a self,
		ctx: &'a mut LoginContext,
		params: &'a CallbackParams,
	) -> LoginFuture<'a> {
		Box::pin(AuthorizationFlow::complete_login(self, ctx, params))
	}

	fn cleanup(&self, ctx: &mut LoginContext) {
		AuthorizationFlow::cleanup(self, ctx);
	}
}
impl<C, M> Clone for AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { client: self.client.clone() }
	}
}
impl<C, M> Debug for AuthorizationFlow<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationFlow").field("client", &self.client).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	async fn drive(strategy: &dyn LoginStrategy, ctx: &mut LoginContext) -> Identity {
		strategy
			.complete_login(ctx, &CallbackParams::from_pairs([("code", "c")]))
			.await
			.expect("Callback should succeed.")
	}

	#[tokio::test]
	async fn strategy_object_drives_full_login_and_cleanup() {
		let script = ScriptedHttpClient::default();

		script.push_json(200, r#"{"access_token":"at","refresh_token":"rt","expires_in":"600"}"#);
		script.push_json(200, r#"{"d":{"results":[{"UserID":"u1","FullName":"A B","Email":"a@x.com"}]}}"#);

		let flow = scripted_flow(test_config(), &script);
		let strategy: &dyn LoginStrategy = &flow;
		let redirect = strategy.begin_login(&LoginRequest::default()).expect("Login should begin.");

		assert!(redirect.url.as_str().starts_with("https://start.exactonline.nl/api/oauth2/auth?"));

		let mut ctx = LoginContext::default();
		let identity = drive(strategy, &mut ctx).await;

		assert_eq!(identity.uid.as_deref(), Some("u1"));
		assert_eq!(flow.info(&ctx).and_then(|info| info.email), Some("a@x.com".into()));
		assert!(flow.credentials(&ctx).is_some());

		strategy.cleanup(&mut ctx);

		assert_eq!(flow.uid(&ctx), None);
		assert_eq!(flow.info(&ctx), None);
		assert_eq!(flow.credentials(&ctx), None);
		assert_eq!(flow.identity(&ctx), None);

		strategy.cleanup(&mut ctx);

		assert!(ctx.is_empty());
	}

	#[tokio::test]
	async fn refresh_requires_a_refresh_token() {
		let script = ScriptedHttpClient::default();
		let flow = scripted_flow(test_config(), &script);
		let err = flow
			.refresh(&TokenSet::new("at"))
			.await
			.expect_err("Refresh without a refresh token should fail.");

		assert!(matches!(err, Error::Config(ConfigError::MissingRefreshToken)));
		assert!(script.requests().is_empty());

		script.push_json(200, r#"{"access_token":"next","refresh_token":"rotated"}"#);

		let refreshed = flow
			.refresh(&TokenSet::new("at").with_refresh_token("rt"))
			.await
			.expect("Refresh should succeed.");

		assert_eq!(refreshed.access_token.expose(), "next");
		assert_eq!(refreshed.refresh_token.as_ref().map(|token| token.expose()), Some("rotated"));
	}
}
