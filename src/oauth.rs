//! Token client: OAuth 2.0 endpoint mechanics plus the one REST call the strategy needs.
//!
//! [`TokenClient`] merges descriptor defaults, process configuration, and call-site
//! [`ClientOverrides`] into a [`ClientConfig`], then drives the authorize URL, the
//! `authorization_code` and `refresh_token` grants, and the authenticated profile GET through
//! a [`TokenHttpClient`]. It never interprets API statuses; that belongs to the flow.

pub mod response;

pub use oauth2;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, AuthUrl, ClientId, ClientSecret, HttpClientError, HttpRequest, RedirectUrl,
	TokenUrl,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenSet},
	config::ProviderConfig,
	error::{ConfigError, TransientError, TransportError},
	http::{ApiResponse, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{
		ClientAuthMethod, EndpointKind, GrantType, ProviderDescriptor, descriptor::join_api_path,
	},
};
#[cfg(feature = "reqwest")]
use crate::http::ReqwestHttpClient;

type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

#[cfg(feature = "reqwest")]
/// Token client specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenClient = TokenClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		endpoint: EndpointKind,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: EndpointKind,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(endpoint, meta, message),
			_ => map_generic_transport_error(endpoint, meta, "unrecognized transport failure"),
		}
	}
}

/// Call-site overrides, the highest-priority configuration layer.
#[derive(Clone, Debug, Default)]
pub struct ClientOverrides {
	/// Authorization endpoint override.
	pub authorize_url: Option<Url>,
	/// Token endpoint override.
	pub token_url: Option<Url>,
	/// REST API base override.
	pub api_base_url: Option<Url>,
	/// Callback URL override.
	pub redirect_uri: Option<Url>,
	/// Client authentication method override.
	pub client_auth_method: Option<ClientAuthMethod>,
}

/// Fully merged client configuration for one operation.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// OAuth client secret.
	pub client_secret: ClientSecret,
	/// Authorization endpoint.
	pub auth_url: AuthUrl,
	/// Token endpoint (always called with POST).
	pub token_url: TokenUrl,
	/// REST API base.
	pub api_base: Url,
	/// Callback URL, when configured.
	pub redirect_uri: Option<RedirectUrl>,
	/// Client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
}
impl ClientConfig {
	/// Builds the authorization-code redirect URL for `params`.
	pub fn authorize_url(&self, params: &AuthorizeParams) -> Url {
		let mut url = self.auth_url.url().clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", self.client_id.as_str());

		if let Some(redirect_uri) = params.redirect_uri.as_ref() {
			pairs.append_pair("redirect_uri", redirect_uri.as_str());
		}
		if let Some(state) = params.state.as_deref() {
			pairs.append_pair("state", state);
		}

		for (key, value) in &params.extra {
			pairs.append_pair(key, value);
		}

		drop(pairs);

		url
	}

	fn basic_authorization(&self) -> String {
		let id: String = form_urlencoded::byte_serialize(self.client_id.as_bytes()).collect();
		let secret: String =
			form_urlencoded::byte_serialize(self.client_secret.secret().as_bytes()).collect();

		format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
	}
}

/// Caller parameters for the authorize URL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizeParams {
	/// Opaque value forwarded unchanged.
	pub state: Option<String>,
	/// Callback URL sent as `redirect_uri`.
	pub redirect_uri: Option<Url>,
	/// Additional query parameters appended verbatim.
	pub extra: Vec<(String, String)>,
}
impl AuthorizeParams {
	/// Sets the opaque `state` value.
	pub fn with_state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}

	/// Sets the `redirect_uri`.
	pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Appends an extra query parameter.
	pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra.push((key.into(), value.into()));

		self
	}
}

/// OAuth 2.0 + REST client bound to one provider configuration.
pub struct TokenClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: Arc<ProviderConfig>,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> TokenClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: impl Into<Arc<ProviderConfig>>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			config: config.into(),
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		}
	}

	/// Process configuration backing this client.
	pub fn config(&self) -> &ProviderConfig {
		&self.config
	}

	/// Merges descriptor defaults, process configuration, and `overrides` (in increasing
	/// priority) into a validated [`ClientConfig`].
	pub fn build_client(&self, overrides: &ClientOverrides) -> Result<ClientConfig> {
		let config = self.config.as_ref();

		if config.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId.into());
		}
		if config.client_secret.secret().trim().is_empty() {
			return Err(ConfigError::MissingClientSecret.into());
		}

		let defaults = &config.descriptor;
		let descriptor = ProviderDescriptor::builder(defaults.id.clone())
			.authorization_endpoint(
				overrides
					.authorize_url
					.clone()
					.unwrap_or_else(|| defaults.endpoints.authorization.clone()),
			)
			.token_endpoint(
				overrides.token_url.clone().unwrap_or_else(|| defaults.endpoints.token.clone()),
			)
			.api_base(
				overrides
					.api_base_url
					.clone()
					.unwrap_or_else(|| defaults.endpoints.api_base.clone()),
			)
			.client_auth_method(overrides.client_auth_method.unwrap_or(defaults.client_auth_method))
			.build()
			.map_err(ConfigError::from)?;
		let redirect_uri = overrides
			.redirect_uri
			.as_ref()
			.or(config.redirect_uri.as_ref())
			.map(|url| RedirectUrl::from_url(url.clone()));
		let client_auth_method = descriptor.client_auth_method;
		let endpoints = descriptor.endpoints;

		Ok(ClientConfig {
			client_id: config.client_id.clone(),
			client_secret: config.client_secret.clone(),
			auth_url: AuthUrl::from_url(endpoints.authorization),
			token_url: TokenUrl::from_url(endpoints.token),
			api_base: endpoints.api_base,
			redirect_uri,
			client_auth_method,
		})
	}

	/// Builds the provider authorize URL from the merged client config and `params`.
	pub fn authorize_url(
		&self,
		params: &AuthorizeParams,
		overrides: &ClientOverrides,
	) -> Result<Url> {
		Ok(self.build_client(overrides)?.authorize_url(params))
	}

	/// Exchanges an authorization code for a [`TokenSet`].
	///
	/// `client_secret` always travels in the form body. Token-endpoint error payloads surface
	/// as [`Error::Rejected`]; transport failures propagate unchanged. No retries.
	pub fn exchange_code<'a>(
		&'a self,
		code: &'a str,
		redirect_uri: Option<&'a Url>,
		overrides: &'a ClientOverrides,
	) -> ClientFuture<'a, TokenSet> {
		Box::pin(async move {
			let client = self.build_client(overrides)?;
			let mut form = vec![
				("grant_type", GrantType::AuthorizationCode.as_str().to_owned()),
				("code", code.to_owned()),
			];

			if let Some(redirect_uri) = redirect_uri {
				form.push(("redirect_uri", redirect_uri.to_string()));
			}

			self.request_token(&client, form).await
		})
	}

	/// Issues a `refresh_token` grant.
	///
	/// When the provider does not rotate the refresh token, the one passed in is carried over
	/// so the returned set stays usable for the next refresh.
	pub fn refresh_token<'a>(
		&'a self,
		refresh_token: &'a str,
		overrides: &'a ClientOverrides,
	) -> ClientFuture<'a, TokenSet> {
		Box::pin(async move {
			let client = self.build_client(overrides)?;
			let form = vec![
				("grant_type", GrantType::RefreshToken.as_str().to_owned()),
				("refresh_token", refresh_token.to_owned()),
			];
			let mut token = self.request_token(&client, form).await?;

			if token.refresh_token.is_none() {
				token.refresh_token = Some(TokenSecret::new(refresh_token));
			}

			Ok(token)
		})
	}

	/// Issues an authenticated GET against `api_base + path` and returns the raw outcome.
	///
	/// Exact Online expects the client secret as a query parameter alongside the bearer token.
	pub fn fetch_profile<'a>(
		&'a self,
		token: &'a TokenSet,
		path: &'a str,
	) -> ClientFuture<'a, ApiResponse> {
		Box::pin(async move {
			let client = self.build_client(&ClientOverrides::default())?;
			let mut url = join_api_path(&client.api_base, path)
				.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "api", source })?;

			url.query_pairs_mut().append_pair("client_secret", client.client_secret.secret());

			let request = Request::builder()
				.method(Method::GET)
				.uri(url.as_str())
				.header(ACCEPT, "application/json")
				.header(AUTHORIZATION, format!("Bearer {}", token.access_token.expose()))
				.body(Vec::new())
				.map_err(ConfigError::from)?;
			let (response, _) = self.dispatch(EndpointKind::Api, request).await?;

			Ok(ApiResponse::from_http(response))
		})
	}

	async fn request_token(
		&self,
		client: &ClientConfig,
		mut form: Vec<(&'static str, String)>,
	) -> Result<TokenSet> {
		form.push(("client_id", client.client_id.as_str().to_owned()));
		form.push(("client_secret", client.client_secret.secret().to_owned()));

		let body = form_urlencoded::Serializer::new(String::new())
			.extend_pairs(form.iter().map(|(key, value)| (*key, value.as_str())))
			.finish();
		let mut builder = Request::builder()
			.method(Method::POST)
			.uri(client.token_url.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json");

		if matches!(client.client_auth_method, ClientAuthMethod::ClientSecretBasic) {
			builder = builder.header(AUTHORIZATION, client.basic_authorization());
		}

		let request = builder.body(body.into_bytes()).map_err(ConfigError::from)?;
		let (response, meta) = self.dispatch(EndpointKind::Token, request).await?;

		response::map_token_response(
			response.status().as_u16(),
			meta.and_then(|meta| meta.retry_after),
			response.body(),
			OffsetDateTime::now_utc(),
		)
	}

	async fn dispatch(
		&self,
		endpoint: EndpointKind,
		request: HttpRequest,
	) -> Result<(oauth2::HttpResponse, Option<ResponseMetadata>)> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let response = handle.call(request).await.map_err(|err| {
			self.error_mapper.map_transport_error(endpoint, meta.take().as_ref(), err)
		})?;

		Ok((response, meta.take()))
	}
}
#[cfg(feature = "reqwest")]
impl TokenClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client that provisions its own reqwest-backed transport.
	pub fn new(config: impl Into<Arc<ProviderConfig>>) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> Clone for TokenClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			http_client: self.http_client.clone(),
			error_mapper: self.error_mapper.clone(),
		}
	}
}
impl<C, M> Debug for TokenClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenClient")
			.field("client_id", &self.config.client_id)
			.field("descriptor", &self.config.descriptor)
			.finish()
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: EndpointKind, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout { endpoint: endpoint.as_str() }.into();
	}
	if err.is_connect() {
		return TransportError::connect(endpoint.as_str(), err).into();
	}

	TransportError::network(endpoint.as_str(), err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(
	endpoint: EndpointKind,
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> Error {
	TransientError::UnexpectedResponse {
		endpoint: endpoint.as_str(),
		message: format!("HTTP client error: {message}"),
		status: meta.and_then(|value| value.status),
		retry_after: meta.and_then(|value| value.retry_after),
	}
	.into()
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::Engine as _;
	// self
	use super::*;
	use crate::_preludet::*;

	fn client(script: &ScriptedHttpClient) -> ScriptedTokenClient {
		scripted_token_client(test_config(), script)
	}

	#[test]
	fn build_client_layers_overrides_over_config() {
		let script = ScriptedHttpClient::default();
		let token_client = client(&script);
		let merged =
			token_client.build_client(&ClientOverrides::default()).expect("Client should build.");

		assert_eq!(merged.client_id.as_str(), TEST_CLIENT_ID);
		assert_eq!(merged.token_url.as_str(), "https://start.exactonline.nl/api/oauth2/token");
		assert_eq!(merged.client_auth_method, ClientAuthMethod::ClientSecretPost);
		assert_eq!(
			merged.redirect_uri.as_ref().map(|url| url.as_str()),
			Some(TEST_REDIRECT_URI)
		);

		let overrides = ClientOverrides {
			token_url: Some(Url::parse("https://proxy.example.com/token").expect("URL parses.")),
			redirect_uri: Some(Url::parse("https://other.example.com/cb").expect("URL parses.")),
			client_auth_method: Some(ClientAuthMethod::ClientSecretBasic),
			..Default::default()
		};
		let merged = token_client.build_client(&overrides).expect("Client should build.");

		assert_eq!(merged.token_url.as_str(), "https://proxy.example.com/token");
		assert_eq!(
			merged.auth_url.as_str(),
			"https://start.exactonline.nl/api/oauth2/auth",
			"Unset overrides keep the configured value."
		);
		assert_eq!(
			merged.redirect_uri.as_ref().map(|url| url.as_str()),
			Some("https://other.example.com/cb")
		);
		assert_eq!(merged.client_auth_method, ClientAuthMethod::ClientSecretBasic);
	}

	#[test]
	fn build_client_rejects_insecure_overrides() {
		let script = ScriptedHttpClient::default();
		let overrides = ClientOverrides {
			authorize_url: Some(Url::parse("http://example.com/auth").expect("URL parses.")),
			..Default::default()
		};
		let err = client(&script)
			.build_client(&overrides)
			.expect_err("Plain HTTP authorize override should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidDescriptor(_))));
	}

	#[test]
	fn authorize_url_includes_only_supplied_params() {
		let script = ScriptedHttpClient::default();
		let token_client = client(&script);
		let bare = token_client
			.authorize_url(&AuthorizeParams::default(), &ClientOverrides::default())
			.expect("Authorize URL should build.");
		let pairs = query_map(&bare);

		assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(pairs.get("client_id").map(String::as_str), Some(TEST_CLIENT_ID));
		assert!(!pairs.contains_key("redirect_uri"));
		assert!(!pairs.contains_key("state"));

		let params = AuthorizeParams::default()
			.with_state("opaque/state=1")
			.with_redirect_uri(Url::parse(TEST_REDIRECT_URI).expect("URL parses."))
			.with_extra("force_login", "1");
		let full = token_client
			.authorize_url(&params, &ClientOverrides::default())
			.expect("Authorize URL should build.");
		let pairs = query_map(&full);

		assert_eq!(pairs.get("state").map(String::as_str), Some("opaque/state=1"));
		assert_eq!(pairs.get("redirect_uri").map(String::as_str), Some(TEST_REDIRECT_URI));
		assert_eq!(pairs.get("force_login").map(String::as_str), Some("1"));
	}

	#[tokio::test]
	async fn exchange_code_posts_form_with_client_secret() {
		let script = ScriptedHttpClient::default();

		script.push_json(
			200,
			r#"{"access_token":"at","refresh_token":"rt","token_type":"bearer","expires_in":"600"}"#,
		);

		let token_client = client(&script);
		let redirect = Url::parse(TEST_REDIRECT_URI).expect("URL parses.");
		let token = token_client
			.exchange_code("the-code", Some(&redirect), &ClientOverrides::default())
			.await
			.expect("Exchange should succeed.");

		assert_eq!(token.access_token.expose(), "at");
		assert_eq!(token.refresh_token.as_ref().map(TokenSecret::expose), Some("rt"));
		assert!(token.expires_at.is_some());

		let request = script.single_request();
		let form = request.form();

		assert_eq!(request.method, "POST");
		assert_eq!(request.url.path(), "/api/oauth2/token");
		assert_eq!(request.header("accept"), Some("application/json"));
		assert_eq!(request.header("authorization"), None);
		assert_eq!(form.get("grant_type").map(String::as_str), Some("authorization_code"));
		assert_eq!(form.get("code").map(String::as_str), Some("the-code"));
		assert_eq!(form.get("redirect_uri").map(String::as_str), Some(TEST_REDIRECT_URI));
		assert_eq!(form.get("client_id").map(String::as_str), Some(TEST_CLIENT_ID));
		assert_eq!(form.get("client_secret").map(String::as_str), Some(TEST_CLIENT_SECRET));
	}

	#[tokio::test]
	async fn basic_auth_is_added_on_top_of_body_secret() {
		let script = ScriptedHttpClient::default();

		script.push_json(200, r#"{"access_token":"at","token_type":"bearer"}"#);

		let overrides = ClientOverrides {
			client_auth_method: Some(ClientAuthMethod::ClientSecretBasic),
			..Default::default()
		};

		client(&script)
			.exchange_code("code", None, &overrides)
			.await
			.expect("Exchange should succeed.");

		let request = script.single_request();
		let expected = format!(
			"Basic {}",
			STANDARD.encode(format!("{TEST_CLIENT_ID}:{TEST_CLIENT_SECRET}"))
		);

		assert_eq!(request.header("authorization"), Some(expected.as_str()));
		assert_eq!(request.form().get("client_secret").map(String::as_str), Some(TEST_CLIENT_SECRET));
		assert!(!request.form().contains_key("redirect_uri"));
	}

	#[tokio::test]
	async fn refresh_carries_previous_refresh_token_when_not_rotated() {
		let script = ScriptedHttpClient::default();

		script.push_json(200, r#"{"access_token":"fresh","token_type":"bearer","expires_in":600}"#);

		let token = client(&script)
			.refresh_token("old-refresh", &ClientOverrides::default())
			.await
			.expect("Refresh should succeed.");

		assert_eq!(token.access_token.expose(), "fresh");
		assert_eq!(token.refresh_token.as_ref().map(TokenSecret::expose), Some("old-refresh"));

		let form = script.single_request().form();

		assert_eq!(form.get("grant_type").map(String::as_str), Some("refresh_token"));
		assert_eq!(form.get("refresh_token").map(String::as_str), Some("old-refresh"));
		assert_eq!(form.get("client_secret").map(String::as_str), Some(TEST_CLIENT_SECRET));
	}

	#[tokio::test]
	async fn refresh_surfaces_provider_rejection() {
		let script = ScriptedHttpClient::default();

		script.push_json(400, r#"{"error":"invalid_grant","error_description":"expired"}"#);

		let err = client(&script)
			.refresh_token("stale", &ClientOverrides::default())
			.await
			.expect_err("Rejected refresh should fail.");

		assert!(matches!(
			err,
			Error::Rejected { ref code, ref description, status: Some(400) }
				if code == "invalid_grant" && description.as_deref() == Some("expired")
		));
	}

	#[tokio::test]
	async fn fetch_profile_sends_bearer_and_secret_and_returns_raw_status() {
		let script = ScriptedHttpClient::default();

		script.push_json(401, r#"{"error":{"message":{"value":"nope"}}}"#);

		let token = TokenSet::new("access-123");
		let response = client(&script)
			.fetch_profile(&token, "/current/Me")
			.await
			.expect("Non-2xx statuses are not transport errors.");

		assert_eq!(response.status, 401);

		let request = script.single_request();

		assert_eq!(request.method, "GET");
		assert_eq!(request.url.path(), "/api/v1/current/Me");
		assert_eq!(request.header("authorization"), Some("Bearer access-123"));
		assert_eq!(query_map(&request.url).get("client_secret").map(String::as_str), Some(TEST_CLIENT_SECRET));
	}

	#[tokio::test]
	async fn transport_failures_propagate_through_mapper() {
		let script = ScriptedHttpClient::default();

		script.push_failure(ScriptedFailure::Timeout);

		let err = client(&script)
			.exchange_code("code", None, &ClientOverrides::default())
			.await
			.expect_err("Timeout should propagate.");

		assert!(err.is_timeout());
	}
}
