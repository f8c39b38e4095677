//! Shared fixtures for the httpmock-backed integration tests.

#![allow(dead_code)]

// crates.io
use httpmock::prelude::*;
// self
use oauth2_exact::{
	auth::ProviderId,
	config::{ProviderConfig, StrategyOptions},
	flows::{AuthorizationFlow, ReqwestAuthorizationFlow},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::ProviderDescriptor,
	reqwest,
	url::Url,
};

pub const CLIENT_ID: &str = "client-it";
pub const CLIENT_SECRET: &str = "secret-it";
pub const REDIRECT_URI: &str = "https://app.example.com/auth/exact/callback";
pub const TOKEN_PATH: &str = "/api/oauth2/token";
pub const PROFILE_PATH: &str = "/api/v1/current/Me";
pub const TOKEN_BODY: &str = r#"{"access_token":"access-it","refresh_token":"refresh-it","token_type":"bearer","expires_in":"600"}"#;
pub const PROFILE_BODY: &str =
	r#"{"d":{"results":[{"UserID":"u1","FullName":"A B","Email":"a@x.com","UserName":"ab","PictureUrl":"https://cdn.example.com/ab.png"}]}}"#;

pub fn url(value: &str) -> Url {
	Url::parse(value).expect("Fixture URL should parse.")
}

pub fn descriptor(server: &MockServer) -> ProviderDescriptor {
	ProviderDescriptor::builder(ProviderId::exact_online())
		.authorization_endpoint(url(&server.url("/api/oauth2/auth")))
		.token_endpoint(url(&server.url(TOKEN_PATH)))
		.api_base(url(&server.url("/api/v1")))
		.build()
		.expect("Loopback descriptor should build.")
}

pub fn config(server: &MockServer) -> ProviderConfig {
	ProviderConfig::new(CLIENT_ID, CLIENT_SECRET, descriptor(server))
		.expect("Integration configuration should be valid.")
		.with_redirect_uri(Some(url(REDIRECT_URI)))
}

pub fn config_with_options(server: &MockServer, options: StrategyOptions) -> ProviderConfig {
	config(server).with_options(options)
}

pub fn flow(config: ProviderConfig) -> ReqwestAuthorizationFlow {
	AuthorizationFlow::with_http_client(config, ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
}

pub fn flow_with_client(config: ProviderConfig, client: reqwest::Client) -> ReqwestAuthorizationFlow {
	AuthorizationFlow::with_http_client(
		config,
		ReqwestHttpClient::with_client(client),
		ReqwestTransportErrorMapper,
	)
}
