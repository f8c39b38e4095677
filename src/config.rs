//! Process-wide strategy configuration.
//!
//! [`ProviderSettings`] is the raw, deserializable shape a host loads at startup. Calling
//! [`ProviderSettings::resolve`] applies environment indirection exactly once and validates the
//! result into an immutable [`ProviderConfig`]. Missing credentials are fatal here, before any
//! request is served.

pub mod value;

pub use value::*;

// crates.io
use oauth2::{ClientId, ClientSecret};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{ClientAuthMethod, ProviderDescriptor, Region},
};

/// Per-strategy behavior switches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyOptions {
	/// Profile field used as the identity `uid`.
	pub uid_field: String,
	/// Whether the callback URL is sent as `redirect_uri`.
	pub send_redirect_uri: bool,
}
impl StrategyOptions {
	/// Stable provider-assigned user identifier field.
	pub const DEFAULT_UID_FIELD: &'static str = "UserID";

	/// Overrides the uid field (for example `Email`).
	pub fn with_uid_field(mut self, field: impl Into<String>) -> Self {
		self.uid_field = field.into();

		self
	}

	/// Overrides the redirect URI switch.
	pub fn with_send_redirect_uri(mut self, send: bool) -> Self {
		self.send_redirect_uri = send;

		self
	}
}
impl Default for StrategyOptions {
	fn default() -> Self {
		Self { uid_field: Self::DEFAULT_UID_FIELD.into(), send_redirect_uri: true }
	}
}

/// Raw strategy settings as loaded from a host configuration document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSettings {
	/// OAuth client identifier (literal or `{ "env": "VAR" }`).
	pub client_id: Option<ConfigValue>,
	/// OAuth client secret (literal or `{ "env": "VAR" }`).
	pub client_secret: Option<ConfigValue>,
	/// Callback URL registered with the provider.
	pub redirect_uri: Option<String>,
	/// Data center providing the default endpoints.
	pub region: Region,
	/// Authorization endpoint override.
	pub authorize_url: Option<String>,
	/// Token endpoint override.
	pub token_url: Option<String>,
	/// REST API base override.
	pub api_base_url: Option<String>,
	/// Client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
	/// Profile field used as the identity `uid`.
	pub uid_field: Option<String>,
	/// Whether the callback URL is sent as `redirect_uri`.
	pub send_redirect_uri: Option<bool>,
}
impl ProviderSettings {
	/// Creates settings carrying the two required credentials.
	pub fn new(client_id: impl Into<ConfigValue>, client_secret: impl Into<ConfigValue>) -> Self {
		Self {
			client_id: Some(client_id.into()),
			client_secret: Some(client_secret.into()),
			..Default::default()
		}
	}

	/// Parses a JSON settings document, reporting the failing path on error.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::MalformedSettings { source })
	}

	/// Sets the callback URL.
	pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
		self.redirect_uri = Some(redirect_uri.into());

		self
	}

	/// Sets the data center.
	pub fn with_region(mut self, region: Region) -> Self {
		self.region = region;

		self
	}

	/// Resolves environment indirection against the process environment and validates.
	pub fn resolve(self) -> Result<ProviderConfig, ConfigError> {
		self.resolve_with(|name| std::env::var(name).ok())
	}

	/// Resolves environment indirection against `lookup` and validates.
	pub fn resolve_with<F>(self, lookup: F) -> Result<ProviderConfig, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let client_id = self
			.client_id
			.as_ref()
			.map(|value| resolve_value("client_id", value, &lookup))
			.transpose()?
			.unwrap_or_default();
		let client_secret = self
			.client_secret
			.as_ref()
			.map(|value| resolve_value("client_secret", value, &lookup))
			.transpose()?
			.unwrap_or_default();
		let mut builder = ProviderDescriptor::builder(crate::auth::ProviderId::exact_online())
			.region(self.region)
			.client_auth_method(self.client_auth_method);

		if let Some(raw) = self.authorize_url.as_deref() {
			builder = builder.authorization_endpoint(parse_endpoint("authorization", raw)?);
		}
		if let Some(raw) = self.token_url.as_deref() {
			builder = builder.token_endpoint(parse_endpoint("token", raw)?);
		}
		if let Some(raw) = self.api_base_url.as_deref() {
			builder = builder.api_base(parse_endpoint("api", raw)?);
		}

		let redirect_uri =
			self.redirect_uri.as_deref().map(|raw| parse_endpoint("redirect", raw)).transpose()?;
		let mut options = StrategyOptions::default();

		if let Some(field) = self.uid_field {
			options.uid_field = field;
		}
		if let Some(send) = self.send_redirect_uri {
			options.send_redirect_uri = send;
		}

		ProviderConfig::new(client_id, client_secret, builder.build()?)
			.map(|config| config.with_redirect_uri(redirect_uri).with_options(options))
	}
}

/// Validated, immutable strategy configuration.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// OAuth client secret.
	pub client_secret: ClientSecret,
	/// Callback URL registered with the provider.
	pub redirect_uri: Option<Url>,
	/// Endpoint set and client-auth preference.
	pub descriptor: ProviderDescriptor,
	/// Strategy behavior switches.
	pub options: StrategyOptions,
}
impl ProviderConfig {
	/// Builds a configuration from resolved credentials; empty values are rejected.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		descriptor: ProviderDescriptor,
	) -> Result<Self, ConfigError> {
		let client_id = client_id.into();
		let client_secret = client_secret.into();

		if client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if client_secret.trim().is_empty() {
			return Err(ConfigError::MissingClientSecret);
		}

		descriptor.validate()?;

		Ok(Self {
			client_id: ClientId::new(client_id),
			client_secret: ClientSecret::new(client_secret),
			redirect_uri: None,
			descriptor,
			options: StrategyOptions::default(),
		})
	}

	/// Sets or clears the callback URL.
	pub fn with_redirect_uri(mut self, redirect_uri: Option<Url>) -> Self {
		self.redirect_uri = redirect_uri;

		self
	}

	/// Replaces the strategy options.
	pub fn with_options(mut self, options: StrategyOptions) -> Self {
		self.options = options;

		self
	}

	/// Authorization endpoint.
	pub fn authorize_url(&self) -> &Url {
		&self.descriptor.endpoints.authorization
	}

	/// Token endpoint.
	pub fn token_url(&self) -> &Url {
		&self.descriptor.endpoints.token
	}

	/// REST API base.
	pub fn api_base_url(&self) -> &Url {
		&self.descriptor.endpoints.api_base
	}
}

fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn env(name: &str) -> Option<String> {
		match name {
			"EXACT_CLIENT_ID" => Some("env-client".into()),
			"EXACT_CLIENT_SECRET" => Some("env-secret".into()),
			_ => None,
		}
	}

	#[test]
	fn resolves_literals_and_env_indirection() {
		let config = ProviderSettings::from_json_str(
			r#"{
				"client_id": "literal-client",
				"client_secret": { "env": "EXACT_CLIENT_SECRET" },
				"redirect_uri": "https://app.example.com/auth/exact/callback",
				"region": "uk",
				"uid_field": "Email"
			}"#,
		)
		.expect("Settings should parse.")
		.resolve_with(env)
		.expect("Settings should resolve.");

		assert_eq!(config.client_id.as_str(), "literal-client");
		assert_eq!(config.client_secret.secret(), "env-secret");
		assert_eq!(config.authorize_url().as_str(), "https://start.exactonline.co.uk/api/oauth2/auth");
		assert_eq!(config.options.uid_field, "Email");
		assert!(config.options.send_redirect_uri);
		assert_eq!(
			config.redirect_uri.as_ref().map(Url::as_str),
			Some("https://app.example.com/auth/exact/callback")
		);
	}

	#[test]
	fn missing_credentials_fail_fast() {
		let err = ProviderSettings::default()
			.resolve_with(env)
			.expect_err("Missing client id should be fatal.");

		assert!(matches!(err, ConfigError::MissingClientId));

		let err = ProviderSettings::new("client", "")
			.resolve_with(env)
			.expect_err("Empty client secret should be fatal.");

		assert!(matches!(err, ConfigError::MissingClientSecret));

		let err = ProviderSettings::new(ConfigValue::env("EXACT_UNSET"), "secret")
			.resolve_with(env)
			.expect_err("Unset environment indirection should be fatal.");

		assert!(matches!(err, ConfigError::MissingEnvVar { field: "client_id", .. }));
	}

	#[test]
	fn malformed_documents_are_rejected() {
		let err = ProviderSettings::from_json_str(r#"{"client_id":"a","send_redirect_uri":"no"}"#)
			.expect_err("String switch should be rejected.");

		assert!(err.to_string().contains("send_redirect_uri"));
		assert!(ProviderSettings::from_json_str(r#"{"clientid":"typo"}"#).is_err());

		let err = ProviderSettings::new("client", "secret")
			.with_redirect_uri("not a url")
			.resolve_with(env)
			.expect_err("Invalid redirect should be rejected.");

		assert!(matches!(err, ConfigError::InvalidEndpoint { endpoint: "redirect", .. }));
	}

	#[test]
	fn endpoint_overrides_take_priority_over_region() {
		let mut settings = ProviderSettings::new(ConfigValue::env("EXACT_CLIENT_ID"), "secret")
			.with_region(Region::France);

		settings.api_base_url = Some("https://gateway.example.com/api/v1".into());
		settings.send_redirect_uri = Some(false);

		let config = settings.resolve_with(env).expect("Settings should resolve.");

		assert_eq!(config.client_id.as_str(), "env-client");
		assert_eq!(config.token_url().as_str(), "https://start.exactonline.fr/api/oauth2/token");
		assert_eq!(config.api_base_url().as_str(), "https://gateway.example.com/api/v1");
		assert!(!config.options.send_redirect_uri);
	}
}
