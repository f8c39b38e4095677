//! Provider descriptor data structures shared by the token client and flows.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Grant identifiers sent to the token endpoint.
pub mod grant;

pub use builder::*;
pub use grant::*;

// self
use crate::{_prelude::*, auth::ProviderId, provider::Region};

/// Preferred client authentication modes for token endpoint calls.
///
/// Exact Online always expects `client_secret` in the form body; `ClientSecretBasic`
/// additionally sends the credentials as an HTTP Basic header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`, on top of the body parameters.
	ClientSecretBasic,
	#[default]
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Outbound endpoint a request targets; used to label errors and spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointKind {
	/// Token endpoint (code exchange, refresh).
	Token,
	/// REST API (`/current/Me`).
	Api,
}
impl EndpointKind {
	/// Returns a stable label suitable for messages and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			EndpointKind::Token => "token",
			EndpointKind::Api => "api",
		}
	}
}
impl Display for EndpointKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the user-agent is redirected to.
	pub authorization: Url,
	/// Token endpoint used for code exchanges and refreshes.
	pub token: Url,
	/// Base URL of the REST API (`.../api/v1`).
	pub api_base: Url,
}

/// Immutable provider descriptor consumed by the token client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Preferred client authentication mechanism.
	pub client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptor {
	/// Identifier used for the built-in Exact Online descriptor.
	pub const EXACT_ONLINE: &'static str = "exact_online";

	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Builds the default Exact Online descriptor for a region.
	pub fn exact_online(region: Region) -> Self {
		Self {
			id: ProviderId::exact_online(),
			endpoints: ProviderEndpoints {
				authorization: region.authorization_url(),
				token: region.token_url(),
				api_base: region.api_base_url(),
			},
			client_auth_method: ClientAuthMethod::ClientSecretPost,
		}
	}

	/// Joins `path` onto the API base, keeping the base path intact.
	pub fn api_url(&self, path: &str) -> Result<Url, url::ParseError> {
		join_api_path(&self.endpoints.api_base, path)
	}
}

pub(crate) fn join_api_path(base: &Url, path: &str) -> Result<Url, url::ParseError> {
	let base = base.as_str().trim_end_matches('/');
	let path = path.trim_start_matches('/');

	Url::parse(&format!("{base}/{path}"))
}
