//! Provider-agnostic identity record handed to the host.

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, TokenSecret, TokenSet},
};

/// Normalized result of a successful sign-in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
	/// Provider that authenticated the user.
	pub provider: ProviderId,
	/// Value of the configured uid field; `None` when the profile lacks it.
	pub uid: Option<String>,
	/// Token material for API access.
	pub credentials: Credentials,
	/// Display-oriented user details.
	pub info: IdentityInfo,
	/// Unmodified token set and profile.
	pub raw: RawIdentity,
}
impl Identity {
	/// Builds the identity from a token set and a `/current/Me` profile object.
	pub fn build(
		provider: &ProviderId,
		uid_field: &str,
		token: &TokenSet,
		profile: &JsonValue,
	) -> Self {
		Self {
			provider: provider.clone(),
			uid: profile_uid(profile, uid_field),
			credentials: Credentials::from_token(token),
			info: IdentityInfo::from_profile(profile),
			raw: RawIdentity { token: token.clone(), user: profile.clone() },
		}
	}
}

/// Token material exposed on the identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Access token.
	pub token: TokenSecret,
	/// Refresh token, when issued.
	pub refresh_token: Option<TokenSecret>,
	/// Access token expiry as a Unix timestamp.
	#[serde(with = "time::serde::timestamp::option")]
	pub expires_at: Option<OffsetDateTime>,
	/// Token type (`bearer`).
	pub token_type: String,
	/// Exact Online access tokens always expire.
	pub expires: bool,
}
impl Credentials {
	/// Projects a token set onto the host-facing credential shape.
	pub fn from_token(token: &TokenSet) -> Self {
		Self {
			token: token.access_token.clone(),
			refresh_token: token.refresh_token.clone(),
			expires_at: token.expires_at,
			token_type: token.token_type.clone(),
			expires: true,
		}
	}
}

/// Display-oriented user details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityInfo {
	/// `FullName`.
	pub name: Option<String>,
	/// `UserName`, falling back to `FirstName`.
	pub nickname: Option<String>,
	/// `Email`.
	pub email: Option<String>,
	/// `PictureUrl`.
	pub image: Option<String>,
}
impl IdentityInfo {
	/// Maps profile fields onto the info record; absent or blank fields stay `None`.
	pub fn from_profile(profile: &JsonValue) -> Self {
		let field = |name: &str| {
			profile
				.get(name)
				.and_then(JsonValue::as_str)
				.filter(|value| !value.trim().is_empty())
				.map(str::to_owned)
		};

		Self {
			name: field("FullName"),
			nickname: field("UserName").or_else(|| field("FirstName")),
			email: field("Email"),
			image: field("PictureUrl"),
		}
	}
}

/// Unmodified provider payloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawIdentity {
	/// Token set returned by the exchange.
	pub token: TokenSet,
	/// `/current/Me` profile object.
	pub user: JsonValue,
}

/// Renders `profile[field]` as a uid. Strings are used verbatim, numbers and booleans via their
/// JSON text; null, missing, and structured values yield `None`.
pub fn profile_uid(profile: &JsonValue, field: &str) -> Option<String> {
	match profile.get(field)? {
		JsonValue::String(value) => Some(value.clone()),
		value if value.is_number() || value.is_boolean() => Some(value.to_string()),
		_ => None,
	}
}
