//! Token endpoint response classification.

// crates.io
use serde::Deserializer;
// self
use crate::{_prelude::*, auth::TokenSet, error::TransientError};

/// Code reported when a 2xx token response carries no access token.
pub const MISSING_ACCESS_TOKEN: &str = "invalid_credentials";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenResponseBody {
	access_token: Option<String>,
	refresh_token: Option<String>,
	token_type: Option<String>,
	#[serde(deserialize_with = "lenient_seconds")]
	expires_in: Option<i64>,
	error: Option<String>,
	error_description: Option<String>,
}

/// Classifies a raw token endpoint response.
///
/// A non-empty `access_token` wins regardless of status. Otherwise an `error` field becomes
/// [`Error::Rejected`], other non-2xx answers become [`TransientError::UnexpectedResponse`],
/// and a 2xx without a token is rejected as `invalid_credentials`.
pub(crate) fn map_token_response(
	status: u16,
	retry_after: Option<Duration>,
	body: &[u8],
	received_at: OffsetDateTime,
) -> Result<TokenSet> {
	let success = (200..300).contains(&status);
	let mut de = serde_json::Deserializer::from_slice(body);
	let parsed: TokenResponseBody = match serde_path_to_error::deserialize(&mut de) {
		Ok(parsed) => parsed,
		Err(source) if success =>
			return Err(TransientError::TokenResponseParse { source, status: Some(status) }.into()),
		Err(_) =>
			return Err(TransientError::UnexpectedResponse {
				endpoint: "token",
				message: format!("HTTP {status} with a non-JSON body"),
				status: Some(status),
				retry_after,
			}
			.into()),
	};

	if let Some(access_token) = non_empty(parsed.access_token) {
		let mut token = TokenSet::new(access_token);

		if let Some(refresh_token) = non_empty(parsed.refresh_token) {
			token = token.with_refresh_token(refresh_token);
		}
		if let Some(token_type) = non_empty(parsed.token_type) {
			token = token.with_token_type(token_type);
		}
		if let Some(seconds) = parsed.expires_in {
			token = token.with_expires_in(received_at, Duration::seconds(seconds)).ok_or_else(|| {
				TransientError::UnexpectedResponse {
					endpoint: "token",
					message: format!("expires_in `{seconds}` is out of range"),
					status: Some(status),
					retry_after,
				}
			})?;
		}

		return Ok(token);
	}
	if let Some(code) = non_empty(parsed.error) {
		return Err(Error::Rejected {
			code,
			description: non_empty(parsed.error_description),
			status: Some(status),
		});
	}
	if !success {
		return Err(TransientError::UnexpectedResponse {
			endpoint: "token",
			message: format!("HTTP {status} without an OAuth error payload"),
			status: Some(status),
			retry_after,
		}
		.into());
	}

	Err(Error::Rejected {
		code: MISSING_ACCESS_TOKEN.into(),
		description: Some("Token response did not include an access token.".into()),
		status: Some(status),
	})
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.trim().is_empty())
}

// Exact Online reports `expires_in` as a JSON string.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	use serde::de::Error as _;

	match Option::<JsonValue>::deserialize(deserializer)? {
		None | Some(JsonValue::Null) => Ok(None),
		Some(JsonValue::Number(number)) => number
			.as_i64()
			.or_else(|| number.as_f64().map(|value| value as i64))
			.map(Some)
			.ok_or_else(|| D::Error::custom("expires_in is out of range")),
		Some(JsonValue::String(raw)) => {
			let raw = raw.trim();

			if raw.is_empty() {
				return Ok(None);
			}

			raw.parse::<i64>()
				.map(Some)
				.map_err(|_| D::Error::custom(format!("expires_in `{raw}` is not a number")))
		},
		Some(other) => Err(D::Error::custom(format!("expires_in has unexpected type: {other}"))),
	}
}
