//! Literal-or-environment configuration values.

// self
use crate::{_prelude::*, error::ConfigError};

/// A configuration value given either literally or as an environment variable reference.
///
/// Deserializes from a plain string (`"abc"`) or from `{ "env": "EXACT_CLIENT_SECRET" }`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
	/// Value used verbatim.
	Literal(String),
	/// Value read from the named environment variable at startup.
	Env {
		/// Environment variable name.
		env: String,
	},
}
impl ConfigValue {
	/// Creates an environment indirection.
	pub fn env(name: impl Into<String>) -> Self {
		Self::Env { env: name.into() }
	}
}
impl From<&str> for ConfigValue {
	fn from(value: &str) -> Self {
		Self::Literal(value.to_owned())
	}
}
impl From<String> for ConfigValue {
	fn from(value: String) -> Self {
		Self::Literal(value)
	}
}
impl Debug for ConfigValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Literal(_) => f.debug_tuple("Literal").field(&"<redacted>").finish(),
			Self::Env { env } => f.debug_struct("Env").field("env", env).finish(),
		}
	}
}

/// Resolves `value` into a literal, consulting `lookup` for environment indirections.
///
/// The function is pure: the process environment is only involved when the caller passes a
/// lookup backed by it.
pub fn resolve_value<F>(
	field: &'static str,
	value: &ConfigValue,
	lookup: F,
) -> Result<String, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	match value {
		ConfigValue::Literal(literal) => Ok(literal.clone()),
		ConfigValue::Env { env } =>
			lookup(env).ok_or_else(|| ConfigError::MissingEnvVar { field, name: env.clone() }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn deserializes_both_shapes() {
		let literal: ConfigValue =
			serde_json::from_str("\"plain\"").expect("Literal should deserialize.");
		let env: ConfigValue = serde_json::from_str(r#"{"env":"EXACT_CLIENT_ID"}"#)
			.expect("Env indirection should deserialize.");

		assert_eq!(literal, ConfigValue::from("plain"));
		assert_eq!(env, ConfigValue::env("EXACT_CLIENT_ID"));
		assert!(serde_json::from_str::<ConfigValue>(r#"{"var":"X"}"#).is_err());
	}

	#[test]
	fn resolve_consults_lookup_only_for_env() {
		let lookup = |name: &str| (name == "SET").then(|| "from-env".to_owned());

		assert_eq!(
			resolve_value("client_id", &ConfigValue::from("lit"), lookup)
				.expect("Literal should resolve."),
			"lit"
		);
		assert_eq!(
			resolve_value("client_id", &ConfigValue::env("SET"), lookup)
				.expect("Set variable should resolve."),
			"from-env"
		);
		assert!(matches!(
			resolve_value("client_secret", &ConfigValue::env("UNSET"), lookup),
			Err(ConfigError::MissingEnvVar { field: "client_secret", .. })
		));
	}

	#[test]
	fn debug_hides_literals() {
		assert_eq!(format!("{:?}", ConfigValue::from("s3cr3t")), "Literal(\"<redacted>\")");
	}
}
