//! Walks through an Exact Online sign-in: prints the authorize URL, then (when the callback URL
//! the browser landed on is passed as the first argument) completes the login and prints the
//! normalized identity.
//!
//! ```sh
//! EXACT_CLIENT_ID=... EXACT_CLIENT_SECRET=... cargo run --example exact_login
//! EXACT_CLIENT_ID=... EXACT_CLIENT_SECRET=... cargo run --example exact_login -- \
//!     'https://app.example.com/auth/exact/callback?code=...&state=demo-state'
//! ```

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use oauth2_exact::{
	config::{ConfigValue, ProviderSettings},
	flows::{AuthorizationFlow, CallbackParams, LoginContext, LoginRequest, LoginStrategy},
	provider::Region,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let region = env::var("EXACT_REGION").ok().map(|raw| raw.parse::<Region>()).transpose()?;
	let config = ProviderSettings::new(
		ConfigValue::env("EXACT_CLIENT_ID"),
		ConfigValue::env("EXACT_CLIENT_SECRET"),
	)
	.with_redirect_uri("https://app.example.com/auth/exact/callback")
	.with_region(region.unwrap_or_default())
	.resolve()?;
	let flow = AuthorizationFlow::new(config);
	let redirect = flow.begin_login(&LoginRequest::default().with_state("demo-state"))?;

	println!("Send your user to {}.", redirect.url);

	let Some(callback) = env::args().nth(1) else {
		println!("Re-run with the callback URL to finish the login.");

		return Ok(());
	};
	let params = CallbackParams::from_query(&Url::parse(&callback)?);

	if params.state.as_deref() != Some("demo-state") {
		eprintln!("State `{:?}` was not recognized.", params.state);
	}

	let mut ctx = LoginContext::default();
	let outcome = flow.complete_login(&mut ctx, &params).await;

	LoginStrategy::cleanup(&flow, &mut ctx);

	let identity = outcome.map_err(|errors| {
		let summary = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");

		eyre!("Sign-in failed: {summary}.")
	})?;

	println!("Signed in as {:?} ({:?}).", identity.info.name, identity.uid);
	println!("Access token expires at {:?}.", identity.credentials.expires_at);

	Ok(())
}
