// self
use crate::{
	flows::AuthError,
	obs::{FlowKind, FlowOutcome},
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_exact_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a per-request sign-in failure: a `warn` event (with `tracing`) and a counter
/// increment labeled by the failure kind (with `metrics`).
pub fn record_auth_failure(kind: FlowKind, error: &AuthError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			flow = kind.as_str(),
			kind = error.kind.as_str(),
			detail = error.message.as_str(),
			"Sign-in failed."
		);
	}

	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_exact_auth_failure_total", "kind" => error.kind.clone())
			.increment(1);
	}

	#[cfg(not(any(feature = "tracing", feature = "metrics")))]
	{
		let _ = (kind, error);
	}
	#[cfg(all(feature = "metrics", not(feature = "tracing")))]
	{
		let _ = kind;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_backends() {
		record_flow_outcome(FlowKind::CompleteLogin, FlowOutcome::Failure);
		record_auth_failure(FlowKind::CompleteLogin, &AuthError::missing_code());
	}
}
