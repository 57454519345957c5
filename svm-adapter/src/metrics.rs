//! Optional Prometheus exposition surface (spec SPEC_FULL.md §10.4), grounded on
//! `engine/src/metrics.rs`'s `lazy_static!` registry + `prometheus` + `warp` shape. Feature-gated
//! behind `metrics`: the adapter is fully usable as a library with this module compiled out,
//! matching the teacher's `metrics::start` being an optional weak task rather than a hard
//! dependency of the witnessing pipeline.

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use tokio_util::sync::CancellationToken;
use warp::Filter;

lazy_static! {
	static ref REGISTRY: Registry = Registry::new();
	pub static ref RPC_CALLS_TOTAL: IntCounterVec = IntCounterVec::new(
		Opts::new("sol_rpc_calls_total", "Count of RPC calls made per endpoint and method"),
		&["endpoint", "method"],
	)
	.expect("metric definition is valid");
	pub static ref EVENTS_INGESTED_TOTAL: IntCounterVec = IntCounterVec::new(
		Opts::new("sol_events_ingested_total", "Count of gateway events ingested, by status"),
		&["status"],
	)
	.expect("metric definition is valid");
	pub static ref CONFIRMATIONS_PENDING: IntGauge = IntGauge::new(
		"sol_confirmations_pending",
		"Number of tracked events/transactions not yet finalized",
	)
	.expect("metric definition is valid");
	pub static ref RPC_ENDPOINT_HEALTHY: IntGaugeVec = IntGaugeVec::new(
		Opts::new("sol_rpc_endpoint_healthy", "1 if the endpoint passed its last health check, else 0"),
		&["url"],
	)
	.expect("metric definition is valid");
}

/// Registers every metric with the process-wide registry. Idempotent calls after the first are a
/// bug in the caller (mirrors the teacher's `register_metrics`, called once at startup).
pub fn register_metrics() {
	REGISTRY.register(Box::new(RPC_CALLS_TOTAL.clone())).expect("metric not already registered");
	REGISTRY
		.register(Box::new(EVENTS_INGESTED_TOTAL.clone()))
		.expect("metric not already registered");
	REGISTRY
		.register(Box::new(CONFIRMATIONS_PENDING.clone()))
		.expect("metric not already registered");
	REGISTRY
		.register(Box::new(RPC_ENDPOINT_HEALTHY.clone()))
		.expect("metric not already registered");
}

fn render() -> String {
	use prometheus::Encoder;
	let encoder = prometheus::TextEncoder::new();
	let mut buffer = Vec::new();
	if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
		tracing::warn!(error = %e, "failed to encode prometheus metrics");
		return String::new();
	}
	String::from_utf8(buffer).unwrap_or_default()
}

/// Serves `/metrics` on `127.0.0.1:<port>` until `token` is cancelled, then joins. Not part of
/// [`crate::client::ChainClient`]'s own startup sequence — callers that want it opt in explicitly,
/// same as the teacher's own `metrics::start` being wired in by the CFE's top-level binary, not by
/// the witnessing engine itself.
pub fn start(token: CancellationToken, port: u16) -> tokio::task::JoinHandle<()> {
	tokio::spawn(async move {
		let routes = warp::path("metrics").and(warp::path::end()).map(render);
		let (_, serving) = warp::serve(routes).bind_with_graceful_shutdown(
			([127, 0, 0, 1], port),
			async move { token.cancelled().await },
		);
		serving.await;
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn render_produces_valid_prometheus_text_after_registration() {
		register_metrics();
		CONFIRMATIONS_PENDING.set(3);
		let text = render();
		assert!(text.contains("sol_confirmations_pending"), "rendered text was: {text}");
	}
}
