//! RPC Pool Adapter (C2): a single logical Solana RPC surface in front of N endpoints, with
//! round-robin failover and a background health monitor (spec §4.1).
//!
//! Grounded on the teacher's retry-with-backoff pattern (`engine/src/retrier.rs`) simplified to
//! this adapter's needs: bounded attempt count rather than unbounded exponential backoff, since
//! spec §4.1 calls for a fixed `max_attempts = 3` with no retry loop of its own.

use std::{
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
	time::{Duration, Instant},
};

use solana_rpc::{
	error::Error as RpcError,
	responses::{EncodedConfirmedTransactionWithStatusMeta, LatestBlockhash, SignatureInfo, TransactionStatus, UiAccount},
	traits::{
		SolanaGetAccountInfo, SolanaGetGenesisHash, SolanaGetHealth, SolanaGetLatestBlockhash,
		SolanaGetSignatureStatuses, SolanaGetSignaturesForAddress, SolanaGetSlot,
		SolanaGetTransaction, SolanaSendTransaction,
	},
	types::{Commitment, Response, RpcSignatureStatusConfig, RpcSignaturesForAddressConfig, RpcTransactionConfig},
	SolanaClient,
};
use sol_prim::{Address, Digest, Signature};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

const MAX_ATTEMPTS: usize = 3;
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

struct Endpoint {
	url: String,
	client: SolanaClient,
	healthy: bool,
	last_latency: Option<Duration>,
	failure_count: u32,
}

/// Exposes the failover-wrapped Solana RPC surface. Cheap to clone; the endpoint table is
/// `Arc`-shared so every clone observes the same health state.
#[derive(Clone)]
pub struct RpcPool {
	endpoints: Arc<RwLock<Vec<Endpoint>>>,
	next: Arc<AtomicUsize>,
	expected_genesis_hash: Option<String>,
}

impl RpcPool {
	pub fn new(urls: Vec<String>, expected_genesis_hash: Option<String>) -> Result<Self, RpcError> {
		let endpoints = urls
			.into_iter()
			.map(|url| {
				SolanaClient::new(url.clone()).map(|client| Endpoint {
					client,
					url,
					healthy: true,
					last_latency: None,
					failure_count: 0,
				})
			})
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self {
			endpoints: Arc::new(RwLock::new(endpoints)),
			next: Arc::new(AtomicUsize::new(0)),
			expected_genesis_hash,
		})
	}

	pub async fn healthy_endpoint_count(&self) -> usize {
		self.endpoints.read().await.iter().filter(|e| e.healthy).count()
	}

	/// Picks the next candidate endpoint in round-robin order among the currently healthy ones,
	/// falling back to any endpoint if none are marked healthy (spec §4.1 invariant: an unhealthy
	/// endpoint is never chosen while a healthy one exists).
	async fn pick(&self, excluded: &[usize]) -> Option<usize> {
		let endpoints = self.endpoints.read().await;
		if endpoints.is_empty() {
			return None;
		}
		let healthy_indices: Vec<usize> = (0..endpoints.len())
			.filter(|i| endpoints[*i].healthy && !excluded.contains(i))
			.collect();
		let pool = if healthy_indices.is_empty() {
			(0..endpoints.len()).filter(|i| !excluded.contains(i)).collect::<Vec<_>>()
		} else {
			healthy_indices
		};
		if pool.is_empty() {
			return None;
		}
		let idx = self.next.fetch_add(1, Ordering::Relaxed) % pool.len();
		Some(pool[idx])
	}

	async fn record(&self, index: usize, success: bool, latency: Duration) {
		let mut endpoints = self.endpoints.write().await;
		if let Some(e) = endpoints.get_mut(index) {
			e.last_latency = Some(latency);
			if success {
				e.failure_count = 0;
			} else {
				e.failure_count += 1;
			}
		}
	}

	/// `executeWithFailover` (spec §4.1): tries up to `MAX_ATTEMPTS` distinct endpoints, recording
	/// success/latency/error per attempt. Returns the last error if every attempt fails.
	async fn execute_with_failover<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, RpcError>
	where
		F: Fn(SolanaClient) -> Fut,
		Fut: std::future::Future<Output = Result<T, RpcError>>,
	{
		let mut tried = Vec::new();
		let mut last_err = None;
		for _ in 0..MAX_ATTEMPTS {
			let Some(idx) = self.pick(&tried).await else { break };
			tried.push(idx);
			let client = self.endpoints.read().await[idx].client.clone();
			let started = Instant::now();
			match f(client).await {
				Ok(v) => {
					self.record(idx, true, started.elapsed()).await;
					return Ok(v);
				},
				Err(e) => {
					self.record(idx, false, started.elapsed()).await;
					tracing::warn!(op, endpoint = idx, error = %e, "rpc attempt failed");
					last_err = Some(e);
				},
			}
		}
		Err(last_err.unwrap_or_else(|| RpcError::Transport("no endpoints configured".into())))
	}

	/// Runs one health-check pass over every endpoint, updating `healthy` in place (spec §4.1).
	pub async fn run_health_check(&self) {
		let urls: Vec<(usize, SolanaClient)> = {
			let endpoints = self.endpoints.read().await;
			endpoints.iter().enumerate().map(|(i, e)| (i, e.client.clone())).collect()
		};
		for (idx, client) in urls {
			let healthy = tokio::time::timeout(HEALTH_CHECK_TIMEOUT, check_one(&client, &self.expected_genesis_hash))
				.await
				.map(|r| r.unwrap_or(false))
				.unwrap_or(false);
			let mut endpoints = self.endpoints.write().await;
			if let Some(e) = endpoints.get_mut(idx) {
				e.healthy = healthy;
			}
		}
	}

	/// Runs [`Self::run_health_check`] on `interval` until `stop` is cancelled, so `healthy` stays
	/// current instead of being fixed at construction time (spec §4.1).
	pub async fn run_health_check_loop(self, interval: Duration, stop: CancellationToken) {
		let mut ticker = tokio::time::interval(interval);
		loop {
			tokio::select! {
				_ = stop.cancelled() => return,
				_ = ticker.tick() => self.run_health_check().await,
			}
		}
	}

	pub async fn get_genesis_hash(&self) -> Result<Digest, RpcError> {
		self.execute_with_failover("get_genesis_hash", |c| async move { c.get_genesis_hash().await }).await
	}

	pub async fn get_slot(&self, commitment: Commitment) -> Result<u64, RpcError> {
		self.execute_with_failover("get_slot", move |c| async move { c.get_slot(commitment).await }).await
	}

	pub async fn get_signatures_for_address(
		&self,
		address: Address,
		config: RpcSignaturesForAddressConfig,
	) -> Result<Vec<SignatureInfo>, RpcError> {
		let config = config.clone();
		self.execute_with_failover("get_signatures_for_address", move |c| {
			let config = config.clone();
			async move { c.get_signatures_for_address(&address, config).await }
		})
		.await
	}

	pub async fn get_transaction(
		&self,
		signature: Signature,
		config: RpcTransactionConfig,
	) -> Result<Option<EncodedConfirmedTransactionWithStatusMeta>, RpcError> {
		let config = config.clone();
		self.execute_with_failover("get_transaction", move |c| {
			let config = config.clone();
			async move { c.get_transaction(&signature, config).await }
		})
		.await
	}

	pub async fn get_signature_statuses(
		&self,
		signatures: Vec<Signature>,
		config: RpcSignatureStatusConfig,
	) -> Result<Response<Vec<Option<TransactionStatus>>>, RpcError> {
		self.execute_with_failover("get_signature_statuses", move |c| {
			let signatures = signatures.clone();
			let config = config.clone();
			async move { c.get_signature_statuses(&signatures, config).await }
		})
		.await
	}

	pub async fn get_account_info(&self, address: Address) -> Result<Option<UiAccount>, RpcError> {
		self.execute_with_failover("get_account_info", move |c| async move {
			c.get_account_info(&address).await
		})
		.await
	}

	pub async fn get_latest_blockhash(
		&self,
		commitment: Commitment,
	) -> Result<Response<LatestBlockhash>, RpcError> {
		self.execute_with_failover("get_latest_blockhash", move |c| async move {
			c.get_latest_blockhash(commitment).await
		})
		.await
	}

	pub async fn send_transaction(&self, transaction: String) -> Result<Signature, RpcError> {
		self.execute_with_failover("send_transaction", move |c| {
			let transaction = transaction.clone();
			async move { c.send_transaction(transaction).await }
		})
		.await
	}
}

async fn check_one(client: &SolanaClient, expected_genesis_hash: &Option<String>) -> Result<bool, RpcError> {
	client.get_health().await?;
	let slot = client.get_slot(Commitment::Finalized).await?;
	if slot == 0 {
		return Ok(false);
	}
	if let Some(expected) = expected_genesis_hash {
		let actual = client.get_genesis_hash().await?.to_string();
		let len = expected.len().min(actual.len());
		if actual[..len] != expected[..len] {
			return Ok(false);
		}
	}
	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn new_pool_has_all_endpoints_initially_healthy() {
		let pool = RpcPool::new(vec!["http://a".into(), "http://b".into()], None).unwrap();
		assert_eq!(pool.healthy_endpoint_count().await, 2);
	}

	#[tokio::test]
	async fn pick_round_robins_across_healthy_endpoints() {
		let pool = RpcPool::new(vec!["http://a".into(), "http://b".into()], None).unwrap();
		let first = pool.pick(&[]).await.unwrap();
		let second = pool.pick(&[]).await.unwrap();
		assert_ne!(first, second);
	}

	#[tokio::test]
	async fn pick_skips_excluded_endpoints() {
		let pool = RpcPool::new(vec!["http://a".into(), "http://b".into()], None).unwrap();
		let picked = pool.pick(&[0]).await.unwrap();
		assert_eq!(picked, 1);
	}
}
